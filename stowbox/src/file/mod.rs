//! Open handles returned by [`ResourceBox::open`](crate::ResourceBox::open).

use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::meta::Metadata;

mod virtual_dir;
mod virtual_file;

pub use self::virtual_dir::VirtualDir;
pub use self::virtual_file::VirtualFile;

use self::virtual_file::closed_error;

/// A file or directory opened from a box, whichever backend it came from.
///
/// Implements [`Read`] and [`Seek`]; directories fail both with
/// [`io::ErrorKind::IsADirectory`].
#[derive(Debug)]
pub enum File {
    /// In-memory file content (embedded or decompressed from the appended archive).
    Virtual(VirtualFile),
    /// In-memory directory listing.
    Dir(VirtualDir),
    /// A file or directory on disk.
    Disk(DiskFile),
}

impl File {
    pub fn stat(&self) -> io::Result<Metadata> {
        match self {
            File::Virtual(f) => f.stat(),
            File::Dir(d) => d.stat(),
            File::Disk(f) => f.stat(),
        }
    }

    /// Lists up to `count` directory entries (all remaining when zero).
    pub fn readdir(&mut self, count: usize) -> io::Result<Vec<Metadata>> {
        match self {
            File::Virtual(f) => f.readdir(count),
            File::Dir(d) => d.readdir(count),
            File::Disk(f) => f.readdir(count),
        }
    }

    pub fn close(&mut self) -> io::Result<()> {
        match self {
            File::Virtual(f) => f.close(),
            File::Dir(d) => d.close(),
            File::Disk(f) => f.close(),
        }
    }

    pub fn is_dir(&self) -> bool {
        match self {
            File::Virtual(_) => false,
            File::Dir(_) => true,
            File::Disk(f) => f.is_dir,
        }
    }
}

impl Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            File::Virtual(f) => f.read(buf),
            File::Dir(d) => d.read(buf),
            File::Disk(f) => f.read(buf),
        }
    }
}

impl Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            File::Virtual(f) => f.seek(pos),
            File::Dir(d) => d.seek(pos),
            File::Disk(f) => f.seek(pos),
        }
    }
}

/// A handle on a real file or directory, used by boxes that live on the filesystem.
#[derive(Debug)]
pub struct DiskFile {
    file: Option<fs::File>,
    path: PathBuf,
    is_dir: bool,
    closed: bool,
    entries: Option<fs::ReadDir>,
}

impl DiskFile {
    pub(crate) fn open(path: PathBuf) -> io::Result<DiskFile> {
        let is_dir = fs::metadata(&path)?.is_dir();
        let file = if is_dir {
            None
        } else {
            Some(fs::File::open(&path)?)
        };
        Ok(DiskFile {
            file,
            path,
            is_dir,
            closed: false,
            entries: None,
        })
    }

    #[inline(always)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.closed {
            Err(closed_error(&self.path.display().to_string()))
        } else {
            Ok(())
        }
    }

    fn is_a_directory(&self, op: &'static str) -> io::Error {
        Error::IsADirectory {
            op,
            path: self.path.display().to_string(),
        }
        .into()
    }

    pub fn stat(&self) -> io::Result<Metadata> {
        self.ensure_open()?;
        let meta = match &self.file {
            Some(file) => file.metadata()?,
            None => fs::metadata(&self.path)?,
        };
        Ok(Metadata::from_fs(self.name(), &meta))
    }

    pub fn readdir(&mut self, count: usize) -> io::Result<Vec<Metadata>> {
        self.ensure_open()?;
        if !self.is_dir {
            return Err(Error::Unsupported {
                op: "readdir",
                path: self.path.display().to_string(),
            }
            .into());
        }

        let mut entries = match self.entries.take() {
            Some(entries) => entries,
            None => fs::read_dir(&self.path)?,
        };

        let limit = if count == 0 { usize::MAX } else { count };
        let mut out = vec![];
        for entry in entries.by_ref().take(limit) {
            let entry = entry?;
            let meta = entry.metadata()?;
            out.push(Metadata::from_fs(
                entry.file_name().to_string_lossy().into_owned(),
                &meta,
            ));
        }

        self.entries = Some(entries);
        Ok(out)
    }

    pub fn close(&mut self) -> io::Result<()> {
        self.file = None;
        self.entries = None;
        self.closed = true;
        Ok(())
    }
}

impl Read for DiskFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_open()?;
        match &mut self.file {
            Some(file) => file.read(buf),
            None => Err(self.is_a_directory("read")),
        }
    }
}

impl Seek for DiskFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.ensure_open()?;
        match &mut self.file {
            Some(file) => file.seek(pos),
            None => Err(self.is_a_directory("seek")),
        }
    }
}
