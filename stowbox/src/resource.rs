//! The [`ResourceBox`] handle and its read operations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use std::{fs, io};

use crate::appended::AppendedBox;
use crate::embedded::EmbeddedBox;
use crate::error::{Error, Result};
use crate::file::{DiskFile, File, VirtualDir, VirtualFile};
use crate::path::{trim_request, BoxPath};

/// Where the content of a [`ResourceBox`] lives. Fixed when the box is located.
#[derive(Debug, Clone)]
pub enum Backing {
    Embedded(Arc<EmbeddedBox>),
    Appended(Arc<AppendedBox>),
    /// Absolute directory on disk.
    Filesystem(PathBuf),
}

/// A located box. Cheap to clone, and safe to share across threads.
#[derive(Debug, Clone)]
pub struct ResourceBox {
    name: String,
    backing: Backing,
}

impl ResourceBox {
    pub(crate) fn new(name: String, backing: Backing) -> ResourceBox {
        ResourceBox { name, backing }
    }

    /// A box reading straight from `dir`, without going through a registry.
    pub fn from_directory<S: Into<String>, P: Into<PathBuf>>(name: S, dir: P) -> ResourceBox {
        ResourceBox::new(name.into(), Backing::Filesystem(dir.into()))
    }

    pub fn from_embedded(bx: Arc<EmbeddedBox>) -> ResourceBox {
        ResourceBox::new(bx.name().to_string(), Backing::Embedded(bx))
    }

    pub fn from_appended(bx: Arc<AppendedBox>) -> ResourceBox {
        ResourceBox::new(bx.name().to_string(), Backing::Appended(bx))
    }

    /// The name the box was requested by.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.backing, Backing::Embedded(_))
    }

    pub fn is_appended(&self) -> bool {
        matches!(self.backing, Backing::Appended(_))
    }

    pub fn is_filesystem(&self) -> bool {
        matches!(self.backing, Backing::Filesystem(_))
    }

    /// The directory a filesystem box reads from.
    pub fn base_dir(&self) -> Option<&Path> {
        match &self.backing {
            Backing::Filesystem(path) => Some(path),
            _ => None,
        }
    }

    /// Modification time reported for the box as a whole.
    ///
    /// Embedded boxes report their registration time, appended boxes the
    /// newest modification time among their members. Filesystem boxes have
    /// no fixed time and report the current time.
    pub fn time(&self) -> SystemTime {
        match &self.backing {
            Backing::Embedded(bx) => bx.time(),
            Backing::Appended(bx) => bx.time().unwrap_or_else(SystemTime::now),
            Backing::Filesystem(_) => SystemTime::now(),
        }
    }

    /// Opens a file or directory. Leading separators are ignored, and an
    /// empty name opens the root of the box.
    pub fn open(&self, name: &str) -> Result<File> {
        let name = trim_request(name);
        tracing::debug!(r#box = %self.name, name, "open");

        match &self.backing {
            Backing::Embedded(bx) => {
                if name.is_empty() {
                    let (meta, entries) = bx.root_listing();
                    return Ok(File::Dir(VirtualDir::new(String::new(), meta, entries)));
                }
                if let Some(file) = bx.file(name) {
                    return Ok(File::Virtual(VirtualFile::embedded(file.clone())));
                }
                if let Some(dir) = bx.dir(name) {
                    return Ok(File::Dir(VirtualDir::new(
                        name.to_string(),
                        dir.metadata(),
                        bx.children(dir),
                    )));
                }
                Err(Error::not_found("open", name))
            }
            Backing::Appended(bx) => {
                if name.is_empty() {
                    return Ok(File::Dir(VirtualDir::new(
                        String::new(),
                        bx.root_metadata(),
                        bx.children(&BoxPath::root()),
                    )));
                }
                let entry = bx
                    .entry(name)
                    .ok_or_else(|| Error::not_found("open", name))?;
                if entry.is_dir() {
                    return Ok(File::Dir(VirtualDir::new(
                        name.to_string(),
                        entry.metadata(),
                        bx.children(entry.path()),
                    )));
                }
                let bytes = bx.decompress("open", entry)?;
                Ok(File::Virtual(VirtualFile::owned(
                    name.to_string(),
                    entry.metadata(),
                    bytes,
                )))
            }
            Backing::Filesystem(base) => Ok(File::Disk(DiskFile::open(base.join(name))?)),
        }
    }

    /// Reads the whole content of a file into a fresh buffer.
    pub fn bytes(&self, name: &str) -> Result<Vec<u8>> {
        let name = trim_request(name);
        match &self.backing {
            Backing::Embedded(bx) => bx
                .file(name)
                .map(|file| file.content().to_vec())
                .ok_or_else(|| Error::not_found("read", name)),
            Backing::Appended(bx) => bx.read("read", name),
            Backing::Filesystem(base) => Ok(fs::read(base.join(name))?),
        }
    }

    /// Reads the whole content of a file as UTF-8 text.
    pub fn string(&self, name: &str) -> Result<String> {
        let bytes = self.bytes(name)?;
        String::from_utf8(bytes).map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    /// Like [`bytes`](Self::bytes), but panics on failure.
    #[track_caller]
    pub fn must_bytes(&self, name: &str) -> Vec<u8> {
        match self.bytes(name) {
            Ok(bytes) => bytes,
            Err(e) => panic!("{}", e),
        }
    }

    /// Like [`string`](Self::string), but panics on failure.
    #[track_caller]
    pub fn must_string(&self, name: &str) -> String {
        match self.string(name) {
            Ok(s) => s,
            Err(e) => panic!("{}", e),
        }
    }
}
