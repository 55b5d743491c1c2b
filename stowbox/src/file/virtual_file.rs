use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use crate::embedded::EmbeddedFile;
use crate::error::Error;
use crate::meta::Metadata;

#[derive(Debug)]
enum Content {
    Embedded(Arc<EmbeddedFile>),
    Owned(Vec<u8>),
}

impl Content {
    #[inline(always)]
    fn as_slice(&self) -> &[u8] {
        match self {
            Content::Embedded(file) => file.content(),
            Content::Owned(bytes) => bytes,
        }
    }
}

/// A read handle over file content held in memory.
///
/// The read position is private to the handle; sharing one handle between
/// threads requires external synchronisation.
#[derive(Debug)]
pub struct VirtualFile {
    meta: Metadata,
    path: String,
    content: Option<Content>,
    offset: u64,
}

pub(crate) fn closed_error(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Other,
        format!("{}: file already closed", path),
    )
}

impl VirtualFile {
    pub(crate) fn embedded(file: Arc<EmbeddedFile>) -> VirtualFile {
        VirtualFile {
            meta: file.metadata(),
            path: file.path().to_string(),
            content: Some(Content::Embedded(file)),
            offset: 0,
        }
    }

    pub(crate) fn owned(path: String, meta: Metadata, bytes: Vec<u8>) -> VirtualFile {
        VirtualFile {
            meta,
            path,
            content: Some(Content::Owned(bytes)),
            offset: 0,
        }
    }

    /// Path of the file relative to its box.
    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn stat(&self) -> io::Result<Metadata> {
        Ok(self.meta.clone())
    }

    pub fn readdir(&mut self, _count: usize) -> io::Result<Vec<Metadata>> {
        Err(Error::Unsupported {
            op: "readdir",
            path: self.path.clone(),
        }
        .into())
    }

    /// Releases the content. Calling it again is harmless.
    pub fn close(&mut self) -> io::Result<()> {
        self.content = None;
        self.offset = 0;
        Ok(())
    }
}

impl Read for VirtualFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let content = match &self.content {
            Some(content) => content.as_slice(),
            None => return Err(closed_error(&self.path)),
        };

        let start = self.offset.min(content.len() as u64) as usize;
        let n = buf.len().min(content.len() - start);
        buf[..n].copy_from_slice(&content[start..start + n]);
        self.offset += n as u64;
        Ok(n)
    }
}

impl Seek for VirtualFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = match &self.content {
            Some(content) => content.as_slice().len() as i128,
            None => return Err(closed_error(&self.path)),
        };

        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::Current(delta) => self.offset as i128 + delta as i128,
            SeekFrom::End(delta) => len + delta as i128,
        };

        if target < 0 || target > len {
            return Err(Error::InvalidSeek {
                op: "seek",
                path: self.path.clone(),
                offset: target,
            }
            .into());
        }

        self.offset = target as u64;
        Ok(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedded::EmbeddedBox;
    use std::time::{Duration, UNIX_EPOCH};

    const TEXT: &[u8] = b"This is a test file.\nIt has a couple of lines.\n";

    fn open() -> VirtualFile {
        let bx = EmbeddedBox::builder("testdata", UNIX_EPOCH)
            .file("test.txt", TEXT, UNIX_EPOCH + Duration::from_secs(1_594_051_142))
            .build()
            .unwrap();
        VirtualFile::embedded(bx.file("test.txt").unwrap().clone())
    }

    #[test]
    fn small_reads_match_full_read() {
        let mut file = open();
        let mut chunked = vec![];
        let mut buf = [0u8; 4];
        loop {
            let n = file.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            chunked.extend_from_slice(&buf[..n]);
        }
        assert_eq!(chunked, TEXT);

        let mut full = vec![];
        open().read_to_end(&mut full).unwrap();
        assert_eq!(full, chunked);
    }

    #[test]
    fn rewind_after_partial_read() {
        let mut file = open();
        let mut buf = [0u8; 7];
        file.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"This is");

        assert_eq!(file.seek(SeekFrom::Start(0)).unwrap(), 0);
        let mut rest = vec![];
        file.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, TEXT);
    }

    #[test]
    fn exhausted_file_reads_zero() {
        let mut file = open();
        let end = file.seek(SeekFrom::End(0)).unwrap();
        assert_eq!(end, TEXT.len() as u64);

        let mut buf = [0u8; 8];
        assert_eq!(file.read(&mut buf).unwrap(), 0);
        assert_eq!(file.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn seek_relative_positions() {
        let mut file = open();
        assert_eq!(file.seek(SeekFrom::Current(5)).unwrap(), 5);
        assert_eq!(file.seek(SeekFrom::Current(-2)).unwrap(), 3);
        assert_eq!(file.seek(SeekFrom::End(-6)).unwrap(), TEXT.len() as u64 - 6);

        let mut tail = String::new();
        file.read_to_string(&mut tail).unwrap();
        assert_eq!(tail, "ines.\n");
    }

    #[test]
    fn out_of_bounds_seeks_fail_without_moving() {
        let mut file = open();
        file.seek(SeekFrom::Start(3)).unwrap();

        let err = file.seek(SeekFrom::Current(-4)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(err.to_string().starts_with("seek test.txt"));

        let err = file.seek(SeekFrom::End(1)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        assert_eq!(file.stream_position().unwrap(), 3);
    }

    #[test]
    fn stat_reports_embedded_metadata() {
        let file = open();
        let meta = file.stat().unwrap();
        assert_eq!(meta.name(), "test.txt");
        assert_eq!(meta.len(), TEXT.len() as u64);
        assert_eq!(
            meta.modified(),
            UNIX_EPOCH + Duration::from_secs(1_594_051_142)
        );
        assert!(!meta.is_dir());
    }

    #[test]
    fn readdir_on_a_file_is_unsupported() {
        let mut file = open();
        let err = file.readdir(0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn close_is_idempotent() {
        let mut file = open();
        file.close().unwrap();
        file.close().unwrap();
        assert!(file.read(&mut [0u8; 4]).is_err());
    }
}
