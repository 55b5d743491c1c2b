use std::io::{self, Read, Seek, SeekFrom};

use crate::error::Error;
use crate::meta::Metadata;

/// A directory handle over an in-memory listing.
#[derive(Debug)]
pub struct VirtualDir {
    meta: Metadata,
    path: String,
    entries: Vec<Metadata>,
    position: usize,
}

impl VirtualDir {
    pub(crate) fn new(path: String, meta: Metadata, entries: Vec<Metadata>) -> VirtualDir {
        VirtualDir {
            meta,
            path,
            entries,
            position: 0,
        }
    }

    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn stat(&self) -> io::Result<Metadata> {
        Ok(self.meta.clone())
    }

    /// Returns up to `count` entries not yet returned, or all of them when
    /// `count` is zero. An exhausted listing yields an empty vector.
    pub fn readdir(&mut self, count: usize) -> io::Result<Vec<Metadata>> {
        let remaining = &self.entries[self.position.min(self.entries.len())..];
        let n = match count {
            0 => remaining.len(),
            n => n.min(remaining.len()),
        };
        let out = remaining[..n].to_vec();
        self.position += n;
        Ok(out)
    }

    pub fn close(&mut self) -> io::Result<()> {
        self.entries = Vec::new();
        self.position = 0;
        Ok(())
    }

    fn is_a_directory(&self, op: &'static str) -> io::Error {
        Error::IsADirectory {
            op,
            path: self.path.clone(),
        }
        .into()
    }
}

impl Read for VirtualDir {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(self.is_a_directory("read"))
    }
}

impl Seek for VirtualDir {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(self.is_a_directory("seek"))
    }
}
