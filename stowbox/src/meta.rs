use std::time::SystemTime;

/// Permission bits reported for everything served from memory: `r-xr-xr-x`.
pub const READ_ONLY_MODE: u32 = 0o555;

/// A snapshot of an entry's metadata, shared by all backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub(crate) name: String,
    pub(crate) size: u64,
    pub(crate) mode: u32,
    pub(crate) modified: SystemTime,
    pub(crate) is_dir: bool,
}

impl Metadata {
    pub(crate) fn file<S: Into<String>>(name: S, size: u64, modified: SystemTime) -> Metadata {
        Metadata {
            name: name.into(),
            size,
            mode: READ_ONLY_MODE,
            modified,
            is_dir: false,
        }
    }

    pub(crate) fn dir<S: Into<String>>(name: S, modified: SystemTime) -> Metadata {
        Metadata {
            name: name.into(),
            size: 0,
            mode: READ_ONLY_MODE,
            modified,
            is_dir: true,
        }
    }

    pub(crate) fn from_fs<S: Into<String>>(name: S, meta: &std::fs::Metadata) -> Metadata {
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            meta.permissions().mode() & 0o7777
        };
        #[cfg(not(unix))]
        let mode = if meta.permissions().readonly() {
            READ_ONLY_MODE
        } else {
            0o755
        };

        Metadata {
            name: name.into(),
            size: if meta.is_dir() { 0 } else { meta.len() },
            mode,
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            is_dir: meta.is_dir(),
        }
    }

    /// Base name of the entry.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content length in bytes; always zero for directories.
    #[inline(always)]
    pub fn len(&self) -> u64 {
        self.size
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Unix-style permission bits.
    #[inline(always)]
    pub fn mode(&self) -> u32 {
        self.mode
    }

    #[inline(always)]
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    #[inline(always)]
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    #[inline(always)]
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }
}
