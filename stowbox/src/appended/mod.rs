//! Boxes stored in a zip archive appended to the running executable.
//!
//! The archive may follow arbitrary leading bytes (the executable itself);
//! it is found by its end-of-central-directory record, not by offset zero.
//! Members are stored as `<box-name>/<relative-path>`, where `/` inside box
//! names has been replaced by `-` (see [`archive_box_name`]).

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use memmap2::Mmap;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::meta::Metadata;
use crate::path::{archive_box_name, BoxPath, PATH_BOX_SEP};

mod writer;

pub use self::writer::{append_to_executable, AppendWriter};

/// Bytes shared between every box cut from the same archive.
#[derive(Clone)]
pub(crate) struct SharedBytes(Arc<dyn AsRef<[u8]> + Send + Sync>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        AsRef::<[u8]>::as_ref(&*self.0)
    }
}

type ArchiveReader = ZipArchive<Cursor<SharedBytes>>;

const MAX_PREALLOCATION: u64 = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File { index: usize, size: u64 },
    Directory,
}

/// One member of an appended box.
#[derive(Debug, Clone)]
pub struct AppendedEntry {
    pub(crate) path: BoxPath,
    pub(crate) kind: EntryKind,
    pub(crate) modified: SystemTime,
}

impl AppendedEntry {
    #[inline(always)]
    pub fn path(&self) -> &BoxPath {
        &self.path
    }

    #[inline(always)]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    #[inline(always)]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    #[inline(always)]
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    pub fn metadata(&self) -> Metadata {
        match self.kind {
            EntryKind::File { size, .. } => {
                Metadata::file(self.path.file_name(), size, self.modified)
            }
            EntryKind::Directory => Metadata::dir(self.path.file_name(), self.modified),
        }
    }
}

/// A box found in the appended archive.
pub struct AppendedBox {
    name: String,
    entries: HashMap<String, AppendedEntry>,
    archive: ArchiveReader,
    time: Option<SystemTime>,
}

impl fmt::Debug for AppendedBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppendedBox")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .field("time", &self.time)
            .finish()
    }
}

impl AppendedBox {
    /// The archive-side name (`/` already replaced by `-`).
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Newest modification time of any member.
    #[inline(always)]
    pub fn time(&self) -> Option<SystemTime> {
        self.time
    }

    /// Exact lookup by box-relative path.
    #[inline(always)]
    pub fn entry(&self, path: &str) -> Option<&AppendedEntry> {
        self.entries.get(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &AppendedEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decompresses the file at `path`.
    pub fn read(&self, op: &'static str, path: &str) -> Result<Vec<u8>> {
        match self.entries.get(path) {
            Some(entry) if !entry.is_dir() => self.decompress(op, entry),
            _ => Err(Error::not_found(op, path)),
        }
    }

    pub(crate) fn decompress(&self, op: &'static str, entry: &AppendedEntry) -> Result<Vec<u8>> {
        let (index, size) = match entry.kind {
            EntryKind::File { index, size } => (index, size),
            EntryKind::Directory => {
                return Err(Error::IsADirectory {
                    op,
                    path: entry.path.to_string(),
                })
            }
        };

        let integrity = |source: Box<dyn std::error::Error + Send + Sync>| Error::DataIntegrity {
            op,
            path: entry.path.to_string(),
            source: Some(source),
        };

        // Clones share the parsed central directory and the mapped bytes.
        let mut archive = self.archive.clone();
        let mut file = archive.by_index(index).map_err(|e| integrity(Box::new(e)))?;

        // The recorded size is unverified until the data has been read.
        let mut buf = Vec::with_capacity(size.min(MAX_PREALLOCATION) as usize);
        file.read_to_end(&mut buf)
            .map_err(|e| integrity(Box::new(e)))?;

        if buf.len() as u64 != size {
            return Err(Error::DataIntegrity {
                op,
                path: entry.path.to_string(),
                source: None,
            });
        }

        Ok(buf)
    }

    /// Metadata of the direct children of `dir`, directories first.
    pub(crate) fn children(&self, dir: &BoxPath) -> Vec<Metadata> {
        let mut children: Vec<&AppendedEntry> = self
            .entries
            .values()
            .filter(|e| e.path.parent().as_ref() == Some(dir))
            .collect();
        children.sort_by(|a, b| {
            b.is_dir()
                .cmp(&a.is_dir())
                .then_with(|| a.path.file_name().cmp(b.path.file_name()))
        });
        children.into_iter().map(|e| e.metadata()).collect()
    }

    /// Full paths of the direct children of `dir`, sorted.
    pub(crate) fn child_paths(&self, dir: &BoxPath) -> Vec<(String, bool)> {
        let mut out: Vec<(String, bool)> = self
            .entries
            .values()
            .filter(|e| e.path.parent().as_ref() == Some(dir))
            .map(|e| (e.path.as_str().to_string(), e.is_dir()))
            .collect();
        out.sort();
        out
    }

    /// Metadata describing the box root.
    pub(crate) fn root_metadata(&self) -> Metadata {
        Metadata::dir(self.name.clone(), self.time.unwrap_or(UNIX_EPOCH))
    }
}

/// Every appended box found in one archive, keyed by archive-side name.
#[derive(Debug, Default)]
pub struct AppendedRegistry {
    boxes: HashMap<String, Arc<AppendedBox>>,
}

fn dos_to_system_time(dt: zip::DateTime) -> Option<SystemTime> {
    let date = chrono::NaiveDate::from_ymd_opt(dt.year() as i32, dt.month() as u32, dt.day() as u32)?;
    let datetime = date.and_hms_opt(dt.hour() as u32, dt.minute() as u32, dt.second() as u32)?;
    Some(datetime.and_utc().into())
}

struct RawMember {
    index: usize,
    name: String,
    is_dir: bool,
    size: u64,
    modified: SystemTime,
}

impl AppendedRegistry {
    /// An empty registry.
    pub fn new() -> AppendedRegistry {
        AppendedRegistry::default()
    }

    /// Scans the running executable. Never fails: an executable without an
    /// appended archive simply yields an empty registry.
    pub fn scan_current_exe() -> AppendedRegistry {
        let path = match std::env::current_exe() {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(error = %e, "cannot locate current executable");
                return AppendedRegistry::new();
            }
        };

        match AppendedRegistry::scan_path(&path) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot scan executable");
                AppendedRegistry::new()
            }
        }
    }

    /// Scans the file at `path` for a trailing zip archive.
    ///
    /// Only failing to open or map the file is an error.
    pub fn scan_path<P: AsRef<Path>>(path: P) -> Result<AppendedRegistry> {
        let file = File::open(path.as_ref())?;
        // The mapping is read-only and executables are not rewritten while running.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(AppendedRegistry::from_shared(SharedBytes(Arc::new(mmap))))
    }

    /// Scans an in-memory image for a trailing zip archive.
    pub fn from_bytes(bytes: Vec<u8>) -> AppendedRegistry {
        AppendedRegistry::from_shared(SharedBytes(Arc::new(bytes)))
    }

    fn from_shared(bytes: SharedBytes) -> AppendedRegistry {
        match AppendedRegistry::index(bytes) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::debug!(error = %e, "no appended archive found");
                AppendedRegistry::new()
            }
        }
    }

    fn index(bytes: SharedBytes) -> Result<AppendedRegistry> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut members = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive.by_index_raw(index)?;
            members.push(RawMember {
                index,
                name: file.name().to_string(),
                is_dir: file.is_dir(),
                size: file.size(),
                modified: file
                    .last_modified()
                    .and_then(dos_to_system_time)
                    .unwrap_or(UNIX_EPOCH),
            });
        }

        let mut grouped: HashMap<String, HashMap<String, AppendedEntry>> = HashMap::new();

        for member in members {
            tracing::debug!(name = %member.name, "found appended entry");

            let trimmed = member.name.trim_start_matches(PATH_BOX_SEP);
            let (box_name, rest) = match trimmed.split_once(PATH_BOX_SEP) {
                Some((box_name, rest)) => (box_name, rest),
                None => (trimmed, ""),
            };
            if box_name.is_empty() {
                continue;
            }

            let entries = grouped.entry(box_name.to_string()).or_insert_with(|| {
                tracing::debug!(name = %box_name, "creating appended box");
                HashMap::new()
            });

            let path = match BoxPath::new_or_root(rest) {
                Ok(path) if !path.is_root() => path,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(name = %member.name, error = %e, "skipping unrepresentable appended entry");
                    continue;
                }
            };

            let kind = if member.is_dir {
                EntryKind::Directory
            } else {
                EntryKind::File {
                    index: member.index,
                    size: member.size,
                }
            };

            let mut parent = path.parent();
            while let Some(dir) = parent.filter(|p| !p.is_root()) {
                parent = dir.parent();
                entries
                    .entry(dir.as_str().to_string())
                    .or_insert_with(|| AppendedEntry {
                        path: dir,
                        kind: EntryKind::Directory,
                        modified: member.modified,
                    });
            }

            entries.insert(
                path.as_str().to_string(),
                AppendedEntry {
                    path,
                    kind,
                    modified: member.modified,
                },
            );
        }

        let boxes = grouped
            .into_iter()
            .map(|(name, entries)| {
                let time = entries.values().map(|e| e.modified).max();
                let appended = AppendedBox {
                    name: name.clone(),
                    entries,
                    archive: archive.clone(),
                    time,
                };
                (name, Arc::new(appended))
            })
            .collect();

        Ok(AppendedRegistry { boxes })
    }

    /// Looks up a box by its logical name; `/` is mapped to `-` first.
    pub fn find(&self, name: &str) -> Option<&Arc<AppendedBox>> {
        self.boxes.get(&archive_box_name(name))
    }

    /// Exact lookup by archive-side name.
    #[inline(always)]
    pub fn get(&self, archive_name: &str) -> Option<&Arc<AppendedBox>> {
        self.boxes.get(archive_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AppendedBox>> {
        self.boxes.values()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}
