//! Directory trees compiled into the program.
//!
//! An [`EmbeddedBox`] is immutable once built. Trees are produced with an
//! [`EmbeddedBoxBuilder`], either by generated code or by snapshotting a real
//! directory with [`EmbeddedBox::from_directory`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use crate::meta::Metadata;
use crate::path::{BoxPath, PATH_BOX_SEP};

mod builder;

pub use self::builder::EmbeddedBoxBuilder;

/// A file stored in an embedded box.
#[derive(Debug, Clone)]
pub struct EmbeddedFile {
    pub(crate) path: BoxPath,
    pub(crate) modified: SystemTime,
    pub(crate) content: Cow<'static, [u8]>,
}

impl EmbeddedFile {
    /// Path relative to the box root.
    #[inline(always)]
    pub fn path(&self) -> &BoxPath {
        &self.path
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        self.path.file_name()
    }

    #[inline(always)]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    #[inline(always)]
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    #[inline(always)]
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::file(self.name(), self.len(), self.modified)
    }
}

/// A directory stored in an embedded box. Children are kept by name, sorted.
#[derive(Debug, Clone)]
pub struct EmbeddedDir {
    pub(crate) path: BoxPath,
    pub(crate) modified: SystemTime,
    pub(crate) child_dirs: Vec<String>,
    pub(crate) child_files: Vec<String>,
}

impl EmbeddedDir {
    /// Path relative to the box root; empty for the root itself.
    #[inline(always)]
    pub fn path(&self) -> &BoxPath {
        &self.path
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        self.path.file_name()
    }

    #[inline(always)]
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    #[inline(always)]
    pub fn child_dirs(&self) -> &[String] {
        &self.child_dirs
    }

    #[inline(always)]
    pub fn child_files(&self) -> &[String] {
        &self.child_files
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::dir(self.name(), self.modified)
    }
}

/// A named, time-stamped tree of embedded files and directories.
#[derive(Debug)]
pub struct EmbeddedBox {
    pub(crate) name: String,
    pub(crate) time: SystemTime,
    pub(crate) files: HashMap<String, Arc<EmbeddedFile>>,
    pub(crate) dirs: HashMap<String, Arc<EmbeddedDir>>,
    pub(crate) root: Arc<EmbeddedDir>,
}

fn child_key(dir: &BoxPath, name: &str) -> String {
    if dir.is_root() {
        name.to_string()
    } else {
        format!("{}{}{}", dir, PATH_BOX_SEP, name)
    }
}

impl EmbeddedBox {
    pub fn builder<S: Into<String>>(name: S, time: SystemTime) -> EmbeddedBoxBuilder {
        EmbeddedBoxBuilder::new(name, time)
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the box was embedded.
    #[inline(always)]
    pub fn time(&self) -> SystemTime {
        self.time
    }

    #[inline(always)]
    pub fn root(&self) -> &Arc<EmbeddedDir> {
        &self.root
    }

    /// Exact lookup of a file by its box-relative path.
    #[inline(always)]
    pub fn file(&self, path: &str) -> Option<&Arc<EmbeddedFile>> {
        self.files.get(path)
    }

    /// Exact lookup of a directory by its box-relative path.
    #[inline(always)]
    pub fn dir(&self, path: &str) -> Option<&Arc<EmbeddedDir>> {
        self.dirs.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &Arc<EmbeddedFile>> {
        self.files.values()
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Arc<EmbeddedDir>> {
        self.dirs.values()
    }

    /// Metadata of the direct children of `dir`, directories first.
    pub(crate) fn children(&self, dir: &EmbeddedDir) -> Vec<Metadata> {
        let dirs = dir
            .child_dirs
            .iter()
            .filter_map(|name| self.dirs.get(&child_key(&dir.path, name)))
            .map(|d| d.metadata());
        let files = dir
            .child_files
            .iter()
            .filter_map(|name| self.files.get(&child_key(&dir.path, name)))
            .map(|f| f.metadata());
        dirs.chain(files).collect()
    }

    /// The root listing, assembled from every top-level entry of the box.
    pub(crate) fn root_listing(&self) -> (Metadata, Vec<Metadata>) {
        let top_level = |key: &String| !key.is_empty() && !key.contains(PATH_BOX_SEP);

        let mut dirs: Vec<_> = self
            .dirs
            .iter()
            .filter(|(key, _)| top_level(key))
            .map(|(_, d)| d.metadata())
            .collect();
        dirs.sort_by(|a, b| a.name.cmp(&b.name));

        let mut files: Vec<_> = self
            .files
            .iter()
            .filter(|(key, _)| top_level(key))
            .map(|(_, f)| f.metadata())
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));

        dirs.extend(files);
        (Metadata::dir(self.name.clone(), self.time), dirs)
    }

    /// Full box-relative paths of the direct children of `dir`, sorted by name.
    pub(crate) fn child_paths(&self, dir: &EmbeddedDir) -> Vec<(String, bool)> {
        let mut out: Vec<(String, bool)> = dir
            .child_dirs
            .iter()
            .map(|name| (child_key(&dir.path, name), true))
            .chain(
                dir.child_files
                    .iter()
                    .map(|name| (child_key(&dir.path, name), false)),
            )
            .collect();
        out.sort();
        out
    }
}
