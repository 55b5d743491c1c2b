//! Recursive traversal of a box.

use std::io;
use std::path::Path;

use crate::appended::AppendedBox;
use crate::embedded::EmbeddedBox;
use crate::error::Error;
use crate::meta::Metadata;
use crate::path::{trim_request, BoxPath};
use crate::resource::{Backing, ResourceBox};

/// What the visitor wants [`ResourceBox::walk`] to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkAction {
    #[default]
    Continue,
    /// On a directory, do not descend into it. On a file, skip the rest of
    /// the directory containing it.
    SkipDir,
}

enum Step {
    Continue,
    SkipParent,
}

/// A read-only tree held in memory.
trait Tree {
    fn lookup(&self, path: &str) -> Option<Metadata>;
    fn children(&self, path: &str) -> Vec<(String, Metadata)>;
}

impl Tree for EmbeddedBox {
    fn lookup(&self, path: &str) -> Option<Metadata> {
        if path.is_empty() {
            return Some(Metadata::dir(self.name(), self.time()));
        }
        self.file(path)
            .map(|f| f.metadata())
            .or_else(|| self.dir(path).map(|d| d.metadata()))
    }

    fn children(&self, path: &str) -> Vec<(String, Metadata)> {
        let dir = match self.dir(path) {
            Some(dir) => dir,
            None => return vec![],
        };
        self.child_paths(dir)
            .into_iter()
            .filter_map(|(child, _)| self.lookup(&child).map(|meta| (child, meta)))
            .collect()
    }
}

impl Tree for AppendedBox {
    fn lookup(&self, path: &str) -> Option<Metadata> {
        if path.is_empty() {
            return Some(self.root_metadata());
        }
        self.entry(path).map(|e| e.metadata())
    }

    fn children(&self, path: &str) -> Vec<(String, Metadata)> {
        let dir = match BoxPath::new_or_root(path) {
            Ok(dir) => dir,
            Err(_) => return vec![],
        };
        self.child_paths(&dir)
            .into_iter()
            .filter_map(|(child, _)| self.lookup(&child).map(|meta| (child, meta)))
            .collect()
    }
}

fn walk_tree<T, F, E>(tree: &T, path: &str, meta: Metadata, visitor: &mut F) -> Result<Step, E>
where
    T: Tree + ?Sized,
    F: FnMut(&str, Result<Metadata, Error>) -> Result<WalkAction, E>,
{
    let is_dir = meta.is_dir();
    if visitor(path, Ok(meta))? == WalkAction::SkipDir {
        return Ok(if is_dir { Step::Continue } else { Step::SkipParent });
    }
    if !is_dir {
        return Ok(Step::Continue);
    }

    for (child, child_meta) in tree.children(path) {
        if let Step::SkipParent = walk_tree(tree, &child, child_meta, visitor)? {
            break;
        }
    }
    Ok(Step::Continue)
}

fn walk_memory<T, F, E>(tree: &T, root: &str, mut visitor: F) -> Result<(), E>
where
    T: Tree + ?Sized,
    F: FnMut(&str, Result<Metadata, Error>) -> Result<WalkAction, E>,
{
    match tree.lookup(root) {
        Some(meta) => walk_tree(tree, root, meta, &mut visitor).map(|_| ()),
        None => visitor(root, Err(Error::not_found("walk", root))).map(|_| ()),
    }
}

fn relative_name(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .ok()
        .and_then(|p| BoxPath::from_platform(p).ok())
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn walk_disk<F, E>(base: &Path, root: &str, mut visitor: F) -> Result<(), E>
where
    F: FnMut(&str, Result<Metadata, Error>) -> Result<WalkAction, E>,
{
    let mut it = walkdir::WalkDir::new(base.join(root))
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = it.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let name = match (e.depth(), e.path()) {
                    (0, _) | (_, None) => root.to_string(),
                    (_, Some(path)) => relative_name(base, path),
                };
                let is_missing_root = e.depth() == 0
                    && e.io_error().map(|e| e.kind()) == Some(io::ErrorKind::NotFound);
                let err = if is_missing_root {
                    Error::not_found("walk", root)
                } else {
                    Error::Io(io::Error::from(e))
                };
                visitor(&name, Err(err))?;
                continue;
            }
        };

        let name = if entry.depth() == 0 {
            root.to_string()
        } else {
            relative_name(base, entry.path())
        };

        let meta = entry
            .metadata()
            .map(|m| Metadata::from_fs(entry.file_name().to_string_lossy(), &m))
            .map_err(|e| Error::Io(io::Error::from(e)));
        let failed = meta.is_err();

        if visitor(&name, meta)? == WalkAction::SkipDir && !failed {
            it.skip_current_dir();
        }
    }

    Ok(())
}

impl ResourceBox {
    /// Visits `root` and everything below it, parents before children and
    /// siblings in lexical order.
    ///
    /// The visitor gets the box-relative path of each entry and either its
    /// metadata or the error hit while reading it. Returning
    /// [`WalkAction::SkipDir`] prunes the traversal; returning an error stops
    /// it and hands the error back to the caller.
    pub fn walk<F, E>(&self, root: &str, visitor: F) -> Result<(), E>
    where
        F: FnMut(&str, Result<Metadata, Error>) -> Result<WalkAction, E>,
    {
        let root = trim_request(root).trim_end_matches('/');
        tracing::trace!(r#box = %self.name(), root, "walk");

        match self.backing() {
            Backing::Embedded(bx) => walk_memory(&**bx, root, visitor),
            Backing::Appended(bx) => walk_memory(&**bx, root, visitor),
            Backing::Filesystem(base) => walk_disk(base, root, visitor),
        }
    }
}
