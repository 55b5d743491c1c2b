use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use super::{EmbeddedBox, EmbeddedDir, EmbeddedFile};
use crate::error::{Error, Result};
use crate::path::{BoxPath, IntoBoxPathError};

/// Assembles an [`EmbeddedBox`].
///
/// Entries may be added in any order. [`build`](Self::build) creates every
/// directory node first and only then links directories and files into their
/// parents, so the result never depends on insertion or hashing order.
#[derive(Debug)]
pub struct EmbeddedBoxBuilder {
    name: String,
    time: SystemTime,
    dirs: Vec<(String, SystemTime)>,
    files: Vec<(String, Cow<'static, [u8]>, SystemTime)>,
}

#[derive(Default)]
struct DirNode {
    modified: Option<SystemTime>,
    child_dirs: BTreeSet<String>,
    child_files: BTreeSet<String>,
}

fn normalize(path: &str) -> Result<BoxPath> {
    BoxPath::new_or_root(path).map_err(|source| Error::InvalidPath {
        path: path.to_string(),
        source,
    })
}

impl EmbeddedBoxBuilder {
    pub fn new<S: Into<String>>(name: S, time: SystemTime) -> EmbeddedBoxBuilder {
        EmbeddedBoxBuilder {
            name: name.into(),
            time,
            dirs: vec![],
            files: vec![],
        }
    }

    /// Declares a directory. `""` declares the root, which otherwise inherits the box time.
    pub fn dir<S: Into<String>>(mut self, path: S, modified: SystemTime) -> Self {
        self.dirs.push((path.into(), modified));
        self
    }

    pub fn file<S, C>(mut self, path: S, content: C, modified: SystemTime) -> Self
    where
        S: Into<String>,
        C: Into<Cow<'static, [u8]>>,
    {
        self.files.push((path.into(), content.into(), modified));
        self
    }

    pub fn build(self) -> Result<EmbeddedBox> {
        let mut nodes: BTreeMap<BoxPath, DirNode> = BTreeMap::new();
        nodes.insert(BoxPath::root(), DirNode::default());

        let mut declared = Vec::with_capacity(self.dirs.len());
        for (raw, modified) in self.dirs {
            let path = normalize(&raw)?;
            nodes.entry(path.clone()).or_default().modified = Some(modified);
            declared.push(path);
        }

        for path in declared.iter().filter(|p| !p.is_root()) {
            let parent = path.parent().unwrap_or_default();
            match nodes.get_mut(&parent) {
                Some(node) => {
                    node.child_dirs.insert(path.file_name().to_string());
                }
                None => {
                    return Err(Error::MissingParent {
                        path: path.to_string(),
                        parent: parent.to_string(),
                    })
                }
            }
        }

        let mut files = HashMap::with_capacity(self.files.len());
        for (raw, content, modified) in self.files {
            let path = BoxPath::new(&raw).map_err(|source| Error::InvalidPath {
                path: raw.clone(),
                source,
            })?;
            let parent = path.parent().unwrap_or_default();
            match nodes.get_mut(&parent) {
                Some(node) => {
                    node.child_files.insert(path.file_name().to_string());
                }
                None => {
                    return Err(Error::MissingParent {
                        path: path.to_string(),
                        parent: parent.to_string(),
                    })
                }
            }

            files.insert(
                path.as_str().to_string(),
                Arc::new(EmbeddedFile {
                    path,
                    modified,
                    content,
                }),
            );
        }

        let time = self.time;
        let into_dir = |path: BoxPath, node: DirNode| EmbeddedDir {
            modified: node.modified.unwrap_or(time),
            child_dirs: node.child_dirs.into_iter().collect(),
            child_files: node.child_files.into_iter().collect(),
            path,
        };

        let root_node = nodes.remove(&BoxPath::root()).unwrap_or_default();
        let root = Arc::new(into_dir(BoxPath::root(), root_node));

        let mut dirs: HashMap<String, Arc<EmbeddedDir>> = nodes
            .into_iter()
            .map(|(path, node)| (path.as_str().to_string(), Arc::new(into_dir(path, node))))
            .collect();
        dirs.insert(String::new(), root.clone());

        tracing::debug!(
            name = %self.name,
            files = files.len(),
            dirs = dirs.len(),
            "built embedded box"
        );

        Ok(EmbeddedBox {
            name: self.name,
            time,
            files,
            dirs,
            root,
        })
    }
}

impl EmbeddedBox {
    /// Snapshots the directory at `dir` into an embedded box named `name`.
    ///
    /// Symlinks are followed; modification times are preserved.
    pub fn from_directory<S: Into<String>, P: AsRef<Path>>(name: S, dir: P) -> Result<EmbeddedBox> {
        let dir = dir.as_ref();
        let root_meta = std::fs::metadata(dir)?;
        if !root_meta.is_dir() {
            return Err(Error::NotADirectory {
                path: dir.to_path_buf(),
            });
        }

        let now = SystemTime::now();
        let mut builder = EmbeddedBoxBuilder::new(name, now)
            .dir("", root_meta.modified().unwrap_or(now));

        for entry in walkdir::WalkDir::new(dir)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            let relative = entry
                .path()
                .strip_prefix(dir)
                .map_err(|_| Error::InvalidPath {
                    path: entry.path().display().to_string(),
                    source: IntoBoxPathError::NonCanonical,
                })?;
            let path = BoxPath::from_platform(relative).map_err(|source| Error::InvalidPath {
                path: relative.display().to_string(),
                source,
            })?;

            let meta = entry.metadata().map_err(io::Error::from)?;
            let modified = meta.modified().unwrap_or(now);

            if meta.is_dir() {
                builder = builder.dir(path.as_str(), modified);
            } else {
                let content = std::fs::read(entry.path())?;
                builder = builder.file(path.as_str(), content, modified);
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn missing_parent_is_an_error() {
        let err = EmbeddedBoxBuilder::new("assets", UNIX_EPOCH)
            .file("sub/b.txt", &b"world"[..], UNIX_EPOCH)
            .build()
            .unwrap_err();

        match err {
            Error::MissingParent { path, parent } => {
                assert_eq!(path, "sub/b.txt");
                assert_eq!(parent, "sub");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn missing_parent_directory_is_an_error() {
        let err = EmbeddedBoxBuilder::new("assets", UNIX_EPOCH)
            .dir("a/b", UNIX_EPOCH)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingParent { .. }));
    }

    #[test]
    fn declaration_order_does_not_matter() {
        let bx = EmbeddedBoxBuilder::new("assets", UNIX_EPOCH)
            .file("a/b/c.txt", &b"c"[..], UNIX_EPOCH)
            .dir("a/b", UNIX_EPOCH)
            .dir("a", UNIX_EPOCH)
            .build()
            .unwrap();

        assert_eq!(bx.root().child_dirs(), ["a"]);
        assert_eq!(bx.dir("a").unwrap().child_dirs(), ["b"]);
        assert_eq!(bx.dir("a/b").unwrap().child_files(), ["c.txt"]);
    }

    #[test]
    fn paths_are_normalized() {
        let bx = EmbeddedBoxBuilder::new("assets", UNIX_EPOCH)
            .dir("/sub/", UNIX_EPOCH)
            .file("./sub//b.txt", &b"b"[..], UNIX_EPOCH)
            .build()
            .unwrap();
        assert!(bx.file("sub/b.txt").is_some());
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let err = EmbeddedBoxBuilder::new("assets", UNIX_EPOCH)
            .file("../escape.txt", &b""[..], UNIX_EPOCH)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn root_inherits_box_time() {
        let time = UNIX_EPOCH + std::time::Duration::from_secs(42);
        let bx = EmbeddedBoxBuilder::new("assets", time).build().unwrap();
        assert_eq!(bx.root().modified(), time);
        assert!(bx.root().child_dirs().is_empty());
    }

    #[test]
    fn snapshot_of_directory() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        std::fs::write(temp.path().join("a.txt"), "hello").unwrap();
        std::fs::write(temp.path().join("sub").join("b.txt"), "world").unwrap();

        let bx = EmbeddedBox::from_directory("assets", temp.path()).unwrap();
        assert_eq!(bx.name(), "assets");
        assert_eq!(bx.file("a.txt").unwrap().content(), b"hello");
        assert_eq!(bx.file("sub/b.txt").unwrap().content(), b"world");
        assert_eq!(bx.root().child_dirs(), ["sub"]);
        assert_eq!(bx.root().child_files(), ["a.txt"]);
    }
}
