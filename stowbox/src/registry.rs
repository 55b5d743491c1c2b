//! Process-wide stores of embedded and appended boxes, and box resolution.
//!
//! A [`Registry`] is populated during start-up (register embedded trees,
//! scan for an appended archive) and only read afterwards. It can be passed
//! around explicitly, or installed once as the process-wide registry used by
//! [`crate::find_box`].

use std::collections::HashMap;
use std::io;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::appended::AppendedRegistry;
use crate::embedded::EmbeddedBox;
use crate::error::{Error, Result};
use crate::locate::{BaseDir, FindOptions, LocateMethod};
use crate::resource::{Backing, ResourceBox};

#[derive(Debug, Default)]
pub struct Registry {
    embedded: HashMap<String, Arc<EmbeddedBox>>,
    appended: AppendedRegistry,
}

impl Registry {
    /// A registry with no embedded boxes and no appended archive.
    pub fn new() -> Registry {
        Registry::default()
    }

    /// A registry whose appended boxes are read from the running executable.
    pub fn from_current_exe() -> Registry {
        Registry {
            embedded: HashMap::new(),
            appended: AppendedRegistry::scan_current_exe(),
        }
    }

    pub fn with_appended(appended: AppendedRegistry) -> Registry {
        Registry {
            embedded: HashMap::new(),
            appended,
        }
    }

    pub fn set_appended(&mut self, appended: AppendedRegistry) {
        self.appended = appended;
    }

    /// Registers an embedded box under `name`, failing if the name is taken.
    pub fn try_register_embedded<S: Into<String>>(&mut self, name: S, bx: EmbeddedBox) -> Result<()> {
        let name = name.into();
        if self.embedded.contains_key(&name) {
            return Err(Error::DuplicateBox { name });
        }
        tracing::debug!(name = %name, files = bx.files.len(), "registering embedded box");
        self.embedded.insert(name, Arc::new(bx));
        Ok(())
    }

    /// Registers an embedded box under `name`.
    ///
    /// # Panics
    ///
    /// If a box with the same name is already registered. Two generated
    /// embeddings colliding is a build problem, not something to recover from.
    pub fn register_embedded<S: Into<String>>(&mut self, name: S, bx: EmbeddedBox) {
        if let Err(e) = self.try_register_embedded(name, bx) {
            panic!("{}", e);
        }
    }

    #[inline(always)]
    pub fn embedded(&self, name: &str) -> Option<&Arc<EmbeddedBox>> {
        self.embedded.get(name)
    }

    #[inline(always)]
    pub fn appended(&self) -> &AppendedRegistry {
        &self.appended
    }

    /// Resolves `name` with the default locate order, relative to the caller's source directory.
    #[track_caller]
    pub fn find_box(&self, name: &str) -> Result<ResourceBox> {
        self.find_box_with(name, &FindOptions::default())
    }

    /// Like [`find_box`](Self::find_box), but panics when the box cannot be found.
    #[track_caller]
    pub fn must_find_box(&self, name: &str) -> ResourceBox {
        match self.find_box(name) {
            Ok(bx) => bx,
            Err(e) => panic!("{}", e),
        }
    }

    /// Tries each method of `options.order` in turn and binds the box to the first that succeeds.
    #[track_caller]
    pub fn find_box_with(&self, name: &str, options: &FindOptions) -> Result<ResourceBox> {
        let path = Path::new(name);
        if path.is_absolute() || path.has_root() {
            return Err(Error::AbsolutePath {
                name: name.to_string(),
            });
        }

        let caller = Location::caller();
        let mut failure = None;

        for method in &options.order {
            tracing::debug!(name, method = %method, "locating box");

            let backing = match method {
                LocateMethod::Embedded => self.embedded.get(name).cloned().map(Backing::Embedded),
                LocateMethod::Appended => self.appended.find(name).cloned().map(Backing::Appended),
                LocateMethod::Filesystem => {
                    match locate_on_filesystem(name, &options.base_dir, caller) {
                        Ok(dir) => Some(Backing::Filesystem(dir)),
                        Err(e) => {
                            tracing::debug!(name, error = %e, "box not on filesystem");
                            if let Error::NotADirectory { .. } = e {
                                failure = Some(e);
                            }
                            None
                        }
                    }
                }
            };

            if let Some(backing) = backing {
                tracing::debug!(name, method = %method, "located box");
                return Ok(ResourceBox::new(name.to_string(), backing));
            }
        }

        Err(failure.unwrap_or_else(|| Error::BoxNotFound {
            name: name.to_string(),
        }))
    }
}

/// The directory of the calling source file. `file!()` paths are relative to
/// wherever the compiler ran, which for workspaces is above the package, so
/// relative paths are tried against each ancestor of the working directory.
fn caller_dir(caller: &Location<'_>) -> io::Result<PathBuf> {
    let dir = Path::new(caller.file())
        .parent()
        .unwrap_or_else(|| Path::new(""));
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }

    let cwd = std::env::current_dir()?;
    Ok(cwd
        .ancestors()
        .map(|ancestor| ancestor.join(dir))
        .find(|candidate| candidate.is_dir())
        .unwrap_or_else(|| cwd.join(dir)))
}

fn locate_on_filesystem(name: &str, base: &BaseDir, caller: &Location<'_>) -> Result<PathBuf> {
    let base = match base {
        BaseDir::Caller => caller_dir(caller)?,
        BaseDir::WorkingDir => std::env::current_dir()?,
        BaseDir::Path(path) => path.clone(),
    };

    let path = base.join(name);
    let meta = std::fs::metadata(&path)?;
    if !meta.is_dir() {
        return Err(Error::NotADirectory { path });
    }
    Ok(path)
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Installs the process-wide registry. Only the first call succeeds; the
/// rejected registry is handed back.
pub fn install(registry: Registry) -> std::result::Result<(), Registry> {
    GLOBAL.set(registry)
}

/// The process-wide registry, scanning the current executable on first use
/// if nothing was installed.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::from_current_exe)
}
