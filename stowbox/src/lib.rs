//! Read-only virtual filesystems ("boxes") that resolve to data compiled into
//! the binary, a zip archive appended to the executable, or a directory on
//! disk, behind one API.
//!
//! ```no_run
//! let bx = stowbox::must_find_box("templates");
//! let index = bx.must_string("index.html");
//! # let _ = index;
//! ```
//!
//! Boxes are resolved against the process-wide [`Registry`], which scans the
//! running executable for an appended archive on first use unless one was
//! [installed](registry::install) beforehand.

mod appended;
mod embedded;
mod error;
mod file;
mod http;
mod locate;
mod meta;
pub mod path;
pub mod registry;
mod resource;
mod walk;

pub use appended::{
    append_to_executable, AppendWriter, AppendedBox, AppendedEntry, AppendedRegistry, EntryKind,
};
pub use embedded::{EmbeddedBox, EmbeddedBoxBuilder, EmbeddedDir, EmbeddedFile};
pub use error::{Error, Result};
pub use file::{DiskFile, File, VirtualDir, VirtualFile};
pub use http::{FileSystem, HttpBox};
pub use locate::{BaseDir, FindOptions, LocateMethod, ParseLocateMethodError, DEFAULT_LOCATE_ORDER};
pub use meta::{Metadata, READ_ONLY_MODE};
pub use path::BoxPath;
pub use registry::Registry;
pub use resource::{Backing, ResourceBox};
pub use walk::WalkAction;

/// Locates `name` in the process-wide registry with the default options.
///
/// Filesystem lookups are relative to the directory of the calling source file.
#[track_caller]
pub fn find_box(name: &str) -> Result<ResourceBox> {
    registry::global().find_box(name)
}

/// Like [`find_box`], but panics when the box cannot be located.
#[track_caller]
pub fn must_find_box(name: &str) -> ResourceBox {
    registry::global().must_find_box(name)
}

#[track_caller]
pub fn find_box_with(name: &str, options: &FindOptions) -> Result<ResourceBox> {
    registry::global().find_box_with(name, options)
}
