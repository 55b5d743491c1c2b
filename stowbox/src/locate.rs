use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A strategy for finding a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocateMethod {
    /// Trees registered with [`Registry::register_embedded`](crate::Registry::register_embedded).
    Embedded,
    /// Boxes found in a zip archive appended to the executable.
    Appended,
    /// A real directory relative to the base directory.
    #[serde(rename = "fs")]
    Filesystem,
}

/// Embedded, then appended, then the filesystem.
pub const DEFAULT_LOCATE_ORDER: [LocateMethod; 3] = [
    LocateMethod::Embedded,
    LocateMethod::Appended,
    LocateMethod::Filesystem,
];

impl fmt::Display for LocateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LocateMethod::Embedded => "embedded",
            LocateMethod::Appended => "appended",
            LocateMethod::Filesystem => "fs",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLocateMethodError(String);

impl std::error::Error for ParseLocateMethodError {}

impl fmt::Display for ParseLocateMethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown locate method: {}", self.0)
    }
}

impl FromStr for LocateMethod {
    type Err = ParseLocateMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s {
            "embedded" | "embed" => LocateMethod::Embedded,
            "appended" | "append" => LocateMethod::Appended,
            "fs" | "filesystem" => LocateMethod::Filesystem,
            _ => return Err(ParseLocateMethodError(s.to_string())),
        };
        Ok(method)
    }
}

/// Where filesystem-backed boxes are resolved from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BaseDir {
    /// The directory of the source file that called the resolving function.
    /// Relative source paths are anchored at the nearest ancestor of the
    /// working directory that contains them.
    #[default]
    Caller,
    /// The process working directory.
    WorkingDir,
    /// An explicit directory.
    Path(PathBuf),
}

/// Options for [`Registry::find_box_with`](crate::Registry::find_box_with).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOptions {
    pub order: Vec<LocateMethod>,
    pub base_dir: BaseDir,
}

impl Default for FindOptions {
    fn default() -> Self {
        FindOptions {
            order: DEFAULT_LOCATE_ORDER.to_vec(),
            base_dir: BaseDir::Caller,
        }
    }
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    pub fn order<I: IntoIterator<Item = LocateMethod>>(mut self, order: I) -> Self {
        self.order = order.into_iter().collect();
        self
    }

    pub fn base_dir(mut self, base_dir: BaseDir) -> Self {
        self.base_dir = base_dir;
        self
    }
}
