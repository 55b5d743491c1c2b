use relative_path::{Component, RelativePath};
use std::{fmt, path::Path};

mod error;

pub use self::error::IntoBoxPathError;

/// The separator used inside boxes and appended archives, regardless of platform.
pub const PATH_BOX_SEP: char = '/';

/// The character box-name separators are replaced with when the name is used
/// as the top-level segment of an appended archive.
pub const ARCHIVE_NAME_SEP: char = '-';

/// A normalized path relative to the root of a box.
///
/// Always `/`-delimited, never has a leading or trailing separator and never
/// contains `.` or `..` chunks. The root of a box is the empty path.
#[derive(Debug, Clone, Default, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct BoxPath(pub(crate) String);

fn sanitize_segment(segment: &str) -> Option<&str> {
    Some(segment)
        .filter(|x| !x.is_empty())
        .filter(|x| !x.chars().any(|c| c == '\\' || c.is_control()))
}

impl BoxPath {
    /// Normalizes `path`, collapsing `.` and `..` chunks and repeated separators.
    pub fn new<S: AsRef<str>>(path: S) -> Result<BoxPath, IntoBoxPathError> {
        let out = Self::sanitize(path.as_ref())?;
        if out.is_root() {
            return Err(IntoBoxPathError::EmptyPath);
        }
        Ok(out)
    }

    /// Like [`BoxPath::new`], but an empty (or all-`.`) input yields the root.
    pub fn new_or_root<S: AsRef<str>>(path: S) -> Result<BoxPath, IntoBoxPathError> {
        Self::sanitize(path.as_ref())
    }

    /// Converts a platform path relative to a box directory.
    pub fn from_platform<P: AsRef<Path>>(path: P) -> Result<BoxPath, IntoBoxPathError> {
        use std::path::Component as PlatformComponent;

        let mut out: Vec<&str> = vec![];
        for component in path.as_ref().components() {
            match component {
                PlatformComponent::CurDir => {}
                PlatformComponent::RootDir | PlatformComponent::Prefix(_) => {
                    return Err(IntoBoxPathError::NonCanonical)
                }
                PlatformComponent::ParentDir => {
                    out.pop().ok_or(IntoBoxPathError::NonCanonical)?;
                }
                PlatformComponent::Normal(os_str) => out.push(
                    os_str
                        .to_str()
                        .and_then(sanitize_segment)
                        .ok_or(IntoBoxPathError::UnrepresentableStr)?,
                ),
            }
        }
        Ok(BoxPath(out.join("/")))
    }

    fn sanitize(path: &str) -> Result<BoxPath, IntoBoxPathError> {
        let mut out: Vec<&str> = vec![];

        for component in RelativePath::new(path).components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    out.pop().ok_or(IntoBoxPathError::NonCanonical)?;
                }
                Component::Normal(segment) => {
                    out.push(sanitize_segment(segment).ok_or(IntoBoxPathError::UnrepresentableStr)?)
                }
            }
        }

        Ok(BoxPath(out.join("/")))
    }

    pub fn root() -> BoxPath {
        BoxPath(String::new())
    }

    #[inline(always)]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The parent directory; the root for top-level entries, `None` for the root itself.
    pub fn parent(&self) -> Option<BoxPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(PATH_BOX_SEP) {
            Some(idx) => Some(BoxPath(self.0[..idx].to_string())),
            None => Some(BoxPath::root()),
        }
    }

    /// The last segment of the path. Empty for the root.
    pub fn file_name(&self) -> &str {
        match self.0.rfind(PATH_BOX_SEP) {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }
}

impl fmt::Display for BoxPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BoxPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strips the leading separators callers commonly send (`/index.html`).
/// `""` and `"."` both address the box root. No other normalization happens:
/// lookups are exact.
pub fn trim_request(name: &str) -> &str {
    let name = name.trim_start_matches(PATH_BOX_SEP);
    if name == "." {
        ""
    } else {
        name
    }
}

/// The top-level archive segment a box is stored under when appended.
pub fn archive_box_name(name: &str) -> String {
    name.replace(PATH_BOX_SEP, &ARCHIVE_NAME_SEP.to_string())
}
