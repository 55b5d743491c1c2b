use std::io;
use std::path::PathBuf;

use crate::path::IntoBoxPathError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{op} {path}: file does not exist")]
    NotFound { op: &'static str, path: String },

    #[error("could not locate box `{name}`")]
    BoxNotFound { name: String },

    #[error("absolute path not supported: `{name}`")]
    AbsolutePath { name: String },

    #[error("`{}` is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("embedded box `{name}` is already registered")]
    DuplicateBox { name: String },

    #[error("{op} {path}: error reading data from zip file")]
    DataIntegrity {
        op: &'static str,
        path: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{op} {path}: operation not supported")]
    Unsupported { op: &'static str, path: String },

    #[error("{op} {path}: is a directory")]
    IsADirectory { op: &'static str, path: String },

    #[error("{op} {path}: invalid offset {offset}")]
    InvalidSeek {
        op: &'static str,
        path: String,
        offset: i128,
    },

    #[error("`{path}` has no parent directory `{parent}` in the tree")]
    MissingParent { path: String, parent: String },

    #[error("cannot handle path `{path}`")]
    InvalidPath {
        path: String,
        #[source]
        source: IntoBoxPathError,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("cannot read appended archive")]
    Archive(#[from] zip::result::ZipError),
}

impl Error {
    pub(crate) fn not_found<S: Into<String>>(op: &'static str, path: S) -> Error {
        Error::NotFound {
            op,
            path: path.into(),
        }
    }

    /// Classifies the error the way `std::io` would.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Error::NotFound { .. } | Error::BoxNotFound { .. } => io::ErrorKind::NotFound,
            Error::AbsolutePath { .. }
            | Error::InvalidSeek { .. }
            | Error::InvalidPath { .. }
            | Error::MissingParent { .. } => io::ErrorKind::InvalidInput,
            Error::NotADirectory { .. } => io::ErrorKind::NotADirectory,
            Error::IsADirectory { .. } => io::ErrorKind::IsADirectory,
            Error::DuplicateBox { .. } => io::ErrorKind::AlreadyExists,
            Error::DataIntegrity { .. } | Error::Archive(_) => io::ErrorKind::InvalidData,
            Error::Unsupported { .. } => io::ErrorKind::Unsupported,
            Error::Io(e) => e.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == io::ErrorKind::NotFound
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> io::Error {
        match error {
            Error::Io(e) => e,
            other => io::Error::new(other.kind(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_conversion_keeps_kind_and_payload() {
        let err: io::Error = Error::not_found("open", "missing.txt").into();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(err.to_string(), "open missing.txt: file does not exist");
        assert!(err.get_ref().unwrap().downcast_ref::<Error>().is_some());
    }

    #[test]
    fn io_errors_pass_through_unchanged() {
        let original = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let err: io::Error = Error::Io(original).into();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(err.to_string(), "nope");
    }
}
