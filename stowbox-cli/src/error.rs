use std::path::PathBuf;

use miette::Diagnostic;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    #[error("Cannot read executable `{}`", .path.display())]
    ReadExecutable {
        path: PathBuf,
        #[source]
        source: stowbox::Error,
    },

    #[error("Cannot append boxes to `{}`", .path.display())]
    AppendBoxes {
        path: PathBuf,
        #[source]
        source: stowbox::Error,
    },

    #[error("Box directory `{}` does not exist", .path.display())]
    #[diagnostic(help("Box directories are resolved relative to the current directory"))]
    MissingBoxDirectory { path: PathBuf },

    #[error("Invalid box `{spec}`")]
    #[diagnostic(help("Use NAME=DIR or DIR, with a relative box name"))]
    InvalidBoxSpec { spec: String },

    #[error("No boxes are appended to `{}`", .path.display())]
    #[diagnostic(help("Append boxes with `stowbox append --exec <BINARY> <BOX>...`"))]
    NoAppendedBoxes { path: PathBuf },

    #[error("Cannot serialize listing")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}
