use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Anything that goes wrong with an individual file is recorded
/// as a [`SkipRecord`](crate::SkipRecord) instead and never surfaces here.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Root does not exist: {0}")]
    RootNotFound(PathBuf),
    #[error("Root is not a directory: {0}")]
    RootNotDirectory(PathBuf),
    #[error("Cannot write output {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BundleError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BundleError::Output {
            path: path.into(),
            source,
        }
    }
}
