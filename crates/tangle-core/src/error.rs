use std::path::PathBuf;

use thiserror::Error;

/// Failure while indexing artifacts. Any of these aborts the whole scan.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("artifact path does not exist: {0}")]
    MissingPath(PathBuf),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed class file {path}: {reason}")]
    MalformedClass { path: PathBuf, reason: String },

    #[error("unsupported artifact {0}: expected a class directory, .class file, .jar/.zip archive or .json registry")]
    UnsupportedArtifact(PathBuf),

    #[error("invalid class registry {path}")]
    Registry {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ScanError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
