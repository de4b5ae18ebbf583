//! Error types shared by every infragraph crate

use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions. Any of these aborts graph generation; callers never
/// receive a partial graph alongside an error.
#[derive(Error, Debug)]
pub enum Error {
    /// The state `version` is missing, not a number, or not one we can read.
    #[error("invalid state file version: {0}")]
    InvalidStateVersion(String),

    /// A resource has no usable identity (empty address, or a state
    /// instance without an `id` attribute).
    #[error("invalid state file: missing resource ID for {address:?}")]
    InvalidResourceIdentity { address: String },

    /// The state document is not JSON or lacks its top-level shape.
    #[error("invalid state file: {0}")]
    InvalidStateFile(#[from] serde_json::Error),

    /// An HCL file could not be parsed.
    #[error("failed to parse HCL {}: {message}", path.display())]
    Hcl { path: PathBuf, message: String },

    /// Reading configuration sources failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn missing_identity(address: impl Into<String>) -> Self {
        Error::InvalidResourceIdentity {
            address: address.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
