//! Error type shared by the resolver, the dataset facade and chain traversal.

use std::io;
use thiserror::Error;

/// Failure of a single resolution, read, write or traversal call.
///
/// Codec messages are carried verbatim in [`WconError::Io`] so the original
/// diagnostics reach the top-level caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WconError {
    /// The caller's arguments do not describe the file being processed,
    /// e.g. a self fragment that is not a suffix of the path.
    #[error("{0}")]
    Argument(String),

    /// The codec reported a failure while reading or writing.
    #[error("{0}")]
    Io(String),

    /// A chain walk revisited a file or grew past its configured limit.
    #[error("{0}")]
    Chain(String),
}

pub type Result<T> = std::result::Result<T, WconError>;

impl From<WconError> for io::Error {
    fn from(err: WconError) -> Self {
        let kind = match err {
            WconError::Argument(_) => io::ErrorKind::InvalidInput,
            WconError::Io(_) => io::ErrorKind::Other,
            WconError::Chain(_) => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}
