//! Error types for pdf-outline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdf-outline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting an outline.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file does not start with a PDF header.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF header carries a version string we cannot interpret.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The PDF could not be opened or its content could not be decoded.
    #[error("Document unreadable: {0}")]
    DocumentUnreadable(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// A text span carries unusable font or position data.
    #[error("Malformed span on page {page}: {reason}")]
    MalformedSpan {
        /// Page the span was found on (as reported, may itself be invalid)
        page: u32,
        /// What was wrong with it
        reason: String,
    },

    /// A configuration value was rejected.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Error serializing a result.
    #[error("Rendering error: {0}")]
    Render(String),

    /// An input or output directory cannot be used.
    #[error("Invalid directory {}: {reason}", path.display())]
    InvalidDirectory {
        /// The offending path
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },
}

impl Error {
    /// Whether this error concerns a single document rather than the environment.
    ///
    /// Document-level failures skip that document; everything else aborts a batch.
    pub fn is_document_failure(&self) -> bool {
        matches!(
            self,
            Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::DocumentUnreadable(_)
                | Error::Encrypted
                | Error::MalformedSpan { .. }
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::DocumentUnreadable(err.to_string()),
        }
    }
}
