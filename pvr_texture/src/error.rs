//! Error types for the PVR texture pipeline
//!
//! This module defines the error types used throughout the crate,
//! covering container parsing, block decompression and native upload.

use thiserror::Error as ThisError;

/// Result type for texture pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Texture pipeline errors
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// Signature mismatch: the stream is not in the expected container format
    #[error("Format error: {0}")]
    Format(String),

    /// Header internally inconsistent, or the stream is truncated
    #[error("Corrupt data: {0}")]
    CorruptData(String),

    /// Recognised format with a sub-mode that is not implemented
    #[error("Unsupported variant: {0}")]
    UnsupportedVariant(String),

    /// Mip level, face or array layer outside the texture
    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    /// Block decompressor could not decode its input
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// Backend could not allocate the native resource
    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    /// Backend rejected a sub-resource write
    #[error("Upload failure: {0}")]
    UploadFailure(String),

    /// Backend context could not be created
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Stream failure other than end-of-file
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                Error::CorruptData(format!("Stream ended early: {}", error))
            }
            _ => Error::Io(error.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
