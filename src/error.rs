//! Error types for the mask editor

use thiserror::Error;

/// Result type alias for editor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Notice shown to the user when a selected file is not an image.
pub const INVALID_FILE_NOTICE: &str = "Please upload a valid image file.";

/// Errors that can occur while editing and submitting a mask
#[derive(Error, Debug)]
pub enum Error {
    /// Selected file does not declare an `image/*` media type
    #[error("Please upload a valid image file. (got {0:?})")]
    InvalidFileType(String),

    /// Failed to read a selected file
    #[error("Failed to read file: {0}")]
    ReadError(String),

    /// A data URL has no payload after its comma delimiter
    #[error("Data URL has no payload: {0}")]
    MissingPayload(String),

    /// Base64 or image decoding failed
    #[error("Decoding failed: {0}")]
    DecodeError(String),

    /// Failed to rasterize or encode an image
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Transport-level failure talking to the upload endpoint
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The endpoint answered with a non-success status
    #[error("Upload rejected with HTTP status {status}")]
    UploadRejected { status: u16 },

    /// The endpoint answered 2xx but the body was not the expected shape
    #[error("Malformed upload response: {0}")]
    MalformedResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::DecodeError(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Decoding(e) => Error::DecodeError(e.to_string()),
            other => Error::RenderError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_file_message_carries_notice() {
        let e = Error::InvalidFileType("text/plain".into());
        assert!(e.to_string().starts_with(INVALID_FILE_NOTICE));
    }

    #[test]
    fn rejected_status_is_reported() {
        let e = Error::UploadRejected { status: 502 };
        assert_eq!(e.to_string(), "Upload rejected with HTTP status 502");
    }
}
