//! User-facing error kinds.
//!
//! Every variant ends up as the single visible message in the error banner.

/// Message used when the endpoint rejects a request without a usable `detail`.
pub const GENERIC_FAILURE: &str = "Failed to get caption.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewerError {
    /// The picked file does not declare an `image/*` type, or nothing was picked.
    #[error("Please select a valid image file (PNG, JPG, GIF).")]
    InvalidFileType,

    #[error("Please select an image first.")]
    NoFileSelected,

    /// Non-success status; carries the server's `detail` or [`GENERIC_FAILURE`].
    #[error("Error: {0}")]
    ServerRejected(String),

    /// The request could not complete or the response could not be read.
    #[error("Error: {0}")]
    Transport(String),
}

impl ViewerError {
    /// Builds a [`ViewerError::ServerRejected`] from an optional server detail.
    pub fn rejected(detail: Option<String>) -> Self {
        let message = detail
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        ViewerError::ServerRejected(message)
    }
}

impl From<reqwest::Error> for ViewerError {
    fn from(err: reqwest::Error) -> Self {
        ViewerError::Transport(err.to_string())
    }
}
