//! Creative Suite Error Definitions
//!
//! Defines error types used throughout the crate.

use thiserror::Error;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Credential Errors
    // =========================================================================
    #[error("No API credential configured")]
    MissingCredential,

    // =========================================================================
    // Generation Errors
    // =========================================================================
    #[error("Image generation returned no images")]
    GenerationEmpty,

    #[error("No image data found in model response")]
    NoImageInResponse,

    #[error("Video generation failed: {0}")]
    VideoGenerationFailed(String),

    #[error("Video generation completed but no download link was found")]
    MissingResultLink,

    #[error("Failed to download video: {0}")]
    DownloadFailed(String),

    #[error("Video generation cancelled")]
    Cancelled,

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Convert to a user-facing message the workflow layer can display
    pub fn to_display_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CoreError::MissingCredential.to_string(),
            "No API credential configured"
        );
        assert_eq!(
            CoreError::VideoGenerationFailed("quota exceeded".to_string()).to_string(),
            "Video generation failed: quota exceeded"
        );
        assert_eq!(
            CoreError::DownloadFailed("403 Forbidden".to_string()).to_string(),
            "Failed to download video: 403 Forbidden"
        );
    }

    #[test]
    fn test_display_message_matches_display() {
        let err = CoreError::MissingResultLink;
        assert_eq!(err.to_display_message(), err.to_string());
    }
}
