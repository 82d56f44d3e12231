//! Video Generation Types
//!
//! Request and job-handle types for the long-running video generation
//! operation. A job is seeded with two keyframes and polled to completion by
//! the orchestrator; the handle is owned by exactly one poll loop and mutated
//! only by re-fetching its remote status.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::image::{AspectRatio, ImageAsset};

/// Resolution tier requested for every video job.
pub const VIDEO_RESOLUTION: &str = "720p";

/// Number of output videos requested per job.
pub const VIDEO_SAMPLE_COUNT: u32 = 1;

// =============================================================================
// Request
// =============================================================================

/// Parameters for a keyframe-conditioned video generation job.
#[derive(Debug, Clone)]
pub struct VideoJobRequest {
    /// Scene description driving the generation.
    pub prompt: String,
    /// Starting keyframe.
    pub start_frame: ImageAsset,
    /// Ending keyframe, used for end-frame conditioning.
    pub end_frame: ImageAsset,
    /// Output aspect ratio; must be one of the video-capable ratios.
    pub aspect_ratio: AspectRatio,
}

impl VideoJobRequest {
    pub fn new(
        prompt: impl Into<String>,
        start_frame: ImageAsset,
        end_frame: ImageAsset,
        aspect_ratio: AspectRatio,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            start_frame,
            end_frame,
            aspect_ratio,
        }
    }

    /// Validates the request before submission.
    pub fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("Prompt cannot be empty".to_string());
        }
        if !self.aspect_ratio.supports_video() {
            return Err(format!(
                "Aspect ratio {} is not supported for video. Valid: 16:9, 9:16",
                self.aspect_ratio
            ));
        }
        if self.start_frame.bytes.is_empty() {
            return Err("Start frame is empty".to_string());
        }
        if self.end_frame.bytes.is_empty() {
            return Err("End frame is empty".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Job Handle
// =============================================================================

/// Error payload reported by a failed remote job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoJobError {
    /// Remote-provided message, surfaced to the user verbatim.
    pub message: String,
    /// Remote-provided error code, when present.
    pub code: Option<i32>,
}

/// Handle for a remote long-running video generation operation.
///
/// The handle's fields reflect the last status fetch. A result URI is present
/// only when `done` is true and `error` is absent.
#[derive(Debug, Clone)]
pub struct VideoJob {
    /// Remote operation name, used for status re-fetches.
    pub name: String,
    /// Completion flag; terminal once true (success or error).
    pub done: bool,
    /// Error payload for a failed job.
    pub error: Option<VideoJobError>,
    /// Fetchable reference to the generated media.
    pub result_uri: Option<String>,
    /// Unix timestamp of submission.
    pub submitted_at: i64,
}

impl VideoJob {
    /// Whether the remote reported a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.done
    }

    /// Whether the remote reported failure.
    pub fn has_failed(&self) -> bool {
        self.done && self.error.is_some()
    }
}

// =============================================================================
// Result
// =============================================================================

/// Downloaded video media, addressable by the caller without further network
/// access.
#[derive(Clone)]
pub struct GeneratedVideo {
    /// Raw media bytes.
    pub bytes: Vec<u8>,
    /// MIME type of the payload.
    pub mime_type: String,
    /// The remote URI the bytes were fetched from (without credentials).
    pub source_uri: String,
}

impl fmt::Debug for GeneratedVideo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedVideo")
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .field("mime_type", &self.mime_type)
            .field("source_uri", &self.source_uri)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
