//! Generative Media Integration
//!
//! Client and workflow layer for the hosted generative-media API.
//! Covers image generation and editing, prompt enhancement, the two-stage
//! keyframe pipeline, and the long-running video job orchestrator.

pub mod enhance;
pub mod image;
pub mod orchestrator;
pub mod pipeline;
pub mod provider_impls;
pub mod providers;
pub mod video;

// Re-export main types
pub use enhance::EnhancementTarget;
pub use image::{AspectRatio, ImageAsset};
pub use orchestrator::{VideoJobOrchestrator, POLL_INTERVAL, PROGRESS_PHRASES};
pub use pipeline::{FramePipeline, KeyframePair};
pub use provider_impls::GeminiMediaProvider;
pub use providers::{MediaProvider, MockMediaProvider};
pub use video::{GeneratedVideo, VideoJob, VideoJobError, VideoJobRequest};
