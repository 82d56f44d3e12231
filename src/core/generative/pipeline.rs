//! Keyframe Pipeline
//!
//! Strictly sequential two-stage derivation of the keyframe pair a video job
//! needs: generate a starting image from the scene description, then derive
//! an ending image conditioned on the starting image and the same scene text.
//!
//! The dependency is enforced by the signatures: the second stage takes the
//! first stage's output by reference, so it cannot begin without it. A
//! stage-two failure never rolls back the already-produced starting frame;
//! callers using the two-step form may keep it and retry only the derivation.

use std::sync::Arc;

use tracing::debug;

use super::image::{AspectRatio, ImageAsset};
use super::providers::MediaProvider;
use crate::core::CoreResult;

/// The two keyframes seeding a video generation job.
#[derive(Debug, Clone)]
pub struct KeyframePair {
    pub start: ImageAsset,
    pub end: ImageAsset,
}

/// Runs the two-stage keyframe derivation against a media provider.
pub struct FramePipeline {
    provider: Arc<dyn MediaProvider>,
}

impl FramePipeline {
    pub fn new(provider: Arc<dyn MediaProvider>) -> Self {
        Self { provider }
    }

    /// Stage one: generate the starting keyframe from the scene description.
    pub async fn start_frame(
        &self,
        scene: &str,
        aspect_ratio: AspectRatio,
    ) -> CoreResult<ImageAsset> {
        debug!("Generating starting keyframe");
        self.provider.generate_image(scene, aspect_ratio).await
    }

    /// Stage two: derive the ending keyframe from the starting keyframe and
    /// the unchanged scene description.
    pub async fn end_frame(&self, scene: &str, start: &ImageAsset) -> CoreResult<ImageAsset> {
        debug!("Deriving ending keyframe");
        self.provider.derive_end_frame(scene, start).await
    }

    /// Runs both stages in order and returns the pair.
    pub async fn generate(
        &self,
        scene: &str,
        aspect_ratio: AspectRatio,
    ) -> CoreResult<KeyframePair> {
        let start = self.start_frame(scene, aspect_ratio).await?;
        let end = self.end_frame(scene, &start).await?;
        Ok(KeyframePair { start, end })
    }
}

// =============================================================================
// Tests
// =============================================================================
