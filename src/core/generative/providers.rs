//! Media Provider Abstraction
//!
//! The contract every remote generative-media backend implements, plus a
//! scriptable in-memory provider used by tests. All operations require a
//! resolvable credential and fail with [`CoreError::MissingCredential`]
//! before any network activity when none is configured; none of them retry
//! automatically.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::enhance::EnhancementTarget;
use super::image::{AspectRatio, ImageAsset};
use super::video::{VideoJob, VideoJobRequest};
use crate::core::{CoreError, CoreResult};

/// Instruction sent for the end-frame derivation, conditioned on the start
/// frame and the unchanged scene description.
pub fn end_frame_instruction(scene: &str) -> String {
    format!(
        "Based on the provided image and the description \"{}\", generate a logical \
final frame for a short video. The generated image should represent the end of the \
story or action.",
        scene
    )
}

// =============================================================================
// MediaProvider Trait
// =============================================================================

/// Trait for generative media backends.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Returns the provider name
    fn name(&self) -> &str;

    /// Checks if the provider is configured (a credential resolves)
    fn is_available(&self) -> bool;

    /// Performs a lightweight connectivity/auth check.
    ///
    /// Cheap by contract (no generation), and must not leak secrets in error
    /// messages.
    async fn health_check(&self) -> CoreResult<()> {
        Ok(())
    }

    /// Generates one image from a text prompt.
    ///
    /// Fails with [`CoreError::GenerationEmpty`] when the remote call
    /// succeeds but returns zero results.
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> CoreResult<ImageAsset>;

    /// Edits an image according to an instruction, as a single multi-part
    /// request (inline image + text).
    ///
    /// Fails with [`CoreError::NoImageInResponse`] when no image part is
    /// found among the returned parts.
    async fn edit_image(&self, instruction: &str, source: &ImageAsset) -> CoreResult<ImageAsset>;

    /// Derives the ending keyframe for a scene, conditioned on the starting
    /// keyframe. A specialization of [`Self::edit_image`] with a fixed
    /// instruction template, not a distinct remote capability.
    async fn derive_end_frame(
        &self,
        scene: &str,
        start_frame: &ImageAsset,
    ) -> CoreResult<ImageAsset> {
        self.edit_image(&end_frame_instruction(scene), start_frame)
            .await
    }

    /// Rewrites a rough idea into a polished prompt via a single-turn
    /// exchange; no conversation state is retained.
    async fn enhance_prompt(&self, idea: &str, target: EnhancementTarget) -> CoreResult<String>;

    /// Generates a self-contained single-file web app from a description.
    async fn generate_app(&self, description: &str) -> CoreResult<String>;

    /// Submits a long-running video generation job seeded by two keyframes.
    async fn submit_video_job(&self, request: &VideoJobRequest) -> CoreResult<VideoJob>;

    /// Re-fetches the current status of a submitted job.
    async fn refresh_video_job(&self, job: &VideoJob) -> CoreResult<VideoJob>;

    /// Downloads the media referenced by a completed job's result URI.
    ///
    /// Fails with [`CoreError::DownloadFailed`] on a non-success transport
    /// status.
    async fn fetch_result(&self, uri: &str) -> CoreResult<Vec<u8>>;
}

// =============================================================================
// Mock Provider for Testing
// =============================================================================

/// One recorded call against [`MockMediaProvider`], with the arguments the
/// caller actually passed.
#[derive(Debug, Clone)]
pub enum MockCall {
    GenerateImage {
        prompt: String,
        aspect_ratio: AspectRatio,
    },
    EditImage {
        instruction: String,
        source_bytes: Vec<u8>,
        source_mime: String,
    },
    EnhancePrompt {
        idea: String,
        target: EnhancementTarget,
    },
    GenerateApp {
        description: String,
    },
    SubmitVideoJob {
        prompt: String,
        start_bytes: Vec<u8>,
        end_bytes: Vec<u8>,
        aspect_ratio: AspectRatio,
    },
    RefreshVideoJob {
        name: String,
    },
    FetchResult {
        uri: String,
    },
    HealthCheck,
}

impl MockCall {
    /// Short operation name, for counting.
    pub fn op(&self) -> &'static str {
        match self {
            MockCall::GenerateImage { .. } => "generate_image",
            MockCall::EditImage { .. } => "edit_image",
            MockCall::EnhancePrompt { .. } => "enhance_prompt",
            MockCall::GenerateApp { .. } => "generate_app",
            MockCall::SubmitVideoJob { .. } => "submit_video_job",
            MockCall::RefreshVideoJob { .. } => "refresh_video_job",
            MockCall::FetchResult { .. } => "fetch_result",
            MockCall::HealthCheck => "health_check",
        }
    }
}

/// In-memory provider that records every call and serves canned responses.
///
/// Video status fetches are scripted: submission consumes the first entry of
/// the status plan and every refresh consumes the next, so a plan of N
/// not-done entries followed by a done entry exercises exactly N+1 status
/// observations. An exhausted (or absent) plan reports completion with a
/// default result URI.
pub struct MockMediaProvider {
    name: String,
    available: bool,
    calls: Mutex<Vec<MockCall>>,
    status_plan: Mutex<VecDeque<VideoJob>>,
    fail_edits: AtomicUsize,
}

impl MockMediaProvider {
    /// Default result URI reported when the status plan is exhausted.
    pub const DEFAULT_RESULT_URI: &'static str = "mock://video/result";

    /// Media bytes served for every fetch.
    pub const RESULT_BYTES: &'static [u8] = b"mock-video-bytes";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available: true,
            calls: Mutex::new(Vec::new()),
            status_plan: Mutex::new(VecDeque::new()),
            fail_edits: AtomicUsize::new(0),
        }
    }

    /// Sets availability
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Scripts the sequence of job states served to submit/refresh calls.
    pub fn with_status_plan(self, plan: Vec<VideoJob>) -> Self {
        *self.lock_plan() = plan.into();
        self
    }

    /// Makes the next `count` edit calls fail with `NoImageInResponse`.
    pub fn with_edit_failures(self, count: usize) -> Self {
        self.fail_edits.store(count, Ordering::SeqCst);
        self
    }

    /// Snapshot of every recorded call, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock_calls().clone()
    }

    /// Number of recorded calls for one operation.
    pub fn call_count(&self, op: &str) -> usize {
        self.lock_calls().iter().filter(|c| c.op() == op).count()
    }

    /// Number of status observations served (submission + refreshes).
    pub fn status_calls(&self) -> usize {
        self.call_count("submit_video_job") + self.call_count("refresh_video_job")
    }

    fn record(&self, call: MockCall) {
        self.lock_calls().push(call);
    }

    fn next_status(&self, fallback_name: &str) -> VideoJob {
        self.lock_plan().pop_front().unwrap_or(VideoJob {
            name: fallback_name.to_string(),
            done: true,
            error: None,
            result_uri: Some(Self::DEFAULT_RESULT_URI.to_string()),
            submitted_at: 0,
        })
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<MockCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_plan(&self) -> std::sync::MutexGuard<'_, VecDeque<VideoJob>> {
        self.status_plan.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MediaProvider for MockMediaProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn health_check(&self) -> CoreResult<()> {
        self.record(MockCall::HealthCheck);
        if self.available {
            Ok(())
        } else {
            Err(CoreError::MissingCredential)
        }
    }

    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> CoreResult<ImageAsset> {
        self.record(MockCall::GenerateImage {
            prompt: prompt.to_string(),
            aspect_ratio,
        });
        Ok(ImageAsset::new(
            format!("start:{}", prompt).into_bytes(),
            "image/png",
        ))
    }

    async fn edit_image(&self, instruction: &str, source: &ImageAsset) -> CoreResult<ImageAsset> {
        self.record(MockCall::EditImage {
            instruction: instruction.to_string(),
            source_bytes: source.bytes.clone(),
            source_mime: source.mime_type.clone(),
        });

        let remaining = self.fail_edits.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_edits.store(remaining - 1, Ordering::SeqCst);
            return Err(CoreError::NoImageInResponse);
        }

        let mut bytes = b"edited:".to_vec();
        bytes.extend_from_slice(&source.bytes);
        Ok(ImageAsset::new(bytes, source.mime_type.clone()))
    }

    async fn enhance_prompt(&self, idea: &str, target: EnhancementTarget) -> CoreResult<String> {
        self.record(MockCall::EnhancePrompt {
            idea: idea.to_string(),
            target,
        });
        Ok(format!("Enhanced {} prompt: {}", target, idea))
    }

    async fn generate_app(&self, description: &str) -> CoreResult<String> {
        self.record(MockCall::GenerateApp {
            description: description.to_string(),
        });
        Ok("<!DOCTYPE html><html><body></body></html>".to_string())
    }

    async fn submit_video_job(&self, request: &VideoJobRequest) -> CoreResult<VideoJob> {
        self.record(MockCall::SubmitVideoJob {
            prompt: request.prompt.clone(),
            start_bytes: request.start_frame.bytes.clone(),
            end_bytes: request.end_frame.bytes.clone(),
            aspect_ratio: request.aspect_ratio,
        });
        Ok(self.next_status("operations/mock"))
    }

    async fn refresh_video_job(&self, job: &VideoJob) -> CoreResult<VideoJob> {
        self.record(MockCall::RefreshVideoJob {
            name: job.name.clone(),
        });
        Ok(self.next_status(&job.name))
    }

    async fn fetch_result(&self, uri: &str) -> CoreResult<Vec<u8>> {
        self.record(MockCall::FetchResult {
            uri: uri.to_string(),
        });
        Ok(Self::RESULT_BYTES.to_vec())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_frame_instruction_embeds_scene_verbatim() {
        let instruction = end_frame_instruction("a red bicycle on a beach");
        assert!(instruction.contains("\"a red bicycle on a beach\""));
        assert!(instruction.starts_with("Based on the provided image"));
        assert!(instruction.contains("end of the story or action"));
    }

    #[tokio::test]
    async fn test_mock_records_calls_in_order() {
        let provider = MockMediaProvider::new("mock");

        provider
            .generate_image("a cat", AspectRatio::Square)
            .await
            .unwrap();
        provider
            .enhance_prompt("a cat", EnhancementTarget::Image)
            .await
            .unwrap();

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].op(), "generate_image");
        assert_eq!(calls[1].op(), "enhance_prompt");
        assert_eq!(provider.call_count("generate_image"), 1);
        assert_eq!(provider.call_count("fetch_result"), 0);
    }

    #[tokio::test]
    async fn test_mock_derive_end_frame_routes_through_edit() {
        let provider = MockMediaProvider::new("mock");
        let start = ImageAsset::new(vec![1, 2, 3], "image/png");

        let end = provider.derive_end_frame("scene", &start).await.unwrap();

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            MockCall::EditImage {
                instruction,
                source_bytes,
                ..
            } => {
                assert_eq!(instruction, &end_frame_instruction("scene"));
                assert_eq!(source_bytes, &vec![1, 2, 3]);
            }
            other => panic!("Expected EditImage call, got {:?}", other),
        }
        assert!(end.bytes.starts_with(b"edited:"));
    }

    #[tokio::test]
    async fn test_mock_edit_failure_injection() {
        let start = ImageAsset::new(vec![7], "image/png");
        let provider = MockMediaProvider::new("mock").with_edit_failures(1);

        let first = provider.edit_image("instr", &start).await;
        assert!(matches!(first, Err(CoreError::NoImageInResponse)));

        let second = provider.edit_image("instr", &start).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_mock_status_plan_consumed_in_order() {
        let pending = VideoJob {
            name: "operations/a".to_string(),
            done: false,
            error: None,
            result_uri: None,
            submitted_at: 0,
        };
        let done = VideoJob {
            name: "operations/a".to_string(),
            done: true,
            error: None,
            result_uri: Some("mock://done".to_string()),
            submitted_at: 0,
        };
        let provider =
            MockMediaProvider::new("mock").with_status_plan(vec![pending.clone(), done]);

        let request = VideoJobRequest::new(
            "scene",
            ImageAsset::new(vec![1], "image/png"),
            ImageAsset::new(vec![2], "image/png"),
            AspectRatio::Landscape,
        );

        let submitted = provider.submit_video_job(&request).await.unwrap();
        assert!(!submitted.done);

        let refreshed = provider.refresh_video_job(&submitted).await.unwrap();
        assert!(refreshed.done);
        assert_eq!(refreshed.result_uri.as_deref(), Some("mock://done"));

        // Plan exhausted: defaults to a completed job.
        let after = provider.refresh_video_job(&refreshed).await.unwrap();
        assert_eq!(
            after.result_uri.as_deref(),
            Some(MockMediaProvider::DEFAULT_RESULT_URI)
        );
        assert_eq!(provider.status_calls(), 3);
    }
}
