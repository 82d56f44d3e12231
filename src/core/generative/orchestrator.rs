//! Video Job Orchestrator
//!
//! Drives a submitted video generation job to completion:
//!
//! ```text
//! SUBMITTING -> POLLING -> { SUCCEEDED, FAILED }
//! ```
//!
//! Submission yields a job handle (possibly already terminal). While the
//! handle is not done, each polling iteration emits one cosmetic progress
//! phrase, suspends for the fixed interval, and re-fetches the handle from
//! the remote. The loop has no iteration cap and no timeout; it ends only
//! when the remote reports completion, or when the caller fires the optional
//! cancellation channel.
//!
//! On success the orchestrator emits a final "fetching" notification,
//! downloads the referenced media, and resolves to an in-memory video.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info};

use super::providers::MediaProvider;
use super::video::{GeneratedVideo, VideoJobRequest};
use crate::core::{CoreError, CoreResult};

/// Fixed delay between status checks. Constant, not exponential.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Cosmetic status phrases, cycled one per polling iteration.
pub const PROGRESS_PHRASES: [&str; 6] = [
    "Warming up the digital director...",
    "Setting up the scene...",
    "Action! Cameras are rolling...",
    "Processing dailies...",
    "In the editing room, adding final touches...",
    "Rendering the final cut...",
];

/// Final notification emitted before the media download.
pub const FETCHING_RESULT_PHRASE: &str = "Fetching your masterpiece...";

/// Submits and polls video generation jobs against a media provider.
pub struct VideoJobOrchestrator {
    provider: Arc<dyn MediaProvider>,
}

impl VideoJobOrchestrator {
    pub fn new(provider: Arc<dyn MediaProvider>) -> Self {
        Self { provider }
    }

    /// Runs a job to remote-reported completion. Once submitted the job
    /// cannot be aborted through this form; see [`Self::run_with_cancel`].
    pub async fn run(
        &self,
        request: &VideoJobRequest,
        on_progress: impl FnMut(&str),
    ) -> CoreResult<GeneratedVideo> {
        self.drive(request, on_progress, None).await
    }

    /// Like [`Self::run`], but the poll loop also races a cancellation
    /// channel. Firing the sender abandons the loop with
    /// [`CoreError::Cancelled`]; the remote job itself is not contacted
    /// again and keeps running server-side. Dropping the sender without
    /// firing it leaves the loop to run to completion.
    pub async fn run_with_cancel(
        &self,
        request: &VideoJobRequest,
        on_progress: impl FnMut(&str),
        cancel: oneshot::Receiver<()>,
    ) -> CoreResult<GeneratedVideo> {
        self.drive(request, on_progress, Some(cancel)).await
    }

    async fn drive(
        &self,
        request: &VideoJobRequest,
        mut on_progress: impl FnMut(&str),
        mut cancel: Option<oneshot::Receiver<()>>,
    ) -> CoreResult<GeneratedVideo> {
        // SUBMITTING
        let mut job = self.provider.submit_video_job(request).await?;
        info!("Video job submitted: {}", job.name);

        // POLLING: one progress callback and one status check per iteration.
        let mut phrase = 0usize;
        while !job.done {
            on_progress(PROGRESS_PHRASES[phrase % PROGRESS_PHRASES.len()]);
            phrase += 1;

            match cancel.take() {
                Some(mut rx) => {
                    tokio::select! {
                        _ = tokio::time::sleep(POLL_INTERVAL) => {
                            cancel = Some(rx);
                        }
                        fired = &mut rx => {
                            if fired.is_ok() {
                                info!("Video job {} abandoned by caller", job.name);
                                return Err(CoreError::Cancelled);
                            }
                            // Cancel handle dropped without firing; fall back
                            // to plain polling.
                            tokio::time::sleep(POLL_INTERVAL).await;
                        }
                    }
                }
                None => tokio::time::sleep(POLL_INTERVAL).await,
            }

            job = self.provider.refresh_video_job(&job).await?;
            debug!("Video job {} polled: done={}", job.name, job.done);
        }

        // FAILED
        if let Some(error) = job.error {
            return Err(CoreError::VideoGenerationFailed(error.message));
        }

        // SUCCEEDED
        let uri = job.result_uri.ok_or(CoreError::MissingResultLink)?;
        on_progress(FETCHING_RESULT_PHRASE);
        let bytes = self.provider.fetch_result(&uri).await?;
        info!("Video job {} completed ({} bytes)", job.name, bytes.len());

        Ok(GeneratedVideo {
            bytes,
            mime_type: "video/mp4".to_string(),
            source_uri: uri,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::generative::image::{AspectRatio, ImageAsset};
    use crate::core::generative::providers::MockMediaProvider;
    use crate::core::generative::video::{VideoJob, VideoJobError};

    fn request() -> VideoJobRequest {
        VideoJobRequest::new(
            "a storm rolling over the hills",
            ImageAsset::new(vec![1, 1], "image/png"),
            ImageAsset::new(vec![2, 2], "image/png"),
            AspectRatio::Landscape,
        )
    }

    fn pending() -> VideoJob {
        VideoJob {
            name: "operations/test".to_string(),
            done: false,
            error: None,
            result_uri: None,
            submitted_at: 0,
        }
    }

    fn succeeded(uri: &str) -> VideoJob {
        VideoJob {
            result_uri: Some(uri.to_string()),
            done: true,
            ..pending()
        }
    }

    fn failed(message: &str) -> VideoJob {
        VideoJob {
            done: true,
            error: Some(VideoJobError {
                message: message.to_string(),
                code: None,
            }),
            ..pending()
        }
    }

    /// Status plan: N not-done observations, then done-with-result. The
    /// orchestrator must make exactly N+1 status calls and emit exactly N
    /// polling notifications (plus the final fetching one).
    #[tokio::test(start_paused = true)]
    async fn test_poll_loop_call_and_progress_counts() {
        const N: usize = 3;
        let mut plan: Vec<VideoJob> = (0..N).map(|_| pending()).collect();
        plan.push(succeeded("mock://video/out"));

        let provider = Arc::new(MockMediaProvider::new("mock").with_status_plan(plan));
        let orchestrator = VideoJobOrchestrator::new(provider.clone());

        let mut progress: Vec<String> = Vec::new();
        let video = orchestrator
            .run(&request(), |status| progress.push(status.to_string()))
            .await
            .unwrap();

        assert_eq!(provider.status_calls(), N + 1);
        assert_eq!(provider.call_count("submit_video_job"), 1);
        assert_eq!(provider.call_count("refresh_video_job"), N);

        assert_eq!(progress.len(), N + 1);
        assert_eq!(progress[..N], PROGRESS_PHRASES[..N]);
        assert_eq!(progress[N], FETCHING_RESULT_PHRASE);

        assert_eq!(video.bytes, MockMediaProvider::RESULT_BYTES);
        assert_eq!(video.source_uri, "mock://video/out");
        assert_eq!(video.mime_type, "video/mp4");
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_phrases_wrap_around() {
        const N: usize = 8;
        let mut plan: Vec<VideoJob> = (0..N).map(|_| pending()).collect();
        plan.push(succeeded("mock://video/out"));

        let provider = Arc::new(MockMediaProvider::new("mock").with_status_plan(plan));
        let orchestrator = VideoJobOrchestrator::new(provider);

        let mut progress: Vec<String> = Vec::new();
        orchestrator
            .run(&request(), |status| progress.push(status.to_string()))
            .await
            .unwrap();

        assert_eq!(progress[6], PROGRESS_PHRASES[0]);
        assert_eq!(progress[7], PROGRESS_PHRASES[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_already_done_at_submission() {
        let provider = Arc::new(
            MockMediaProvider::new("mock").with_status_plan(vec![succeeded("mock://fast")]),
        );
        let orchestrator = VideoJobOrchestrator::new(provider.clone());

        let mut progress: Vec<String> = Vec::new();
        let video = orchestrator
            .run(&request(), |status| progress.push(status.to_string()))
            .await
            .unwrap();

        // No polling happened, only the fetching notification.
        assert_eq!(provider.status_calls(), 1);
        assert_eq!(progress, vec![FETCHING_RESULT_PHRASE.to_string()]);
        assert_eq!(video.source_uri, "mock://fast");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_surfaces_remote_message_without_download() {
        let provider = Arc::new(
            MockMediaProvider::new("mock")
                .with_status_plan(vec![pending(), failed("quota exceeded")]),
        );
        let orchestrator = VideoJobOrchestrator::new(provider.clone());

        let result = orchestrator.run(&request(), |_| {}).await;
        match result {
            Err(CoreError::VideoGenerationFailed(message)) => {
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("Expected VideoGenerationFailed, got {:?}", other),
        }
        assert_eq!(provider.call_count("fetch_result"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_completion_without_result_link() {
        let done_without_result = VideoJob {
            done: true,
            ..pending()
        };
        let provider =
            Arc::new(MockMediaProvider::new("mock").with_status_plan(vec![done_without_result]));
        let orchestrator = VideoJobOrchestrator::new(provider.clone());

        let result = orchestrator.run(&request(), |_| {}).await;
        assert!(matches!(result, Err(CoreError::MissingResultLink)));
        assert_eq!(provider.call_count("fetch_result"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_abandons_poll_loop() {
        let plan: Vec<VideoJob> = (0..32).map(|_| pending()).collect();
        let provider = Arc::new(MockMediaProvider::new("mock").with_status_plan(plan));
        let orchestrator = VideoJobOrchestrator::new(provider.clone());

        let (tx, rx) = oneshot::channel();
        tx.send(()).expect("receiver alive");

        let result = orchestrator.run_with_cancel(&request(), |_| {}, rx).await;
        assert!(matches!(result, Err(CoreError::Cancelled)));

        // Only the submission reached the remote; no further status checks
        // and no download.
        assert_eq!(provider.status_calls(), 1);
        assert_eq!(provider.call_count("fetch_result"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_cancel_handle_does_not_cancel() {
        let provider = Arc::new(
            MockMediaProvider::new("mock")
                .with_status_plan(vec![pending(), succeeded("mock://video/out")]),
        );
        let orchestrator = VideoJobOrchestrator::new(provider.clone());

        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);

        let video = orchestrator
            .run_with_cancel(&request(), |_| {}, rx)
            .await
            .unwrap();
        assert_eq!(video.bytes, MockMediaProvider::RESULT_BYTES);
        assert_eq!(provider.status_calls(), 2);
    }
}
