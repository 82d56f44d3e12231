//! End-to-end workflow tests
//!
//! Exercises the full generate-from-prompt video workflow against the
//! scriptable provider: keyframe pipeline, job submission, poll loop, and
//! final media resolution, checking that every stage receives exactly the
//! arguments the previous stage produced.

use std::sync::Arc;

use crate::core::generative::image::AspectRatio;
use crate::core::generative::orchestrator::{VideoJobOrchestrator, FETCHING_RESULT_PHRASE};
use crate::core::generative::pipeline::FramePipeline;
use crate::core::generative::providers::{MockCall, MockMediaProvider};
use crate::core::generative::video::{VideoJob, VideoJobRequest};
use crate::core::session::SessionStore;

fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[tokio::test(start_paused = true)]
async fn test_generate_from_prompt_video_workflow() {
    init_test_logging();

    const SCENE: &str = "a red bicycle on a beach";
    let ratio = AspectRatio::Landscape;

    let pending = VideoJob {
        name: "operations/e2e".to_string(),
        done: false,
        error: None,
        result_uri: None,
        submitted_at: 0,
    };
    let done = VideoJob {
        done: true,
        result_uri: Some("mock://video/e2e".to_string()),
        ..pending.clone()
    };

    let provider = Arc::new(
        MockMediaProvider::new("mock").with_status_plan(vec![pending.clone(), pending, done]),
    );

    // Keyframe pair, then the job seeded with it.
    let pipeline = FramePipeline::new(provider.clone());
    let pair = pipeline.generate(SCENE, ratio).await.unwrap();

    let request = VideoJobRequest::new(SCENE, pair.start.clone(), pair.end.clone(), ratio);
    assert!(request.validate().is_ok());

    let orchestrator = VideoJobOrchestrator::new(provider.clone());
    let mut progress: Vec<String> = Vec::new();
    let video = orchestrator
        .run(&request, |status| progress.push(status.to_string()))
        .await
        .unwrap();

    assert!(!video.bytes.is_empty());
    assert_eq!(video.source_uri, "mock://video/e2e");
    assert_eq!(progress.last().map(String::as_str), Some(FETCHING_RESULT_PHRASE));

    // The recorded call sequence ties the stages together.
    let calls = provider.calls();
    let ops: Vec<&str> = calls.iter().map(|c| c.op()).collect();
    assert_eq!(
        ops,
        vec![
            "generate_image",
            "edit_image",
            "submit_video_job",
            "refresh_video_job",
            "refresh_video_job",
            "fetch_result",
        ]
    );

    match &calls[0] {
        MockCall::GenerateImage {
            prompt,
            aspect_ratio,
        } => {
            assert_eq!(prompt, SCENE);
            assert_eq!(*aspect_ratio, ratio);
        }
        other => panic!("Expected GenerateImage, got {:?}", other),
    }

    match &calls[1] {
        MockCall::EditImage {
            instruction,
            source_bytes,
            ..
        } => {
            assert!(instruction.contains(SCENE));
            assert_eq!(source_bytes, &pair.start.bytes);
        }
        other => panic!("Expected EditImage, got {:?}", other),
    }

    match &calls[2] {
        MockCall::SubmitVideoJob {
            prompt,
            start_bytes,
            end_bytes,
            aspect_ratio,
        } => {
            assert_eq!(prompt, SCENE);
            assert_eq!(start_bytes, &pair.start.bytes);
            assert_eq!(end_bytes, &pair.end.bytes);
            assert_eq!(*aspect_ratio, ratio);
        }
        other => panic!("Expected SubmitVideoJob, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_workflow_results_promote_into_session_store() {
    init_test_logging();

    const SCENE: &str = "lanterns drifting over a midnight lake";
    let provider = Arc::new(MockMediaProvider::new("mock"));
    let pipeline = FramePipeline::new(provider.clone());

    let pair = pipeline
        .generate(SCENE, AspectRatio::Portrait)
        .await
        .unwrap();

    let mut store = SessionStore::new();
    store.save_prompt(SCENE);
    store.save_prompt(SCENE);
    store.save_image(pair.start.bytes.clone(), pair.start.mime_type.clone(), None);
    store.save_image(pair.end.bytes.clone(), pair.end.mime_type.clone(), None);
    // Saving the start frame again is a no-op.
    store.save_image(pair.start.bytes.clone(), pair.start.mime_type.clone(), None);

    assert_eq!(store.prompts(), &[SCENE.to_string()]);
    assert_eq!(store.images().len(), 2);
    assert_eq!(store.images()[0].bytes, pair.end.bytes);
    assert_eq!(store.images()[1].bytes, pair.start.bytes);
}
