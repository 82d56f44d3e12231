//! Gemini Media Provider
//!
//! Adapter for the Google generative-language REST API family: Imagen for
//! image generation (`:predict`), Gemini image models for editing and frame
//! derivation (`:generateContent` with inline image parts), Gemini text
//! models for the single-turn prompt/app exchanges, and Veo for long-running
//! video generation (`:predictLongRunning` plus operation polling).
//!
//! The credential chain is re-resolved on every call, so a key entered or
//! changed mid-session is picked up by the very next request. No operation
//! retries automatically.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::credentials::{Credential, CredentialChain};
use crate::core::generative::enhance::{EnhancementTarget, APP_BUILDER_INSTRUCTION};
use crate::core::generative::image::{AspectRatio, ImageAsset};
use crate::core::generative::providers::MediaProvider;
use crate::core::generative::video::{
    VideoJob, VideoJobError, VideoJobRequest, VIDEO_RESOLUTION, VIDEO_SAMPLE_COUNT,
};
use crate::core::{CoreError, CoreResult};

// =============================================================================
// Constants
// =============================================================================

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for text-to-image generation
const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

/// Default model for image editing and frame derivation
const DEFAULT_EDIT_MODEL: &str = "gemini-2.5-flash-image";

/// Default model for the single-turn text exchanges
const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Default model for video generation
const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";

/// Request timeout; video submissions and media downloads can be slow
const REQUEST_TIMEOUT_SECS: u64 = 180;

// =============================================================================
// API Request/Response Types
// =============================================================================

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<ImageInstance>,
    parameters: ImageParameters,
}

#[derive(Debug, Serialize)]
struct ImageInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageParameters {
    sample_count: u32,
    aspect_ratio: String,
    output_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoSubmitRequest {
    instances: Vec<VideoInstance>,
    parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoInstance {
    prompt: String,
    image: ImagePayload,
    last_frame: ImagePayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagePayload {
    bytes_base64_encoded: String,
    mime_type: String,
}

impl ImagePayload {
    fn from_asset(asset: &ImageAsset) -> Self {
        Self {
            bytes_base64_encoded: asset.to_base64(),
            mime_type: asset.mime_type.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoParameters {
    sample_count: u32,
    resolution: String,
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationError>,
    #[serde(default)]
    response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    #[serde(default)]
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

// =============================================================================
// GeminiMediaProvider
// =============================================================================

/// Media provider backed by the hosted Gemini/Imagen/Veo REST API.
pub struct GeminiMediaProvider {
    /// HTTP connection pool, shared across calls
    http: reqwest::Client,
    /// Credential origins, re-resolved per call
    credentials: CredentialChain,
    /// Base URL for all API requests
    base_url: String,
    image_model: String,
    edit_model: String,
    text_model: String,
    video_model: String,
}

impl std::fmt::Debug for GeminiMediaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiMediaProvider")
            .field("base_url", &self.base_url)
            .field("image_model", &self.image_model)
            .field("edit_model", &self.edit_model)
            .field("text_model", &self.text_model)
            .field("video_model", &self.video_model)
            .finish_non_exhaustive()
    }
}

impl GeminiMediaProvider {
    /// Creates a provider over a credential chain.
    pub fn new(credentials: CredentialChain) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CoreError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            edit_model: DEFAULT_EDIT_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
        })
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set custom image generation model
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Set custom image editing model
    pub fn with_edit_model(mut self, model: impl Into<String>) -> Self {
        self.edit_model = model.into();
        self
    }

    /// Set custom text model
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    /// Set custom video model
    pub fn with_video_model(mut self, model: impl Into<String>) -> Self {
        self.video_model = model.into();
        self
    }

    // =========================================================================
    // URL building
    // =========================================================================

    fn predict_url(&self) -> String {
        format!("{}/models/{}:predict", self.base_url, self.image_model)
    }

    fn generate_content_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn video_submit_url(&self) -> String {
        format!(
            "{}/models/{}:predictLongRunning",
            self.base_url, self.video_model
        )
    }

    fn operation_url(&self, operation_name: &str) -> String {
        format!("{}/{}", self.base_url, operation_name)
    }

    /// Appends the credential as a `key` query parameter, the authentication
    /// form the media download endpoint expects. The returned URL carries the
    /// credential and must never be logged.
    fn authenticated_media_url(uri: &str, credential: &Credential) -> String {
        let separator = if uri.contains('?') { '&' } else { '?' };
        format!("{}{}key={}", uri, separator, credential.as_str())
    }

    // =========================================================================
    // Transport
    // =========================================================================

    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        credential: &Credential,
        body: &B,
    ) -> CoreResult<R> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", credential.as_str())
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| CoreError::RequestFailed(format!("Network error: {}", e)))?;

        Self::read_json(response).await
    }

    async fn get_json<R: DeserializeOwned>(
        &self,
        url: &str,
        credential: &Credential,
    ) -> CoreResult<R> {
        let response = self
            .http
            .get(url)
            .header("x-goog-api-key", credential.as_str())
            .send()
            .await
            .map_err(|e| CoreError::RequestFailed(format!("Network error: {}", e)))?;

        Self::read_json(response).await
    }

    async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> CoreResult<R> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::RequestFailed(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_api_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| CoreError::RequestFailed(format!("Failed to parse response: {}", e)))
    }

    /// Parse an error response body
    fn parse_api_error(status: StatusCode, body: &str) -> CoreError {
        if let Ok(err) = serde_json::from_str::<ApiError>(body) {
            let remote_status = err.error.status.as_deref().unwrap_or("unknown");
            return CoreError::RequestFailed(format!(
                "API error ({}; status={}): {}",
                status, remote_status, err.error.message
            ));
        }

        let truncated: String = body.chars().take(500).collect();
        CoreError::RequestFailed(format!("API error ({}): {}", status, truncated))
    }

    // =========================================================================
    // Request building
    // =========================================================================

    fn text_request(system_instruction: &str, user_text: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(user_text.to_string()),
                    inline_data: None,
                }],
            }],
            system_instruction: Some(Content {
                // System instruction doesn't need a role
                role: None,
                parts: vec![Part {
                    text: Some(system_instruction.to_string()),
                    inline_data: None,
                }],
            }),
            generation_config: None,
        }
    }

    fn edit_request(instruction: &str, source: &ImageAsset) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: source.mime_type.clone(),
                            data: source.to_base64(),
                        }),
                    },
                    Part {
                        text: Some(instruction.to_string()),
                        inline_data: None,
                    },
                ],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string()]),
            }),
        }
    }

    fn video_request(request: &VideoJobRequest) -> VideoSubmitRequest {
        VideoSubmitRequest {
            instances: vec![VideoInstance {
                prompt: request.prompt.clone(),
                image: ImagePayload::from_asset(&request.start_frame),
                last_frame: ImagePayload::from_asset(&request.end_frame),
            }],
            parameters: VideoParameters {
                sample_count: VIDEO_SAMPLE_COUNT,
                resolution: VIDEO_RESOLUTION.to_string(),
                aspect_ratio: request.aspect_ratio.as_str().to_string(),
            },
        }
    }

    // =========================================================================
    // Response handling
    // =========================================================================

    fn image_from_predictions(response: PredictResponse) -> CoreResult<ImageAsset> {
        let prediction = response
            .predictions
            .into_iter()
            .find(|p| p.bytes_base64_encoded.is_some())
            .ok_or(CoreError::GenerationEmpty)?;

        let data = prediction
            .bytes_base64_encoded
            .unwrap_or_default();
        let mime_type = prediction
            .mime_type
            .unwrap_or_else(|| "image/png".to_string());
        ImageAsset::from_base64(&data, mime_type)
    }

    fn image_from_content(response: GenerateContentResponse) -> CoreResult<ImageAsset> {
        Self::check_prompt_feedback(&response)?;

        let inline = response
            .candidates
            .into_iter()
            .flatten()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data)
            .ok_or(CoreError::NoImageInResponse)?;

        let bytes = BASE64
            .decode(inline.data.as_bytes())
            .map_err(|e| CoreError::RequestFailed(format!("Invalid inline image data: {}", e)))?;
        Ok(ImageAsset::new(bytes, inline.mime_type))
    }

    fn text_from_content(response: GenerateContentResponse) -> CoreResult<String> {
        Self::check_prompt_feedback(&response)?;

        response
            .candidates
            .into_iter()
            .flatten()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .ok_or_else(|| CoreError::RequestFailed("Model returned no text reply".to_string()))
    }

    fn check_prompt_feedback(response: &GenerateContentResponse) -> CoreResult<()> {
        if let Some(feedback) = &response.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(CoreError::RequestFailed(format!(
                    "Content blocked by safety filters: {}",
                    reason
                )));
            }
        }
        Ok(())
    }

    /// Maps a remote operation onto a job handle, preserving the invariant
    /// that a result URI is present only when the job is done without error.
    fn job_from_operation(operation: Operation, submitted_at: i64) -> VideoJob {
        let error = operation.error.map(|e| VideoJobError {
            message: e.message.unwrap_or_else(|| "Unknown error".to_string()),
            code: e.code,
        });

        let result_uri = if operation.done && error.is_none() {
            operation
                .response
                .and_then(|r| r.generate_video_response)
                .map(|r| r.generated_samples)
                .into_iter()
                .flatten()
                .filter_map(|s| s.video)
                .find_map(|v| v.uri)
        } else {
            None
        };

        VideoJob {
            name: operation.name,
            done: operation.done,
            error,
            result_uri,
            submitted_at,
        }
    }
}

// =============================================================================
// MediaProvider Implementation
// =============================================================================

#[async_trait]
impl MediaProvider for GeminiMediaProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_available(&self) -> bool {
        self.credentials.is_configured()
    }

    async fn health_check(&self) -> CoreResult<()> {
        let credential = self.credentials.resolve()?;
        let url = format!("{}/models", self.base_url);

        let response = self
            .http
            .get(&url)
            .header("x-goog-api-key", credential.as_str())
            .send()
            .await
            .map_err(|e| CoreError::RequestFailed(format!("Health check failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(Self::parse_api_error(status, &body))
    }

    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> CoreResult<ImageAsset> {
        let credential = self.credentials.resolve()?;

        let body = PredictRequest {
            instances: vec![ImageInstance {
                prompt: prompt.to_string(),
            }],
            parameters: ImageParameters {
                sample_count: 1,
                aspect_ratio: aspect_ratio.as_str().to_string(),
                output_mime_type: "image/png".to_string(),
            },
        };

        debug!("Generating image with {}", self.image_model);
        let response: PredictResponse = self
            .post_json(&self.predict_url(), &credential, &body)
            .await?;

        let asset = Self::image_from_predictions(response)?;
        debug!("Image generated ({} bytes)", asset.bytes.len());
        Ok(asset)
    }

    async fn edit_image(&self, instruction: &str, source: &ImageAsset) -> CoreResult<ImageAsset> {
        let credential = self.credentials.resolve()?;

        let body = Self::edit_request(instruction, source);
        let url = self.generate_content_url(&self.edit_model);

        debug!("Editing image with {}", self.edit_model);
        let response: GenerateContentResponse =
            self.post_json(&url, &credential, &body).await?;

        Self::image_from_content(response)
    }

    async fn enhance_prompt(&self, idea: &str, target: EnhancementTarget) -> CoreResult<String> {
        let credential = self.credentials.resolve()?;

        let body = Self::text_request(target.system_instruction(), idea);
        let url = self.generate_content_url(&self.text_model);

        debug!("Enhancing prompt for target {}", target);
        let response: GenerateContentResponse =
            self.post_json(&url, &credential, &body).await?;

        Self::text_from_content(response)
    }

    async fn generate_app(&self, description: &str) -> CoreResult<String> {
        let credential = self.credentials.resolve()?;

        let body = Self::text_request(APP_BUILDER_INSTRUCTION, description);
        let url = self.generate_content_url(&self.text_model);

        debug!("Generating app with {}", self.text_model);
        let response: GenerateContentResponse =
            self.post_json(&url, &credential, &body).await?;

        Self::text_from_content(response)
    }

    async fn submit_video_job(&self, request: &VideoJobRequest) -> CoreResult<VideoJob> {
        let credential = self.credentials.resolve()?;
        request.validate().map_err(CoreError::ValidationError)?;

        let body = Self::video_request(request);
        let operation: Operation = self
            .post_json(&self.video_submit_url(), &credential, &body)
            .await?;

        info!("Video generation submitted: operation={}", operation.name);
        Ok(Self::job_from_operation(
            operation,
            chrono::Utc::now().timestamp(),
        ))
    }

    async fn refresh_video_job(&self, job: &VideoJob) -> CoreResult<VideoJob> {
        let credential = self.credentials.resolve()?;

        let url = self.operation_url(&job.name);
        let operation: Operation = self.get_json(&url, &credential).await?;

        debug!(
            "Video job {} status: done={}",
            operation.name, operation.done
        );
        Ok(Self::job_from_operation(operation, job.submitted_at))
    }

    async fn fetch_result(&self, uri: &str) -> CoreResult<Vec<u8>> {
        let credential = self.credentials.resolve()?;

        let url = Self::authenticated_media_url(uri, &credential);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CoreError::RequestFailed(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Media download failed: {}", status);
            return Err(CoreError::DownloadFailed(status.to_string()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::RequestFailed(format!("Failed to read media: {}", e)))?;

        info!("Downloaded generated video ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }
}

// =============================================================================
// Tests
// =============================================================================
