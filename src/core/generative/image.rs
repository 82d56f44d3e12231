//! Image Assets
//!
//! In-memory images as exchanged with the media API: raw bytes plus a MIME
//! type, with optional identity and preview metadata. Also defines the closed
//! set of aspect ratios the API accepts.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult};

// =============================================================================
// AspectRatio
// =============================================================================

/// Output aspect ratio. The API accepts exactly this set; video generation
/// accepts only the 16:9 and 9:16 members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Fullscreen,
    #[serde(rename = "3:4")]
    FullscreenPortrait,
}

impl AspectRatio {
    /// Every ratio the image operations accept.
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Fullscreen,
        AspectRatio::FullscreenPortrait,
    ];

    /// The subset the video workflow accepts.
    pub const VIDEO: [AspectRatio; 2] = [AspectRatio::Landscape, AspectRatio::Portrait];

    /// Wire representation, e.g. `"16:9"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Fullscreen => "4:3",
            AspectRatio::FullscreenPortrait => "3:4",
        }
    }

    /// Whether this ratio is valid for video generation.
    pub fn supports_video(&self) -> bool {
        Self::VIDEO.contains(self)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1:1" => Ok(AspectRatio::Square),
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            "4:3" => Ok(AspectRatio::Fullscreen),
            "3:4" => Ok(AspectRatio::FullscreenPortrait),
            other => Err(CoreError::ValidationError(format!(
                "Invalid aspect ratio '{}'. Valid: 1:1, 16:9, 9:16, 4:3, 3:4",
                other
            ))),
        }
    }
}

// =============================================================================
// ImageAsset
// =============================================================================

/// An image held in memory.
///
/// Created by decoding a user-selected file, by decoding a generation
/// response, or by promotion into the session store. Immutable once created;
/// identity for deduplication is byte-content equality.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Stable identifier, assigned when the asset enters the session store.
    pub id: Option<String>,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// MIME type, e.g. `"image/png"`.
    pub mime_type: String,
    /// Display/preview reference for the UI layer.
    pub preview: Option<String>,
}

impl ImageAsset {
    /// Creates an asset from raw bytes.
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            id: None,
            bytes,
            mime_type: mime_type.into(),
            preview: None,
        }
    }

    /// Sets the stable identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the preview reference.
    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    /// Decodes a base64 payload as received from the API.
    pub fn from_base64(data: &str, mime_type: impl Into<String>) -> CoreResult<Self> {
        let bytes = BASE64.decode(data.as_bytes()).map_err(|e| {
            CoreError::ValidationError(format!("Invalid base64 image payload: {}", e))
        })?;
        Ok(Self::new(bytes, mime_type))
    }

    /// Decodes a browser-style data URL (`data:image/png;base64,...`), the
    /// form produced by reading a user-selected file.
    pub fn from_data_url(url: &str) -> CoreResult<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| CoreError::ValidationError("Not a data URL".to_string()))?;
        let (meta, data) = rest
            .split_once(',')
            .ok_or_else(|| CoreError::ValidationError("Malformed data URL".to_string()))?;
        let mime_type = meta.strip_suffix(";base64").ok_or_else(|| {
            CoreError::ValidationError("Only base64 data URLs are supported".to_string())
        })?;
        if mime_type.is_empty() {
            return Err(CoreError::ValidationError(
                "Data URL is missing a MIME type".to_string(),
            ));
        }
        Self::from_base64(data, mime_type)
    }

    /// Encodes the bytes for transport.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// Whether two assets hold identical byte content, the deduplication key.
    pub fn same_content(&self, other: &ImageAsset) -> bool {
        self.bytes == other.bytes
    }

    /// File extension matching the MIME type.
    pub fn file_extension(&self) -> &str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "bin",
        }
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("id", &self.id)
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .field("mime_type", &self.mime_type)
            .field("preview", &self.preview)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // AspectRatio Tests
    // =========================================================================

    #[test]
    fn test_ratio_wire_strings() {
        assert_eq!(AspectRatio::Square.as_str(), "1:1");
        assert_eq!(AspectRatio::Landscape.as_str(), "16:9");
        assert_eq!(AspectRatio::Portrait.as_str(), "9:16");
        assert_eq!(AspectRatio::Fullscreen.as_str(), "4:3");
        assert_eq!(AspectRatio::FullscreenPortrait.as_str(), "3:4");
    }

    #[test]
    fn test_ratio_serialization() {
        assert_eq!(
            serde_json::to_string(&AspectRatio::Landscape).unwrap(),
            "\"16:9\""
        );
        assert_eq!(
            serde_json::from_str::<AspectRatio>("\"9:16\"").unwrap(),
            AspectRatio::Portrait
        );
    }

    #[test]
    fn test_ratio_parse_round_trip() {
        for ratio in AspectRatio::ALL {
            assert_eq!(ratio.as_str().parse::<AspectRatio>().unwrap(), ratio);
        }
    }

    #[test]
    fn test_ratio_parse_rejects_unknown() {
        let err = "21:9".parse::<AspectRatio>().unwrap_err();
        assert!(err.to_string().contains("Invalid aspect ratio"));
    }

    #[test]
    fn test_video_ratio_subset() {
        assert!(AspectRatio::Landscape.supports_video());
        assert!(AspectRatio::Portrait.supports_video());
        assert!(!AspectRatio::Square.supports_video());
        assert!(!AspectRatio::Fullscreen.supports_video());
        assert!(!AspectRatio::FullscreenPortrait.supports_video());
    }

    // =========================================================================
    // ImageAsset Tests
    // =========================================================================

    #[test]
    fn test_base64_round_trip() {
        let asset = ImageAsset::new(vec![1, 2, 3, 255], "image/png");
        let encoded = asset.to_base64();
        let decoded = ImageAsset::from_base64(&encoded, "image/png").unwrap();
        assert!(asset.same_content(&decoded));
    }

    #[test]
    fn test_from_base64_rejects_garbage() {
        let result = ImageAsset::from_base64("not base64 at all!!!", "image/png");
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_from_data_url() {
        let url = format!("data:image/jpeg;base64,{}", BASE64.encode([9u8, 8, 7]));
        let asset = ImageAsset::from_data_url(&url).unwrap();
        assert_eq!(asset.bytes, vec![9, 8, 7]);
        assert_eq!(asset.mime_type, "image/jpeg");
    }

    #[test]
    fn test_from_data_url_rejects_malformed_input() {
        assert!(ImageAsset::from_data_url("http://example.com/a.png").is_err());
        assert!(ImageAsset::from_data_url("data:image/png;base64").is_err());
        assert!(ImageAsset::from_data_url("data:image/png,plainpayload").is_err());
        assert!(ImageAsset::from_data_url("data:;base64,AAAA").is_err());
    }

    #[test]
    fn test_same_content_ignores_metadata() {
        let a = ImageAsset::new(vec![1, 2, 3], "image/png").with_id("a");
        let b = ImageAsset::new(vec![1, 2, 3], "image/png").with_preview("blob:xyz");
        assert!(a.same_content(&b));

        let c = ImageAsset::new(vec![1, 2, 4], "image/png");
        assert!(!a.same_content(&c));
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(ImageAsset::new(vec![], "image/png").file_extension(), "png");
        assert_eq!(ImageAsset::new(vec![], "image/jpeg").file_extension(), "jpg");
        assert_eq!(ImageAsset::new(vec![], "image/webp").file_extension(), "webp");
        assert_eq!(ImageAsset::new(vec![], "video/mp4").file_extension(), "bin");
    }

    #[test]
    fn test_debug_omits_raw_bytes() {
        let asset = ImageAsset::new(vec![0u8; 4096], "image/png");
        let rendered = format!("{:?}", asset);
        assert!(rendered.contains("4096 bytes"));
        assert!(rendered.len() < 200);
    }
}
