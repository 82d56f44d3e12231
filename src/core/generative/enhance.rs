//! Prompt Enhancement
//!
//! System-instruction personas for the single-turn text operations: prompt
//! rewriting (tuned per output medium) and the app-builder code generator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which medium an enhanced prompt is intended for. Selects the
/// system-instruction persona applied to the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementTarget {
    Image,
    Video,
}

const IMAGE_PERSONA: &str = "You are an expert prompt writer for text-to-image models. \
Expand the user's idea into a single vivid prompt: describe the subject, setting, \
lighting, color palette, composition, and artistic style (photographic, cinematic, \
or painterly) in concrete visual language. Reply with the prompt text only, with no \
preamble and no explanations.";

const VIDEO_PERSONA: &str = "You are an expert prompt writer for text-to-video models. \
Expand the user's idea into a single cinematic prompt: describe the scene, the action \
as it unfolds, camera movement, pacing, lighting, and atmosphere in concrete visual \
language. Reply with the prompt text only, with no preamble and no explanations.";

/// System instruction for the app-builder exchange.
pub const APP_BUILDER_INSTRUCTION: &str = "You are an expert front-end developer. \
Generate a complete, self-contained single-file web application (HTML with inline CSS \
and JavaScript) implementing the user's description. Reply with the code only, with \
no explanations and no markdown fences.";

impl EnhancementTarget {
    /// The persona text sent as the exchange's system instruction.
    pub fn system_instruction(&self) -> &'static str {
        match self {
            EnhancementTarget::Image => IMAGE_PERSONA,
            EnhancementTarget::Video => VIDEO_PERSONA,
        }
    }
}

impl fmt::Display for EnhancementTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnhancementTarget::Image => write!(f, "Image"),
            EnhancementTarget::Video => write!(f, "Video"),
        }
    }
}
