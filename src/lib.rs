//! Creative Suite Core Library
//!
//! Client and workflow orchestration for a hosted generative-media API.
//! The library covers four remote creative operations (image generation,
//! image editing, video generation, prompt enhancement), the two-stage
//! keyframe pipeline and poll-driven video job orchestrator built on top of
//! them, a session-scoped store for saved prompts and images, and an ordered
//! credential-provider chain.
//!
//! The UI driving these components is expected to live elsewhere; everything
//! here is headless and callable from any tokio runtime.

pub mod core;

pub use crate::core::{CoreError, CoreResult};
