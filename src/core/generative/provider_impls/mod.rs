//! Concrete media provider implementations.

mod gemini;

pub use gemini::GeminiMediaProvider;
