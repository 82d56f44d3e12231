//! Session Store
//!
//! Volatile, session-scoped collections of saved prompts and saved images.
//! Both collections are insertion-ordered with at-most-once membership:
//! prompts deduplicate by exact string equality, images by byte content.
//! The newest entry is always first. Nothing here touches disk; the store
//! lives and dies with the application session.
//!
//! The store is passed explicitly to whichever workflow component needs it
//! and mutated only through the two save methods, so there is a single
//! writer by construction.

use ulid::Ulid;

use crate::core::generative::image::ImageAsset;

/// Saved prompts and images for one application session.
#[derive(Debug, Default)]
pub struct SessionStore {
    prompts: Vec<String>,
    images: Vec<ImageAsset>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves a prompt. Empty input and exact duplicates are no-ops;
    /// otherwise the prompt is prepended.
    pub fn save_prompt(&mut self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        if prompt.is_empty() || self.prompts.iter().any(|p| p == &prompt) {
            return;
        }
        self.prompts.insert(0, prompt);
    }

    /// Saves an image. An asset with identical byte content is a no-op
    /// (first write wins); otherwise a new entry with a freshly generated
    /// identifier is prepended.
    pub fn save_image(
        &mut self,
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        preview: Option<String>,
    ) {
        if self.images.iter().any(|img| img.bytes == bytes) {
            return;
        }
        let mut asset = ImageAsset::new(bytes, mime_type).with_id(Ulid::new().to_string());
        asset.preview = preview;
        self.images.insert(0, asset);
    }

    /// Saved prompts, newest first.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Saved images, newest first.
    pub fn images(&self) -> &[ImageAsset] {
        &self.images
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_prompt_deduplicates_exact_matches() {
        let mut store = SessionStore::new();
        store.save_prompt("a cat in space");
        store.save_prompt("a cat in space");
        assert_eq!(store.prompts().len(), 1);

        // Non-exact variants are distinct entries.
        store.save_prompt("A cat in space");
        assert_eq!(store.prompts().len(), 2);
    }

    #[test]
    fn test_save_prompt_newest_first() {
        let mut store = SessionStore::new();
        store.save_prompt("a");
        store.save_prompt("b");
        assert_eq!(store.prompts(), &["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_save_prompt_ignores_empty() {
        let mut store = SessionStore::new();
        store.save_prompt("");
        assert!(store.prompts().is_empty());
    }

    #[test]
    fn test_save_image_deduplicates_by_byte_content() {
        let mut store = SessionStore::new();
        store.save_image(vec![1, 2, 3], "image/png", Some("blob:first".to_string()));
        store.save_image(vec![1, 2, 3], "image/png", Some("blob:second".to_string()));

        // First write wins, preview handle of the duplicate is discarded.
        assert_eq!(store.images().len(), 1);
        assert_eq!(store.images()[0].preview.as_deref(), Some("blob:first"));
    }

    #[test]
    fn test_save_image_assigns_fresh_ids_and_prepends() {
        let mut store = SessionStore::new();
        store.save_image(vec![1], "image/png", None);
        store.save_image(vec![2], "image/png", None);

        let images = store.images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].bytes, vec![2]);
        assert_eq!(images[1].bytes, vec![1]);

        let first_id = images[0].id.as_ref().expect("id assigned");
        let second_id = images[1].id.as_ref().expect("id assigned");
        assert_ne!(first_id, second_id);
    }

    #[test]
    fn test_collections_start_empty() {
        let store = SessionStore::new();
        assert!(store.prompts().is_empty());
        assert!(store.images().is_empty());
    }
}
