mod client;
mod model;

pub use client::{ADD_WORD_URL, AUTH_URL, ClientConfig, Endpoints, LeoClient, TRANSLATE_URL};
pub use model::{Direction, Variant, WordTranslation, is_english_word, unique, unique_by};

use async_trait::async_trait;

use crate::request::ApiError;

/// Dictionary operations the pipeline depends on.
#[async_trait]
pub trait TranslationClient: Send + Sync {
    async fn translate(&self, word: &str) -> Result<WordTranslation, ApiError>;

    /// Adds `translation` for `word` to the user's dictionary.
    async fn add_word(&self, word: &str, translation: &str) -> Result<WordTranslation, ApiError>;
}
