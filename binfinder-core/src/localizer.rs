//! Translation of outbound text into the user's language.

use std::sync::Arc;

use tracing::warn;

use crate::ports::Translator;

/// Prefix marking text that could not be translated.
pub const UNTRANSLATED_MARKER: &str = "[untranslated]";

/// Wraps the translation collaborator so reply delivery never fails on it.
#[derive(Clone, Default)]
pub struct ResponseLocalizer {
    translator: Option<Arc<dyn Translator>>,
}

impl ResponseLocalizer {
    /// Localizer delegating non-English text to `translator`.
    #[must_use]
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self {
            translator: Some(translator),
        }
    }

    /// Localizer that returns every text unchanged.
    #[must_use]
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// Translate `text` for a user speaking `language_code`.
    ///
    /// English and unknown (empty) languages are returned as-is. Translation failures
    /// yield the original text behind [`UNTRANSLATED_MARKER`].
    pub async fn localize(&self, text: &str, language_code: &str) -> String {
        let language = language_code.trim();
        if language.is_empty() || language.to_lowercase().starts_with("en") {
            return text.to_owned();
        }
        let Some(translator) = &self.translator else {
            return text.to_owned();
        };

        match translator.translate(text, language).await {
            Ok(translated) => translated,
            Err(err) => {
                warn!(language, error = %err, "translation failed, sending original text");
                format!("{UNTRANSLATED_MARKER} {text}")
            }
        }
    }
}
