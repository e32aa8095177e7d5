//! Traits describing facility providers and external collaborators, plus the shared error type.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Error as ReqwestError;
use serde::{Deserialize, Serialize};

use crate::model::{Facility, FacilityQuery, ProviderMeta};

#[derive(thiserror::Error, Debug)]
/// Errors raised by providers and collaborators.
///
/// An empty facility list is not an error; providers return `Ok(vec![])` instead.
pub enum PortError {
    /// Backend unreachable, timed out, or answered with a non-success status.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Backend answered successfully but with a payload of unexpected shape.
    #[error("Malformed provider response: {0}")]
    ProviderMalformedResponse(String),
    /// The image classifier could not produce a label.
    #[error("Classification failed: {0}")]
    ClassificationFailed(String),
    /// The translation collaborator failed.
    #[error("Translation failed: {0}")]
    TranslationFailed(String),
    /// The chat collaborator failed.
    #[error("Chat completion failed: {0}")]
    ChatFailed(String),
    /// No provider is registered for the requested facility kind.
    #[error("Unsupported facility kind")]
    UnsupportedKind,
    /// Query parameters violate their constraints.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl From<ReqwestError> for PortError {
    fn from(err: ReqwestError) -> Self {
        if err.is_decode() {
            PortError::ProviderMalformedResponse(err.to_string())
        } else {
            PortError::ProviderUnavailable(err.to_string())
        }
    }
}

#[async_trait]
/// Trait for backend-specific facility lookups.
pub trait FacilityPort: Send + Sync {
    /// Metadata describing the provider.
    fn meta(&self) -> &ProviderMeta;

    /// Fetch facilities around the query origin.
    ///
    /// Implementations map the radius (always meters here) to their backend's unit.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::ProviderUnavailable`] or
    /// [`PortError::ProviderMalformedResponse`] when the backend call fails.
    async fn find(&self, query: &FacilityQuery) -> Result<Vec<Facility>, PortError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Photo handed to the classifier.
pub enum ImageSource {
    /// Raw image bytes as received from the messaging layer.
    Bytes(Vec<u8>),
    /// Image stored on local disk.
    Path(PathBuf),
}

#[async_trait]
/// Black-box image classifier.
pub trait Classifier: Send + Sync {
    /// Produce a free-text label describing the photographed item.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::ClassificationFailed`] when no label can be produced.
    async fn classify(&self, image: &ImageSource) -> Result<String, PortError>;
}

#[async_trait]
/// Black-box translation service.
pub trait Translator: Send + Sync {
    /// Translate `text` into the language identified by `language_code`.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::TranslationFailed`] when the service fails.
    async fn translate(&self, text: &str, language_code: &str) -> Result<String, PortError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Author of a chat turn.
pub enum ChatRole {
    /// The human user.
    User,
    /// The assistant.
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Single message of free-chat history.
pub struct ChatTurn {
    /// Author.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

#[async_trait]
/// Black-box conversational model for free chat.
pub trait ChatPort: Send + Sync {
    /// Answer `prompt` given the previous turns of the conversation.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::ChatFailed`] when the model call fails.
    async fn complete(&self, prompt: &str, history: &[ChatTurn]) -> Result<String, PortError>;
}
