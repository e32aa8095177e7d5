//! HTTP-backed classifier, translator, and chat collaborators.

use std::time::Duration;

use async_trait::async_trait;
use binfinder_core::{ChatPort, ChatTurn, Classifier, ImageSource, PortError, Translator};
use reqwest::{Client, header::CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::settings::LlmSettings;

const ASSISTANT_PROMPT: &str = "You are a friendly assistant that helps people in Prague \
    dispose of waste correctly. Answer briefly. Suggest sending a photo of an item to learn \
    which bin it belongs in, or sharing a location to find the nearest bin or collection yard.";

/// Classifier service answering `{"label": ...}` for posted image bytes.
pub(crate) struct HttpClassifier {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
    label: String,
}

impl HttpClassifier {
    pub(crate) fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, image: &ImageSource) -> Result<String, PortError> {
        let bytes = match image {
            ImageSource::Bytes(bytes) => bytes.clone(),
            ImageSource::Path(path) => tokio::fs::read(path).await.map_err(|err| {
                PortError::ClassificationFailed(format!("{}: {err}", path.display()))
            })?,
        };
        debug!(url = %self.url, size = bytes.len(), "classifying image");

        let res = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|err| PortError::ClassificationFailed(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(PortError::ClassificationFailed(format!(
                "classifier answered {status}"
            )));
        }

        let body: LabelResponse = res
            .json()
            .await
            .map_err(|err| PortError::ClassificationFailed(err.to_string()))?;
        let label = body.label.trim();
        if label.is_empty() {
            return Err(PortError::ClassificationFailed("empty label".to_owned()));
        }
        Ok(label.to_owned())
    }
}

/// Offline classifier reading the label from the image file name.
///
/// `plastic_bottle.jpg` is classified as `plastic bottle`.
pub(crate) struct FileNameClassifier;

#[async_trait]
impl Classifier for FileNameClassifier {
    async fn classify(&self, image: &ImageSource) -> Result<String, PortError> {
        let ImageSource::Path(path) = image else {
            return Err(PortError::ClassificationFailed(
                "image has no file name".to_owned(),
            ));
        };

        let label = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().replace(['_', '-'], " "))
            .unwrap_or_default();
        let label = label.trim();
        if label.is_empty() {
            return Err(PortError::ClassificationFailed(format!(
                "no label in {}",
                path.display()
            )));
        }
        Ok(label.to_owned())
    }
}

/// OpenAI-compatible chat-completions client.
pub(crate) struct LlmClient {
    client: Client,
    settings: LlmSettings,
}

#[derive(Debug, Deserialize)]
struct Completion {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl LlmClient {
    pub(crate) fn new(client: Client, settings: LlmSettings) -> Self {
        Self { client, settings }
    }

    async fn complete_messages(&self, messages: Vec<Value>) -> Result<String, String> {
        let url = format!("{}/chat/completions", self.settings.url.trim_end_matches('/'));
        let body = json!({
            "model": self.settings.model,
            "messages": messages,
        });

        let mut req = self
            .client
            .post(&url)
            .timeout(Duration::from_millis(self.settings.timeout_ms))
            .json(&body);
        if let Some(key) = &self.settings.api_key {
            req = req.bearer_auth(key);
        }

        let res = req.send().await.map_err(|err| err.to_string())?;
        let status = res.status();
        if !status.is_success() {
            return Err(format!("completion endpoint answered {status}"));
        }

        let completion: Completion = res.json().await.map_err(|err| err.to_string())?;
        completion
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .map(|content| content.trim().to_owned())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| "completion without content".to_owned())
    }
}

#[async_trait]
impl Translator for LlmClient {
    async fn translate(&self, text: &str, language_code: &str) -> Result<String, PortError> {
        let instruction = format!(
            "Translate the user's message into the language with code '{language_code}'. \
             Keep Markdown markup, links and numbers unchanged. Reply with the translation only."
        );
        let messages = vec![
            json!({"role": "system", "content": instruction}),
            json!({"role": "user", "content": text}),
        ];
        self.complete_messages(messages)
            .await
            .map_err(PortError::TranslationFailed)
    }
}

#[async_trait]
impl ChatPort for LlmClient {
    async fn complete(&self, prompt: &str, history: &[ChatTurn]) -> Result<String, PortError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(json!({"role": "system", "content": ASSISTANT_PROMPT}));
        for turn in history {
            messages.push(json!({"role": turn.role, "content": turn.content}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        self.complete_messages(messages)
            .await
            .map_err(PortError::ChatFailed)
    }
}
