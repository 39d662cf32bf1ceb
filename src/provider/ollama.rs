//! Ollama `/api/chat` backend
//!
//! Sends one non-streamed request and reads the reply leniently, since Ollama
//! versions differ in the body they return.

use super::ProviderSettings;
use crate::error::Result;
use crate::message::ChatMessage;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Upper bound on a single request to the local server
pub const OLLAMA_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Clone)]
pub struct OllamaBackend {
    model: String,
    host: String,
    http_client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(model: impl Into<String>, settings: &ProviderSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(OLLAMA_TIMEOUT).build()?;

        Ok(Self {
            model: model.into(),
            host: settings.ollama_host().to_string(),
            http_client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.host.trim_end_matches('/'))
    }

    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: ChatOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        let response = self
            .http_client
            .post(self.chat_url())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let data: Value = response.json().await?;
        Ok(parse_chat_response(&data))
    }
}

/// Extract the reply text from an `/api/chat` body.
///
/// An object with a `message` key yields `message.content` (empty when absent).
/// An array yields each element's `message.content` concatenated in order.
/// Anything else yields an empty string.
pub fn parse_chat_response(data: &Value) -> String {
    fn content_of(item: &Value) -> &str {
        item.get("message")
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    match data {
        Value::Object(map) if map.contains_key("message") => content_of(data).to_string(),
        Value::Array(chunks) => chunks.iter().map(content_of).collect(),
        _ => String::new(),
    }
}
