//! Provider client dispatching to the selected backend

use super::{OllamaBackend, OpenAiBackend, ProviderKind, ProviderSettings};
use crate::error::Result;
use crate::message::ChatMessage;
use async_trait::async_trait;

/// Anything that can turn a message list into reply text
#[async_trait]
pub trait Completion: Send + Sync {
    async fn completion(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String>;
}

/// Exactly one configured backend
#[derive(Clone)]
pub enum ProviderClient {
    OpenAi(OpenAiBackend),
    Ollama(OllamaBackend),
}

impl ProviderClient {
    /// Create a client for `provider`, reading endpoint settings from the environment.
    ///
    /// A blank `provider` selects openai. Fails with `UnsupportedProvider` for
    /// names other than "openai" and "ollama".
    pub fn new(model: &str, provider: &str) -> Result<Self> {
        let kind = if provider.trim().is_empty() {
            ProviderKind::OpenAi
        } else {
            provider.parse()?
        };
        Self::with_settings(model, kind, &ProviderSettings::from_env())
    }

    pub fn with_settings(
        model: &str,
        kind: ProviderKind,
        settings: &ProviderSettings,
    ) -> Result<Self> {
        let client = match kind {
            ProviderKind::OpenAi => ProviderClient::OpenAi(OpenAiBackend::new(model, settings)),
            ProviderKind::Ollama => ProviderClient::Ollama(OllamaBackend::new(model, settings)?),
        };
        tracing::debug!(provider = %kind, model = model, "Provider client created");
        Ok(client)
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderClient::OpenAi(_) => ProviderKind::OpenAi,
            ProviderClient::Ollama(_) => ProviderKind::Ollama,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderClient::OpenAi(backend) => backend.model(),
            ProviderClient::Ollama(backend) => backend.model(),
        }
    }
}

#[async_trait]
impl Completion for ProviderClient {
    async fn completion(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let start = std::time::Instant::now();
        tracing::info!(
            target: "llm",
            provider = %self.kind(),
            model = self.model(),
            message_count = messages.len(),
            temperature = temperature,
            max_tokens = max_tokens,
            "Starting completion"
        );

        let result = match self {
            ProviderClient::OpenAi(backend) => {
                backend.complete(messages, temperature, max_tokens).await
            }
            ProviderClient::Ollama(backend) => {
                backend.complete(messages, temperature, max_tokens).await
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(text) => tracing::info!(
                target: "llm",
                provider = %self.kind(),
                elapsed_ms = elapsed_ms,
                response_len = text.len(),
                "Completion finished"
            ),
            Err(e) => tracing::error!(
                target: "llm",
                provider = %self.kind(),
                elapsed_ms = elapsed_ms,
                error = %e,
                "Completion failed"
            ),
        }
        result
    }
}
