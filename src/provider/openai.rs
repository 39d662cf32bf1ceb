//! OpenAI-compatible chat completions backend

use super::ProviderSettings;
use crate::error::{Error, Result};
use crate::message::ChatMessage;
use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestMessage, CreateChatCompletionRequestArgs},
    Client,
};

/// Thin wrapper over the async-openai client.
///
/// Uses the library's default HTTP timeout. The library itself retries
/// rate-limited (429) responses; every other failure is returned as is.
#[derive(Clone)]
pub struct OpenAiBackend {
    model: String,
    client: Client<OpenAIConfig>,
}

impl OpenAiBackend {
    pub fn new(model: impl Into<String>, settings: &ProviderSettings) -> Self {
        let mut openai_config = OpenAIConfig::new()
            .with_api_key(settings.openai_api_key.clone().unwrap_or_default());
        if let Some(base_url) = &settings.openai_base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Self {
            model: model.into(),
            client: Client::with_config(openai_config),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single chat completion; returns the first choice's content
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let messages = messages
            .iter()
            .map(ChatMessage::to_request)
            .collect::<Result<Vec<ChatCompletionRequestMessage>>>()?;

        #[allow(deprecated)]
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(temperature)
            .max_tokens(max_tokens)
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(Error::EmptyCompletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::stub::serve_once;
    use async_openai::error::OpenAIError;

    fn backend_at(base: String) -> OpenAiBackend {
        let settings = ProviderSettings {
            openai_api_key: Some("sk-test".to_string()),
            openai_base_url: Some(format!("{}/v1", base)),
            ..Default::default()
        };
        OpenAiBackend::new("gpt-4o-mini", &settings)
    }

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::system("sys"), ChatMessage::user("usr")]
    }

    fn completion_body(choices: &str) -> String {
        format!(
            r#"{{"id":"chatcmpl-1","object":"chat.completion","created":1,"model":"gpt-4o-mini","choices":{}}}"#,
            choices
        )
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let body = completion_body(
            r#"[{"index":0,"message":{"role":"assistant","content":"hello"},"finish_reason":"stop"},
                {"index":1,"message":{"role":"assistant","content":"ignored"},"finish_reason":"stop"}]"#,
        );
        let (base, seen) = serve_once(200, &body).await;

        let reply = backend_at(base).complete(&messages(), 0.5, 10).await.unwrap();
        assert_eq!(reply, "hello");

        let request = seen.await.unwrap();
        assert!(request.request_line.starts_with("POST /v1/chat/completions "));
        assert_eq!(request.body["model"], "gpt-4o-mini");
        assert_eq!(request.body["temperature"], 0.5);
        assert_eq!(request.body["max_tokens"], 10);
        assert_eq!(request.body["messages"][0]["role"], "system");
        assert_eq!(request.body["messages"][0]["content"], "sys");
        assert_eq!(request.body["messages"][1]["role"], "user");
        assert_eq!(request.body["messages"][1]["content"], "usr");
    }

    #[tokio::test]
    async fn test_complete_without_choices_is_empty_completion() {
        let (base, _seen) = serve_once(200, &completion_body("[]")).await;
        let err = backend_at(base).complete(&messages(), 0.5, 10).await.unwrap_err();
        assert!(matches!(err, Error::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_complete_server_error_propagates() {
        let (base, _seen) = serve_once(
            500,
            r#"{"error":{"message":"upstream exploded","type":"server_error","param":null,"code":null}}"#,
        )
        .await;
        let err = backend_at(base).complete(&messages(), 0.5, 10).await.unwrap_err();
        match err {
            Error::OpenAi(OpenAIError::ApiError(api)) => {
                assert_eq!(api.message, "upstream exploded")
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }
}
