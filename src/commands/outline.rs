//! Outline command: generate or rewrite the multi-level outline

use crate::config::Config;
use crate::error::Result;
use crate::message::build_messages;
use crate::provider::Completion;
use crate::store::{OutlineDocument, PromptKind, StoryStore};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;

pub const DEFAULT_AUDIENCE: &str = "大众读者";
pub const DEFAULT_LENGTH: &str = "中篇";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRequest {
    pub title: String,
    pub genres: Vec<String>,
    pub audience: String,
    pub length: String,
}

impl OutlineRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            genres: Vec::new(),
            audience: DEFAULT_AUDIENCE.to_string(),
            length: DEFAULT_LENGTH.to_string(),
        }
    }
}

#[derive(Serialize)]
struct OutlinePayload<'a> {
    title: &'a str,
    genres: &'a [String],
    audience: &'a str,
    length: &'a str,
    language: &'a str,
    bible: &'a Mapping,
}

/// Result of an outline run
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineReport {
    pub path: PathBuf,
    pub outline: OutlineDocument,
}

/// JSON object key for a YAML mapping key
fn json_key(key: &Value) -> Value {
    match key {
        Value::String(_) => key.clone(),
        Value::Null => Value::String("null".to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Tagged(tagged) => json_key(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => Value::String(
            serde_json::to_string(key).unwrap_or_else(|_| format!("{:?}", key)),
        ),
    }
}

/// Copy of `value` whose mapping keys are all strings, in the same order
fn with_string_keys(value: &Value) -> Value {
    match value {
        Value::Mapping(mapping) => Value::Mapping(string_keyed(mapping)),
        Value::Sequence(items) => Value::Sequence(items.iter().map(with_string_keys).collect()),
        _ => value.clone(),
    }
}

fn string_keyed(mapping: &Mapping) -> Mapping {
    mapping
        .iter()
        .map(|(k, v)| (json_key(k), with_string_keys(v)))
        .collect()
}

/// JSON user payload for the outline request.
///
/// Non-string bible keys are written as strings (`~` becomes `"null"`).
pub fn outline_payload(config: &Config, request: &OutlineRequest, bible: &Mapping) -> Result<String> {
    let bible = string_keyed(bible);
    let payload = OutlinePayload {
        title: &request.title,
        genres: &request.genres,
        audience: &request.audience,
        length: &request.length,
        language: &config.language,
        bible: &bible,
    };
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Ask the model for an outline and overwrite `outline.yaml` with the reply.
///
/// The file is written whether or not the reply parses as a YAML mapping.
pub async fn run_outline(
    config: &Config,
    store: &StoryStore,
    model: &dyn Completion,
    request: &OutlineRequest,
) -> Result<OutlineReport> {
    let bible = store.load_bible()?;
    let system_prompt = store.read_prompt(PromptKind::Outline)?;
    let user_payload = outline_payload(config, request, &bible)?;

    let reply = model
        .completion(
            &build_messages(&system_prompt, &user_payload),
            config.temperature_outline,
            config.max_output_tokens,
        )
        .await?;

    let outline = OutlineDocument::from_reply(&reply);
    if !outline.is_parsed() {
        tracing::warn!("Outline reply is not a YAML mapping, saving raw text");
    }
    let path = store.save_outline(&outline)?;
    tracing::info!(path = %path.display(), parsed = outline.is_parsed(), "Outline saved");

    Ok(OutlineReport { path, outline })
}
