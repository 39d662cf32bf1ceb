//! Scene command: expand one scene of the outline into prose

use crate::config::Config;
use crate::error::Result;
use crate::message::build_messages;
use crate::provider::Completion;
use crate::store::{PromptKind, StoryStore};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;

/// Which part of the outline to write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SceneTarget {
    pub chapter: Option<String>,
    pub section: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneRequest {
    /// Explicit scene number; auto-assigned when absent
    pub index: Option<u32>,
    pub target: SceneTarget,
}

#[derive(Serialize)]
struct ScenePayload<'a> {
    language: &'a str,
    bible: &'a Mapping,
    outline: Value,
    target: &'a SceneTarget,
}

/// YAML user payload for the scene request
pub fn scene_payload(
    config: &Config,
    bible: &Mapping,
    outline: Value,
    target: &SceneTarget,
) -> Result<String> {
    let payload = ScenePayload {
        language: &config.language,
        bible,
        outline,
        target,
    };
    Ok(serde_yaml::to_string(&payload)?)
}

/// Generate one scene and write the reply verbatim. Returns the path written.
pub async fn run_scene(
    config: &Config,
    store: &StoryStore,
    model: &dyn Completion,
    request: &SceneRequest,
) -> Result<PathBuf> {
    let bible = store.load_bible()?;
    let outline = store.load_outline()?;
    if !outline.is_parsed() {
        tracing::warn!("Outline is raw text, passing it through unparsed");
    }
    let system_prompt = store.read_prompt(PromptKind::Scene)?;
    let user_payload = scene_payload(config, &bible, outline.to_value(), &request.target)?;

    let reply = model
        .completion(
            &build_messages(&system_prompt, &user_payload),
            config.temperature_scene,
            config.max_output_tokens,
        )
        .await?;

    let path = store.next_scene_path(request.index)?;
    store.write_scene(&path, &reply)?;
    tracing::info!(path = %path.display(), bytes = reply.len(), "Scene written");
    Ok(path)
}
