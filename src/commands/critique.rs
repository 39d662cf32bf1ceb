//! Critique command: editorial review of an existing draft

use crate::config::Config;
use crate::error::{Error, Result};
use crate::message::build_messages;
use crate::provider::Completion;
use crate::store::{PromptKind, StoryStore};
use serde::Serialize;
use serde_yaml::Mapping;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CritiqueRequest {
    /// Draft to review
    pub file: PathBuf,
    /// Focus areas, e.g. pacing or character consistency
    pub focus: Vec<String>,
}

#[derive(Serialize)]
struct CritiquePayload<'a> {
    language: &'a str,
    focus: &'a [String],
    bible: &'a Mapping,
    draft: &'a str,
}

pub fn critique_payload(
    config: &Config,
    focus: &[String],
    bible: &Mapping,
    draft: &str,
) -> Result<String> {
    let payload = CritiquePayload {
        language: &config.language,
        focus,
        bible,
        draft,
    };
    Ok(serde_yaml::to_string(&payload)?)
}

/// Review the draft and return the model's critique. Nothing is written.
pub async fn run_critique(
    config: &Config,
    store: &StoryStore,
    model: &dyn Completion,
    request: &CritiqueRequest,
) -> Result<String> {
    let draft = std::fs::read_to_string(&request.file).map_err(|source| Error::ReadFile {
        path: request.file.clone(),
        source,
    })?;
    let bible = store.load_bible()?;
    let system_prompt = store.read_prompt(PromptKind::Critique)?;
    let user_payload = critique_payload(config, &request.focus, &bible, &draft)?;

    tracing::debug!(file = %request.file.display(), chars = draft.chars().count(), "Critiquing draft");
    model
        .completion(
            &build_messages(&system_prompt, &user_payload),
            config.temperature_critique,
            config.max_output_tokens,
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{story_fixture, CannedModel};
    use serde_yaml::Value;

    #[tokio::test]
    async fn test_critique_returns_reply() {
        let (temp, store) = story_fixture();
        let draft = temp.path().join("draft.md");
        std::fs::write(&draft, "# Scene\n\nShe waited.\n").unwrap();
        let model = CannedModel::new("Tighten the pacing.");

        let request = CritiqueRequest {
            file: draft,
            focus: vec!["节奏".to_string(), "voice".to_string()],
        };
        let out = run_critique(&Config::default(), &store, &model, &request)
            .await
            .unwrap();
        assert_eq!(out, "Tighten the pacing.");

        let seen = model.requests();
        assert_eq!(seen[0].temperature, 0.3);
        assert_eq!(seen[0].messages[0].content, "critique prompt");

        let payload: Mapping = serde_yaml::from_str(&seen[0].messages[1].content).unwrap();
        let keys: Vec<_> = payload.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["language", "focus", "bible", "draft"]);
        assert_eq!(
            payload.get("draft"),
            Some(&Value::String("# Scene\n\nShe waited.\n".to_string()))
        );
    }

    #[tokio::test]
    async fn test_critique_writes_nothing() {
        let (temp, store) = story_fixture();
        let draft = temp.path().join("draft.md");
        std::fs::write(&draft, "text").unwrap();
        let model = CannedModel::new("notes");

        let request = CritiqueRequest {
            file: draft,
            focus: vec![],
        };
        run_critique(&Config::default(), &store, &model, &request)
            .await
            .unwrap();

        assert!(!store.outline_path().exists());
        assert_eq!(std::fs::read_dir(store.scenes_dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_draft() {
        let (temp, store) = story_fixture();
        let model = CannedModel::new("unused");
        let request = CritiqueRequest {
            file: temp.path().join("nope.md"),
            focus: vec![],
        };

        let err = run_critique(&Config::default(), &store, &model, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReadFile { .. }));
        assert!(model.requests().is_empty());
    }
}
