//! Command handlers
//!
//! Each generation command loads story state, builds a system + user request,
//! calls the model once and then persists or returns the reply.

mod critique;
mod outline;
mod scene;

pub use critique::*;
pub use outline::*;
pub use scene::*;

use crate::error::Result;
use crate::store::StoryStore;
use std::path::PathBuf;

/// Outcome of `init`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub story_dir: PathBuf,
    pub bible_created: bool,
}

/// Create the story directories and a starter bible if none exists
pub fn run_init(store: &StoryStore) -> Result<InitReport> {
    let bible_created = store.init()?;
    Ok(InitReport {
        story_dir: store.story_dir().to_path_buf(),
        bible_created,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::error::Result;
    use crate::message::ChatMessage;
    use crate::provider::Completion;
    use crate::store::{PromptKind, StoryStore};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// One recorded request
    #[derive(Debug, Clone)]
    pub struct SeenRequest {
        pub messages: Vec<ChatMessage>,
        pub temperature: f32,
        pub max_tokens: u32,
    }

    /// Returns a fixed reply and records what it was asked
    pub struct CannedModel {
        reply: String,
        seen: Mutex<Vec<SeenRequest>>,
    }

    impl CannedModel {
        pub fn new(reply: impl Into<String>) -> Self {
            Self {
                reply: reply.into(),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<SeenRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Completion for CannedModel {
        async fn completion(
            &self,
            messages: &[ChatMessage],
            temperature: f32,
            max_tokens: u32,
        ) -> Result<String> {
            self.seen.lock().unwrap().push(SeenRequest {
                messages: messages.to_vec(),
                temperature,
                max_tokens,
            });
            Ok(self.reply.clone())
        }
    }

    /// Store in a temp dir with all three prompt templates present
    pub fn story_fixture() -> (TempDir, StoryStore) {
        let temp = TempDir::new().unwrap();
        let store = StoryStore::new(temp.path().join("story"), temp.path().join("prompts"));
        std::fs::create_dir_all(temp.path().join("prompts")).unwrap();
        for kind in [PromptKind::Outline, PromptKind::Scene, PromptKind::Critique] {
            std::fs::write(store.prompt_path(kind), format!("{} prompt", kind)).unwrap();
        }
        store.ensure_dirs().unwrap();
        (temp, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_init() {
        let temp = TempDir::new().unwrap();
        let store = StoryStore::new(temp.path().join("story"), temp.path().join("prompts"));

        let report = run_init(&store).unwrap();
        assert!(report.bible_created);
        assert!(store.scenes_dir().is_dir());

        let report = run_init(&store).unwrap();
        assert!(!report.bible_created);
    }
}
