//! On-disk story state
//!
//! Layout under the story directory:
//! - `bible.yaml`: setting and character facts, read-only here
//! - `outline.yaml`: chapter/section plan written by the outline command
//! - `scenes/scene_NNN.md`: generated scenes
//!
//! Prompt templates live in a separate directory as `{name}.txt`.

use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// First line written to `outline.yaml` when the model reply was not a mapping
pub const OUTLINE_FALLBACK_HEADER: &str = "# Model did not return valid YAML; raw output follows:";

const BIBLE_FILE: &str = "bible.yaml";
const OUTLINE_FILE: &str = "outline.yaml";
const SCENES_DIR: &str = "scenes";
const SCENE_GLOB: &str = "scene_*.md";

const BIBLE_STARTER: &str = "\
# Story bible: setting, characters and rules shared with every request.
# Any YAML mapping works. For example:
#
# world:
#   name: Harbor City
#   era: near future
# characters:
#   - name: Lin
#     role: protagonist
";

/// Logical names of the prompt templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Outline,
    Scene,
    Critique,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Outline => "outline",
            PromptKind::Scene => "scene",
            PromptKind::Critique => "critique",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of `outline.yaml`
#[derive(Debug, Clone, PartialEq)]
pub enum OutlineDocument {
    /// The model returned a YAML mapping
    Parsed(Mapping),
    /// The model returned something else; kept verbatim
    RawFallback(String),
}

impl OutlineDocument {
    /// Parse a model reply, falling back to the raw text when it is not a mapping.
    ///
    /// A mapping with a repeated key is rejected by the parser and kept raw.
    pub fn from_reply(reply: &str) -> Self {
        match serde_yaml::from_str::<Value>(reply) {
            Ok(Value::Mapping(mapping)) => OutlineDocument::Parsed(mapping),
            Ok(_) => OutlineDocument::RawFallback(reply.to_string()),
            Err(e) => {
                tracing::debug!(error = %e, "Outline reply is not YAML");
                OutlineDocument::RawFallback(reply.to_string())
            }
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, OutlineDocument::Parsed(_))
    }

    /// Value embedded in request payloads
    pub fn to_value(&self) -> Value {
        match self {
            OutlineDocument::Parsed(mapping) => Value::Mapping(mapping.clone()),
            OutlineDocument::RawFallback(text) => Value::String(text.clone()),
        }
    }
}

/// Reads and writes the story files
#[derive(Debug, Clone)]
pub struct StoryStore {
    story_dir: PathBuf,
    prompts_dir: PathBuf,
}

impl StoryStore {
    pub fn new(story_dir: impl Into<PathBuf>, prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            story_dir: story_dir.into(),
            prompts_dir: prompts_dir.into(),
        }
    }

    pub fn story_dir(&self) -> &Path {
        &self.story_dir
    }

    pub fn bible_path(&self) -> PathBuf {
        self.story_dir.join(BIBLE_FILE)
    }

    pub fn outline_path(&self) -> PathBuf {
        self.story_dir.join(OUTLINE_FILE)
    }

    pub fn scenes_dir(&self) -> PathBuf {
        self.story_dir.join(SCENES_DIR)
    }

    pub fn prompt_path(&self, kind: PromptKind) -> PathBuf {
        self.prompts_dir.join(format!("{}.txt", kind))
    }

    /// Create the story and scenes directories
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(self.scenes_dir())?;
        Ok(())
    }

    /// Create the directories and a starter bible. Returns true if the bible was created.
    pub fn init(&self) -> Result<bool> {
        self.ensure_dirs()?;
        let bible = self.bible_path();
        if bible.exists() {
            return Ok(false);
        }
        write_text(&bible, BIBLE_STARTER)?;
        tracing::info!(path = %bible.display(), "Created starter bible");
        Ok(true)
    }

    /// Load a YAML mapping. Missing files and null documents give an empty mapping.
    pub fn load(&self, path: &Path) -> Result<Mapping> {
        let Some(text) = read_optional(path)? else {
            return Ok(Mapping::new());
        };
        match serde_yaml::from_str::<Value>(&text)? {
            Value::Null => Ok(Mapping::new()),
            Value::Mapping(mapping) => Ok(mapping),
            _ => Err(Error::NotAMapping {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Write a mapping as YAML, keeping key order
    pub fn save(&self, path: &Path, data: &Mapping) -> Result<()> {
        let text = serde_yaml::to_string(data)?;
        write_text(path, &text)
    }

    pub fn load_bible(&self) -> Result<Mapping> {
        self.load(&self.bible_path())
    }

    /// Load the outline, accepting the raw-text fallback form
    pub fn load_outline(&self) -> Result<OutlineDocument> {
        let path = self.outline_path();
        let Some(text) = read_optional(&path)? else {
            return Ok(OutlineDocument::Parsed(Mapping::new()));
        };

        if let Some(raw) = text.strip_prefix(OUTLINE_FALLBACK_HEADER) {
            let raw = raw.strip_prefix('\n').unwrap_or(raw);
            return Ok(OutlineDocument::RawFallback(raw.to_string()));
        }

        match serde_yaml::from_str::<Value>(&text) {
            Ok(Value::Null) => Ok(OutlineDocument::Parsed(Mapping::new())),
            Ok(Value::Mapping(mapping)) => Ok(OutlineDocument::Parsed(mapping)),
            _ => Ok(OutlineDocument::RawFallback(text)),
        }
    }

    /// Overwrite `outline.yaml`
    pub fn save_outline(&self, outline: &OutlineDocument) -> Result<PathBuf> {
        let path = self.outline_path();
        match outline {
            OutlineDocument::Parsed(mapping) => self.save(&path, mapping)?,
            OutlineDocument::RawFallback(raw) => {
                write_text(&path, &format!("{}\n{}", OUTLINE_FALLBACK_HEADER, raw))?
            }
        }
        Ok(path)
    }

    /// Read a prompt template by logical name
    pub fn read_prompt(&self, kind: PromptKind) -> Result<String> {
        let path = self.prompt_path(kind);
        std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                Error::TemplateNotFound {
                    name: kind.to_string(),
                    path,
                }
            } else {
                Error::ReadFile { path, source }
            }
        })
    }

    /// Path for the next scene file.
    ///
    /// An explicit index is used as is, even if that file exists. Otherwise the
    /// index is the number of existing `scene_*.md` files plus one. Gaps in the
    /// numbering are not detected, so the result may collide with an existing
    /// scene; that case is logged and the file is overwritten.
    pub fn next_scene_path(&self, index: Option<u32>) -> Result<PathBuf> {
        self.ensure_dirs()?;
        let scenes_dir = self.scenes_dir();

        let index = match index {
            Some(index) => index,
            None => {
                let existing = count_scene_files(&scenes_dir)?;
                let next = u32::try_from(existing)
                    .ok()
                    .and_then(|n| n.checked_add(1))
                    .ok_or(Error::SceneIndexOverflow(existing))?;
                let path = scene_path(&scenes_dir, next);
                if path.exists() {
                    tracing::warn!(
                        path = %path.display(),
                        existing = existing,
                        "Auto-assigned scene index collides with an existing file; it will be overwritten"
                    );
                }
                next
            }
        };

        Ok(scene_path(&scenes_dir, index))
    }

    /// Write scene text verbatim
    pub fn write_scene(&self, path: &Path, text: &str) -> Result<()> {
        write_text(path, text)
    }
}

fn scene_pattern() -> &'static glob::Pattern {
    static PATTERN: OnceLock<glob::Pattern> = OnceLock::new();
    PATTERN.get_or_init(|| glob::Pattern::new(SCENE_GLOB).expect("valid scene file pattern"))
}

/// Count `scene_*.md` files, following symlinks. Directories are skipped.
fn count_scene_files(scenes_dir: &Path) -> Result<usize> {
    let pattern = scene_pattern();
    let mut count = 0;
    for entry in std::fs::read_dir(scenes_dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        if pattern.matches(&entry.file_name().to_string_lossy()) {
            count += 1;
        }
    }
    Ok(count)
}

fn scene_path(scenes_dir: &Path, index: u32) -> PathBuf {
    scenes_dir.join(format!("scene_{:03}.md", index))
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::ReadFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text).map_err(|source| Error::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}
