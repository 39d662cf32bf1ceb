//! Configuration for the story agent
//!
//! Values are layered: built-in defaults, then the `PROVIDER` / `MODEL`
//! environment variables, then an optional YAML config file, then CLI flags.

use crate::error::{Error, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LANGUAGE: &str = "zh";

/// Per-invocation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Provider selector ("openai" or "ollama")
    pub provider: String,

    /// Model name/ID
    pub model: String,

    /// Output language requested from the model
    pub language: String,

    pub temperature_outline: f32,
    pub temperature_scene: f32,
    pub temperature_critique: f32,

    /// Maximum tokens for each response
    pub max_output_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            temperature_outline: 0.8,
            temperature_scene: 0.5,
            temperature_critique: 0.3,
            max_output_tokens: 1200,
        }
    }
}

/// Optional values read from the config file. Keys not listed here are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
    pub temperature_outline: Option<f32>,
    pub temperature_scene: Option<f32>,
    pub temperature_critique: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl ConfigOverrides {
    /// Parse config file text after `${VAR}` substitution
    pub fn parse(text: &str) -> Result<Self> {
        let expanded = substitute_env(text, |name| std::env::var(name).ok());
        let value: serde_yaml::Value = serde_yaml::from_str(&expanded)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_value(value)?)
    }
}

impl Config {
    /// Defaults with `PROVIDER` and `MODEL` taken from the environment when set
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(provider) = non_empty("PROVIDER") {
            config.provider = provider;
        }
        if let Some(model) = non_empty("MODEL") {
            config.model = model;
        }
        config
    }

    /// Environment defaults overlaid with the config file at `path`.
    ///
    /// A missing file leaves the defaults untouched.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_env();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(config);
            }
            Err(source) => {
                return Err(Error::ReadFile {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        config.apply(ConfigOverrides::parse(&text)?);
        tracing::debug!(path = %path.display(), ?config, "Loaded config file");
        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            provider,
            model,
            language,
            temperature_outline,
            temperature_scene,
            temperature_critique,
            max_output_tokens,
        } = overrides;

        if let Some(v) = provider {
            self.provider = v;
        }
        if let Some(v) = model {
            self.model = v;
        }
        if let Some(v) = language {
            self.language = v;
        }
        if let Some(v) = temperature_outline {
            self.temperature_outline = v;
        }
        if let Some(v) = temperature_scene {
            self.temperature_scene = v;
        }
        if let Some(v) = temperature_critique {
            self.temperature_critique = v;
        }
        if let Some(v) = max_output_tokens {
            self.max_output_tokens = v;
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        if let Some(language) = language {
            self.language = language;
        }
        self
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"))
}

/// Replace `${NAME}` with the value `lookup` returns for NAME.
///
/// Placeholders with no value are left as written.
pub fn substitute_env(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    placeholder_regex()
        .replace_all(text, |caps: &Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
