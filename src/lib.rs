//! Story Agent - an LLM writing assistant for long-form fiction
//!
//! This crate provides:
//! - A provider client over OpenAI-compatible and Ollama chat APIs
//! - A YAML story store (bible, outline, scene files, prompt templates)
//! - Outline, scene and critique commands built on both

pub mod commands;
pub mod config;
pub mod error;
pub mod message;
pub mod provider;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use error::{Error, Result};
pub use message::{build_messages, ChatMessage, Role};
pub use provider::{Completion, ProviderClient, ProviderKind, ProviderSettings};
pub use store::{OutlineDocument, PromptKind, StoryStore};
pub use telemetry::Telemetry;
