//! ecotutor-providers: dialogue model backends and configuration.
//!
//! Implements the `DialogueModel` trait for a local Ollama server and a
//! scripted mock, and loads the tutor configuration that picks between them.

pub mod config;
pub mod mock;
pub mod ollama;

pub use config::{create_dialogue, load_config, DialogueConfig, TutorConfig};
pub use ecotutor_core::error::DialogueError;
