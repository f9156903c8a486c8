//! Tutor configuration and dialogue backend factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ecotutor_core::dataset::DEFAULT_DATASET_PATH;
use ecotutor_core::session::{SessionConfig, SmallTalkConfig};
use ecotutor_core::traits::{
    DialogueModel, SamplingParams, DEFAULT_DIALOGUE_MODEL, DEFAULT_END_OF_TURN,
    DEFAULT_SMALL_TALK_PROMPT,
};

use crate::mock::MockDialogue;
use crate::ollama::{OllamaDialogue, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// Which dialogue backend produces small talk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DialogueConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_model")]
        model: String,
        #[serde(default = "default_end_of_turn")]
        end_of_turn: String,
        #[serde(default = "default_top_k")]
        top_k: u32,
        #[serde(default = "default_top_p")]
        top_p: f64,
        #[serde(default = "default_max_new_tokens")]
        max_new_tokens: u32,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    /// Scripted replies, for demos and tests.
    Mock {
        #[serde(default)]
        replies: Vec<String>,
    },
    /// No dialogue model; small talk never happens.
    #[serde(rename = "none")]
    Disabled,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        DialogueConfig::Ollama {
            base_url: default_ollama_url(),
            model: default_model(),
            end_of_turn: default_end_of_turn(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_new_tokens: default_max_new_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_ollama_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_model() -> String {
    DEFAULT_DIALOGUE_MODEL.to_string()
}
fn default_end_of_turn() -> String {
    DEFAULT_END_OF_TURN.to_string()
}
fn default_top_k() -> u32 {
    SamplingParams::default().top_k
}
fn default_top_p() -> f64 {
    SamplingParams::default().top_p
}
fn default_max_new_tokens() -> u32 {
    SamplingParams::default().max_new_tokens
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Top-level ecotutor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorConfig {
    /// Question dataset to load.
    #[serde(default = "default_dataset")]
    pub dataset: PathBuf,
    /// Chance of small talk before each question.
    #[serde(default = "default_probability")]
    pub small_talk_probability: f64,
    /// Prompt sent to the dialogue model for small talk.
    #[serde(default = "default_prompt")]
    pub small_talk_prompt: String,
    /// Print "(Question n of m)" before each question.
    #[serde(default = "default_true")]
    pub show_progress: bool,
    /// Dialogue backend.
    #[serde(default)]
    pub dialogue: DialogueConfig,
}

fn default_dataset() -> PathBuf {
    PathBuf::from(DEFAULT_DATASET_PATH)
}
fn default_probability() -> f64 {
    0.3
}
fn default_prompt() -> String {
    DEFAULT_SMALL_TALK_PROMPT.to_string()
}
fn default_true() -> bool {
    true
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset(),
            small_talk_probability: default_probability(),
            small_talk_prompt: default_prompt(),
            show_progress: true,
            dialogue: DialogueConfig::default(),
        }
    }
}

impl TutorConfig {
    /// Reject settings no session can run with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.small_talk_probability),
            "small_talk_probability must be between 0.0 and 1.0, got {}",
            self.small_talk_probability
        );
        if let DialogueConfig::Ollama { top_p, top_k, .. } = &self.dialogue {
            anyhow::ensure!(
                *top_p > 0.0 && *top_p <= 1.0,
                "top_p must be in (0.0, 1.0], got {top_p}"
            );
            anyhow::ensure!(*top_k >= 1, "top_k must be at least 1");
        }
        Ok(())
    }

    /// Session settings derived from this config.
    pub fn session_config(&self) -> SessionConfig {
        let mut small_talk = SmallTalkConfig {
            probability: self.small_talk_probability,
            prompt: self.small_talk_prompt.clone(),
            ..Default::default()
        };

        match &self.dialogue {
            DialogueConfig::Ollama {
                model,
                end_of_turn,
                top_k,
                top_p,
                max_new_tokens,
                ..
            } => {
                small_talk.model = model.clone();
                small_talk.end_of_turn = end_of_turn.clone();
                small_talk.sampling = SamplingParams {
                    top_k: *top_k,
                    top_p: *top_p,
                    max_new_tokens: *max_new_tokens,
                };
            }
            DialogueConfig::Mock { .. } => small_talk.model = "mock".to_string(),
            DialogueConfig::Disabled => small_talk.probability = 0.0,
        }

        SessionConfig {
            small_talk,
            show_progress: self.show_progress,
        }
    }

    /// Model name to warm up, if the backend has one.
    pub fn model_name(&self) -> Option<&str> {
        match &self.dialogue {
            DialogueConfig::Ollama { model, .. } => Some(model.as_str()),
            _ => None,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + len];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `ecotutor.toml` in the current directory
/// 2. `~/.config/ecotutor/config.toml`
///
/// Environment variable overrides: `ECOTUTOR_OLLAMA_URL`, `ECOTUTOR_MODEL`.
pub fn load_config() -> Result<TutorConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<TutorConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("ecotutor.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => TutorConfig::default(),
    };

    apply_env_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Parse a config from TOML text, resolving `${VAR}` references.
pub fn parse_config(content: &str) -> Result<TutorConfig> {
    let mut config: TutorConfig = toml::from_str(content)?;
    if let DialogueConfig::Ollama {
        base_url, model, ..
    } = &mut config.dialogue
    {
        *base_url = resolve_env_vars(base_url);
        *model = resolve_env_vars(model);
    }
    Ok(config)
}

fn apply_env_overrides(config: &mut TutorConfig) {
    if let DialogueConfig::Ollama {
        base_url, model, ..
    } = &mut config.dialogue
    {
        if let Ok(url) = std::env::var("ECOTUTOR_OLLAMA_URL") {
            *base_url = url;
        }
        if let Ok(name) = std::env::var("ECOTUTOR_MODEL") {
            *model = name;
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("ecotutor"))
}

/// Create the dialogue backend described by `config`. `None` when small talk
/// is disabled.
pub fn create_dialogue(config: &DialogueConfig) -> Result<Option<Arc<dyn DialogueModel>>> {
    let dialogue: Arc<dyn DialogueModel> = match config {
        DialogueConfig::Ollama {
            base_url,
            timeout_secs,
            ..
        } => Arc::new(OllamaDialogue::new(base_url, *timeout_secs)?),
        DialogueConfig::Mock { replies } => Arc::new(MockDialogue::new(replies.clone())),
        DialogueConfig::Disabled => return Ok(None),
    };
    Ok(Some(dialogue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_ECOTUTOR_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_ECOTUTOR_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_ECOTUTOR_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("no vars"), "no vars");
        assert_eq!(resolve_env_vars("open ${ never closed"), "open ${ never closed");
        std::env::remove_var("_ECOTUTOR_TEST_VAR");
    }

    #[test]
    fn resolve_env_vars_does_not_expand_values_again() {
        std::env::set_var("_ECOTUTOR_SELF_REF", "${_ECOTUTOR_SELF_REF}");
        assert_eq!(
            resolve_env_vars("http://${_ECOTUTOR_SELF_REF}/api"),
            "http://${_ECOTUTOR_SELF_REF}/api"
        );
        std::env::set_var("_ECOTUTOR_NESTED", "${HOME}");
        assert_eq!(resolve_env_vars("${_ECOTUTOR_NESTED}x"), "${HOME}x");
        std::env::remove_var("_ECOTUTOR_SELF_REF");
        std::env::remove_var("_ECOTUTOR_NESTED");
    }

    #[test]
    fn default_config() {
        let config = TutorConfig::default();
        assert_eq!(config.dataset, PathBuf::from(DEFAULT_DATASET_PATH));
        assert_eq!(config.small_talk_probability, 0.3);
        assert_eq!(config.small_talk_prompt, "Student: Hi\nTeacher:");
        assert_eq!(config.model_name(), Some("qwen2.5:0.5b"));
        assert_eq!(
            config.session_config().small_talk.model,
            SmallTalkConfig::default().model
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_ollama_config() {
        let toml_str = r#"
dataset = "questions.json"
small_talk_probability = 0.5

[dialogue]
type = "ollama"
base_url = "http://gpu-box:11434"
model = "qwen2.5:1.5b"
top_k = 20
"#;
        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.dataset, PathBuf::from("questions.json"));
        let session = config.session_config();
        assert_eq!(session.small_talk.probability, 0.5);
        assert_eq!(session.small_talk.model, "qwen2.5:1.5b");
        assert_eq!(session.small_talk.sampling.top_k, 20);
        assert_eq!(session.small_talk.sampling.top_p, 0.95);
        assert_eq!(session.small_talk.end_of_turn, "<|endoftext|>");
        assert!(matches!(
            config.dialogue,
            DialogueConfig::Ollama { ref base_url, .. } if base_url == "http://gpu-box:11434"
        ));
    }

    #[test]
    fn parse_disabled_dialogue() {
        let config = parse_config("[dialogue]\ntype = \"none\"\n").unwrap();
        assert_eq!(config.dialogue, DialogueConfig::Disabled);
        assert_eq!(config.session_config().small_talk.probability, 0.0);
        assert!(create_dialogue(&config.dialogue).unwrap().is_none());
    }

    #[test]
    fn parse_mock_dialogue() {
        let config =
            parse_config("[dialogue]\ntype = \"mock\"\nreplies = [\"Hi!\", \"Nice day.\"]\n")
                .unwrap();
        let dialogue = create_dialogue(&config.dialogue).unwrap().unwrap();
        assert_eq!(dialogue.name(), "mock");
        assert_eq!(config.model_name(), None);
    }

    #[test]
    fn model_name_from_env_reference() {
        std::env::set_var("_ECOTUTOR_TEST_MODEL", "tinychat");
        let config =
            parse_config("[dialogue]\ntype = \"ollama\"\nmodel = \"${_ECOTUTOR_TEST_MODEL}\"\n")
                .unwrap();
        assert_eq!(config.model_name(), Some("tinychat"));
        std::env::remove_var("_ECOTUTOR_TEST_MODEL");
    }

    #[test]
    fn probability_out_of_range_is_rejected() {
        let config = parse_config("small_talk_probability = 1.5\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_missing_path_fails() {
        let err = load_config_from(Some(Path::new("/nope/ecotutor.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecotutor.toml");
        std::fs::write(&path, "show_progress = false\n[dialogue]\ntype = \"none\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert!(!config.show_progress);
        assert_eq!(config.dialogue, DialogueConfig::Disabled);
    }
}
