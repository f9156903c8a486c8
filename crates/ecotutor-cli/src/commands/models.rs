//! The `ecotutor models` command.

use std::path::PathBuf;

use anyhow::Result;

use ecotutor_providers::config::load_config_from;
use ecotutor_providers::ollama::{same_model, OllamaDialogue};
use ecotutor_providers::DialogueConfig;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    match &config.dialogue {
        DialogueConfig::Ollama {
            base_url,
            model,
            timeout_secs,
            ..
        } => {
            let backend = OllamaDialogue::new(base_url, *timeout_secs)?;
            let models = backend.local_models().await?;
            println!("Backend: ollama ({base_url})");
            if models.is_empty() {
                println!("  no models pulled yet");
            }
            for name in &models {
                let marker = if same_model(name, model) {
                    " (configured)"
                } else {
                    ""
                };
                println!("  {name}{marker}");
            }
        }
        DialogueConfig::Mock { replies } => {
            println!("Backend: mock ({} scripted replies)", replies.len());
        }
        DialogueConfig::Disabled => {
            println!("Small talk is disabled. Set [dialogue] in ecotutor.toml to enable it.");
        }
    }

    Ok(())
}
