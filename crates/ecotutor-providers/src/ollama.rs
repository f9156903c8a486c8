//! Ollama (local model server) dialogue backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use ecotutor_core::error::DialogueError;
use ecotutor_core::traits::{clean_reply, DialogueModel, ReplyRequest, ReplyResponse};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
// Pulling a model can take a while on first use.
const PULL_TIMEOUT_SECS: u64 = 1800;

/// Dialogue backend talking to an Ollama server.
pub struct OllamaDialogue {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OllamaDialogue {
    pub fn new(base_url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DialogueError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            timeout_secs,
            client,
        })
    }

    fn unreachable(&self) -> DialogueError {
        DialogueError::NetworkError(format!(
            "Ollama not reachable at {}. Is it running? Start with: ollama serve",
            self.base_url
        ))
    }

    fn map_send_error(&self, e: reqwest::Error) -> DialogueError {
        if e.is_timeout() {
            DialogueError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            self.unreachable()
        } else {
            DialogueError::NetworkError(e.to_string())
        }
    }

    /// Names of the models the server already has.
    pub async fn local_models(&self) -> anyhow::Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let tags: OllamaTagsResponse =
            response.json().await.map_err(|e| DialogueError::ApiError {
                status: 0,
                message: format!("failed to parse tags response: {e}"),
            })?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Ask the server to fetch `model` from its registry.
    pub async fn pull(&self, model: &str) -> anyhow::Result<()> {
        tracing::warn!("pulling model {model} from the Ollama registry, this can take a while");
        let response = self
            .client
            .post(format!("{}/api/pull", self.base_url))
            .timeout(Duration::from_secs(PULL_TIMEOUT_SECS))
            .json(&OllamaPullRequest {
                model: model.to_string(),
                stream: false,
            })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(DialogueError::ModelNotFound(model.to_string()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(DialogueError::ApiError {
                status,
                message: body,
            }
            .into());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    raw: bool,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    top_k: u32,
    top_p: f64,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    model: String,
    response: String,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Serialize)]
struct OllamaPullRequest {
    model: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModelEntry>,
}

#[derive(Deserialize)]
struct OllamaModelEntry {
    name: String,
}

/// Ollama reports `name:tag`; a bare name means `:latest`.
pub fn same_model(listed: &str, wanted: &str) -> bool {
    listed == wanted || listed.strip_suffix(":latest") == Some(wanted)
}

#[async_trait]
impl DialogueModel for OllamaDialogue {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn warm_up(&self, model: &str) -> anyhow::Result<()> {
        let models = self.local_models().await?;
        if models.iter().any(|m| same_model(m, model)) {
            tracing::debug!("model {model} already available");
            return Ok(());
        }
        self.pull(model).await
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn reply(&self, request: &ReplyRequest) -> anyhow::Result<ReplyResponse> {
        let start = Instant::now();

        let body = OllamaGenerateRequest {
            model: request.model.clone(),
            prompt: format!("{}{}", request.prompt, request.end_of_turn),
            raw: true,
            stream: false,
            options: OllamaOptions {
                top_k: request.sampling.top_k,
                top_p: request.sampling.top_p,
                num_predict: request.sampling.max_new_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(DialogueError::ModelNotFound(format!(
                "Model '{}' not found locally. Pull it with: ollama pull {}",
                request.model, request.model
            ))
            .into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(DialogueError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let api_response: OllamaGenerateResponse =
            response.json().await.map_err(|e| DialogueError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        let text = clean_reply(&api_response.response, &request.end_of_turn);
        if text.is_empty() {
            return Err(DialogueError::EmptyReply.into());
        }

        Ok(ReplyResponse {
            text,
            model: api_response.model,
            generated_tokens: api_response.eval_count,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
