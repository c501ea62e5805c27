//! Minimal OpenAI client for our use-case.
//!
//! We only call chat.completions and return the raw completion text; turning
//! it into flashcards is the job of `parser` + `normalizer`.
//! Calls are instrumented and log model name, latency, and response size (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short to avoid PII leaks.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::config::{ModelConfig, Prompts};
use crate::util::{fill_template, trunc_for_log};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: ModelConfig,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  /// OPENAI_MODEL overrides the configured model name.
  pub fn from_env(model: &ModelConfig) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let mut model = model.clone();
    if let Ok(name) = std::env::var("OPENAI_MODEL") {
      model.name = name;
    }
    match Self::new(api_key, base_url, model) {
      Ok(oa) => Some(oa),
      Err(e) => {
        error!(target: "flashcards_backend", error = %e, "Failed to build HTTP client; OpenAI disabled");
        None
      }
    }
  }

  pub fn new(api_key: String, base_url: String, model: ModelConfig) -> Result<Self, String> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(model.timeout_secs))
      .build()
      .map_err(|e| e.to_string())?;
    let base_url = base_url.trim_end_matches('/').to_string();
    Ok(Self { client, api_key, base_url, model })
  }

  /// Plain-text chat completion.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model.name, user_len = user.len()))]
  async fn chat_plain(&self, system: &str, user: &str) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.name.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature: self.model.temperature,
      max_tokens: Some(self.model.max_tokens),
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "flashcards-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();

    if text.is_empty() {
      return Err("OpenAI returned an empty completion".into());
    }
    Ok(text)
  }

  /// Ask the model for flashcards about `text`. Returns the raw completion.
  #[instrument(level = "info", skip(self, prompts, text), fields(text_len = text.len(), %max_cards))]
  pub async fn generate_flashcards(
    &self,
    prompts: &Prompts,
    text: &str,
    max_cards: usize,
  ) -> Result<String, String> {
    let max_cards = max_cards.to_string();
    let user = fill_template(&prompts.user_template, &[("max_cards", max_cards.as_str()), ("text", text)]);
    let start = Instant::now();
    let result = self.chat_plain(&prompts.system, &user).await;
    let elapsed = start.elapsed();

    match &result {
      Ok(content) => {
        info!(?elapsed, content_len = content.len(), "Model response received successfully");
        debug!(preview = %trunc_for_log(content, 120), "Model response preview");
      }
      Err(e) => error!(?elapsed, error = %e, "Model call failed during flashcard generation"),
    }
    result
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
