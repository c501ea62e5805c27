//! Service configuration (prompts, model parameters, upload limits, normalizer policy) from TOML.
//!
//! Every section and field is optional; anything left out keeps its default.
//! See `AppConfig` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
  pub prompts: Prompts,
  pub model: ModelConfig,
  pub limits: Limits,
  pub normalizer: NormalizerConfig,
}

/// Prompts sent to the chat model. `{text}` and `{max_cards}` are filled per request.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub system: String,
  pub user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      system: "You create study flashcards from documents. Respond ONLY with a JSON array, no prose and no markdown fences.".into(),
      user_template: r#"Create {max_cards} flashcards from the following text. Each flashcard must have a "question", an "answer" and a "category".
The category is a difficulty level from 1 (easiest) to 5 (hardest): write three flashcards per level and order the array from level 1 to level 5.
The questions should test understanding of key concepts. Keep both questions and answers concise.

Example format:
[
  {"question": "What is the main concept?", "answer": "The clear, concise answer", "category": 1}
]

Text:
{text}"#
        .into(),
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
  pub name: String,
  pub temperature: f32,
  pub max_tokens: u32,
  pub timeout_secs: u64,
}

impl Default for ModelConfig {
  fn default() -> Self {
    Self { name: "gpt-3.5-turbo".into(), temperature: 0.7, max_tokens: 2000, timeout_secs: 60 }
  }
}

/// What to do with extracted text longer than `Limits::max_text_chars`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextOverflow {
  /// Keep the first `max_text_chars` characters.
  #[default]
  Truncate,
  /// Refuse the upload.
  Reject,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Limits {
  pub max_file_bytes: usize,
  pub max_text_chars: usize,
  pub text_overflow: TextOverflow,
}

impl Default for Limits {
  fn default() -> Self {
    Self { max_file_bytes: 5 * 1024 * 1024, max_text_chars: 10_000, text_overflow: TextOverflow::Truncate }
  }
}

/// How an individual malformed entry in the model output is treated.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntryPolicy {
  /// Substitute "Question N" / "Answer N" placeholders, never reject.
  #[default]
  Lenient,
  /// Fail the whole batch on a non-object entry or a blank question/answer.
  Strict,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
  /// Object keys searched for the card list, first present key wins.
  pub payload_keys: Vec<String>,
  pub max_cards: usize,
  pub entry_policy: EntryPolicy,
}

impl Default for NormalizerConfig {
  fn default() -> Self {
    Self {
      payload_keys: vec!["flashcards".into(), "cards".into()],
      max_cards: 15,
      entry_policy: EntryPolicy::Lenient,
    }
  }
}

impl AppConfig {
  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(s)
  }
}

/// Load `AppConfig` from FLASHCARDS_CONFIG_PATH. On any parsing/IO error, falls back to defaults.
pub fn load_config_from_env() -> AppConfig {
  let Ok(path) = std::env::var("FLASHCARDS_CONFIG_PATH") else {
    return AppConfig::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match AppConfig::from_toml_str(&s) {
      Ok(cfg) => {
        info!(target: "flashcards_backend", %path, "Loaded config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "flashcards_backend", %path, error = %e, "Failed to parse TOML config; using defaults");
        AppConfig::default()
      }
    },
    Err(e) => {
      error!(target: "flashcards_backend", %path, error = %e, "Failed to read TOML config file; using defaults");
      AppConfig::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_yields_defaults() {
    let cfg = AppConfig::from_toml_str("").unwrap();
    assert_eq!(cfg.limits.max_text_chars, 10_000);
    assert_eq!(cfg.limits.max_file_bytes, 5 * 1024 * 1024);
    assert_eq!(cfg.limits.text_overflow, TextOverflow::Truncate);
    assert_eq!(cfg.normalizer.payload_keys, vec!["flashcards", "cards"]);
    assert_eq!(cfg.normalizer.max_cards, 15);
    assert_eq!(cfg.normalizer.entry_policy, EntryPolicy::Lenient);
    assert_eq!(cfg.model.name, "gpt-3.5-turbo");
    assert!(cfg.prompts.user_template.contains("{text}"));
  }

  #[test]
  fn partial_sections_keep_other_defaults() {
    let cfg = AppConfig::from_toml_str(
      r#"
        [limits]
        text_overflow = "reject"

        [normalizer]
        entry_policy = "strict"
        payload_keys = ["cards"]

        [model]
        temperature = 0.2
      "#,
    )
    .unwrap();
    assert_eq!(cfg.limits.text_overflow, TextOverflow::Reject);
    assert_eq!(cfg.limits.max_text_chars, 10_000);
    assert_eq!(cfg.normalizer.entry_policy, EntryPolicy::Strict);
    assert_eq!(cfg.normalizer.payload_keys, vec!["cards"]);
    assert_eq!(cfg.normalizer.max_cards, 15);
    assert_eq!(cfg.model.max_tokens, 2000);
    assert!((cfg.model.temperature - 0.2).abs() < f32::EPSILON);
  }

  #[test]
  fn unknown_policy_is_an_error() {
    assert!(AppConfig::from_toml_str("[normalizer]\nentry_policy = \"maybe\"").is_err());
  }
}
