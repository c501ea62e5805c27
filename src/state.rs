//! Application state: configuration, optional OpenAI client, and the shared normalizer.
//!
//! Nothing here is mutated after startup; every request reads it through `Arc<AppState>`.

use tracing::{info, instrument, warn};

use crate::config::{load_config_from_env, AppConfig};
use crate::normalizer::Normalizer;
use crate::openai::OpenAI;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub openai: Option<OpenAI>,
    pub normalizer: Normalizer,
}

impl AppState {
    /// Build state from env: load config, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = load_config_from_env();
        let openai = OpenAI::from_env(&config.model);
        if let Some(oa) = &openai {
            info!(target: "flashcards_backend", base_url = %oa.base_url, model = %oa.model.name, "OpenAI enabled.");
        } else {
            warn!(target: "flashcards_backend", "OpenAI disabled (no OPENAI_API_KEY). Uploads will fail with a configuration error.");
        }
        Self::with_parts(config, openai)
    }

    pub fn with_parts(config: AppConfig, openai: Option<OpenAI>) -> Self {
        let normalizer = Normalizer::new(&config.normalizer);
        info!(
            target: "flashcards_backend",
            policy = ?normalizer.policy(),
            max_cards = normalizer.max_cards(),
            max_text_chars = config.limits.max_text_chars,
            max_file_bytes = config.limits.max_file_bytes,
            "Flashcard pipeline configured"
        );
        Self { config, openai, normalizer }
    }
}
