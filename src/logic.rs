//! Core behaviors shared by every upload handler.
//!
//! This includes:
//!   - The completion → flashcards pipeline (`parser` then `normalizer`)
//!   - The upload flow: size check, PDF text extraction, text budget, model call
//!   - Decoding base64 uploads

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{error, info, instrument};

use crate::domain::FlashcardSet;
use crate::error::{ApiError, FlashcardError};
use crate::normalizer::Normalizer;
use crate::parser;
use crate::pdf::{cap_text, extract_text};
use crate::state::AppState;

/// Raw model completion → validated flashcards. Pure; no I/O.
pub fn flashcards_from_completion(normalizer: &Normalizer, completion: &str) -> Result<FlashcardSet, FlashcardError> {
  let value = parser::parse(completion)?;
  normalizer.normalize(&value)
}

/// Full upload flow for one PDF.
#[instrument(level = "info", skip(state, pdf), fields(bytes = pdf.len(), file_name = file_name.unwrap_or("-")))]
pub async fn process_pdf(state: &AppState, pdf: Vec<u8>, file_name: Option<&str>) -> Result<FlashcardSet, ApiError> {
  if state.openai.is_none() {
    error!(target: "flashcards_backend", "OPENAI_API_KEY not set; cannot generate flashcards");
    return Err(ApiError::NotConfigured);
  }
  let limit = state.config.limits.max_file_bytes;
  if pdf.len() > limit {
    return Err(ApiError::PayloadTooLarge { limit });
  }

  let text = tokio::task::spawn_blocking(move || extract_text(&pdf))
    .await
    .map_err(|e| ApiError::Pdf(format!("extraction task failed: {e}")))??;
  let text = cap_text(text, &state.config.limits)?;

  flashcards_from_text(state, &text).await
}

/// Prompt the model with already-extracted text and normalize its answer.
#[instrument(level = "info", skip(state, text), fields(text_len = text.len()))]
pub async fn flashcards_from_text(state: &AppState, text: &str) -> Result<FlashcardSet, ApiError> {
  let oa = state.openai.as_ref().ok_or(ApiError::NotConfigured)?;
  let completion = oa
    .generate_flashcards(&state.config.prompts, text, state.normalizer.max_cards())
    .await
    .map_err(ApiError::Upstream)?;

  let set = flashcards_from_completion(&state.normalizer, &completion)?;
  info!(target: "flashcards", count = set.len(), tiers = ?set.tier_counts(), "Flashcards generated");
  Ok(set)
}

/// Decode a base64 upload, accepting an optional `data:...;base64,` prefix.
pub fn decode_base64_pdf(input: &str) -> Result<Vec<u8>, ApiError> {
  let payload = match input.split_once(";base64,") {
    Some((prefix, rest)) if prefix.starts_with("data:") => rest,
    _ => input,
  };
  let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
  if compact.is_empty() {
    return Err(ApiError::MissingPdf);
  }
  STANDARD
    .decode(compact.as_bytes())
    .map_err(|e| ApiError::BadRequest(format!("Invalid base64 PDF payload: {e}")))
}
