//! Lenient JSON recovery for model completions.
//!
//! Models are asked for bare JSON but regularly wrap it in markdown fences or
//! surround it with prose. [`parse`] tries three strategies from strictest to
//! loosest and returns the first value that parses:
//!
//! 1. the whole completion as-is
//! 2. the completion with every code-fence marker removed
//! 3. the span from the first `[` to the last `]`
//!
//! A stricter stage always wins, so an object that happens to contain an
//! array is returned whole rather than reduced to the inner array.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::FlashcardError;
use crate::util::take_chars;

/// Characters of the completion kept in a `MalformedResponse` preview.
pub const PREVIEW_CHARS: usize = 100;

// Opening fence with an optional language tag, or a bare closing fence.
static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z0-9_+.-]*").unwrap());

// Greedy: first `[` through the last `]` anywhere in the text.
static RE_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

/// Parse a model completion into a JSON value, tolerating fences and prose.
#[instrument(level = "debug", skip(text), fields(text_len = text.len()))]
pub fn parse(text: &str) -> Result<Value, FlashcardError> {
    if let Ok(v) = serde_json::from_str::<Value>(text) {
        debug!(target: "flashcards", stage = "direct", "Parsed model response");
        return Ok(v);
    }

    if let Ok(v) = serde_json::from_str::<Value>(&strip_fences(text)) {
        debug!(target: "flashcards", stage = "fence_stripped", "Parsed model response");
        return Ok(v);
    }

    if let Some(m) = RE_ARRAY.find(text) {
        if let Ok(v) = serde_json::from_str::<Value>(m.as_str()) {
            debug!(target: "flashcards", stage = "array_extracted", "Parsed model response");
            return Ok(v);
        }
    }

    Err(FlashcardError::MalformedResponse {
        preview: take_chars(text, PREVIEW_CHARS).to_string(),
    })
}

/// Remove every markdown fence marker and trim the result.
fn strip_fences(text: &str) -> String {
    RE_FENCE.replace_all(text, "").trim().to_string()
}
