//! Turns a parsed model response of unknown shape into a [`FlashcardSet`].
//!
//! Steps, in order:
//! 1. pick the payload: a bare array, or the first configured key of an object
//! 2. require the payload to be an array
//! 3. coerce each entry (text fields trimmed, placeholders or rejection per
//!    [`EntryPolicy`], category parsed or derived from position)
//! 4. keep at most `max_cards` entries, order untouched
//! 5. refuse an empty result

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::config::{EntryPolicy, NormalizerConfig};
use crate::domain::{Flashcard, FlashcardSet, MAX_CATEGORY, MIN_CATEGORY};
use crate::error::FlashcardError;

/// Entries per difficulty band when the category has to be derived.
const BAND_SIZE: usize = 3;

#[derive(Clone, Debug)]
pub struct Normalizer {
    payload_keys: Vec<String>,
    max_cards: usize,
    policy: EntryPolicy,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&NormalizerConfig::default())
    }
}

impl Normalizer {
    pub fn new(cfg: &NormalizerConfig) -> Self {
        if cfg.max_cards == 0 {
            warn!(target: "flashcards", "normalizer.max_cards = 0 would reject every response; using 1");
        }
        Self {
            payload_keys: cfg.payload_keys.clone(),
            max_cards: cfg.max_cards.max(1),
            policy: cfg.entry_policy,
        }
    }

    pub fn policy(&self) -> EntryPolicy {
        self.policy
    }

    pub fn max_cards(&self) -> usize {
        self.max_cards
    }

    #[instrument(level = "debug", skip(self, value), fields(policy = ?self.policy))]
    pub fn normalize(&self, value: &Value) -> Result<FlashcardSet, FlashcardError> {
        let entries = self.payload(value)?;
        let total = entries.len();

        let cards = entries
            .iter()
            .take(self.max_cards)
            .enumerate()
            .map(|(i, entry)| self.coerce_entry(i, entry))
            .collect::<Result<Vec<_>, _>>()?;

        if cards.is_empty() {
            return Err(FlashcardError::NoFlashcards);
        }
        if total > cards.len() {
            debug!(target: "flashcards", total, kept = cards.len(), "Truncated flashcards");
        }
        Ok(FlashcardSet::from_cards(cards))
    }

    /// Locate the list of entries inside `value`.
    fn payload<'a>(&self, value: &'a Value) -> Result<&'a [Value], FlashcardError> {
        let candidate = match value {
            Value::Array(items) => return Ok(items),
            Value::Object(map) => match self.payload_keys.iter().find_map(|k| map.get(k)) {
                Some(v) => v,
                None => return Ok(&[]),
            },
            _ => value,
        };
        match candidate {
            Value::Array(items) => Ok(items),
            _ => Err(FlashcardError::InvalidShape),
        }
    }

    fn coerce_entry(&self, index: usize, entry: &Value) -> Result<Flashcard, FlashcardError> {
        let empty = Map::new();
        let fields = match (entry, self.policy) {
            (Value::Object(map), _) => map,
            (_, EntryPolicy::Strict) => return Err(FlashcardError::InvalidEntry { index }),
            (_, EntryPolicy::Lenient) => &empty,
        };

        let question = text_field(fields, "question");
        let answer = text_field(fields, "answer");
        if self.policy == EntryPolicy::Strict && (question.is_empty() || answer.is_empty()) {
            return Err(FlashcardError::InvalidEntry { index });
        }

        Ok(Flashcard::new(
            or_placeholder(question, "Question", index),
            or_placeholder(answer, "Answer", index),
            category_field(fields).unwrap_or_else(|| fallback_category(index)),
        ))
    }
}

/// Field coerced to trimmed text; missing, `null` and `false` become empty.
fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    let raw = match fields.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => return String::new(),
        Some(other) => other.to_string(),
    };
    raw.trim().to_string()
}

fn or_placeholder(text: String, label: &str, index: usize) -> String {
    if text.is_empty() { format!("{label} {}", index + 1) } else { text }
}

/// Explicit category if it is an integer (or integer text) inside the tier range.
fn category_field(fields: &Map<String, Value>) -> Option<i64> {
    let n = match fields.get("category")? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (MIN_CATEGORY..=MAX_CATEGORY).contains(&n).then_some(n)
}

/// Bands of three, easiest first, capped at the top tier.
fn fallback_category(index: usize) -> i64 {
    ((index / BAND_SIZE) as i64 + MIN_CATEGORY).min(MAX_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strict() -> Normalizer {
        Normalizer::new(&NormalizerConfig { entry_policy: EntryPolicy::Strict, ..Default::default() })
    }

    fn valid_entries(n: usize) -> Value {
        Value::Array(
            (0..n)
                .map(|i| json!({"question": format!("q{i}"), "answer": format!("a{i}"), "category": 1}))
                .collect(),
        )
    }

    #[test]
    fn bare_array_is_used_directly() {
        let set = Normalizer::default()
            .normalize(&json!([{"question": " What? ", "answer": " That. ", "category": 2}]))
            .unwrap();
        assert_eq!(set.cards(), &[Flashcard::new("What?", "That.", 2)]);
    }

    #[test]
    fn payload_keys_follow_precedence() {
        let n = Normalizer::default();
        let both = json!({
            "cards": [{"question": "from cards", "answer": "a"}],
            "flashcards": [{"question": "from flashcards", "answer": "a"}]
        });
        assert_eq!(n.normalize(&both).unwrap().cards()[0].question, "from flashcards");

        let cards_only = json!({"cards": [{"question": "c", "answer": "a"}]});
        assert_eq!(n.normalize(&cards_only).unwrap().cards()[0].question, "c");
    }

    #[test]
    fn custom_payload_keys() {
        let n = Normalizer::new(&NormalizerConfig {
            payload_keys: vec!["items".into()],
            ..Default::default()
        });
        let set = n.normalize(&json!({"items": [{"question": "q", "answer": "a"}]})).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(n.normalize(&json!({"flashcards": [{"question": "q"}]})), Err(FlashcardError::NoFlashcards));
    }

    #[test]
    fn object_without_payload_key_has_no_flashcards() {
        let err = Normalizer::default().normalize(&json!({"result": "ok"})).unwrap_err();
        assert_eq!(err, FlashcardError::NoFlashcards);
    }

    #[test]
    fn non_list_payloads_are_invalid_shape() {
        let n = Normalizer::default();
        assert_eq!(n.normalize(&json!({"flashcards": "none"})), Err(FlashcardError::InvalidShape));
        assert_eq!(n.normalize(&json!({"cards": {"question": "q"}})), Err(FlashcardError::InvalidShape));
        assert_eq!(n.normalize(&json!("text")), Err(FlashcardError::InvalidShape));
        assert_eq!(n.normalize(&json!(7)), Err(FlashcardError::InvalidShape));
        assert_eq!(n.normalize(&Value::Null), Err(FlashcardError::InvalidShape));
    }

    #[test]
    fn output_is_bounded() {
        let n = Normalizer::default();
        for count in [1usize, 5, 14, 15, 16, 100, 1000] {
            let set = n.normalize(&valid_entries(count)).unwrap();
            assert_eq!(set.len(), count.min(15), "count = {count}");
        }
        assert_eq!(n.normalize(&valid_entries(0)), Err(FlashcardError::NoFlashcards));
    }

    #[test]
    fn truncation_keeps_first_entries_in_order() {
        let set = Normalizer::default().normalize(&valid_entries(20)).unwrap();
        let questions: Vec<_> = set.cards().iter().map(|c| c.question.as_str()).collect();
        let expected: Vec<String> = (0..15).map(|i| format!("q{i}")).collect();
        assert_eq!(questions, expected);
    }

    #[test]
    fn empty_entry_gets_placeholders() {
        let set = Normalizer::default().normalize(&json!([{"question": "q", "answer": "a"}, {}, {}])).unwrap();
        assert_eq!(set.cards()[2], Flashcard::new("Question 3", "Answer 3", 1));
    }

    #[test]
    fn blank_and_falsy_fields_get_placeholders() {
        let set = Normalizer::default()
            .normalize(&json!([{"question": "   ", "answer": null}, {"question": false, "answer": 0}]))
            .unwrap();
        assert_eq!(set.cards()[0].question, "Question 1");
        assert_eq!(set.cards()[0].answer, "Answer 1");
        assert_eq!(set.cards()[1].question, "Question 2");
        assert_eq!(set.cards()[1].answer, "Answer 2");
    }

    #[test]
    fn non_text_fields_are_stringified() {
        let set = Normalizer::default()
            .normalize(&json!([{"question": 42, "answer": true}]))
            .unwrap();
        assert_eq!(set.cards()[0], Flashcard::new("42", "true", 1));
    }

    #[test]
    fn lenient_policy_accepts_non_object_entries() {
        let set = Normalizer::default().normalize(&json!(["loose text", 3])).unwrap();
        assert_eq!(set.cards()[0], Flashcard::new("Question 1", "Answer 1", 1));
        assert_eq!(set.cards()[1], Flashcard::new("Question 2", "Answer 2", 1));
    }

    #[test]
    fn category_text_is_parsed() {
        let set = Normalizer::default()
            .normalize(&json!([{"question": "q", "answer": "a", "category": "3"}]))
            .unwrap();
        assert_eq!(set.cards()[0].category, 3);
    }

    #[test]
    fn unparseable_category_uses_position() {
        let mut entries: Vec<Value> = (0..7).map(|i| json!({"question": format!("q{i}"), "answer": "a"})).collect();
        entries[6]["category"] = json!("abc");
        let set = Normalizer::default().normalize(&Value::Array(entries)).unwrap();
        assert_eq!(set.cards()[6].category, 3);
    }

    #[test]
    fn fallback_category_bands_of_three_capped_at_five() {
        let entries: Vec<Value> = (0..15).map(|_| json!({"question": "q", "answer": "a"})).collect();
        let set = Normalizer::default().normalize(&Value::Array(entries)).unwrap();
        let cats: Vec<i64> = set.cards().iter().map(|c| c.category).collect();
        assert_eq!(cats, vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4, 5, 5, 5]);
        assert_eq!(fallback_category(40), 5);
    }

    #[test]
    fn out_of_range_or_fractional_category_uses_position() {
        let set = Normalizer::default()
            .normalize(&json!([
                {"question": "q", "answer": "a", "category": 9},
                {"question": "q", "answer": "a", "category": 0},
                {"question": "q", "answer": "a", "category": 2.5},
                {"question": "q", "answer": "a", "category": 4.0},
            ]))
            .unwrap();
        let cats: Vec<i64> = set.cards().iter().map(|c| c.category).collect();
        assert_eq!(cats, vec![1, 1, 1, 4]);
    }

    #[test]
    fn strict_policy_rejects_non_object_entry() {
        let err = strict()
            .normalize(&json!([{"question": "q", "answer": "a"}, "oops"]))
            .unwrap_err();
        assert_eq!(err, FlashcardError::InvalidEntry { index: 1 });
    }

    #[test]
    fn strict_policy_rejects_blank_fields() {
        let err = strict()
            .normalize(&json!([{"question": "q", "answer": "a"}, {"question": "q", "answer": "  "}]))
            .unwrap_err();
        assert_eq!(err, FlashcardError::InvalidEntry { index: 1 });
    }

    #[test]
    fn strict_policy_ignores_entries_past_the_cap() {
        let mut entries = valid_entries(15);
        entries.as_array_mut().unwrap().push(json!("dropped anyway"));
        assert_eq!(strict().normalize(&entries).unwrap().len(), 15);
    }

    #[test]
    fn zero_cap_is_raised_to_one() {
        let n = Normalizer::new(&NormalizerConfig { max_cards: 0, ..Default::default() });
        assert_eq!(n.max_cards(), 1);
        assert_eq!(n.normalize(&valid_entries(3)).unwrap().len(), 1);
    }

    #[test]
    fn fenced_completion_end_to_end() {
        let text = "```json\n[{\"question\":\"What is 2+2?\",\"answer\":\"4\",\"category\":1}]\n```";
        let value = crate::parser::parse(text).unwrap();
        let set = Normalizer::default().normalize(&value).unwrap();
        assert_eq!(set.cards(), &[Flashcard::new("What is 2+2?", "4", 1)]);
    }
}
