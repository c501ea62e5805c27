//! Domain models: a single flashcard and the bounded, ordered set returned per upload.

use serde::Serialize;

/// Lowest difficulty tier.
pub const MIN_CATEGORY: i64 = 1;
/// Highest difficulty tier.
pub const MAX_CATEGORY: i64 = 5;

/// One question/answer pair with its difficulty tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Flashcard {
  pub question: String,
  pub answer: String,
  /// Difficulty tier in `MIN_CATEGORY..=MAX_CATEGORY`.
  pub category: i64,
}

impl Flashcard {
  pub fn new(question: impl Into<String>, answer: impl Into<String>, category: i64) -> Self {
    Self { question: question.into(), answer: answer.into(), category }
  }
}

/// Ordered flashcards, order = difficulty order as produced by the model.
///
/// Only the normalizer builds non-empty sets; once handed out it is read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlashcardSet(Vec<Flashcard>);

impl FlashcardSet {
  pub(crate) fn from_cards(cards: Vec<Flashcard>) -> Self {
    Self(cards)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn cards(&self) -> &[Flashcard] {
    &self.0
  }

  /// Number of cards per tier, index 0 = tier 1.
  pub fn tier_counts(&self) -> [usize; MAX_CATEGORY as usize] {
    let mut counts = [0usize; MAX_CATEGORY as usize];
    for card in &self.0 {
      counts[(card.category - MIN_CATEGORY) as usize] += 1;
    }
    counts
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn set_serializes_as_plain_array() {
    let set = FlashcardSet::from_cards(vec![Flashcard::new("What is 2+2?", "4", 1)]);
    let json = serde_json::to_value(&set).unwrap();
    assert_eq!(json, serde_json::json!([{"question": "What is 2+2?", "answer": "4", "category": 1}]));
  }

  #[test]
  fn tier_counts_groups_by_category() {
    let set = FlashcardSet::from_cards(vec![
      Flashcard::new("a", "a", 1),
      Flashcard::new("b", "b", 1),
      Flashcard::new("c", "c", 5),
    ]);
    assert_eq!(set.tier_counts(), [2, 0, 0, 0, 1]);
  }
}
