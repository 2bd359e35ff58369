use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Phase name recorded for cards whose `current_phase` is null.
pub const UNKNOWN_PHASE: &str = "N/A";

/// One card of a pipeline, normalized from the GraphQL node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<FixedOffset>,
    pub phase: String,
    pub labels: Vec<String>,
}

impl Card {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.trim() == label)
    }

    /// Phase name trimmed and lowercased, for matching against configured phase lists.
    pub fn normalized_phase(&self) -> String {
        normalize_phase(&self.phase)
    }
}

pub fn normalize_phase(phase: &str) -> String {
    phase.trim().to_lowercase()
}

/// Every card of a pipeline, in the order the service returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CardTable {
    pub cards: Vec<Card>,
}

impl CardTable {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }
}

impl<'a> IntoIterator for &'a CardTable {
    type Item = &'a Card;
    type IntoIter = std::slice::Iter<'a, Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}
