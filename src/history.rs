//! In-memory extraction history, newest first. Lives for the session only.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

const RECORD_ID_LEN: usize = 12;

/// Result of one successful capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    /// `data:` URL of the captured region.
    pub preview_image: String,
}

impl ExtractionRecord {
    pub fn new(text: String, preview_image: String) -> Self {
        Self {
            id: nanoid::nanoid!(RECORD_ID_LEN),
            timestamp: Utc::now(),
            text,
            preview_image,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct History {
    records: VecDeque<ExtractionRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `record`. Rejects a record whose id is already present.
    pub fn push(&mut self, record: ExtractionRecord) -> bool {
        if self.get(&record.id).is_some() {
            warn!(id = %record.id, "Duplicate history id, record dropped");
            return false;
        }
        debug!(id = %record.id, len = record.text.len(), "History record added");
        self.records.push_front(record);
        true
    }

    /// Removes the record with `id`, keeping the order of the others.
    pub fn remove(&mut self, id: &str) -> Option<ExtractionRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        self.records.remove(index)
    }

    pub fn get(&self, id: &str) -> Option<&ExtractionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn latest(&self) -> Option<&ExtractionRecord> {
        self.records.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> ExtractionRecord {
        ExtractionRecord {
            id: id.to_string(),
            timestamp: Utc::now(),
            text: format!("text {id}"),
            preview_image: String::new(),
        }
    }

    fn ids(history: &History) -> Vec<&str> {
        history.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_push_is_newest_first() {
        let mut history = History::new();
        history.push(record("a"));
        history.push(record("b"));
        history.push(record("c"));
        assert_eq!(ids(&history), ["c", "b", "a"]);
        assert_eq!(history.latest().map(|r| r.id.as_str()), Some("c"));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut history = History::new();
        for id in ["a", "b", "c", "d"] {
            history.push(record(id));
        }
        let removed = history.remove("b").unwrap();
        assert_eq!(removed.id, "b");
        assert_eq!(ids(&history), ["d", "c", "a"]);
        assert!(history.remove("b").is_none());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut history = History::new();
        assert!(history.push(record("a")));
        assert!(!history.push(record("a")));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_generated_ids_differ() {
        let a = ExtractionRecord::new("same".into(), String::new());
        let b = ExtractionRecord::new("same".into(), String::new());
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), RECORD_ID_LEN);
    }
}
