use std::collections::VecDeque;

use super::entry::ClipboardEntry;
use crate::ids::NodeId;

pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Append-only, bounded sequence of clipboard entries.
///
/// Invariant: no two consecutive entries carry the same `value`, whatever
/// their origin. When the buffer is full the oldest entry is evicted; dropping
/// the head can never create a new adjacent pair.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<ClipboardEntry>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Append `value` unless it equals the most recent value.
    ///
    /// Returns `true` if a new entry was stored.
    pub fn append(&mut self, value: impl Into<String>, origin: NodeId) -> bool {
        let value = value.into();
        if self.latest().is_some_and(|last| last.value == value) {
            return false;
        }

        if self.entries.len() == self.capacity {
            let _evicted = self.entries.pop_front();
            #[cfg(feature = "tracing")]
            tracing::trace!(capacity = self.capacity, "history full, evicted oldest entry");
        }
        self.entries.push_back(ClipboardEntry::new(value, origin));
        true
    }

    pub fn latest(&self) -> Option<&ClipboardEntry> {
        self.entries.back()
    }

    pub fn snapshot(&self) -> Vec<ClipboardEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> NodeId {
        NodeId::new(id)
    }

    fn values(history: &History) -> Vec<(String, String)> {
        history
            .snapshot()
            .into_iter()
            .map(|e| (e.value, e.origin.into_inner()))
            .collect()
    }

    #[test]
    fn test_append_to_empty_history() {
        let mut history = History::default();
        assert!(history.latest().is_none());

        assert!(history.append("foo", node("A")));

        let latest = history.latest().expect("latest entry");
        assert_eq!(latest.value, "foo");
        assert_eq!(latest.origin, node("A"));
    }

    #[test]
    fn test_same_value_from_other_origin_is_noop() {
        let mut history = History::default();
        assert!(history.append("v", node("A")));
        assert!(!history.append("v", node("B")));

        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().map(|e| e.origin.clone()), Some(node("A")));
    }

    #[test]
    fn test_foo_foo_bar_scenario() {
        let mut history = History::default();
        assert!(history.append("foo", node("A")));
        assert!(!history.append("foo", node("A")));
        assert!(history.append("bar", node("A")));

        assert_eq!(
            values(&history),
            vec![
                ("foo".to_string(), "A".to_string()),
                ("bar".to_string(), "A".to_string())
            ]
        );
    }

    #[test]
    fn test_non_adjacent_repeat_is_kept() {
        let mut history = History::default();
        history.append("a", node("A"));
        history.append("b", node("A"));
        assert!(history.append("a", node("B")));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_no_adjacent_duplicates_for_arbitrary_sequences() {
        let inputs = ["x", "x", "y", "x", "y", "y", "y", "z", "x", "x", "", "", "z"];
        let origins = ["A", "B", "C"];
        let mut history = History::with_capacity(5);

        for (i, value) in inputs.iter().enumerate() {
            history.append(*value, node(origins[i % origins.len()]));
            let snapshot = history.snapshot();
            assert!(snapshot.len() <= 5);
            for pair in snapshot.windows(2) {
                assert_ne!(pair[0].value, pair[1].value);
            }
        }
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::with_capacity(2);
        history.append("one", node("A"));
        history.append("two", node("A"));
        history.append("three", node("A"));

        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].value, "two");
        assert_eq!(snapshot[1].value, "three");
    }

    #[test]
    fn test_zero_capacity_is_normalised() {
        let mut history = History::with_capacity(0);
        assert_eq!(history.capacity(), 1);
        history.append("a", node("A"));
        history.append("b", node("A"));
        assert_eq!(values(&history), vec![("b".to_string(), "A".to_string())]);
        assert!(!history.append("b", node("B")));
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut history = History::default();
        history.append("a", node("A"));
        let snapshot = history.snapshot();
        history.append("b", node("A"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(history.len(), 2);
    }
}
