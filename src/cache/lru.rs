//! LRU Tracker Module
//!
//! Orders cached identifiers by recency for eviction.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// Every touch stamps the identifier with a strictly increasing sequence
/// number. The smallest stamp is the least recently used identifier, so ties
/// in wall or monotonic time resolve to touch order.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Sequence stamp -> identifier, oldest first
    order: BTreeMap<u64, String>,
    /// Identifier -> its current stamp
    stamps: HashMap<String, u64>,
    next_stamp: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks an identifier as most recently used, tracking it if new.
    pub fn touch(&mut self, id: &str) {
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        if let Some(previous) = self.stamps.insert(id.to_string(), stamp) {
            self.order.remove(&previous);
        }
        self.order.insert(stamp, id.to_string());
    }

    // == Remove ==
    /// Stops tracking an identifier. No-op if absent.
    pub fn remove(&mut self, id: &str) {
        if let Some(stamp) = self.stamps.remove(id) {
            self.order.remove(&stamp);
        }
    }

    // == Pop Oldest ==
    /// Returns and stops tracking the least recently used identifier.
    #[cfg(test)]
    pub fn pop_oldest(&mut self) -> Option<String> {
        let (_, id) = self.order.pop_first()?;
        self.stamps.remove(&id);
        Some(id)
    }

    /// Returns the least recently used identifier without removing it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.values().next().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.stamps.contains_key(id)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.stamps.clear();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_touch_orders_by_first_use() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some("a"));
    }

    #[test]
    fn test_touch_existing_moves_to_newest() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.touch("a");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.pop_oldest(), Some("b".to_string()));
        assert_eq!(lru.pop_oldest(), Some("c".to_string()));
        assert_eq!(lru.pop_oldest(), Some("a".to_string()));
        assert_eq!(lru.pop_oldest(), None);
    }

    #[test]
    fn test_remove() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.remove("a");
        lru.remove("missing");

        assert_eq!(lru.len(), 1);
        assert!(!lru.contains("a"));
        assert_eq!(lru.peek_oldest(), Some("b"));
    }

    #[test]
    fn test_repeated_touch_tracks_once() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("a");
        lru.touch("a");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.pop_oldest(), Some("a".to_string()));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut lru = LruTracker::new();
        lru.touch("a");
        lru.touch("b");
        lru.clear();

        assert!(lru.is_empty());
        assert_eq!(lru.pop_oldest(), None);
    }
}
