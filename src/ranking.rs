//! Bounded ranking helpers shared by every "count, sort, cap" accumulator
//!
//! `RankedCounter` keeps keys in first-seen order so a stable descending sort
//! breaks ties by encounter order everywhere it is used (topics, themes,
//! words, contributors). `CappedList` stops growing at its cap.

use ahash::{HashMap, HashMapExt};
use std::hash::Hash;

/// Insert-or-increment counter that remembers first-seen order
#[derive(Debug, Clone)]
pub struct RankedCounter<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, u64)>,
}

impl<K: Hash + Eq + Clone> RankedCounter<K> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Register a key with a zero count so it keeps its position
    pub fn seed(&mut self, key: K) -> usize {
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.entries.len();
        self.index.insert(key.clone(), idx);
        self.entries.push((key, 0));
        idx
    }

    /// Add one occurrence of `key`, returning its slot
    pub fn increment(&mut self, key: K) -> usize {
        self.add(key, 1)
    }

    pub fn add(&mut self, key: K, n: u64) -> usize {
        let idx = self.seed(key);
        self.entries[idx].1 += n;
        idx
    }

    pub fn get(&self, key: &K) -> u64 {
        self.index
            .get(key)
            .map(|&idx| self.entries[idx].1)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &(K, u64)> {
        self.entries.iter()
    }

    /// Stable descending sort by count, truncated to `limit` when given
    pub fn into_ranked(self, limit: Option<usize>) -> Vec<(K, u64)> {
        self.into_ranked_slots(limit)
            .into_iter()
            .map(|(_, key, count)| (key, count))
            .collect()
    }

    /// Like [`into_ranked`](Self::into_ranked) but also yields each key's slot
    pub fn into_ranked_slots(self, limit: Option<usize>) -> Vec<(usize, K, u64)> {
        let mut entries: Vec<(usize, K, u64)> = self
            .entries
            .into_iter()
            .enumerate()
            .map(|(slot, (key, count))| (slot, key, count))
            .collect();
        entries.sort_by(|a, b| b.2.cmp(&a.2));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }
}

impl<K: Hash + Eq + Clone> Default for RankedCounter<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Vector that silently ignores pushes beyond its cap
#[derive(Debug, Clone)]
pub struct CappedList<T> {
    cap: usize,
    items: Vec<T>,
}

impl<T> CappedList<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            items: Vec::new(),
        }
    }

    /// Push if there is room; returns whether the item was kept
    pub fn push(&mut self, item: T) -> bool {
        if self.items.len() < self.cap {
            self.items.push(item);
            true
        } else {
            false
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.cap
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

/// Ranked label with its count and retained examples
#[derive(Debug, Clone)]
pub struct RankedLabel<E> {
    pub label: String,
    pub count: u64,
    pub examples: Vec<E>,
}

/// Per-label counter that also keeps up to `cap` examples per label
#[derive(Debug, Clone)]
pub struct ExampleTally<E> {
    counter: RankedCounter<String>,
    examples: Vec<CappedList<E>>,
    cap: usize,
}

impl<E> ExampleTally<E> {
    pub fn new(cap: usize) -> Self {
        Self {
            counter: RankedCounter::new(),
            examples: Vec::new(),
            cap,
        }
    }

    /// Register a label with a zero count (fixes its tie-break position)
    pub fn seed(&mut self, label: &str) {
        let slot = self.counter.seed(label.to_string());
        self.ensure_slot(slot);
    }

    /// Count a hit for `label`; `example` is only built while there is room
    pub fn record(&mut self, label: &str, example: impl FnOnce() -> E) {
        let slot = self.counter.increment(label.to_string());
        self.ensure_slot(slot);
        let list = &mut self.examples[slot];
        if !list.is_full() {
            list.push(example());
        }
    }

    pub fn count(&self, label: &str) -> u64 {
        self.counter.get(&label.to_string())
    }

    /// Labels sorted by descending count, ties in first-seen order
    pub fn into_ranked(self) -> Vec<RankedLabel<E>> {
        let mut examples: Vec<Option<CappedList<E>>> =
            self.examples.into_iter().map(Some).collect();
        self.counter
            .into_ranked_slots(None)
            .into_iter()
            .map(|(slot, label, count)| RankedLabel {
                label,
                count,
                examples: examples[slot]
                    .take()
                    .map(CappedList::into_vec)
                    .unwrap_or_default(),
            })
            .collect()
    }

    fn ensure_slot(&mut self, slot: usize) {
        while self.examples.len() <= slot {
            self.examples.push(CappedList::new(self.cap));
        }
    }
}

/// Truncate to at most `max` characters, never splitting a code point
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ties_keep_first_seen_order() {
        let mut counter = RankedCounter::new();
        counter.increment("b");
        counter.increment("a");
        counter.increment("c");
        counter.increment("c");

        let ranked = counter.into_ranked(None);
        assert_eq!(ranked, vec![("c", 2), ("b", 1), ("a", 1)]);
    }

    #[test]
    fn test_seeded_keys_stay_in_output() {
        let mut counter = RankedCounter::new();
        counter.seed("zero");
        counter.seed("one");
        counter.increment("one");

        let ranked = counter.into_ranked(None);
        assert_eq!(ranked, vec![("one", 1), ("zero", 0)]);
    }

    #[test]
    fn test_limit_truncates() {
        let mut counter = RankedCounter::new();
        for i in 0..20u64 {
            counter.add(i, i);
        }
        let ranked = counter.into_ranked(Some(5));
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0], (19, 19));
        assert_eq!(ranked[4], (15, 15));
    }

    #[test]
    fn test_capped_list() {
        let mut list = CappedList::new(2);
        assert!(list.push(1));
        assert!(list.push(2));
        assert!(!list.push(3));
        assert!(list.is_full());
        assert_eq!(list.into_vec(), vec![1, 2]);
    }

    #[test]
    fn test_example_tally_caps_and_ranks() {
        let mut tally = ExampleTally::new(2);
        tally.seed("quiet");
        tally.seed("busy");
        for i in 0..5 {
            tally.record("busy", || i);
        }
        tally.record("late", || 99);

        assert_eq!(tally.count("busy"), 5);
        let ranked = tally.into_ranked();
        let labels: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["busy", "late", "quiet"]);
        assert_eq!(ranked[0].examples, vec![0, 1]);
        assert_eq!(ranked[1].examples, vec![99]);
        assert!(ranked[2].examples.is_empty());
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }
}
