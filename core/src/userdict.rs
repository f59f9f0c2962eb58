//! In-memory user dictionary of learned words.
//!
//! `InMemoryUserDict` counts how often a word has been committed and when it
//! was last learned. The table backend uses it to float learned words to the
//! top of its rankings, to list recent learnings, and to drop a word again on
//! unlearn.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// One learned word as reported to hosts and read from learnings files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedWord {
    pub word: String,
    /// Number of times the word was learned
    pub weight: u64,
    /// Learning order stamp; larger is more recent
    #[serde(default)]
    pub learned_on: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct WordStats {
    count: u64,
    learned_on: u64,
}

#[derive(Debug, Default)]
struct Words {
    stats: HashMap<String, WordStats>,
    clock: u64,
}

/// A thread-safe in-memory user dictionary.
///
/// Stores learned words and their counts. Clones share the same storage.
#[derive(Clone, Debug, Default)]
pub struct InMemoryUserDict {
    inner: Arc<RwLock<Words>>,
}

impl InMemoryUserDict {
    /// Create a new empty in-memory user dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn a word: increment its count by 1.
    pub fn learn(&self, word: &str) {
        self.learn_with_count(word, 1);
    }

    /// Learn a word with a custom increment. The word becomes the most
    /// recently learned one.
    pub fn learn_with_count(&self, word: &str, delta: u64) {
        if delta == 0 {
            return;
        }
        if let Ok(mut words) = self.inner.write() {
            words.clock += 1;
            let stamp = words.clock;
            let entry = words.stats.entry(word.to_string()).or_default();
            entry.count = entry.count.saturating_add(delta);
            entry.learned_on = stamp;
        }
    }

    /// Merge imported words, in file order. Blank words are skipped and a
    /// zero weight counts as one. Returns how many words were taken.
    pub fn import(&self, learned: &[LearnedWord]) -> usize {
        let mut imported = 0;
        for entry in learned {
            let word = entry.word.trim();
            if word.is_empty() {
                continue;
            }
            self.learn_with_count(word, entry.weight.max(1));
            imported += 1;
        }
        imported
    }

    /// Forget a word entirely. Returns true if it was known.
    pub fn unlearn(&self, word: &str) -> bool {
        self.inner
            .write()
            .map(|mut words| words.stats.remove(word).is_some())
            .unwrap_or(false)
    }

    /// Get the learned frequency for a word.
    pub fn frequency(&self, word: &str) -> u64 {
        self.inner
            .read()
            .ok()
            .and_then(|words| words.stats.get(word).map(|stats| stats.count))
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|words| words.stats.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export a snapshot of the current counts.
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.inner
            .read()
            .map(|words| {
                words
                    .stats
                    .iter()
                    .map(|(word, stats)| (word.clone(), stats.count))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Words ordered by frequency (highest first), ties broken alphabetically.
    pub fn most_frequent(&self, limit: usize) -> Vec<(String, u64)> {
        let mut words: Vec<(String, u64)> = self.snapshot().into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(limit);
        words
    }

    /// The `limit` most recently learned words, newest first.
    pub fn recent(&self, limit: usize) -> Vec<LearnedWord> {
        let mut learned: Vec<LearnedWord> = self
            .inner
            .read()
            .map(|words| {
                words
                    .stats
                    .iter()
                    .map(|(word, stats)| LearnedWord {
                        word: word.clone(),
                        weight: stats.count,
                        learned_on: stats.learned_on,
                    })
                    .collect()
            })
            .unwrap_or_default();
        learned.sort_by(|a, b| b.learned_on.cmp(&a.learned_on));
        learned.truncate(limit);
        learned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learn_and_frequency() {
        let dict = InMemoryUserDict::new();
        dict.learn("നന്ദി");
        dict.learn("നന്ദി");
        dict.learn_with_count("മലയാളം", 5);
        dict.learn_with_count("zero", 0);
        assert_eq!(dict.frequency("നന്ദി"), 2);
        assert_eq!(dict.frequency("മലയാളം"), 5);
        assert_eq!(dict.frequency("zero"), 0);
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_unlearn() {
        let dict = InMemoryUserDict::new();
        dict.learn("word");
        assert!(dict.unlearn("word"));
        assert!(!dict.unlearn("word"));
        assert_eq!(dict.frequency("word"), 0);
        assert!(dict.is_empty());
    }

    #[test]
    fn test_clones_share_storage() {
        let dict = InMemoryUserDict::new();
        let other = dict.clone();
        other.learn("shared");
        assert_eq!(dict.frequency("shared"), 1);
    }

    #[test]
    fn test_most_frequent() {
        let dict = InMemoryUserDict::new();
        dict.learn_with_count("b", 3);
        dict.learn_with_count("a", 3);
        dict.learn_with_count("c", 7);
        let top = dict.most_frequent(2);
        assert_eq!(top, vec![("c".to_string(), 7), ("a".to_string(), 3)]);
    }

    #[test]
    fn test_recent_orders_by_last_learned() {
        let dict = InMemoryUserDict::new();
        dict.learn("old");
        dict.learn("mid");
        dict.learn("new");
        dict.learn("old");

        let recent: Vec<String> = dict.recent(2).into_iter().map(|w| w.word).collect();
        assert_eq!(recent, vec!["old", "new"]);
        assert_eq!(dict.recent(10)[0].weight, 2);

        dict.unlearn("old");
        assert_eq!(dict.recent(1)[0].word, "new");
    }

    #[test]
    fn test_import_skips_blank_words() {
        let dict = InMemoryUserDict::new();
        let learned = vec![
            LearnedWord { word: "ഒന്ന്".into(), weight: 4, learned_on: 0 },
            LearnedWord { word: "  ".into(), weight: 9, learned_on: 0 },
            LearnedWord { word: "രണ്ട്".into(), weight: 0, learned_on: 0 },
        ];
        assert_eq!(dict.import(&learned), 2);
        assert_eq!(dict.frequency("ഒന്ന്"), 4);
        assert_eq!(dict.frequency("രണ്ട്"), 1);
        assert_eq!(dict.recent(1)[0].word, "രണ്ട്");
    }
}
