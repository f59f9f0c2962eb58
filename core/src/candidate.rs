//! Candidate list management with selection tracking.
//!
//! This module provides:
//! - `CandidateList`: engine-ranked suggestions, de-duplicated, with a
//!   highlighted selection
//! - `Pick`: what a selection key resolves to

use ahash::AHashSet;

/// Number of candidates reachable through digit keys 1-9.
pub const MAX_DIGIT_SELECTION: usize = 9;

/// What a digit selection resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick<'a> {
    /// Digit 0: commit the raw preedit text, bypassing the list.
    Verbatim,
    /// Digits 1-9: the candidate at that rank.
    Candidate(&'a str),
}

/// Direction for moving the highlighted candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Ordered, duplicate-free candidates plus an optional highlighted index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList {
    items: Vec<String>,
    selected: Option<usize>,
}

impl CandidateList {
    /// Create a new empty candidate list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with raw engine output.
    ///
    /// Later duplicates of an earlier candidate are dropped; the first
    /// occurrence keeps its rank. Selection is cleared.
    pub fn set_candidates<I>(&mut self, ranked: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = AHashSet::new();
        self.items = ranked
            .into_iter()
            .filter(|item| seen.insert(item.clone()))
            .collect();
        self.selected = None;
    }

    pub fn candidates(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// The implicit commit target for Space, Return and focus loss.
    pub fn top_candidate(&self) -> Option<&str> {
        self.items.first().map(String::as_str)
    }

    /// The highlighted candidate, falling back to the top one.
    pub fn current(&self) -> Option<&str> {
        self.selected
            .and_then(|index| self.items.get(index))
            .map(String::as_str)
            .or_else(|| self.top_candidate())
    }

    /// Resolve a digit key: 0 is verbatim, k in 1..=9 is `items[k-1]`.
    pub fn candidate_at(&self, position: usize) -> Option<Pick<'_>> {
        match position {
            0 => Some(Pick::Verbatim),
            k if k <= MAX_DIGIT_SELECTION => {
                self.items.get(k - 1).map(|item| Pick::Candidate(item.as_str()))
            }
            _ => None,
        }
    }

    /// Move the highlight, clamping at both ends.
    ///
    /// With no explicit highlight the top candidate counts as highlighted.
    /// Returns false when the list is empty.
    pub fn move_selection(&mut self, direction: Direction) -> bool {
        if self.items.is_empty() {
            return false;
        }
        let last = self.items.len() - 1;
        let from = self.selected.unwrap_or(0);
        let to = match direction {
            Direction::Up => from.saturating_sub(1),
            Direction::Down => (from + 1).min(last),
        };
        self.selected = Some(to);
        true
    }

    /// Highlight a specific index; out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    /// Clear the candidate list.
    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
    }
}
