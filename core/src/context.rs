//! Host text adapter and the in-memory host context.
//!
//! The core never touches a text widget directly. It tells a `HostText`
//! implementation what to mark, what to commit and which candidates to show.
//! `ImeContext` is the simplest such host: it records the latest state in
//! public fields that a platform layer (or a test) reads after each key.

use serde::{Deserialize, Serialize};

/// Operations the composition core performs on the host text field and its
/// candidate window. The core calls these; it does not manage widget lifetime.
pub trait HostText {
    /// Show `text` as marked (uncommitted) text with the caret at
    /// `cursor` characters from its start.
    fn set_marked_text(&mut self, text: &str, cursor: usize);

    /// Insert finalized text into the field.
    fn commit_text(&mut self, text: &str);

    fn clear_marked_text(&mut self);

    /// Replace the contents of the candidate window.
    fn update_candidates(&mut self, candidates: &[String]);

    fn show_candidates(&mut self);

    fn hide_candidates(&mut self);

    /// Mirror the core's highlighted candidate in the window.
    fn select_candidate(&mut self, _index: usize) {}

    /// The line highlighted in the candidate window, if the host tracks one.
    fn selected_candidate_index(&self) -> Option<usize> {
        None
    }
}

/// IME context for platform communication.
///
/// After each call into the engine the platform reads these fields to
/// update preedit, candidates and inserted text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImeContext {
    /// Text being composed (displayed with underline)
    pub preedit_text: String,

    /// Caret position within preedit text (characters)
    pub preedit_cursor: usize,

    /// Text committed since the platform last consumed it
    pub commit_text: String,

    /// Candidate strings to display
    pub candidates: Vec<String>,

    /// Highlighted candidate, if any
    pub candidate_cursor: Option<usize>,

    /// Whether the candidate window is shown
    pub candidates_visible: bool,
}

impl ImeContext {
    /// Create a new empty IME context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear preedit and candidates.
    /// Does NOT clear commit_text (platform should consume it first).
    pub fn clear(&mut self) {
        self.preedit_text.clear();
        self.preedit_cursor = 0;
        self.candidates.clear();
        self.candidate_cursor = None;
        self.candidates_visible = false;
    }

    /// Take the commit text, leaving it empty.
    pub fn take_commit(&mut self) -> String {
        std::mem::take(&mut self.commit_text)
    }

    /// Check if there's any visible state (preedit or candidates).
    pub fn has_visible_state(&self) -> bool {
        !self.preedit_text.is_empty() || self.candidates_visible
    }

    pub fn has_commit(&self) -> bool {
        !self.commit_text.is_empty()
    }

    /// JSON snapshot for hosts that drive the core out of process.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl HostText for ImeContext {
    fn set_marked_text(&mut self, text: &str, cursor: usize) {
        self.preedit_text = text.to_string();
        self.preedit_cursor = cursor;
    }

    fn commit_text(&mut self, text: &str) {
        self.commit_text.push_str(text);
    }

    fn clear_marked_text(&mut self) {
        self.preedit_text.clear();
        self.preedit_cursor = 0;
    }

    fn update_candidates(&mut self, candidates: &[String]) {
        self.candidates = candidates.to_vec();
        self.candidate_cursor = None;
    }

    fn show_candidates(&mut self) {
        self.candidates_visible = true;
    }

    fn hide_candidates(&mut self) {
        self.candidates_visible = false;
    }

    fn select_candidate(&mut self, index: usize) {
        self.candidate_cursor = Some(index);
    }

    fn selected_candidate_index(&self) -> Option<usize> {
        self.candidate_cursor
    }
}
