//! Phonetic editor: the key-by-key composition rules.
//!
//! `PhoneticEditor` decides, for one key event and the current session, how
//! the buffer and candidate highlight change and whether text becomes final.
//! It never talks to the engine or the host; it reports what the caller has
//! to do through `EditorResult`.

use tracing::debug;

use crate::candidate::{Direction, Pick};
use crate::ime_engine::KeyEvent;
use crate::input_buffer::Deletion;
use crate::session::ImeSession;
use crate::Config;

/// Where committed text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitSource {
    /// A ranked candidate; the word may be learned.
    Candidate(String),
    /// The raw preedit text, never learned.
    Verbatim,
}

/// Result of processing a key event in the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorResult {
    /// Buffer text changed; candidates must be refreshed
    Refresh,
    /// Only the caret moved; re-render the preedit
    Render,
    /// Candidate highlight moved
    Select,
    /// Key consumed with no visible change
    Handled,
    /// Finalize `text` and return to Idle
    Commit { text: String, source: CommitSource },
    /// Buffer emptied by a deletion; return to Idle without committing
    Reset,
    /// Remove `word` from the engine's learned words, then refresh
    Unlearn(String),
    /// Key not handled, let the host have it
    PassThrough,
}

impl EditorResult {
    fn commit_candidate(word: &str, suffix: &str) -> Self {
        EditorResult::Commit {
            text: format!("{word}{suffix}"),
            source: CommitSource::Candidate(word.to_string()),
        }
    }

    fn commit_verbatim(text: &str, suffix: &str) -> Self {
        EditorResult::Commit {
            text: format!("{text}{suffix}"),
            source: CommitSource::Verbatim,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhoneticEditor;

impl PhoneticEditor {
    pub fn new() -> Self {
        Self
    }

    /// Process a key event against the session.
    pub fn process_key(&self, key: &KeyEvent, session: &mut ImeSession, config: &Config) -> EditorResult {
        let composing = session.is_composing();
        match key {
            KeyEvent::Char(ch) => self.handle_char(*ch, session, config),
            KeyEvent::Ctrl(_) => EditorResult::PassThrough,
            _ if !composing => EditorResult::PassThrough,
            KeyEvent::Space => self.handle_space(session),
            KeyEvent::Enter => self.handle_enter(session),
            KeyEvent::Escape => {
                EditorResult::commit_verbatim(session.buffer().text(), "")
            }
            KeyEvent::Left => self.handle_cursor(session, -1),
            KeyEvent::Right => self.handle_cursor(session, 1),
            KeyEvent::Up => {
                session.candidates_mut().move_selection(Direction::Up);
                EditorResult::Select
            }
            KeyEvent::Down => {
                session.candidates_mut().move_selection(Direction::Down);
                EditorResult::Select
            }
            KeyEvent::Backspace => Self::deletion(session.buffer_mut().delete_before()),
            KeyEvent::Delete => Self::deletion(session.buffer_mut().delete_after()),
            KeyEvent::ModDelete => match session.candidates().current() {
                Some(word) => EditorResult::Unlearn(word.to_string()),
                None => EditorResult::Handled,
            },
        }
    }

    /// Letters and composing symbols, selection digits, word-break punctuation.
    fn handle_char(&self, ch: char, session: &mut ImeSession, config: &Config) -> EditorResult {
        let composing = session.is_composing();

        if let Some(digit) = ch.to_digit(10) {
            if !composing {
                return EditorResult::PassThrough;
            }
            return match session.candidates().candidate_at(digit as usize) {
                Some(Pick::Verbatim) => EditorResult::commit_verbatim(session.buffer().text(), ""),
                Some(Pick::Candidate(word)) => EditorResult::commit_candidate(word, ""),
                None => {
                    debug!(digit, "no candidate for selection digit");
                    EditorResult::PassThrough
                }
            };
        }

        match session.buffer_mut().insert(ch) {
            Ok(()) => return EditorResult::Refresh,
            Err(err) => debug!(error = %err, "key not composed"),
        }

        if composing && config.is_word_break(ch) {
            if let Some(word) = session.candidates().current() {
                return EditorResult::commit_candidate(word, &ch.to_string());
            }
        }
        EditorResult::PassThrough
    }

    fn handle_space(&self, session: &ImeSession) -> EditorResult {
        match session.candidates().current() {
            Some(word) => EditorResult::commit_candidate(word, " "),
            None => EditorResult::commit_verbatim(session.buffer().text(), " "),
        }
    }

    fn handle_enter(&self, session: &ImeSession) -> EditorResult {
        match session.candidates().current() {
            Some(word) => EditorResult::commit_candidate(word, ""),
            None => EditorResult::commit_verbatim(session.buffer().text(), ""),
        }
    }

    fn handle_cursor(&self, session: &mut ImeSession, delta: isize) -> EditorResult {
        if session.buffer_mut().move_cursor(delta) {
            EditorResult::Render
        } else {
            EditorResult::PassThrough
        }
    }

    fn deletion(outcome: Deletion) -> EditorResult {
        match outcome {
            Deletion::Removed => EditorResult::Refresh,
            Deletion::Emptied => EditorResult::Reset,
            Deletion::Unchanged => EditorResult::Handled,
        }
    }
}
