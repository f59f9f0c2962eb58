//! IME session management.
//!
//! `ImeSession` combines the composition buffer and the candidate list into
//! the state that persists across key events, and knows how to render that
//! state onto a host.

use crate::candidate::CandidateList;
use crate::context::HostText;
use crate::input_buffer::{CompositionBuffer, InputAlphabet};

/// Whether a composition is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposeState {
    /// Buffer empty, keys mostly pass through to the host
    #[default]
    Idle,
    /// Buffer non-empty
    Composing,
}

#[derive(Debug, Clone, Default)]
pub struct ImeSession {
    buffer: CompositionBuffer,
    candidates: CandidateList,
}

impl ImeSession {
    /// Create a new empty session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alphabet(alphabet: InputAlphabet) -> Self {
        Self {
            buffer: CompositionBuffer::with_alphabet(alphabet),
            candidates: CandidateList::new(),
        }
    }

    pub fn state(&self) -> ComposeState {
        if self.buffer.is_empty() {
            ComposeState::Idle
        } else {
            ComposeState::Composing
        }
    }

    pub fn is_composing(&self) -> bool {
        self.state() == ComposeState::Composing
    }

    pub fn buffer(&self) -> &CompositionBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut CompositionBuffer {
        &mut self.buffer
    }

    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    pub fn candidates_mut(&mut self) -> &mut CandidateList {
        &mut self.candidates
    }

    /// Clear all session state and return to Idle.
    pub fn clear(&mut self) {
        self.buffer.reset();
        self.candidates.clear();
    }

    /// Push the preedit text and caret to the host.
    pub fn render_preedit<H: HostText>(&self, host: &mut H) {
        host.set_marked_text(self.buffer.text(), self.buffer.cursor());
    }

    /// Push the candidate list to the host and show or hide the window.
    pub fn render_candidates<H: HostText>(&self, host: &mut H, show: bool) {
        host.update_candidates(self.candidates.candidates());
        if show && !self.candidates.is_empty() {
            if let Some(index) = self.candidates.selected() {
                host.select_candidate(index);
            }
            host.show_candidates();
        } else {
            host.hide_candidates();
        }
    }
}
