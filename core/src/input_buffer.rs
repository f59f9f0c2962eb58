//! Composition buffer with cursor tracking for IME input.
//!
//! The buffer stores the raw, not-yet-committed input (e.g. "namaskaram") and
//! a cursor measured in Unicode scalar values, so every offset handed to the
//! host lands on a character boundary.

use crate::error::ImeError;

/// The set of characters that may enter the composition buffer.
///
/// Letters are always accepted. Schemes may declare extra composing symbols
/// (virama or joiner markers such as `~` or `_`) that are accepted as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputAlphabet {
    extra: Vec<char>,
}

impl InputAlphabet {
    /// Letters only.
    pub fn letters() -> Self {
        Self::default()
    }

    /// Letters plus the given composing symbols.
    pub fn with_symbols<I: IntoIterator<Item = char>>(symbols: I) -> Self {
        let mut extra: Vec<char> = symbols.into_iter().collect();
        extra.sort_unstable();
        extra.dedup();
        Self { extra }
    }

    pub fn accepts(&self, ch: char) -> bool {
        ch.is_alphabetic() || self.extra.binary_search(&ch).is_ok()
    }

    pub fn symbols(&self) -> &[char] {
        &self.extra
    }
}

/// Outcome of a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// Nothing was removed (cursor at the edge).
    Unchanged,
    /// A character was removed and text remains.
    Removed,
    /// A character was removed and the buffer is now empty.
    Emptied,
}

/// Preedit text plus a scalar-value cursor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompositionBuffer {
    text: String,
    cursor: usize, // char offset, not byte offset
    alphabet: InputAlphabet,
}

impl CompositionBuffer {
    /// Create a new empty buffer that accepts letters only.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alphabet(alphabet: InputAlphabet) -> Self {
        Self {
            alphabet,
            ..Self::default()
        }
    }

    /// Replace the accepted-input set (after a scheme switch).
    pub fn set_alphabet(&mut self, alphabet: InputAlphabet) {
        self.alphabet = alphabet;
    }

    pub fn alphabet(&self) -> &InputAlphabet {
        &self.alphabet
    }

    /// Get the raw input text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length of the buffer in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Empty the buffer and zero the cursor.
    pub fn reset(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Byte offset of the `index`-th character (or the end of the text).
    fn byte_offset(&self, index: usize) -> usize {
        self.text
            .char_indices()
            .nth(index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.text.len())
    }

    /// Insert one input unit at the cursor and advance the cursor.
    ///
    /// Characters outside the alphabet are rejected and leave the buffer
    /// untouched.
    pub fn insert(&mut self, ch: char) -> Result<(), ImeError> {
        if !self.alphabet.accepts(ch) {
            return Err(ImeError::InvalidInput(ch));
        }
        let at = self.byte_offset(self.cursor);
        self.text.insert(at, ch);
        self.cursor += 1;
        Ok(())
    }

    /// Delete the character before the cursor (backspace).
    pub fn delete_before(&mut self) -> Deletion {
        if self.cursor == 0 {
            return Deletion::Unchanged;
        }
        let at = self.byte_offset(self.cursor - 1);
        self.text.remove(at);
        self.cursor -= 1;
        self.deletion_outcome()
    }

    /// Delete the character under the cursor (forward delete). The cursor
    /// does not move.
    pub fn delete_after(&mut self) -> Deletion {
        if self.cursor >= self.len() {
            return Deletion::Unchanged;
        }
        let at = self.byte_offset(self.cursor);
        self.text.remove(at);
        self.deletion_outcome()
    }

    fn deletion_outcome(&self) -> Deletion {
        if self.text.is_empty() {
            Deletion::Emptied
        } else {
            Deletion::Removed
        }
    }

    /// Move the cursor by `delta` characters, clamped to `[0, len]`.
    ///
    /// Returns false on an empty buffer so the host can apply its own cursor
    /// movement.
    pub fn move_cursor(&mut self, delta: isize) -> bool {
        if self.is_empty() {
            return false;
        }
        let len = self.len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
        true
    }

    /// Replace the whole buffer, cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.len();
    }
}
