//! Table-driven linguistic backend.
//!
//! `TableBackend` answers transliteration requests from a fixed per-scheme
//! table and boosts words the user has learned. It stands in for a native
//! engine where none is linked, and gives tests a deterministic backend.

use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;

use crate::engine::{Backend, SchemeDetails};
use crate::error::EngineError;
use crate::userdict::{InMemoryUserDict, LearnedWord};

#[derive(Debug, Default)]
struct SchemeTable {
    details: Option<SchemeDetails>,
    entries: HashMap<String, Vec<String>>,
    symbols: Vec<char>,
    learned: InMemoryUserDict,
}

/// A session over one scheme's table. Not `Clone`: closing consumes it.
#[derive(Debug)]
pub struct TableSession {
    scheme_id: String,
}

impl TableSession {
    pub fn scheme_id(&self) -> &str {
        &self.scheme_id
    }
}

#[derive(Debug, Default)]
pub struct TableBackend {
    schemes: Vec<String>,
    tables: HashMap<String, SchemeTable>,
    open_sessions: Cell<usize>,
    transliterate_calls: Cell<usize>,
}

impl TableBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn table_mut(&mut self, scheme_id: &str) -> &mut SchemeTable {
        if !self.tables.contains_key(scheme_id) {
            self.schemes.push(scheme_id.to_string());
        }
        self.tables.entry(scheme_id.to_string()).or_default()
    }

    /// Register a scheme so it can be opened and listed.
    pub fn add_scheme(&mut self, details: SchemeDetails) {
        let id = details.id.clone();
        self.table_mut(&id).details = Some(details);
    }

    /// Map `input` to ranked renderings within `scheme_id`.
    pub fn add_entry(&mut self, scheme_id: &str, input: &str, renderings: &[&str]) {
        self.table_mut(scheme_id).entries.insert(
            input.to_string(),
            renderings.iter().map(|s| s.to_string()).collect(),
        );
    }

    /// Declare extra composing symbols for `scheme_id`.
    pub fn set_symbols(&mut self, scheme_id: &str, symbols: &[char]) {
        self.table_mut(scheme_id).symbols = symbols.to_vec();
    }

    /// Learned words of a scheme (shared handle).
    pub fn learned(&self, scheme_id: &str) -> Option<InMemoryUserDict> {
        self.tables.get(scheme_id).map(|table| table.learned.clone())
    }

    /// Number of sessions opened and not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.get()
    }

    /// Number of transliterate calls that reached the table.
    pub fn transliterate_calls(&self) -> usize {
        self.transliterate_calls.get()
    }

    fn table(&self, session: &TableSession) -> Result<&SchemeTable, EngineError> {
        self.tables
            .get(&session.scheme_id)
            .ok_or(EngineError::NotInitialized)
    }
}

impl Backend for TableBackend {
    type Session = TableSession;

    fn open(&self, scheme_id: &str) -> Result<TableSession, EngineError> {
        match self.tables.get(scheme_id) {
            Some(table) if table.details.is_some() => {
                self.open_sessions.set(self.open_sessions.get() + 1);
                Ok(TableSession {
                    scheme_id: scheme_id.to_string(),
                })
            }
            _ => Err(EngineError::SchemeNotFound(scheme_id.to_string())),
        }
    }

    fn close(&self, _session: TableSession) {
        self.open_sessions.set(self.open_sessions.get().saturating_sub(1));
    }

    fn transliterate(&self, session: &TableSession, text: &str) -> Result<Vec<String>, EngineError> {
        self.transliterate_calls.set(self.transliterate_calls.get() + 1);
        let table = self.table(session)?;
        let mut ranked = table.entries.get(text).cloned().unwrap_or_default();
        // stable: equal frequencies keep table order
        ranked.sort_by_key(|word| std::cmp::Reverse(table.learned.frequency(word)));
        Ok(ranked)
    }

    fn learn(&self, session: &TableSession, word: &str) -> Result<(), EngineError> {
        if word.trim().is_empty() {
            return Err(EngineError::Call("cannot learn an empty word".to_string()));
        }
        self.table(session)?.learned.learn(word);
        Ok(())
    }

    fn unlearn(&self, session: &TableSession, word: &str) -> Result<(), EngineError> {
        if self.table(session)?.learned.unlearn(word) {
            Ok(())
        } else {
            Err(EngineError::Call(format!("`{word}` was never learned")))
        }
    }

    fn list_schemes(&self) -> Vec<SchemeDetails> {
        self.schemes
            .iter()
            .filter_map(|id| self.tables.get(id).and_then(|t| t.details.clone()))
            .collect()
    }

    fn composing_symbols(&self, session: &TableSession) -> Vec<char> {
        self.table(session)
            .map(|table| table.symbols.clone())
            .unwrap_or_default()
    }

    fn recently_learned(&self, session: &TableSession, limit: usize) -> Result<Vec<LearnedWord>, EngineError> {
        Ok(self.table(session)?.learned.recent(limit))
    }

    /// Learnings files are JSON arrays of `{"word", "weight"}` records.
    fn import_learnings(&self, session: &TableSession, path: &Path) -> Result<usize, EngineError> {
        let table = self.table(session)?;
        let content = std::fs::read_to_string(path)
            .map_err(|err| EngineError::Call(format!("reading {}: {err}", path.display())))?;
        let learned: Vec<LearnedWord> = serde_json::from_str(&content)
            .map_err(|err| EngineError::Call(format!("parsing {}: {err}", path.display())))?;
        Ok(table.learned.import(&learned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> TableBackend {
        let mut backend = TableBackend::new();
        backend.add_scheme(SchemeDetails::new("ml", "Malayalam", "ml", true));
        backend.add_entry("ml", "nanni", &["നന്നി", "നന്ദി"]);
        backend.set_symbols("ml", &['~']);
        backend
    }

    #[test]
    fn test_open_unknown_scheme() {
        let backend = backend();
        assert_eq!(
            backend.open("ta").unwrap_err(),
            EngineError::SchemeNotFound("ta".into())
        );
        assert_eq!(backend.open_sessions(), 0);
    }

    #[test]
    fn test_entries_without_scheme_are_not_openable() {
        let mut backend = TableBackend::new();
        backend.add_entry("kn", "a", &["ಅ"]);
        assert!(backend.open("kn").is_err());
        assert!(backend.list_schemes().is_empty());
    }

    #[test]
    fn test_learning_reorders() {
        let backend = backend();
        let session = backend.open("ml").unwrap();
        assert_eq!(backend.transliterate(&session, "nanni").unwrap()[0], "നന്നി");
        backend.learn(&session, "നന്ദി").unwrap();
        assert_eq!(backend.transliterate(&session, "nanni").unwrap()[0], "നന്ദി");
        backend.unlearn(&session, "നന്ദി").unwrap();
        assert_eq!(backend.transliterate(&session, "nanni").unwrap()[0], "നന്നി");
        backend.close(session);
    }

    #[test]
    fn test_unlearn_unknown_word_fails() {
        let backend = backend();
        let session = backend.open("ml").unwrap();
        assert!(matches!(
            backend.unlearn(&session, "nothing"),
            Err(EngineError::Call(_))
        ));
    }

    #[test]
    fn test_unknown_input_yields_nothing() {
        let backend = backend();
        let session = backend.open("ml").unwrap();
        assert!(backend.transliterate(&session, "zzz").unwrap().is_empty());
        assert_eq!(backend.composing_symbols(&session), vec!['~']);
    }

    #[test]
    fn test_import_learnings_file() {
        let backend = backend();
        let session = backend.open("ml").unwrap();
        let path = std::env::temp_dir().join(format!("libvarnam-table-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"word": "നന്ദി", "weight": 3}, {"word": "", "weight": 1}]"#,
        )
        .unwrap();

        assert_eq!(backend.import_learnings(&session, &path).unwrap(), 1);
        assert_eq!(backend.transliterate(&session, "nanni").unwrap()[0], "നന്ദി");
        let recent = backend.recently_learned(&session, 30).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].weight, 3);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            backend.import_learnings(&session, &path),
            Err(EngineError::Call(_))
        ));
        let _ = std::fs::remove_file(&path);
        assert!(backend.import_learnings(&session, &path).is_err());
    }

    #[test]
    fn test_list_schemes_in_registration_order() {
        let mut backend = backend();
        backend.add_scheme(SchemeDetails::new("hi", "Hindi", "hi", false));
        let ids: Vec<_> = backend.list_schemes().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["ml", "hi"]);
    }
}
