use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use libvarnam_core::{Backend, EngineError, SchemeDetails};

/// Backend with switchable failures and a call log.
#[derive(Default)]
pub struct ScriptedBackend {
    schemes: Vec<SchemeDetails>,
    table: HashMap<(String, String), Vec<String>>,
    symbols: HashMap<String, Vec<char>>,
    pub fail_open: Cell<bool>,
    pub fail_transliterate: Cell<bool>,
    pub fail_learn: Cell<bool>,
    next_session: Cell<usize>,
    calls: RefCell<Vec<String>>,
}

#[derive(Debug)]
pub struct ScriptedSession {
    pub scheme_id: String,
    pub serial: usize,
}

impl ScriptedBackend {
    pub fn new(scheme_ids: &[&str]) -> Self {
        Self {
            schemes: scheme_ids
                .iter()
                .map(|id| SchemeDetails::new(id, &id.to_uppercase(), id, true))
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_entry(mut self, scheme_id: &str, input: &str, output: &[&str]) -> Self {
        self.table.insert(
            (scheme_id.to_string(), input.to_string()),
            output.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn with_symbols(mut self, scheme_id: &str, symbols: &[char]) -> Self {
        self.symbols.insert(scheme_id.to_string(), symbols.to_vec());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl Backend for ScriptedBackend {
    type Session = ScriptedSession;

    fn open(&self, scheme_id: &str) -> Result<ScriptedSession, EngineError> {
        self.record(format!("open {scheme_id}"));
        if self.fail_open.get() || !self.schemes.iter().any(|s| s.id == scheme_id) {
            return Err(EngineError::SchemeNotFound(scheme_id.to_string()));
        }
        let serial = self.next_session.get();
        self.next_session.set(serial + 1);
        Ok(ScriptedSession {
            scheme_id: scheme_id.to_string(),
            serial,
        })
    }

    fn close(&self, session: ScriptedSession) {
        self.record(format!("close {}", session.scheme_id));
    }

    fn transliterate(&self, session: &ScriptedSession, text: &str) -> Result<Vec<String>, EngineError> {
        self.record(format!("transliterate {text}"));
        if self.fail_transliterate.get() {
            return Err(EngineError::Call("transliterate failed".into()));
        }
        Ok(self
            .table
            .get(&(session.scheme_id.clone(), text.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn learn(&self, _session: &ScriptedSession, word: &str) -> Result<(), EngineError> {
        self.record(format!("learn {word}"));
        if self.fail_learn.get() {
            return Err(EngineError::Call("learn failed".into()));
        }
        Ok(())
    }

    fn unlearn(&self, _session: &ScriptedSession, word: &str) -> Result<(), EngineError> {
        self.record(format!("unlearn {word}"));
        Ok(())
    }

    fn list_schemes(&self) -> Vec<SchemeDetails> {
        self.schemes.clone()
    }

    fn composing_symbols(&self, session: &ScriptedSession) -> Vec<char> {
        self.symbols
            .get(&session.scheme_id)
            .cloned()
            .unwrap_or_default()
    }
}
