// core/src/engine.rs
//
// Session-owning wrapper around a linguistic backend.
// The backend is a black box (transliterate, learn, unlearn, list schemes);
// this wrapper owns the one live session and caches transliterations.

use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::path::Path;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{EngineError, ImeError};
use crate::userdict::LearnedWord;

const DEFAULT_CACHE_SIZE: usize = 256;

/// Metadata for one transliteration scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeDetails {
    pub id: String,
    pub display_name: String,
    pub language_code: String,
    pub is_stable: bool,
}

impl SchemeDetails {
    pub fn new(id: &str, display_name: &str, language_code: &str, is_stable: bool) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            language_code: language_code.to_string(),
            is_stable,
        }
    }
}

/// Trait that linguistic backends must implement to drive composition.
///
/// Sessions are consumed by `close`, so a closed session can never be used
/// again.
pub trait Backend {
    /// Handle to a scheme loaded into the backend.
    type Session;

    fn open(&self, scheme_id: &str) -> Result<Self::Session, EngineError>;

    fn close(&self, session: Self::Session);

    /// Ranked renderings of `text`. Duplicates are allowed.
    fn transliterate(&self, session: &Self::Session, text: &str) -> Result<Vec<String>, EngineError>;

    fn learn(&self, session: &Self::Session, word: &str) -> Result<(), EngineError>;

    fn unlearn(&self, session: &Self::Session, word: &str) -> Result<(), EngineError>;

    fn list_schemes(&self) -> Vec<SchemeDetails>;

    /// Non-letter symbols the loaded scheme accepts as composing input.
    fn composing_symbols(&self, _session: &Self::Session) -> Vec<char> {
        Vec::new()
    }

    /// Most recently learned words of the loaded scheme, newest first.
    fn recently_learned(&self, _session: &Self::Session, _limit: usize) -> Result<Vec<LearnedWord>, EngineError> {
        Ok(Vec::new())
    }

    /// Merge a learnings file into the loaded scheme. Returns the number of
    /// words taken from it.
    fn import_learnings(&self, _session: &Self::Session, path: &Path) -> Result<usize, EngineError> {
        Err(EngineError::Call(format!(
            "importing {} is not supported by this backend",
            path.display()
        )))
    }
}

/// Owns at most one backend session and an LRU cache of transliterations.
pub struct Engine<B: Backend> {
    backend: B,
    session: Option<B::Session>,
    scheme_id: Option<String>,
    had_session: bool,
    cache: RefCell<LruCache<String, Vec<String>>>,
}

impl<B: Backend> Engine<B> {
    /// Wrap a backend without opening any session.
    pub fn new(backend: B, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size)
            .or_else(|| NonZeroUsize::new(DEFAULT_CACHE_SIZE))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            backend,
            session: None,
            scheme_id: None,
            had_session: false,
            cache: RefCell::new(LruCache::new(capacity)),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The scheme currently loaded, if a session is open.
    pub fn scheme_id(&self) -> Option<&str> {
        self.session.as_ref().and(self.scheme_id.as_deref())
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Whether any session was ever opened successfully.
    pub fn had_session(&self) -> bool {
        self.had_session
    }

    /// Close the current session (if any) and open `scheme_id`.
    ///
    /// The old session is always released first; on failure no session
    /// remains.
    pub fn switch_scheme(&mut self, scheme_id: &str) -> Result<(), ImeError> {
        self.close();
        let session = self.backend.open(scheme_id).map_err(|err| {
            warn!(scheme = scheme_id, error = %err, "failed to open engine session");
            ImeError::EngineUnavailable(err.to_string())
        })?;
        info!(scheme = scheme_id, "engine session opened");
        self.session = Some(session);
        self.scheme_id = Some(scheme_id.to_string());
        self.had_session = true;
        Ok(())
    }

    /// Release the session tied to the current focus lifetime.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(scheme = ?self.scheme_id, "engine session closed");
            self.backend.close(session);
        }
        self.clear_cache();
    }

    fn session(&self) -> Result<&B::Session, ImeError> {
        self.session
            .as_ref()
            .ok_or_else(|| ImeError::EngineUnavailable(EngineError::NotInitialized.to_string()))
    }

    /// Ranked candidates for `text`, served from the cache when possible.
    pub fn transliterate(&self, text: &str) -> Result<Vec<String>, ImeError> {
        let session = self.session()?;
        if let Some(cached) = self.cache.borrow_mut().get(text) {
            return Ok(cached.clone());
        }
        let ranked = self.backend.transliterate(session, text)?;
        self.cache.borrow_mut().put(text.to_string(), ranked.clone());
        Ok(ranked)
    }

    /// Record a committed word; invalidates cached rankings.
    pub fn learn(&self, word: &str) -> Result<(), ImeError> {
        let session = self.session()?;
        self.backend.learn(session, word)?;
        self.clear_cache();
        Ok(())
    }

    /// Forget a word; invalidates cached rankings.
    pub fn unlearn(&self, word: &str) -> Result<(), ImeError> {
        let session = self.session()?;
        self.backend.unlearn(session, word)?;
        self.clear_cache();
        Ok(())
    }

    pub fn list_schemes(&self) -> Vec<SchemeDetails> {
        self.backend.list_schemes()
    }

    pub fn recently_learned(&self, limit: usize) -> Result<Vec<LearnedWord>, ImeError> {
        let session = self.session()?;
        Ok(self.backend.recently_learned(session, limit)?)
    }

    /// Import a learnings file; invalidates cached rankings.
    pub fn import_learnings(&self, path: &Path) -> Result<usize, ImeError> {
        let session = self.session()?;
        let imported = self.backend.import_learnings(session, path)?;
        self.clear_cache();
        info!(path = %path.display(), imported, "learnings imported");
        Ok(imported)
    }

    /// Extra composing symbols of the loaded scheme (empty without a session).
    pub fn composing_symbols(&self) -> Vec<char> {
        self.session
            .as_ref()
            .map(|session| self.backend.composing_symbols(session))
            .unwrap_or_default()
    }

    /// Get current cache size (number of entries).
    pub fn cache_size(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }
}

impl<B: Backend> Drop for Engine<B> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.backend.close(session);
        }
    }
}
