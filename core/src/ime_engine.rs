//! IME engine with session management and key event processing.
//!
//! `ImeEngine` is the per-client controller. It owns the engine session, the
//! composition state and the delayed-refresh queue; routes key events through
//! the `PhoneticEditor`; and carries out what the editor decides against the
//! host text field and the linguistic backend.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::context::HostText;
use crate::editor::{CommitSource, EditorResult, PhoneticEditor};
use crate::engine::{Backend, Engine};
use crate::error::ImeError;
use crate::input_buffer::InputAlphabet;
use crate::scheduler::{DelayQueue, TaskHandle};
use crate::scheme::{self, reconcile, SchemeAction, SchemeMenuItem, SchemeState, SchemeTrigger};
use crate::session::ImeSession;
use crate::store::ConfigStore;
use crate::userdict::LearnedWord;
use crate::Config;

/// Length of the recently-learned list offered to hosts.
pub const RECENTLY_LEARNED_LIMIT: usize = 30;

/// Key event types that the IME can process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// Character input: letters, digits, punctuation
    Char(char),
    Space,
    /// Enter/Return key
    Enter,
    Escape,
    Left,
    Right,
    /// Up arrow key (candidate highlight up)
    Up,
    /// Down arrow key (candidate highlight down)
    Down,
    Backspace,
    /// Forward delete
    Delete,
    /// Modifier + delete: forget the highlighted candidate
    ModDelete,
    /// Ctrl + character; never composed
    Ctrl(char),
}

impl KeyEvent {
    /// Keys whose handling depends on the candidate list.
    fn reads_candidates(&self, config: &Config) -> bool {
        match self {
            KeyEvent::Space | KeyEvent::Enter | KeyEvent::Up | KeyEvent::Down | KeyEvent::ModDelete => true,
            KeyEvent::Char(ch) => ch.is_ascii_digit() || config.is_word_break(*ch),
            _ => false,
        }
    }
}

/// Result of processing a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    /// Key was handled by the IME
    Handled,
    /// Key was not handled (pass through to application)
    NotHandled,
}

/// Work deferred through the delay queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingWork {
    Refresh,
}

/// Per-client composition controller.
///
/// # Example
///
/// ```
/// use libvarnam_core::{ImeContext, ImeEngine, KeyEvent, MemoryStore, SchemeDetails, TableBackend};
///
/// let mut backend = TableBackend::new();
/// backend.add_scheme(SchemeDetails::new("ml", "Malayalam", "ml", true));
/// backend.add_entry("ml", "ab", &["ab1", "ab2"]);
///
/// let mut ime = ImeEngine::new(backend, ImeContext::new(), MemoryStore::default());
/// ime.handle(KeyEvent::Char('a'));
/// ime.handle(KeyEvent::Char('b'));
/// ime.handle(KeyEvent::Space);
/// assert_eq!(ime.host_mut().take_commit(), "ab1 ");
/// ```
pub struct ImeEngine<B: Backend, H: HostText, S: ConfigStore> {
    engine: Engine<B>,
    host: H,
    store: S,
    config: Config,
    editor: PhoneticEditor,
    session: ImeSession,
    schemes: SchemeState,
    queue: DelayQueue<PendingWork>,
    pending: Option<TaskHandle>,
    stale: bool,
}

impl<B: Backend, H: HostText, S: ConfigStore> ImeEngine<B, H, S> {
    /// Create a controller and open the configured scheme.
    ///
    /// If no session can be opened the controller starts in pass-through
    /// mode, reporting every key as unhandled until a later focus gain
    /// manages to open one.
    pub fn new(backend: B, host: H, store: S) -> Self {
        let config = store.load();
        let mut engine = Engine::new(backend, config.max_cache_size);
        let scheme_id = config
            .resolve_scheme_id(&engine.list_schemes())
            .unwrap_or_default();

        let mut schemes = SchemeState::converged(&scheme_id);
        if engine.switch_scheme(&scheme_id).is_err() {
            warn!(scheme = %scheme_id, "no engine session; passing all keys through");
            schemes.runtime_scheme_id.clear();
        }

        let session = ImeSession::with_alphabet(InputAlphabet::with_symbols(engine.composing_symbols()));
        Self {
            engine,
            host,
            store,
            config,
            editor: PhoneticEditor::new(),
            session,
            schemes,
            queue: DelayQueue::new(),
            pending: None,
            stale: false,
        }
    }

    pub fn session(&self) -> &ImeSession {
        &self.session
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn engine(&self) -> &Engine<B> {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scheme_state(&self) -> &SchemeState {
        &self.schemes
    }

    /// True when no engine session was ever available.
    pub fn is_passthrough(&self) -> bool {
        !self.engine.had_session()
    }

    /// Whether a debounced refresh is waiting to run.
    pub fn has_pending_refresh(&self) -> bool {
        self.pending.as_ref().is_some_and(TaskHandle::is_pending)
    }

    /// When the host should next call `pump`.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }

    /// Process a key event and update the host.
    ///
    /// Returns `KeyResult::NotHandled` when the host should apply the key
    /// itself.
    pub fn handle(&mut self, key: KeyEvent) -> KeyResult {
        if self.is_passthrough() {
            return KeyResult::NotHandled;
        }

        if key.reads_candidates(&self.config) && self.session.is_composing() {
            self.flush_refresh();
            if let Some(index) = self.host.selected_candidate_index() {
                self.session.candidates_mut().select(index);
            }
        }

        let result = self.editor.process_key(&key, &mut self.session, &self.config);
        debug!(?key, ?result, "key processed");

        match result {
            EditorResult::Refresh => {
                self.session.render_preedit(&mut self.host);
                self.request_refresh();
            }
            EditorResult::Render => self.session.render_preedit(&mut self.host),
            EditorResult::Select => {
                if let Some(index) = self.session.candidates().selected() {
                    self.host.select_candidate(index);
                }
            }
            EditorResult::Handled => {}
            EditorResult::Commit { text, source } => self.commit(&text, source),
            EditorResult::Reset => self.reset(),
            EditorResult::Unlearn(word) => {
                match self.engine.unlearn(&word) {
                    Ok(()) => info!(word = %word, "unlearned"),
                    Err(err) => warn!(word = %word, error = %err, "unlearn failed"),
                }
                self.refresh_now();
            }
            EditorResult::PassThrough => return KeyResult::NotHandled,
        }
        KeyResult::Handled
    }

    // ========== Candidates ==========

    /// Refresh now, or after the debounce delay when one is configured.
    fn request_refresh(&mut self) {
        let delay = self.config.refresh_debounce();
        if delay.is_zero() {
            self.refresh_now();
            return;
        }
        self.cancel_pending();
        self.stale = true;
        self.pending = Some(self.queue.schedule(Instant::now(), delay, PendingWork::Refresh));
    }

    /// Re-transliterate the buffer and push the candidates to the host.
    /// Engine failures leave an empty list.
    fn refresh_now(&mut self) {
        self.cancel_pending();
        self.stale = false;
        let ranked = self
            .engine
            .transliterate(self.session.buffer().text())
            .unwrap_or_else(|err| {
                warn!(error = %err, "no candidates");
                Vec::new()
            });
        self.session.candidates_mut().set_candidates(ranked);
        self.session
            .render_candidates(&mut self.host, self.config.show_candidates);
    }

    /// Bring candidates up to date before a decision that reads them.
    fn flush_refresh(&mut self) {
        if self.stale {
            self.refresh_now();
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.cancel();
        }
    }

    /// Run delayed work that has come due. Returns the number of tasks run.
    pub fn pump(&mut self, now: Instant) -> usize {
        let due = self.queue.due(now);
        let count = due.len();
        for work in due {
            match work {
                PendingWork::Refresh if self.session.is_composing() => self.refresh_now(),
                PendingWork::Refresh => {}
            }
        }
        if !self.has_pending_refresh() {
            self.pending = None;
        }
        count
    }

    // ========== Commit ==========

    /// Finalize text into the host and return to Idle.
    ///
    /// `learning_enabled` is the value read at the last reconciliation point
    /// (construction, focus gain or scheme selection). Learning failures are
    /// logged and otherwise ignored.
    fn commit(&mut self, text: &str, source: CommitSource) {
        debug!(text, ?source, "commit");
        self.host.commit_text(text);
        if let CommitSource::Candidate(word) = source {
            if self.config.learning_enabled {
                if let Err(err) = self.engine.learn(&word) {
                    warn!(word = %word, error = %err, "learn failed");
                }
            }
        }
        self.reset();
    }

    /// Drop the composition without committing anything.
    fn reset(&mut self) {
        self.cancel_pending();
        self.stale = false;
        self.session.clear();
        self.host.clear_marked_text();
        self.host.update_candidates(&[]);
        self.host.hide_candidates();
    }

    /// The host picked `text` from the candidate window.
    pub fn candidate_selected(&mut self, text: &str) -> KeyResult {
        if self.is_passthrough() || !self.session.is_composing() {
            return KeyResult::NotHandled;
        }
        self.commit(text, CommitSource::Candidate(text.to_string()));
        KeyResult::Handled
    }

    /// The host asked for the composition to be finalized.
    pub fn commit_composition(&mut self) -> KeyResult {
        if !self.session.is_composing() {
            return KeyResult::NotHandled;
        }
        self.handle(KeyEvent::Enter)
    }

    // ========== Focus ==========

    /// Input focus left this client.
    ///
    /// Pending delayed work is cancelled before anything else, the current
    /// composition is committed with Return semantics, and the engine session
    /// is released.
    pub fn focus_lost(&mut self) {
        info!("focus lost");
        self.cancel_pending();
        self.queue.cancel_all();
        if self.session.is_composing() {
            self.handle(KeyEvent::Enter);
        } else {
            self.reset();
        }
        self.engine.close();
    }

    /// Input focus arrived at this client.
    ///
    /// The persisted scheme wins over the one loaded here, catching changes
    /// made elsewhere while this client was in the background.
    pub fn focus_gained(&mut self) {
        self.config = self.store.load();
        let persisted = self
            .config
            .resolve_scheme_id(&self.engine.list_schemes())
            .unwrap_or_default();
        info!(runtime = %self.schemes.runtime_scheme_id, persisted = %persisted, "focus gained");
        self.apply_scheme_trigger(SchemeTrigger::FocusGained { persisted });
    }

    // ========== Learned words ==========

    /// Words learned most recently in the loaded scheme, newest first.
    /// Empty when no session is open.
    pub fn recently_learned(&self) -> Vec<LearnedWord> {
        self.engine
            .recently_learned(RECENTLY_LEARNED_LIMIT)
            .unwrap_or_else(|err| {
                warn!(error = %err, "recently learned words unavailable");
                Vec::new()
            })
    }

    /// Remove `word` from the learned words, outside of any key event.
    pub fn forget_word(&mut self, word: &str) -> Result<(), ImeError> {
        self.engine.unlearn(word)?;
        info!(word, "unlearned");
        if self.session.is_composing() {
            self.refresh_now();
        }
        Ok(())
    }

    /// Merge a learnings file into the loaded scheme.
    pub fn import_learnings(&mut self, path: &Path) -> Result<usize, ImeError> {
        let imported = self.engine.import_learnings(path)?;
        if self.session.is_composing() {
            self.refresh_now();
        }
        Ok(imported)
    }

    // ========== Schemes ==========

    /// A scheme was chosen from the selection menu.
    pub fn select_scheme(&mut self, scheme_id: &str) {
        info!(scheme = scheme_id, "scheme selected");
        self.apply_scheme_trigger(SchemeTrigger::MenuSelected(scheme_id.to_string()));
    }

    /// Entries for the selection menu, the loaded scheme marked active.
    pub fn scheme_menu(&self) -> Vec<SchemeMenuItem> {
        let (state, _) = reconcile(SchemeTrigger::RenderMenu, &self.schemes);
        scheme::scheme_menu(&self.engine.list_schemes(), &self.config.languages, &state)
    }

    fn apply_scheme_trigger(&mut self, trigger: SchemeTrigger) {
        let (next, actions) = reconcile(trigger, &self.schemes);
        self.schemes = next;
        let mut reloaded = false;
        for action in actions {
            match action {
                SchemeAction::Persist(id) => {
                    // only the scheme changes; keep edits made to the store meanwhile
                    self.config = self.store.load();
                    self.config.scheme_id = Some(id);
                    if let Err(err) = self.store.save(&self.config) {
                        warn!(error = %format!("{err:#}"), "failed to persist scheme");
                    }
                }
                SchemeAction::Reload(id) => {
                    self.load_scheme(&id);
                    reloaded = true;
                }
            }
        }
        if !reloaded && !self.engine.is_open() {
            let id = self.schemes.persisted_scheme_id.clone();
            self.load_scheme(&id);
        }
    }

    /// Reinitialize the engine with `scheme_id`, keeping any composition.
    fn load_scheme(&mut self, scheme_id: &str) {
        if self.engine.switch_scheme(scheme_id).is_ok() {
            self.schemes.runtime_scheme_id = scheme_id.to_string();
        } else {
            self.schemes.runtime_scheme_id.clear();
        }
        let alphabet = InputAlphabet::with_symbols(self.engine.composing_symbols());
        self.session.buffer_mut().set_alphabet(alphabet);
        if self.session.is_composing() {
            self.refresh_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ImeContext;
    use crate::engine::SchemeDetails;
    use crate::store::MemoryStore;
    use crate::table::TableBackend;
    use std::time::Duration;

    type TestIme = ImeEngine<TableBackend, ImeContext, MemoryStore>;

    fn backend() -> TableBackend {
        let mut backend = TableBackend::new();
        backend.add_scheme(SchemeDetails::new("ml", "Malayalam", "ml", true));
        backend.add_scheme(SchemeDetails::new("hi", "Hindi", "hi", true));
        backend.add_entry("ml", "a", &["അ"]);
        backend.add_entry("ml", "ab", &["ab1", "ab2", "ab1"]);
        backend.add_entry("ml", "foo", &["foo"]);
        backend.add_entry("ml", "xyz", &["x", "y", "z"]);
        backend.add_entry("hi", "ab", &["अब"]);
        backend.set_symbols("ml", &['~']);
        backend
    }

    fn ime_with(config: Config) -> (TestIme, MemoryStore) {
        let store = MemoryStore::new(config);
        (ImeEngine::new(backend(), ImeContext::new(), store.clone()), store)
    }

    fn ime() -> TestIme {
        ime_with(Config::default()).0
    }

    fn type_str(ime: &mut TestIme, text: &str) {
        for ch in text.chars() {
            assert_eq!(ime.handle(KeyEvent::Char(ch)), KeyResult::Handled);
        }
    }

    #[test]
    fn test_typing_and_space_commit() {
        let mut ime = ime();
        type_str(&mut ime, "a");
        assert_eq!(ime.session().buffer().cursor(), 1);
        assert_eq!(ime.host().candidates, vec!["അ"]);
        type_str(&mut ime, "b");
        assert_eq!(ime.host().preedit_text, "ab");
        assert_eq!(ime.session().candidates().candidates(), &["ab1", "ab2"]);
        assert!(ime.host().candidates_visible);

        assert_eq!(ime.handle(KeyEvent::Space), KeyResult::Handled);
        assert_eq!(ime.host_mut().take_commit(), "ab1 ");
        assert!(!ime.session().is_composing());
        assert_eq!(ime.session().buffer().cursor(), 0);
        assert_eq!(ime.host().preedit_text, "");
        assert!(!ime.host().candidates_visible);
    }

    #[test]
    fn test_commit_learns_candidate() {
        let mut ime = ime();
        type_str(&mut ime, "ab");
        ime.handle(KeyEvent::Char('2'));
        assert_eq!(ime.host_mut().take_commit(), "ab2");
        let learned = ime.engine().backend().learned("ml").unwrap();
        assert_eq!(learned.frequency("ab2"), 1);

        type_str(&mut ime, "ab");
        assert_eq!(ime.session().candidates().top_candidate(), Some("ab2"));
    }

    #[test]
    fn test_learning_disabled() {
        let (mut ime, _store) = ime_with(Config {
            learning_enabled: false,
            ..Config::default()
        });
        type_str(&mut ime, "ab");
        ime.handle(KeyEvent::Enter);
        assert_eq!(ime.host_mut().take_commit(), "ab1");
        assert!(ime.engine().backend().learned("ml").unwrap().is_empty());
    }

    #[test]
    fn test_verbatim_commits_are_not_learned() {
        let mut ime = ime();
        type_str(&mut ime, "ab");
        ime.handle(KeyEvent::Escape);
        assert_eq!(ime.host_mut().take_commit(), "ab");
        assert!(ime.engine().backend().learned("ml").unwrap().is_empty());
    }

    #[test]
    fn test_unlearn_refreshes() {
        let mut ime = ime();
        type_str(&mut ime, "ab");
        ime.handle(KeyEvent::Char('2'));
        type_str(&mut ime, "ab");
        assert_eq!(ime.session().candidates().top_candidate(), Some("ab2"));
        assert_eq!(ime.handle(KeyEvent::ModDelete), KeyResult::Handled);
        assert!(ime.session().is_composing());
        assert_eq!(ime.session().candidates().top_candidate(), Some("ab1"));
    }

    #[test]
    fn test_backspace_to_empty_resets_without_commit() {
        let mut ime = ime();
        type_str(&mut ime, "a");
        assert_eq!(ime.handle(KeyEvent::Backspace), KeyResult::Handled);
        assert!(!ime.session().is_composing());
        assert!(!ime.host().has_commit());
        assert!(ime.host().candidates.is_empty());
        assert_eq!(ime.handle(KeyEvent::Backspace), KeyResult::NotHandled);
    }

    #[test]
    fn test_arrows_on_empty_buffer_pass_through() {
        let mut ime = ime();
        assert_eq!(ime.handle(KeyEvent::Left), KeyResult::NotHandled);
        assert_eq!(ime.handle(KeyEvent::Right), KeyResult::NotHandled);
        assert_eq!(ime.handle(KeyEvent::Up), KeyResult::NotHandled);
    }

    #[test]
    fn test_selection_is_mirrored_and_committed() {
        let mut ime = ime();
        type_str(&mut ime, "xyz");
        ime.handle(KeyEvent::Down);
        ime.handle(KeyEvent::Down);
        assert_eq!(ime.host().candidate_cursor, Some(2));
        ime.handle(KeyEvent::Up);
        ime.handle(KeyEvent::Enter);
        assert_eq!(ime.host_mut().take_commit(), "y");
    }

    #[test]
    fn test_composing_symbols_from_scheme() {
        let mut ime = ime();
        type_str(&mut ime, "a~");
        assert_eq!(ime.session().buffer().text(), "a~");
        assert_eq!(ime.handle(KeyEvent::Char('#')), KeyResult::NotHandled);
        assert_eq!(ime.session().buffer().text(), "a~");
    }

    #[test]
    fn test_passthrough_without_any_session() {
        let config = Config {
            scheme_id: Some("xx".into()),
            ..Config::default()
        };
        let (mut ime, _) = ime_with(config);
        assert!(ime.is_passthrough());
        assert_eq!(ime.handle(KeyEvent::Char('a')), KeyResult::NotHandled);
        assert_eq!(ime.scheme_state().runtime_scheme_id, "");
    }

    #[test]
    fn test_debounced_refresh_runs_on_pump() {
        let config = Config {
            refresh_debounce_ms: 30,
            ..Config::default()
        };
        let (mut ime, _) = ime_with(config);
        type_str(&mut ime, "ab");
        assert!(ime.has_pending_refresh());
        assert!(ime.session().candidates().is_empty());
        assert_eq!(ime.host().preedit_text, "ab");

        let later = Instant::now() + Duration::from_secs(1);
        // the first keystroke's refresh was cancelled explicitly
        assert_eq!(ime.pump(later), 1);
        assert!(!ime.has_pending_refresh());
        assert_eq!(ime.session().candidates().top_candidate(), Some("ab1"));
    }

    #[test]
    fn test_space_flushes_pending_refresh() {
        let config = Config {
            refresh_debounce_ms: 500,
            ..Config::default()
        };
        let (mut ime, _) = ime_with(config);
        type_str(&mut ime, "ab");
        ime.handle(KeyEvent::Space);
        assert_eq!(ime.host_mut().take_commit(), "ab1 ");
        assert_eq!(ime.pump(Instant::now() + Duration::from_secs(5)), 0);
    }
}
