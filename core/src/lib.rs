//! libvarnam-core
//!
//! Composition core for phonetic input methods: turns key events into a
//! preedit buffer, drives a transliteration backend for ranked candidates,
//! and commits finalized text into a host text field.
//!
//! Public API:
//! - `ImeEngine` - The controller: key handling, commits, focus and scheme changes
//! - `Backend` / `Engine` - Linguistic backend seam and its session-owning wrapper
//! - `HostText` / `ImeContext` - Host text adapter seam and an in-memory host
//! - `CompositionBuffer`, `CandidateList` - Preedit and candidate state
//! - `Config` / `ConfigStore` - Persisted preferences
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

pub mod error;
pub use error::{EngineError, ImeError};

pub mod engine;
pub use engine::{Backend, Engine, SchemeDetails};

pub mod userdict;
pub use userdict::{InMemoryUserDict, LearnedWord};

pub mod table;
pub use table::{TableBackend, TableSession};

pub mod input_buffer;
pub use input_buffer::{CompositionBuffer, Deletion, InputAlphabet};

pub mod candidate;
pub use candidate::{CandidateList, Direction, Pick};

pub mod context;
pub use context::{HostText, ImeContext};

pub mod session;
pub use session::{ComposeState, ImeSession};

pub mod editor;
pub use editor::{CommitSource, EditorResult, PhoneticEditor};

pub mod scheme;
pub use scheme::{reconcile, scheme_menu, SchemeAction, SchemeMenuItem, SchemeState, SchemeTrigger};

pub mod scheduler;
pub use scheduler::{DelayQueue, TaskHandle};

pub mod store;
pub use store::{ConfigStore, MemoryStore, TomlStore};

pub mod ime_engine;
pub use ime_engine::{ImeEngine, KeyEvent, KeyResult, RECENTLY_LEARNED_LIMIT};

const DEFAULT_WORD_BREAK_CHARS: &str = ".,?!;:\"')]}";

/// Per-scheme language entry, as shown in the language settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct LanguageConfig {
    /// Scheme identifier (e.g. "ml")
    pub identifier: String,
    /// Display name of the language
    pub language: String,
    pub lang_code: String,
    pub is_enabled: bool,
    #[serde(default)]
    pub is_stable: bool,
}

impl LanguageConfig {
    /// One enabled entry per scheme the backend offers.
    pub fn factory_languages(schemes: &[SchemeDetails]) -> Vec<LanguageConfig> {
        schemes
            .iter()
            .map(|scheme| LanguageConfig {
                identifier: scheme.id.clone(),
                language: scheme.display_name.clone(),
                lang_code: scheme.language_code.clone(),
                is_enabled: true,
                is_stable: scheme.is_stable,
            })
            .collect()
    }

    /// Decode a JSON language list. A malformed list is logged and replaced
    /// by the factory list.
    pub fn languages_from_json(json: &str, schemes: &[SchemeDetails]) -> Vec<LanguageConfig> {
        match serde_json::from_str(json) {
            Ok(languages) => languages,
            Err(err) => {
                warn!(error = %err, "failed to decode language config, using factory defaults");
                Self::factory_languages(schemes)
            }
        }
    }

    pub fn languages_to_json(languages: &[LanguageConfig]) -> serde_json::Result<String> {
        serde_json::to_string(languages)
    }
}

/// Persisted configuration for the composition core.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Preferred scheme; `None` means "pick from the language list"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme_id: Option<String>,

    /// Teach the engine every word committed from a candidate
    pub learning_enabled: bool,

    /// Show the candidate window while composing
    pub show_candidates: bool,

    /// Delay before re-transliterating after an edit; 0 refreshes immediately
    pub refresh_debounce_ms: u64,

    /// Maximum number of entries in the text -> candidates cache
    pub max_cache_size: usize,

    /// Characters that commit the top candidate followed by themselves
    pub word_break_chars: String,

    /// Per-scheme enable flags
    pub languages: Vec<LanguageConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheme_id: None,
            learning_enabled: true,
            show_candidates: true,
            refresh_debounce_ms: 0,
            max_cache_size: 256,
            word_break_chars: DEFAULT_WORD_BREAK_CHARS.to_string(),
            languages: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Save configuration to a TOML file, creating parent directories.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let content = self.to_toml_string().context("serializing config")?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn is_word_break(&self, ch: char) -> bool {
        self.word_break_chars.contains(ch)
    }

    pub fn refresh_debounce(&self) -> Duration {
        Duration::from_millis(self.refresh_debounce_ms)
    }

    /// The scheme to load: the stored preference, else the first enabled
    /// language, else the first language, else the first scheme offered.
    pub fn resolve_scheme_id(&self, schemes: &[SchemeDetails]) -> Option<String> {
        if let Some(id) = self.scheme_id.as_ref().filter(|id| !id.is_empty()) {
            return Some(id.clone());
        }
        self.languages
            .iter()
            .find(|lang| lang.is_enabled)
            .or_else(|| self.languages.first())
            .map(|lang| lang.identifier.clone())
            .or_else(|| schemes.first().map(|scheme| scheme.id.clone()))
    }
}
