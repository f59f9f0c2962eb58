//! Persisted configuration stores.
//!
//! The core only needs `scheme_id` and `learning_enabled` from here, but it
//! always reads a whole `Config` so hosts can keep everything in one place.
//! Stores are read again at every reconciliation point, which is how changes
//! made while the input method was unfocused get noticed.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::Config;

pub trait ConfigStore {
    /// Current configuration. Stores fall back to defaults rather than fail.
    fn load(&self) -> Config;

    fn save(&mut self, config: &Config) -> anyhow::Result<()>;
}

/// In-memory store. Clones share the same configuration, so a host (or a
/// test) can change it out of band while an engine owns another handle.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Config>>,
}

impl MemoryStore {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Rc::new(RefCell::new(config)),
        }
    }

    /// Edit the shared configuration in place.
    pub fn update<F: FnOnce(&mut Config)>(&self, f: F) {
        f(&mut self.inner.borrow_mut());
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Config {
        self.inner.borrow().clone()
    }

    fn save(&mut self, config: &Config) -> anyhow::Result<()> {
        *self.inner.borrow_mut() = config.clone();
        Ok(())
    }
}

/// TOML file store. A missing file reads as the default configuration.
#[derive(Debug, Clone)]
pub struct TomlStore {
    path: PathBuf,
}

impl TomlStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

}

impl ConfigStore for TomlStore {
    fn load(&self) -> Config {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no config file, using defaults");
            return Config::default();
        }
        Config::load_toml(&self.path).unwrap_or_else(|err| {
            warn!(error = %format!("{err:#}"), "unreadable config, using defaults");
            Config::default()
        })
    }

    fn save(&mut self, config: &Config) -> anyhow::Result<()> {
        config.save_toml(&self.path)
    }
}
