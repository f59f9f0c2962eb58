//! Scheme reconciliation across the three places a scheme id lives.
//!
//! - runtime: the scheme loaded in the engine
//! - persisted: the stored user preference
//! - ui: the last entry picked from the selection menu
//!
//! Each trigger moves information in exactly one direction:
//! menu selection goes ui -> persisted -> runtime, focus gain goes
//! persisted -> runtime, and menu rendering reads runtime without writing.

use serde::{Deserialize, Serialize};

use crate::engine::SchemeDetails;
use crate::LanguageConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeState {
    pub runtime_scheme_id: String,
    pub persisted_scheme_id: String,
    pub ui_selected_scheme_id: String,
}

impl SchemeState {
    /// State right after loading `scheme_id` from the persisted preference.
    pub fn converged(scheme_id: &str) -> Self {
        Self {
            runtime_scheme_id: scheme_id.to_string(),
            persisted_scheme_id: scheme_id.to_string(),
            ui_selected_scheme_id: scheme_id.to_string(),
        }
    }

    pub fn is_converged(&self) -> bool {
        self.runtime_scheme_id == self.persisted_scheme_id
            && self.persisted_scheme_id == self.ui_selected_scheme_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemeTrigger {
    /// The user picked a scheme from the selection menu.
    MenuSelected(String),
    /// Input focus arrived; `persisted` is the freshly read preference.
    FocusGained { persisted: String },
    /// The selection menu is about to be drawn.
    RenderMenu,
}

/// Side effects the caller must carry out after a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemeAction {
    /// Write the id to the persisted configuration.
    Persist(String),
    /// Reinitialize the engine with the id.
    Reload(String),
}

/// Apply one trigger to `state`, returning the new state and the actions
/// that bring the outside world in line with it.
pub fn reconcile(trigger: SchemeTrigger, state: &SchemeState) -> (SchemeState, Vec<SchemeAction>) {
    let mut next = state.clone();
    let mut actions = Vec::new();
    match trigger {
        SchemeTrigger::MenuSelected(id) => {
            next.ui_selected_scheme_id = id.clone();
            next.persisted_scheme_id = id.clone();
            actions.push(SchemeAction::Persist(id.clone()));
            if next.runtime_scheme_id != id {
                next.runtime_scheme_id = id.clone();
                actions.push(SchemeAction::Reload(id));
            }
        }
        SchemeTrigger::FocusGained { persisted } => {
            next.persisted_scheme_id = persisted.clone();
            if next.runtime_scheme_id != persisted {
                next.runtime_scheme_id = persisted.clone();
                actions.push(SchemeAction::Reload(persisted));
            }
        }
        SchemeTrigger::RenderMenu => {}
    }
    (next, actions)
}

/// One entry of the scheme-selection surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeMenuItem {
    pub id: String,
    pub title: String,
    pub is_stable: bool,
    pub active: bool,
}

/// Build the selection menu from the available schemes. Disabled languages
/// are left out; the entry equal to the runtime scheme is marked active.
pub fn scheme_menu(
    schemes: &[SchemeDetails],
    languages: &[LanguageConfig],
    state: &SchemeState,
) -> Vec<SchemeMenuItem> {
    schemes
        .iter()
        .filter(|scheme| {
            languages
                .iter()
                .find(|lang| lang.identifier == scheme.id)
                .map_or(true, |lang| lang.is_enabled)
        })
        .map(|scheme| SchemeMenuItem {
            id: scheme.id.clone(),
            title: scheme.display_name.clone(),
            is_stable: scheme.is_stable,
            active: scheme.id == state.runtime_scheme_id,
        })
        .collect()
}
