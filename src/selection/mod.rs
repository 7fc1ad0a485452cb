//! Selection store.
//!
//! Holds the one game the current page's actions are scoped to. The store is
//! constructed per page session and cloned into every consumer, so all of
//! them read the same value instead of caching an id of their own.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::{EntityId, Game};

#[derive(Clone, Default)]
pub struct SelectionStore {
    selected: Arc<Mutex<Option<Game>>>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Game>> {
        self.selected.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_selected(&self, game: Game) {
        tracing::debug!("Selected game {}", game.id);
        *self.slot() = Some(game);
    }

    pub fn get_selected(&self) -> Option<Game> {
        self.slot().clone()
    }

    pub fn selected_id(&self) -> Option<EntityId> {
        self.slot().as_ref().map(|g| g.id.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.slot().is_none()
    }

    /// Only navigation away clears the selection.
    pub fn clear(&self) {
        *self.slot() = None;
    }

    /// After a list refresh, swap in the server's current copy of the
    /// selected game. A game missing from the list stays selected.
    pub fn reconcile(&self, games: &[Game]) {
        let mut slot = self.slot();
        let Some(current) = slot.as_ref() else {
            return;
        };
        if let Some(fresh) = games.iter().find(|g| g.id == current.id) {
            *slot = Some(fresh.clone());
        }
    }
}
