//! Intent catalogue, page profiles and the in-flight duplicate policy.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use crate::errors::ClientError;
use crate::models::EntityId;
use crate::render::RowAction;

/// Something the user can ask the client to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    ListGames,
    CreateGame,
    UpdateGame,
    RunBackup,
    RestoreLatest,
    RestoreById,
    DeleteBackup,
    ListBackups,
    HealthCheck,
}

impl Intent {
    pub const ALL: [Intent; 9] = [
        Intent::ListGames,
        Intent::CreateGame,
        Intent::UpdateGame,
        Intent::RunBackup,
        Intent::RestoreLatest,
        Intent::RestoreById,
        Intent::DeleteBackup,
        Intent::ListBackups,
        Intent::HealthCheck,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::ListGames => "list-games",
            Intent::CreateGame => "create-game",
            Intent::UpdateGame => "update-game",
            Intent::RunBackup => "run-backup",
            Intent::RestoreLatest => "restore-latest",
            Intent::RestoreById => "restore-by-id",
            Intent::DeleteBackup => "delete-backup",
            Intent::ListBackups => "list-backups",
            Intent::HealthCheck => "health-check",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which page the coordinator is serving. Each page offers a subset of the
/// intents and its own row buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    /// Single-page console: everything except delete; games are selectable.
    Console,
    /// Game list: register and edit games, open one.
    GameList,
    /// One game's backups: back up, restore, delete.
    GameDetail,
    /// Every intent; used by the command-line host.
    #[default]
    Full,
}

impl Page {
    pub fn intents(self) -> &'static [Intent] {
        match self {
            Page::Console => &[
                Intent::ListGames,
                Intent::CreateGame,
                Intent::UpdateGame,
                Intent::RunBackup,
                Intent::RestoreLatest,
                Intent::RestoreById,
                Intent::ListBackups,
                Intent::HealthCheck,
            ],
            Page::GameList => &[
                Intent::ListGames,
                Intent::CreateGame,
                Intent::UpdateGame,
                Intent::HealthCheck,
            ],
            Page::GameDetail => &[
                Intent::ListGames,
                Intent::RunBackup,
                Intent::RestoreLatest,
                Intent::RestoreById,
                Intent::DeleteBackup,
                Intent::ListBackups,
            ],
            Page::Full => &Intent::ALL,
        }
    }

    pub fn allows(self, intent: Intent) -> bool {
        self.intents().contains(&intent)
    }

    /// Buttons on each row of the games table.
    pub fn game_actions(self, id: &EntityId) -> Vec<RowAction> {
        match self {
            Page::Console | Page::Full => vec![RowAction::Select(id.clone())],
            Page::GameList => vec![RowAction::Open(id.clone()), RowAction::Edit(id.clone())],
            Page::GameDetail => Vec::new(),
        }
    }

    pub fn has_game_actions(self) -> bool {
        !matches!(self, Page::GameDetail)
    }

    pub fn has_backup_actions(self) -> bool {
        matches!(self, Page::GameDetail | Page::Full)
    }

    /// Buttons on each row of the backups table.
    pub fn backup_actions(self, id: &EntityId) -> Vec<RowAction> {
        match self {
            Page::GameDetail | Page::Full => {
                vec![RowAction::Restore(id.clone()), RowAction::Delete(id.clone())]
            }
            Page::Console | Page::GameList => Vec::new(),
        }
    }
}

/// What to do when an action is submitted while an identical one is
/// still waiting for its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Send it anyway; two identical server operations may run.
    #[default]
    Allow,
    /// Refuse the second submission.
    Forbid,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(DuplicatePolicy::Allow),
            "forbid" => Ok(DuplicatePolicy::Forbid),
            other => Err(format!("unknown duplicate policy {}", other)),
        }
    }
}

/// Identity of a submission for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ActionKey {
    pub(crate) intent: Intent,
    pub(crate) game: Option<EntityId>,
    pub(crate) backup: Option<EntityId>,
}

/// Submissions currently awaiting a response.
#[derive(Default)]
pub(crate) struct InFlight {
    active: Mutex<HashSet<ActionKey>>,
}

impl InFlight {
    pub(crate) fn begin(
        &self,
        key: ActionKey,
        policy: DuplicatePolicy,
    ) -> Result<InFlightGuard<'_>, ClientError> {
        if policy == DuplicatePolicy::Allow {
            return Ok(InFlightGuard {
                active: &self.active,
                key: None,
            });
        }
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(key.clone()) {
            return Err(ClientError::Duplicate(key.intent));
        }
        Ok(InFlightGuard {
            active: &self.active,
            key: Some(key),
        })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Releases the key when the action finishes, however it finishes.
pub(crate) struct InFlightGuard<'a> {
    active: &'a Mutex<HashSet<ActionKey>>,
    key: Option<ActionKey>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.active
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
        }
    }
}
