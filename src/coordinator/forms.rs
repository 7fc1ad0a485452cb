//! Form input and its conversion into request bodies.

use crate::errors::Precondition;
use crate::models::{CreateBackupRequest, CreateGameRequest, Game, UpdateGameRequest};

fn filled(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The create/edit game form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameForm {
    pub name: String,
    pub game_path: String,
    pub backup_root: String,
}

impl GameForm {
    /// Prefill for editing an existing game.
    pub fn from_game(game: &Game) -> Self {
        Self {
            name: game.name.clone(),
            game_path: game.game_path.clone(),
            backup_root: game.backup_root.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// All three fields are required.
    pub fn to_create_request(&self) -> Result<CreateGameRequest, Precondition> {
        Ok(CreateGameRequest {
            name: filled(&self.name).ok_or(Precondition::MissingField("name"))?,
            game_path: filled(&self.game_path).ok_or(Precondition::MissingField("game_path"))?,
            backup_root: filled(&self.backup_root)
                .ok_or(Precondition::MissingField("backup_root"))?,
        })
    }

    /// Only the fields the user filled in; nothing filled is refused.
    pub fn to_update_request(&self) -> Result<UpdateGameRequest, Precondition> {
        let request = UpdateGameRequest {
            name: filled(&self.name),
            game_path: filled(&self.game_path),
            backup_root: filled(&self.backup_root),
        };
        if request.is_empty() {
            return Err(Precondition::EmptyPatch);
        }
        Ok(request)
    }
}

/// The run-backup form: an optional backup name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupForm {
    pub name: String,
}

impl BackupForm {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn reset(&mut self) {
        self.name.clear();
    }

    pub fn to_request(&self) -> CreateBackupRequest {
        CreateBackupRequest {
            name: filled(&self.name),
        }
    }
}
