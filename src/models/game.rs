//! Game model matching the backup API's game resource.

use serde::{Deserialize, Serialize};

use super::EntityId;

/// A registered save-data target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    pub id: EntityId,
    pub name: String,
    pub game_path: String,
    pub backup_root: String,
    #[serde(default)]
    pub last_backup_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Request body for creating a new game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateGameRequest {
    pub name: String,
    pub game_path: String,
    pub backup_root: String,
}

/// Request body for a partial game update. Unset fields are omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateGameRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_root: Option<String>,
}

impl UpdateGameRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.game_path.is_none() && self.backup_root.is_none()
    }
}
