//! Backup model matching the backup API's backup resource.

use serde::{Deserialize, Serialize};

use super::EntityId;

/// One snapshot of a game's save data, owned by that game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Backup {
    pub id: EntityId,
    pub game_id: EntityId,
    #[serde(default)]
    pub name: Option<String>,
    pub backup_path: String,
    pub created_at: String,
    pub size_bytes: u64,
}

/// Request body for running a backup. `name` is always sent, as `null`
/// when the user left it blank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateBackupRequest {
    pub name: Option<String>,
}
