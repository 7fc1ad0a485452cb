//! Paths of the backup API.
//!
//! Ids are percent-encoded so each one stays a single path segment.

use std::borrow::Cow;

use crate::models::EntityId;

pub const GAMES: &str = "/api/v1/games";
pub const HEALTH: &str = "/healthz";

fn segment(id: &EntityId) -> Cow<'_, str> {
    urlencoding::encode(id.as_str())
}

pub fn game(id: &EntityId) -> String {
    format!("{}/{}", GAMES, segment(id))
}

pub fn run_backup(id: &EntityId) -> String {
    format!("{}/{}/backup", GAMES, segment(id))
}

pub fn backups(id: &EntityId) -> String {
    format!("{}/{}/backups", GAMES, segment(id))
}

pub fn backup(id: &EntityId, backup_id: &EntityId) -> String {
    format!("{}/{}/backups/{}", GAMES, segment(id), segment(backup_id))
}

pub fn restore_latest(id: &EntityId) -> String {
    format!("{}/{}/restore/latest", GAMES, segment(id))
}

pub fn restore(id: &EntityId, backup_id: &EntityId) -> String {
    format!("{}/{}/restore/{}", GAMES, segment(id), segment(backup_id))
}
