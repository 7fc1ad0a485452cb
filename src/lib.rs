//! gamebk client
//!
//! Drives the gamebk save-game backup REST API: registers games, runs and
//! restores backups, and keeps the rendered tables, the selected game and
//! the user feedback consistent with what the server reports.

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod messages;
pub mod models;
pub mod notify;
pub mod render;
pub mod selection;
pub mod transport;

pub use coordinator::{ActionCoordinator, Activation, Deletion, HealthStatus};

#[cfg(test)]
mod testing;
