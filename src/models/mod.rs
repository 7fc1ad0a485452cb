//! Data models for the gamebk backup service.
//!
//! These models mirror the JSON the backup API sends and accepts.

mod backup;
mod envelope;
mod game;
mod id;

pub use backup::*;
pub use envelope::*;
pub use game::*;
pub use id::*;
