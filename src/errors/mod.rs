//! Error handling module for the gamebk client.
//!
//! Failures split by when they are detected: before any request
//! (preconditions, rejected duplicates, unencodable bodies), while sending
//! (transport), or from the server's response (application errors).

use crate::coordinator::Intent;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const PRECONDITION_FAILED: &str = "PRECONDITION_FAILED";
    pub const DUPLICATE_ACTION: &str = "DUPLICATE_ACTION";
    pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";
    pub const APPLICATION_ERROR: &str = "APPLICATION_ERROR";
    pub const ENCODE_ERROR: &str = "ENCODE_ERROR";
}

/// A client-detected reason to refuse an action before issuing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The action is scoped to the selected game and none is selected.
    NoGameSelected,
    /// A required form field is blank.
    MissingField(&'static str),
    /// An update form with no field filled in.
    EmptyPatch,
    /// No game id was supplied.
    MissingGameId,
    /// No backup id was supplied.
    MissingBackupId,
    /// An id that cannot be used as a path segment.
    InvalidId(String),
    /// The current page profile does not offer this intent.
    IntentDisabled(Intent),
    /// The requested game is not in the server's game list.
    GameNotFound(String),
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precondition::NoGameSelected => write!(f, "select a game first"),
            Precondition::MissingField(field) => write!(f, "{} is required", field),
            Precondition::EmptyPatch => write!(f, "no fields to update"),
            Precondition::MissingGameId => write!(f, "game id is required"),
            Precondition::MissingBackupId => write!(f, "backup id is required"),
            Precondition::InvalidId(id) => write!(f, "invalid id {:?}", id),
            Precondition::IntentDisabled(intent) => {
                write!(f, "{} is not available on this page", intent)
            }
            Precondition::GameNotFound(id) => write!(f, "game {} not found", id),
        }
    }
}

/// Client error type.
#[derive(Debug)]
pub enum ClientError {
    /// Refused before any request was sent
    Precondition(Precondition),
    /// An identical action is already in flight and the policy forbids duplicates
    Duplicate(Intent),
    /// The request could not complete
    Transport(String),
    /// The request completed with a non-success status
    Application {
        status: u16,
        message: Option<String>,
    },
    /// A request body could not be serialized
    Encode(String),
}

impl ClientError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Precondition(_) => codes::PRECONDITION_FAILED,
            ClientError::Duplicate(_) => codes::DUPLICATE_ACTION,
            ClientError::Transport(_) => codes::TRANSPORT_ERROR,
            ClientError::Application { .. } => codes::APPLICATION_ERROR,
            ClientError::Encode(_) => codes::ENCODE_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            ClientError::Precondition(p) => p.to_string(),
            ClientError::Duplicate(intent) => format!("{} is already in progress", intent),
            ClientError::Transport(msg) => msg.clone(),
            ClientError::Application { status, message } => match message {
                Some(msg) => format!("HTTP {}: {}", status, msg),
                None => format!("HTTP {}", status),
            },
            ClientError::Encode(msg) => msg.clone(),
        }
    }

    /// True when the action was refused without touching the network.
    pub fn is_precondition(&self) -> bool {
        matches!(self, ClientError::Precondition(_))
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for ClientError {}

impl From<Precondition> for ClientError {
    fn from(p: Precondition) -> Self {
        ClientError::Precondition(p)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        tracing::warn!("Transport error: {:?}", err);
        ClientError::Transport(format!("Transport error: {}", err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        ClientError::Encode(format!("JSON error: {}", err))
    }
}
