//! Shared error types for the services crate.

use thiserror::Error;

use classroom_core::ConfigError;
use classroom_core::model::{CardId, Role, ScoreBoardError, SummaryError};
use storage::StorageError;

/// Errors emitted by session controllers.
///
/// `IllegalState` and the card errors indicate a caller bug; the session
/// refuses the call and is left exactly as it was.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("{operation} is not allowed while the session is {phase}")]
    IllegalState {
        operation: &'static str,
        phase: &'static str,
    },
    #[error("card {0} is not on the board")]
    UnknownCard(CardId),
    #[error("card {0} is already face up")]
    CardUnavailable(CardId),
    #[error("no correct answer is waiting to be credited")]
    NoCreditPending,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Score(#[from] ScoreBoardError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

/// Errors emitted while publishing or exporting results.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PublishError {
    #[error("no profile found for the current user")]
    UnknownUser,
    #[error("role {role:?} may not publish results")]
    NotPermitted { role: Option<Role> },
    #[error("the session has not completed yet")]
    NotCompleted,
    #[error(transparent)]
    Persistence(#[from] StorageError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors emitted while loading game configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigLoadError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
