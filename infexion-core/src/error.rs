//! Engine error taxonomy

use crate::board::{Action, Player};

/// Errors raised by the engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The action violates the board constraints
    #[error("Illegal action {action}: {reason}")]
    IllegalAction { action: Action, reason: String },

    /// The side to move has nothing to play
    #[error("No legal move for {0:?}")]
    NoLegalMove(Player),

    /// Soft failure used to unwind a search that ran out of time or space
    #[error("Search budget exceeded")]
    BudgetExceeded,

    /// Weights or limits out of their valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl EngineError {
    pub(crate) fn illegal(action: Action, reason: impl Into<String>) -> Self {
        EngineError::IllegalAction {
            action,
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        EngineError::InvalidConfiguration(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
