//! Engine error type shared by every operation.

use crate::models::{MatchId, TournamentId};
use thiserror::Error;

/// Errors that can occur during tournament operations.
///
/// Every variant except `ConflictDetected` aborts the operation with prior state unchanged.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Fewer than 2 eligible teams for a bracket.
    #[error("Need at least 2 eligible teams (found {eligible})")]
    InsufficientTeams { eligible: usize },

    /// The operation is not allowed in the current state.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Matches remain unplaced after the date/time window ran out.
    #[error("Scheduling window exhausted: {unplaced} match(es) could not be placed")]
    SchedulingWindowExhausted { unplaced: usize },

    /// Advisory: a placement overlaps other matches on the same court.
    #[error("Schedule conflict: match {match_id} overlaps {count} other match(es)")]
    ConflictDetected { match_id: MatchId, count: usize },

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Round {0} not found")]
    RoundNotFound(u32),

    /// Bracket construction for this format is not provided.
    #[error("Unsupported tournament format: {0}")]
    UnsupportedFormat(String),

    /// Malformed request (bad window, empty court list, ...).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Roster CSV could not be read.
    #[error("Roster import error: {0}")]
    Roster(#[from] csv::Error),
}

impl EngineError {
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        EngineError::InvalidTransition(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        EngineError::InvalidRequest(msg.into())
    }

    /// True for the three "reference does not resolve" variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::TournamentNotFound(_)
                | EngineError::MatchNotFound(_)
                | EngineError::RoundNotFound(_)
        )
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
