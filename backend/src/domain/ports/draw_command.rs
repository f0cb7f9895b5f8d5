//! Driving port for running and resetting an event's draw.

use async_trait::async_trait;
use draw_engine::Strategy;

use crate::domain::{Error, EventId, IdentityRef, ParticipantId};

/// Request to run the draw for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDrawRequest {
    pub event_id: EventId,
    pub actor: IdentityRef,
}

/// Request to discard an event's committed draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetDrawRequest {
    pub event_id: EventId,
    pub actor: IdentityRef,
}

/// Reasons a draw request produced no new assignments.
///
/// These are expected outcomes rather than errors: nothing was persisted and
/// the caller decides how to present them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawFailure {
    /// The participant or exclusion set cannot form a draw.
    InvalidInput { message: String },
    /// The exclusions leave no valid assignment.
    Infeasible {
        /// Number of givers that cannot be matched simultaneously.
        conflicting_constraints: usize,
        /// Givers with no allowed receiver at all.
        blocked_givers: Vec<ParticipantId>,
    },
    /// Assignments already exist for the event.
    AlreadyCommitted { assignment_count: usize },
}

impl DrawFailure {
    /// Stable machine-readable reason.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::Infeasible { .. } => "infeasible",
            Self::AlreadyCommitted { .. } => "already_committed",
        }
    }
}

/// Result of a draw request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    /// Assignments were written atomically.
    Committed {
        assignment_count: usize,
        seed: u64,
        strategy: Strategy,
    },
    /// No assignments were written.
    Failed(DrawFailure),
}

/// Response from resetting a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetDrawResponse {
    pub discarded_assignments: usize,
}

/// Driving port for draw operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DrawCommand: Send + Sync {
    /// Run the draw for an event under its exclusive lock.
    ///
    /// Returns `Err` only for lock contention, refused authorisation and
    /// store failures; every other result is a [`DrawOutcome`].
    async fn request_draw(&self, request: RequestDrawRequest) -> Result<DrawOutcome, Error>;

    /// Discard every assignment for the event and return it to pending.
    async fn reset_draw(&self, request: ResetDrawRequest) -> Result<ResetDrawResponse, Error>;
}
