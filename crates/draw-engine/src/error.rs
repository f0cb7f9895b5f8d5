//! Error types for the draw engine.
//!
//! Graph construction and solving report failures as typed values so callers
//! can tell malformed input apart from constraint sets that admit no draw.

use std::fmt;

use thiserror::Error;

/// Errors raised while building a [`crate::ConstraintGraph`].
///
/// Every variant means the caller must fix its data; retrying with the same
/// input always fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError<Id: fmt::Debug> {
    /// Fewer participants than a draw needs.
    #[error("a draw needs at least {minimum} participants, found {found}")]
    TooFewParticipants {
        /// Minimum participant count for a draw.
        minimum: usize,
        /// Participant count supplied by the caller.
        found: usize,
    },

    /// The same participant appears more than once in the input list.
    #[error("participant {id:?} appears more than once")]
    DuplicateParticipant {
        /// The repeated participant identifier.
        id: Id,
    },

    /// An exclusion names a participant that is not part of the draw.
    #[error("exclusion references unknown participant {id:?}")]
    UnknownParticipant {
        /// The identifier that could not be resolved.
        id: Id,
    },

    /// An exclusion names the same participant as giver and receiver.
    #[error("participant {id:?} cannot be excluded from drawing themself")]
    SelfExclusion {
        /// The participant named on both sides of the exclusion.
        id: Id,
    },
}

/// Errors raised by the [`crate::Solver`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError<Id: fmt::Debug> {
    /// The exclusions admit no assignment where everybody gives and receives
    /// exactly once.
    #[error("no valid assignment exists: {unmatched} giver(s) cannot be matched")]
    Infeasible {
        /// Hall deficiency: givers left without a receiver by a maximum
        /// matching.
        unmatched: usize,
        /// Givers whose every potential receiver is forbidden.
        blocked_givers: Vec<Id>,
    },
}

impl<Id: fmt::Debug> SolveError<Id> {
    /// Number of givers that cannot be satisfied under the current
    /// constraints.
    ///
    /// # Examples
    /// ```
    /// use draw_engine::SolveError;
    ///
    /// let err: SolveError<u32> = SolveError::Infeasible {
    ///     unmatched: 1,
    ///     blocked_givers: vec![7],
    /// };
    /// assert_eq!(err.conflicting_constraints(), 1);
    /// ```
    #[must_use]
    pub const fn conflicting_constraints(&self) -> usize {
        match self {
            Self::Infeasible { unmatched, .. } => *unmatched,
        }
    }
}
