//! Port for the single conditional write behind invite claims.

use async_trait::async_trait;

use crate::domain::{Email, EventId, IdentityRef, InviteToken};

use super::define_port_error;

define_port_error! {
    /// Errors raised by invite repository adapters.
    pub enum InviteRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "invite repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "invite repository query failed: {message}",
    }
}

/// Conditional bind request.
///
/// The write applies only when all of these hold at once:
/// - a participant carries `token`;
/// - that participant is still unbound;
/// - no other participant of the same event is bound to `identity`;
/// - when `required_email` is set, the participant email matches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteClaim {
    pub token: InviteToken,
    pub identity: IdentityRef,
    pub required_email: Option<Email>,
}

/// Result of a conditional write as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionalWrite {
    /// Rows changed by the write.
    pub affected_rows: usize,
    /// Event of the bound participant, when a row changed.
    pub event_id: Option<EventId>,
}

impl ConditionalWrite {
    /// The predicate matched nothing.
    pub const fn unapplied() -> Self {
        Self {
            affected_rows: 0,
            event_id: None,
        }
    }

    /// Exactly one row changed.
    pub const fn applied(event_id: EventId) -> Self {
        Self {
            affected_rows: 1,
            event_id: Some(event_id),
        }
    }
}

/// Port for binding identities to invite slots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Issue the conditional bind described by `claim` as one atomic write.
    ///
    /// Adapters must not read-then-write; a concurrent claim for the same
    /// token or identity must observe this write or lose to it.
    async fn claim_unbound(
        &self,
        claim: InviteClaim,
    ) -> Result<ConditionalWrite, InviteRepositoryError>;
}
