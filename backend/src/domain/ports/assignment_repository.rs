//! Port for reading a giver's committed assignment.

use async_trait::async_trait;

use crate::domain::{AssignedReceiver, EventId, IdentityRef};

use super::define_port_error;

define_port_error! {
    /// Errors raised by assignment repository adapters.
    pub enum AssignmentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "assignment repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "assignment repository query failed: {message}",
        /// The event does not exist.
        EventNotFound { message: String } =>
            "event not found: {message}",
        /// No participant of the event is bound to the viewer.
        NotParticipant { message: String } =>
            "not a participant: {message}",
    }
}

/// Port for revealing assignments to the givers they belong to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Receiver drawn for the participant bound to `viewer`.
    ///
    /// Returns `Ok(None)` while the event has no committed draw. Only the
    /// viewer's own pairing is ever read.
    async fn receiver_for(
        &self,
        event_id: EventId,
        viewer: &IdentityRef,
    ) -> Result<Option<AssignedReceiver>, AssignmentRepositoryError>;
}
