//! Port for event-scoped draw persistence.
//!
//! A draw holds an exclusive per-event session from snapshot load to commit.
//! Adapters guarantee that two sessions for the same event never coexist and
//! that dropping a session without committing writes nothing.

use async_trait::async_trait;

use crate::domain::{DrawCommit, DrawSnapshot, EventId, IdentityRef, SnapshotFingerprint};

use super::define_port_error;

define_port_error! {
    /// Errors raised by draw repository adapters.
    pub enum DrawRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "draw repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "draw repository query failed: {message}",
        /// Another draw or reset holds the event, or the store aborted a
        /// conflicting transaction.
        Contention { message: String } =>
            "draw repository contention: {message}",
        /// The actor may not run or reset draws for the event.
        Forbidden { message: String } =>
            "draw operation refused: {message}",
        /// The event does not exist.
        EventNotFound { message: String } =>
            "event not found: {message}",
    }
}

/// Outcome of resetting an event's draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetResult {
    pub discarded_assignments: usize,
}

/// Exclusive draw session for one event.
///
/// Every method runs under the event lock acquired by
/// [`DrawRepository::lock_event`]. After [`DrawSession::commit`] or
/// [`DrawSession::release`] the session must not be used again.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DrawSession: Send {
    /// Read participants, exclusions, run status and assignment count.
    async fn load_snapshot(&mut self) -> Result<DrawSnapshot, DrawRepositoryError>;

    /// Re-read the participant and exclusion sets and fingerprint them.
    async fn current_fingerprint(&mut self) -> Result<SnapshotFingerprint, DrawRepositoryError>;

    /// Atomically write every assignment and mark the run committed, then
    /// release the lock.
    async fn commit(&mut self, commit: DrawCommit) -> Result<(), DrawRepositoryError>;

    /// Release the lock without writing anything.
    async fn release(&mut self) -> Result<(), DrawRepositoryError>;
}

/// Port for per-event draw sessions and resets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DrawRepository: Send + Sync {
    /// Acquire the exclusive draw lock for `event_id` on behalf of `actor`.
    ///
    /// Fails fast with [`DrawRepositoryError::Contention`] when the lock is
    /// held elsewhere, and with [`DrawRepositoryError::Forbidden`] when
    /// `actor` does not administer the event.
    async fn lock_event(
        &self,
        event_id: EventId,
        actor: &IdentityRef,
    ) -> Result<Box<dyn DrawSession>, DrawRepositoryError>;

    /// Delete every assignment for the event and return its run to pending.
    async fn reset(
        &self,
        event_id: EventId,
        actor: &IdentityRef,
    ) -> Result<ResetResult, DrawRepositoryError>;
}
