//! Domain primitives, ports and services.
//!
//! Purpose: define the strongly typed entities behind draws and invite
//! claims, the ports adapters implement, and the services that orchestrate
//! them. Nothing here knows about HTTP or SQL.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Participant and its identifiers: invitees and the identities bound to
//!   them.
//! - DrawSnapshot, DrawCommit and DrawRunStatus: draw lifecycle state.
//! - DrawService, InviteClaimService and AssignmentQueryService: driving
//!   port implementations.

pub mod draw;
mod assignment_query_service;
mod draw_service;
pub mod error;
mod invite_claim_service;
pub mod participant;
pub mod ports;
mod trace_id;

pub use self::draw::{
    AssignedReceiver, Assignment, DrawCommit, DrawRunStatus, DrawSnapshot, DrawTransitionError, Exclusion,
    SnapshotFingerprint, UnknownDrawStatus, strategy_label,
};
pub use self::assignment_query_service::AssignmentQueryService;
pub use self::draw_service::{DEFAULT_MAX_STALE_RETRIES, DrawService};
pub use self::error::{Error, ErrorCode};
pub use self::invite_claim_service::{InviteClaimPolicy, InviteClaimService};
pub use self::participant::{
    Email, EventId, IDENTIFIER_MAX, IdentityRef, InviteToken, Participant, ParticipantDraft,
    ParticipantId, ParticipantValidationError,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use santa_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
