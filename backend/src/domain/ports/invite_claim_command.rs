//! Driving port for claiming invites.

use async_trait::async_trait;

use crate::domain::{Email, Error, EventId, IdentityRef, InviteToken};

/// Request to bind the caller's identity to an invite slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimInviteRequest {
    pub token: InviteToken,
    pub identity: IdentityRef,
    /// Email asserted by the identity provider, when one was supplied.
    pub identity_email: Option<Email>,
}

/// Result of an invite claim.
///
/// An unknown token and a lost race both surface as
/// [`ClaimInviteResponse::NotClaimed`] so callers cannot probe for valid
/// tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimInviteResponse {
    Claimed { event_id: EventId },
    NotClaimed,
}

impl ClaimInviteResponse {
    pub const fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed { .. })
    }
}

/// Driving port for invite claims.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InviteClaimCommand: Send + Sync {
    /// Bind `request.identity` to the slot addressed by `request.token`.
    async fn claim_invite(&self, request: ClaimInviteRequest)
    -> Result<ClaimInviteResponse, Error>;
}
