//! Invite claim service.
//!
//! A claim is a single conditional write; the number of rows it changed is
//! the only source of truth. No lock is taken, so concurrent claims for the
//! same token race inside the store and exactly one can win.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::domain::Error;
use crate::domain::ports::{
    ClaimInviteRequest, ClaimInviteResponse, InviteClaim, InviteClaimCommand, InviteRepository,
    InviteRepositoryError,
};

fn map_repository_error(error: InviteRepositoryError) -> Error {
    match error {
        InviteRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("invite repository unavailable: {message}"))
        }
        InviteRepositoryError::Query { message } => {
            Error::internal(format!("invite repository error: {message}"))
        }
    }
}

/// Rules applied when binding an identity to an invite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InviteClaimPolicy {
    /// Only bind when the participant email equals the caller's email.
    pub require_matching_email: bool,
}

/// Domain service implementing [`InviteClaimCommand`].
#[derive(Clone)]
pub struct InviteClaimService<R> {
    invite_repo: Arc<R>,
    policy: InviteClaimPolicy,
}

impl<R> InviteClaimService<R> {
    /// Create a claim service with the default policy.
    pub fn new(invite_repo: Arc<R>) -> Self {
        Self {
            invite_repo,
            policy: InviteClaimPolicy::default(),
        }
    }

    /// Replace the claim policy.
    pub fn with_policy(mut self, policy: InviteClaimPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl<R> InviteClaimCommand for InviteClaimService<R>
where
    R: InviteRepository,
{
    async fn claim_invite(
        &self,
        request: ClaimInviteRequest,
    ) -> Result<ClaimInviteResponse, Error> {
        let ClaimInviteRequest {
            token,
            identity,
            identity_email,
        } = request;

        let required_email = if self.policy.require_matching_email {
            let Some(email) = identity_email else {
                debug!("invite claim refused: caller supplied no email");
                return Ok(ClaimInviteResponse::NotClaimed);
            };
            Some(email)
        } else {
            None
        };

        let write = self
            .invite_repo
            .claim_unbound(InviteClaim {
                token,
                identity,
                required_email,
            })
            .await
            .map_err(map_repository_error)?;

        match (write.affected_rows, write.event_id) {
            (0, _) => {
                debug!("invite claim not applied");
                Ok(ClaimInviteResponse::NotClaimed)
            }
            (1, Some(event_id)) => {
                info!(event_id = %event_id, "invite claimed");
                Ok(ClaimInviteResponse::Claimed { event_id })
            }
            (1, None) => Err(Error::internal("invite claim did not report its event")),
            (rows, _) => {
                error!(affected_rows = rows, "invite token bound more than one participant");
                Err(Error::internal("invite claim affected more than one participant"))
            }
        }
    }
}
