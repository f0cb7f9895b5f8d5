//! Invite claim handler.
//!
//! ```text
//! POST /api/v1/invites/{token}/claim  Bind the caller to an invite slot
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::domain::InviteToken;
use crate::domain::ports::{ClaimInviteRequest, ClaimInviteResponse};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::CallerIdentity;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Deserialize)]
struct InvitePath {
    token: String,
}

/// Claim response body. `eventId` is present only when the claim won.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimInviteResponseBody {
    pub claimed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(format = "uuid")]
    pub event_id: Option<String>,
}

impl From<ClaimInviteResponse> for ClaimInviteResponseBody {
    fn from(value: ClaimInviteResponse) -> Self {
        match value {
            ClaimInviteResponse::Claimed { event_id } => Self {
                claimed: true,
                event_id: Some(event_id.to_string()),
            },
            ClaimInviteResponse::NotClaimed => Self {
                claimed: false,
                event_id: None,
            },
        }
    }
}

/// Claim an invite for the calling identity.
///
/// Unknown, malformed and already-claimed tokens all answer
/// `{"claimed": false}` so tokens cannot be probed.
#[utoipa::path(
    post,
    path = "/api/v1/invites/{token}/claim",
    params(
        ("token" = String, Path, description = "Invite token from the invitation link")
    ),
    responses(
        (status = 200, description = "Claim result", body = ClaimInviteResponseBody),
        (status = 401, description = "Identity missing", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["invites"],
    operation_id = "claimInvite",
    security(("IdentityHeader" = []))
)]
#[post("/invites/{token}/claim")]
pub async fn claim_invite(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<InvitePath>,
) -> ApiResult<web::Json<ClaimInviteResponseBody>> {
    let Ok(token) = path.token.parse::<InviteToken>() else {
        debug!("rejecting malformed invite token");
        return Ok(web::Json(ClaimInviteResponse::NotClaimed.into()));
    };

    let response = state
        .invites
        .claim_invite(ClaimInviteRequest {
            token,
            identity: caller.subject,
            identity_email: caller.email,
        })
        .await?;
    Ok(web::Json(response.into()))
}
