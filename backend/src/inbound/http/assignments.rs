//! Assignment reveal handler.
//!
//! ```text
//! GET /api/v1/events/{event_id}/assignment  The caller's own receiver
//! ```

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{MyAssignmentRequest, MyAssignmentResponse};
use crate::inbound::http::ApiResult;
use crate::inbound::http::draws::parse_event_id;
use crate::inbound::http::identity::CallerIdentity;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Deserialize)]
struct EventPath {
    event_id: String,
}

/// The participant the caller buys a gift for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponseBody {
    #[schema(format = "uuid")]
    pub receiver_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub email: String,
}

impl From<MyAssignmentResponse> for AssignmentResponseBody {
    fn from(value: MyAssignmentResponse) -> Self {
        let receiver = value.receiver;
        Self {
            receiver_id: receiver.participant_id.to_string(),
            display_name: receiver.display_name,
            email: receiver.email.into(),
        }
    }
}

/// Reveal the caller's receiver once the event's draw is committed.
///
/// Only the giver's own pairing is returned; no caller can read another
/// participant's assignment.
#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}/assignment",
    params(
        ("event_id" = String, Path, description = "Event identifier")
    ),
    responses(
        (status = 200, description = "The caller's receiver", body = AssignmentResponseBody),
        (status = 400, description = "Invalid event id", body = ErrorSchema),
        (status = 401, description = "Identity missing", body = ErrorSchema),
        (status = 403, description = "Caller has not joined the event", body = ErrorSchema),
        (status = 404, description = "Event not found or draw not committed", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["assignments"],
    operation_id = "getMyAssignment",
    security(("IdentityHeader" = []))
)]
#[get("/events/{event_id}/assignment")]
pub async fn my_assignment(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<EventPath>,
) -> ApiResult<web::Json<AssignmentResponseBody>> {
    let event_id = parse_event_id(&path.event_id)?;
    let response = state
        .assignments
        .my_assignment(MyAssignmentRequest {
            event_id,
            viewer: caller.subject,
        })
        .await?;
    Ok(web::Json(response.into()))
}
