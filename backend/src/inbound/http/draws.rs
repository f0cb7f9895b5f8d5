//! Draw API handlers.
//!
//! ```text
//! POST /api/v1/events/{event_id}/draw        Run the event's draw
//! POST /api/v1/events/{event_id}/draw/reset  Discard the committed draw
//! ```
//!
//! Expected draw failures (invalid input, infeasible exclusions, an existing
//! draw) are reported in the draw response body with a matching status code.
//! Lock contention and store failures use the standard error envelope.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::{
    DrawFailure, DrawOutcome, RequestDrawRequest, ResetDrawRequest, ResetDrawResponse,
};
use crate::domain::{Error, EventId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::CallerIdentity;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Deserialize)]
struct EventPath {
    event_id: String,
}

/// Whether the draw produced assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DrawStatusBody {
    Committed,
    Failed,
}

/// Draw response body.
///
/// Committed draws report only the number of assignments; who drew whom is
/// never returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrawResponseBody {
    pub status: DrawStatusBody,
    /// `infeasible`, `already_committed` or `invalid_input` when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_constraints: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<String>>)]
    pub blocked_givers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DrawResponseBody {
    fn new(status: DrawStatusBody) -> Self {
        Self {
            status,
            reason: None,
            assignment_count: None,
            conflicting_constraints: None,
            blocked_givers: None,
            message: None,
        }
    }
}

/// Reset response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetDrawResponseBody {
    pub reset: bool,
    pub discarded_assignments: usize,
}

impl From<ResetDrawResponse> for ResetDrawResponseBody {
    fn from(value: ResetDrawResponse) -> Self {
        Self {
            reset: true,
            discarded_assignments: value.discarded_assignments,
        }
    }
}

pub(crate) fn parse_event_id(raw: &str) -> Result<EventId, Error> {
    raw.parse().map_err(|_| {
        Error::invalid_request("eventId must be a valid UUID").with_details(json!({
            "field": "eventId",
            "value": raw,
            "code": "invalid_uuid",
        }))
    })
}

fn draw_response(outcome: DrawOutcome) -> (StatusCode, DrawResponseBody) {
    let failure = match outcome {
        DrawOutcome::Committed {
            assignment_count, ..
        } => {
            let mut body = DrawResponseBody::new(DrawStatusBody::Committed);
            body.assignment_count = Some(assignment_count);
            return (StatusCode::OK, body);
        }
        DrawOutcome::Failed(failure) => failure,
    };

    let mut body = DrawResponseBody::new(DrawStatusBody::Failed);
    body.reason = Some(failure.reason().to_owned());
    let status = match failure {
        DrawFailure::InvalidInput { message } => {
            body.message = Some(message);
            StatusCode::BAD_REQUEST
        }
        DrawFailure::Infeasible {
            conflicting_constraints,
            blocked_givers,
        } => {
            body.conflicting_constraints = Some(conflicting_constraints);
            body.blocked_givers = Some(blocked_givers.iter().map(ToString::to_string).collect());
            StatusCode::UNPROCESSABLE_ENTITY
        }
        DrawFailure::AlreadyCommitted { assignment_count } => {
            body.assignment_count = Some(assignment_count);
            StatusCode::CONFLICT
        }
    };
    (status, body)
}

/// Run the draw for an event.
///
/// Only the event organiser or a bound admin participant may draw.
#[utoipa::path(
    post,
    path = "/api/v1/events/{event_id}/draw",
    params(
        ("event_id" = String, Path, description = "Event identifier")
    ),
    responses(
        (status = 200, description = "Draw committed", body = DrawResponseBody),
        (status = 400, description = "Invalid event id or draw input", body = DrawResponseBody),
        (status = 401, description = "Identity missing", body = ErrorSchema),
        (status = 403, description = "Caller is not an event admin", body = ErrorSchema),
        (status = 404, description = "Event not found", body = ErrorSchema),
        (status = 409, description = "Draw exists or event is locked", body = DrawResponseBody),
        (status = 422, description = "Exclusions leave no valid draw", body = DrawResponseBody),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["draws"],
    operation_id = "requestDraw",
    security(("IdentityHeader" = []))
)]
#[post("/events/{event_id}/draw")]
pub async fn request_draw(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<EventPath>,
) -> ApiResult<HttpResponse> {
    let event_id = parse_event_id(&path.event_id)?;
    let outcome = state
        .draws
        .request_draw(RequestDrawRequest {
            event_id,
            actor: caller.subject,
        })
        .await?;

    let (status, body) = draw_response(outcome);
    Ok(HttpResponse::build(status).json(body))
}

/// Discard an event's committed draw and return it to pending.
#[utoipa::path(
    post,
    path = "/api/v1/events/{event_id}/draw/reset",
    params(
        ("event_id" = String, Path, description = "Event identifier")
    ),
    responses(
        (status = 200, description = "Draw reset", body = ResetDrawResponseBody),
        (status = 400, description = "Invalid event id", body = ErrorSchema),
        (status = 401, description = "Identity missing", body = ErrorSchema),
        (status = 403, description = "Caller is not an event admin", body = ErrorSchema),
        (status = 404, description = "Event not found", body = ErrorSchema),
        (status = 409, description = "Event is locked by a draw", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["draws"],
    operation_id = "resetDraw",
    security(("IdentityHeader" = []))
)]
#[post("/events/{event_id}/draw/reset")]
pub async fn reset_draw(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<EventPath>,
) -> ApiResult<web::Json<ResetDrawResponseBody>> {
    let event_id = parse_event_id(&path.event_id)?;
    let response = state
        .draws
        .reset_draw(ResetDrawRequest {
            event_id,
            actor: caller.subject,
        })
        .await?;
    Ok(web::Json(ResetDrawResponseBody::from(response)))
}

#[cfg(test)]
#[path = "draws_tests.rs"]
mod tests;
