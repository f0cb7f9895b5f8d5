//! OpenAPI documentation for the REST API.
//!
//! Registers the draw, invite, assignment and health endpoints, the error
//! envelope schemas and the identity header security scheme. Swagger UI serves the
//! document in debug builds and `openapi-dump` prints it for tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::assignments::AssignmentResponseBody;
use crate::inbound::http::draws::{DrawResponseBody, DrawStatusBody, ResetDrawResponseBody};
use crate::inbound::http::invites::ClaimInviteResponseBody;
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};

/// Adds the proxy-asserted identity header as a security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "IdentityHeader",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "X-Identity-Subject",
                "Authenticated subject injected by the trusted authentication proxy.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Secret Santa backend API",
        description = "Draw orchestration and invite claims for gift-exchange events.",
        license(name = "MIT")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("IdentityHeader" = [])),
    paths(
        crate::inbound::http::draws::request_draw,
        crate::inbound::http::draws::reset_draw,
        crate::inbound::http::invites::claim_invite,
        crate::inbound::http::assignments::my_assignment,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        DrawResponseBody,
        DrawStatusBody,
        ResetDrawResponseBody,
        ClaimInviteResponseBody,
        AssignmentResponseBody,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "draws", description = "Running and resetting an event's draw"),
        (name = "invites", description = "Claiming invite slots"),
        (name = "assignments", description = "Revealing a giver's own receiver"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    use super::*;

    #[test]
    fn every_endpoint_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/events/{event_id}/draw",
            "/api/v1/events/{event_id}/draw/reset",
            "/api/v1/invites/{token}/claim",
            "/api/v1/events/{event_id}/assignment",
            "/health/ready",
            "/health/live",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn draw_response_schema_exposes_failure_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let RefOr::T(Schema::Object(draw)) = schemas.get("DrawResponseBody").expect("schema")
        else {
            panic!("expected object schema");
        };
        for field in ["status", "reason", "assignmentCount", "blockedGivers"] {
            assert!(draw.properties.contains_key(field), "missing {field}");
        }
    }

    #[test]
    fn identity_header_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("IdentityHeader"));
    }
}
