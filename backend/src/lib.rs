//! Secret Santa backend: draw orchestration and invite claims.
//!
//! Layout follows ports and adapters: [`domain`] holds services and port
//! traits, [`inbound`] the HTTP adapter, and [`outbound`] the Diesel and
//! in-memory stores.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
