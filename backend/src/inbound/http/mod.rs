//! HTTP inbound adapter exposing the draw, invite and assignment endpoints.

pub mod assignments;
pub mod draws;
pub mod error;
pub mod health;
pub mod identity;
pub mod invites;
pub mod schemas;
pub mod state;

pub use error::ApiResult;
