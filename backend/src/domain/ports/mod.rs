//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod assignment_query;
mod assignment_repository;
mod draw_command;
mod draw_repository;
mod draw_seed_source;
mod invite_claim_command;
mod invite_repository;

#[cfg(test)]
pub use assignment_query::MockAssignmentQuery;
pub use assignment_query::{AssignmentQuery, MyAssignmentRequest, MyAssignmentResponse};
#[cfg(test)]
pub use assignment_repository::MockAssignmentRepository;
pub use assignment_repository::{AssignmentRepository, AssignmentRepositoryError};
#[cfg(test)]
pub use draw_command::MockDrawCommand;
pub use draw_command::{
    DrawCommand, DrawFailure, DrawOutcome, RequestDrawRequest, ResetDrawRequest,
    ResetDrawResponse,
};
#[cfg(test)]
pub use draw_repository::{MockDrawRepository, MockDrawSession};
pub use draw_repository::{DrawRepository, DrawRepositoryError, DrawSession, ResetResult};
#[cfg(test)]
pub use draw_seed_source::MockDrawSeedSource;
pub use draw_seed_source::{DrawSeedSource, FixedDrawSeedSource};
#[cfg(test)]
pub use invite_claim_command::MockInviteClaimCommand;
pub use invite_claim_command::{ClaimInviteRequest, ClaimInviteResponse, InviteClaimCommand};
#[cfg(test)]
pub use invite_repository::MockInviteRepository;
pub use invite_repository::{
    ConditionalWrite, InviteClaim, InviteRepository, InviteRepositoryError,
};
