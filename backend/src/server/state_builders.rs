//! Builders wiring domain services to the configured adapters.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;

use santa_backend::domain::ports::{AssignmentRepository, DrawRepository, InviteRepository};
use santa_backend::domain::{AssignmentQueryService, DrawService, InviteClaimService};
use santa_backend::inbound::http::state::HttpState;
use santa_backend::outbound::memory::InMemoryEventStore;
use santa_backend::outbound::persistence::{
    DieselAssignmentRepository, DieselDrawRepository, DieselInviteRepository,
};
use santa_backend::outbound::random::OsDrawSeedSource;
use tracing::warn;

use super::ServerConfig;

fn build_state<D, I, A>(
    config: &ServerConfig,
    draw_repo: Arc<D>,
    invite_repo: Arc<I>,
    assignment_repo: Arc<A>,
) -> HttpState
where
    D: DrawRepository + 'static,
    I: InviteRepository + 'static,
    A: AssignmentRepository + 'static,
{
    let draws = DrawService::new(draw_repo, Arc::new(OsDrawSeedSource), Arc::new(DefaultClock))
        .with_solver_config(config.solver)
        .with_max_stale_retries(config.max_stale_retries);
    let invites = InviteClaimService::new(invite_repo).with_policy(config.claim_policy);
    let assignments = AssignmentQueryService::new(assignment_repo);
    HttpState::new(Arc::new(draws), Arc::new(invites), Arc::new(assignments))
}

/// Build handler state backed by PostgreSQL when a pool is configured and by
/// an empty in-memory store when that was explicitly enabled.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let state = match &config.db_pool {
        Some(pool) => build_state(
            config,
            Arc::new(DieselDrawRepository::new(pool.clone())),
            Arc::new(DieselInviteRepository::new(pool.clone())),
            Arc::new(DieselAssignmentRepository::new(pool.clone())),
        ),
        None => {
            warn!(
                "using the in-memory event store: it starts empty, has no API to add events \
                 and loses everything on restart"
            );
            let store = Arc::new(InMemoryEventStore::new());
            build_state(config, Arc::clone(&store), Arc::clone(&store), store)
        }
    };
    web::Data::new(state)
}
