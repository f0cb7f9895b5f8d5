//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on driving ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AssignmentQuery, DrawCommand, InviteClaimCommand};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub draws: Arc<dyn DrawCommand>,
    pub invites: Arc<dyn InviteClaimCommand>,
    pub assignments: Arc<dyn AssignmentQuery>,
}

impl HttpState {
    /// Construct state from the draw, invite and assignment use-cases.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use santa_backend::domain::{AssignmentQueryService, DrawService, InviteClaimService};
    /// use santa_backend::inbound::http::state::HttpState;
    /// use santa_backend::outbound::memory::InMemoryEventStore;
    /// use santa_backend::outbound::random::OsDrawSeedSource;
    ///
    /// let store = Arc::new(InMemoryEventStore::new());
    /// let state = HttpState::new(
    ///     Arc::new(DrawService::new(
    ///         Arc::clone(&store),
    ///         Arc::new(OsDrawSeedSource),
    ///         Arc::new(DefaultClock),
    ///     )),
    ///     Arc::new(InviteClaimService::new(Arc::clone(&store))),
    ///     Arc::new(AssignmentQueryService::new(store)),
    /// );
    /// # let _ = state;
    /// ```
    pub fn new(
        draws: Arc<dyn DrawCommand>,
        invites: Arc<dyn InviteClaimCommand>,
        assignments: Arc<dyn AssignmentQuery>,
    ) -> Self {
        Self {
            draws,
            invites,
            assignments,
        }
    }
}
