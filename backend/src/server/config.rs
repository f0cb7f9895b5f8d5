//! HTTP server configuration object.

use std::net::SocketAddr;

use draw_engine::SolverConfig;
use santa_backend::domain::{DEFAULT_MAX_STALE_RETRIES, InviteClaimPolicy};
use santa_backend::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) solver: SolverConfig,
    pub(crate) max_stale_retries: u32,
    pub(crate) claim_policy: InviteClaimPolicy,
}

impl ServerConfig {
    /// Configuration with default draw tuning and the in-memory store.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            solver: SolverConfig {
                base_attempts: draw_engine::DEFAULT_BASE_ATTEMPTS,
                attempts_per_participant: draw_engine::DEFAULT_ATTEMPTS_PER_PARTICIPANT,
            },
            max_stale_retries: DEFAULT_MAX_STALE_RETRIES,
            claim_policy: InviteClaimPolicy::default(),
        }
    }

    /// Attach a database pool so the Diesel adapters replace the in-memory
    /// store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Override the solver budget and stale-snapshot retry limit.
    #[must_use]
    pub fn with_draw_tuning(mut self, solver: SolverConfig, max_stale_retries: u32) -> Self {
        self.solver = solver;
        self.max_stale_retries = max_stale_retries;
        self
    }

    #[must_use]
    pub fn with_claim_policy(mut self, policy: InviteClaimPolicy) -> Self {
        self.claim_policy = policy;
        self
    }
}
