//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the draw, invite and assignment repository
//! ports backed by PostgreSQL via `diesel-async` and `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: every database error maps onto a port error.
//!
//! # Example
//!
//! ```no_run
//! use santa_backend::outbound::persistence::{DbPool, DieselDrawRepository, PoolConfig};
//!
//! # async fn example() -> Result<(), santa_backend::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/santa")).await?;
//! let repo = DieselDrawRepository::new(pool);
//! # let _ = repo;
//! # Ok(())
//! # }
//! ```

mod diesel_assignment_repository;
mod diesel_basic_error_mapping;
mod diesel_draw_repository;
mod diesel_invite_repository;
mod models;
mod pool;
mod schema;

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub use diesel_assignment_repository::DieselAssignmentRepository;
pub use diesel_draw_repository::DieselDrawRepository;
pub use diesel_invite_repository::DieselInviteRepository;
pub use pool::{DbPool, OwnedConnection, PoolConfig, PoolError};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while applying embedded migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("failed to connect for migrations: {0}")]
    Connect(#[from] diesel::ConnectionError),
    #[error("failed to apply migrations: {0}")]
    Apply(String),
}

/// Apply every pending embedded migration.
///
/// Uses a blocking connection; call it from `spawn_blocking` inside async
/// code.
///
/// # Errors
///
/// Returns [`MigrationError`] when the database is unreachable or a migration
/// fails.
pub fn run_migrations(database_url: &str) -> Result<usize, MigrationError> {
    let mut connection = PgConnection::establish(database_url)?;
    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|error| MigrationError::Apply(error.to_string()))?;
    Ok(applied.len())
}
