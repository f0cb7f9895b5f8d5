//! Application settings loaded via OrthoConfig.
//!
//! Values layer CLI flags over `SANTA_*` environment variables over an
//! optional configuration file. Accessors supply defaults for anything left
//! unset.

use std::net::SocketAddr;

use draw_engine::{DEFAULT_ATTEMPTS_PER_PARTICIPANT, DEFAULT_BASE_ATTEMPTS, SolverConfig};
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{DEFAULT_MAX_STALE_RETRIES, InviteClaimPolicy};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("bind address `{value}` is not a socket address")]
    InvalidBindAddr { value: String },
    #[error("no database URL configured and the in-memory store is not enabled")]
    MissingDatabaseUrl,
}

/// Where event data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage<'a> {
    Postgres { database_url: &'a str },
    /// Process-local store that starts empty and is lost on restart.
    InMemory,
}

/// Runtime configuration for the backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SANTA")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Required unless `allow_in_memory` is set.
    pub database_url: Option<String>,
    /// Run on an empty in-memory store when no database URL is configured.
    #[ortho_config(default = false)]
    pub allow_in_memory: bool,
    /// Maximum pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Minimum sampling attempts per draw.
    pub solver_base_attempts: Option<usize>,
    /// Sampling attempts granted per participant.
    pub solver_attempts_per_participant: Option<usize>,
    /// Times a draw restarts after its inputs changed underneath it.
    pub max_stale_retries: Option<u32>,
    /// Only bind invites whose email matches the caller's asserted email.
    #[ortho_config(default = false)]
    pub require_matching_email: bool,
    /// Skip embedded migrations at startup.
    #[ortho_config(default = false)]
    pub skip_migrations: bool,
}

impl AppSettings {
    /// Parsed bind address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::InvalidBindAddr {
            value: raw.to_owned(),
        })
    }

    /// Database URL with surrounding whitespace removed; blank counts as
    /// unset.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Storage backend selected by the database URL and the in-memory opt-in.
    pub fn storage(&self) -> Result<Storage<'_>, SettingsError> {
        match self.database_url() {
            Some(database_url) => Ok(Storage::Postgres { database_url }),
            None if self.allow_in_memory => Ok(Storage::InMemory),
            None => Err(SettingsError::MissingDatabaseUrl),
        }
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            base_attempts: self.solver_base_attempts.unwrap_or(DEFAULT_BASE_ATTEMPTS),
            attempts_per_participant: self
                .solver_attempts_per_participant
                .unwrap_or(DEFAULT_ATTEMPTS_PER_PARTICIPANT),
        }
    }

    pub fn max_stale_retries(&self) -> u32 {
        self.max_stale_retries.unwrap_or(DEFAULT_MAX_STALE_RETRIES)
    }

    pub fn invite_claim_policy(&self) -> InviteClaimPolicy {
        InviteClaimPolicy {
            require_matching_email: self.require_matching_email,
        }
    }
}
