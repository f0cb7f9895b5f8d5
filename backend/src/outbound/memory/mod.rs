//! In-memory adapters for tests and database-less runs.

mod event_store;

pub use event_store::{DrawRunRecord, InMemoryEventStore, SeedError};
