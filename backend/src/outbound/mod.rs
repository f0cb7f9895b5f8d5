//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: in-process store for tests and database-less runs
//! - **random**: operating-system seed source for draws
//!
//! Adapters translate between domain types and infrastructure-specific
//! representations. They contain no business logic.

pub mod memory;
pub mod persistence;
pub mod random;
