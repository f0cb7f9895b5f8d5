//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Bool, Uuid as SqlUuid};
use uuid::Uuid;

use super::schema::{assignments, draw_runs, exclusions, participants};

/// Exclusion pair read from the exclusions table.
#[derive(Debug, Clone, Copy, Queryable, Selectable)]
#[diesel(table_name = exclusions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ExclusionRow {
    pub giver_id: Uuid,
    pub receiver_id: Uuid,
}

/// Receiver details revealed to a giver.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = participants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReceiverRow {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub email: String,
}

/// Draw run status read under the event lock.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = draw_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DrawRunStatusRow {
    pub status: String,
}

/// Insertable assignment row.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = assignments)]
pub(crate) struct NewAssignmentRow {
    pub event_id: Uuid,
    pub giver_id: Uuid,
    pub receiver_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Upsert payload for the draw run record.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = draw_runs)]
#[diesel(primary_key(event_id))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct DrawRunUpsert<'a> {
    pub event_id: Uuid,
    pub status: &'a str,
    pub seed: Option<i64>,
    pub strategy: Option<&'a str>,
    pub assignment_count: i32,
    pub committed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Result of `pg_try_advisory_xact_lock`.
#[derive(Debug, QueryableByName)]
pub(crate) struct AdvisoryLockRow {
    #[diesel(sql_type = Bool)]
    pub locked: bool,
}

/// Event id returned by the conditional invite bind.
#[derive(Debug, QueryableByName)]
pub(crate) struct ClaimedEventRow {
    #[diesel(sql_type = SqlUuid)]
    pub event_id: Uuid,
}
