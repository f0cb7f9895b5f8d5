//! PostgreSQL-backed `DrawRepository` implementation using Diesel ORM.
//!
//! Each draw session owns one pooled connection holding an open READ COMMITTED
//! transaction plus a transaction-scoped advisory lock keyed by the event.
//! Every statement sees rows committed before it started, so the fingerprint
//! re-read observes edits made while the solver ran. Before that re-read the
//! session takes `FOR UPDATE` on the event row, which blocks participant and
//! exclusion inserts (their foreign keys need a share lock on the same row)
//! until the draw commits or rolls back.
//! Committing or rolling back the transaction releases both locks. A session
//! dropped mid-transaction hands its connection back still inside the
//! transaction, so the pool discards it and PostgreSQL releases the lock when
//! the connection closes.

use async_trait::async_trait;
use chrono::Utc;
use diesel::OptionalExtension;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::BigInt;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{DrawRepository, DrawRepositoryError, DrawSession, ResetResult};
use crate::domain::{
    DrawCommit, DrawRunStatus, DrawSnapshot, EventId, Exclusion, IdentityRef, ParticipantId,
    SnapshotFingerprint, strategy_label,
};

use super::diesel_basic_error_mapping::{
    is_serialization_failure, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{
    AdvisoryLockRow, DrawRunStatusRow, DrawRunUpsert, ExclusionRow, NewAssignmentRow,
};
use super::pool::{DbPool, OwnedConnection, PoolError};
use super::schema::{assignments, draw_runs, events, exclusions, participants};

const READ_COMMITTED_SQL: &str = "SET TRANSACTION ISOLATION LEVEL READ COMMITTED";
const TRY_LOCK_SQL: &str = "SELECT pg_try_advisory_xact_lock($1) AS locked";

/// Diesel-backed implementation of the draw repository port.
#[derive(Clone)]
pub struct DieselDrawRepository {
    pool: DbPool,
}

impl DieselDrawRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open a read-committed transaction, check the actor and take the lock.
    async fn open_locked(
        &self,
        event_id: EventId,
        actor: &IdentityRef,
    ) -> Result<OwnedConnection, DrawRepositoryError> {
        let mut conn = self.pool.get_owned().await.map_err(map_pool_error)?;
        let pg: &mut AsyncPgConnection = &mut conn;
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::begin_transaction(pg)
            .await
            .map_err(map_diesel_error)?;
        sql_query(READ_COMMITTED_SQL)
            .execute(pg)
            .await
            .map_err(map_diesel_error)?;
        authorise(pg, event_id, actor).await?;
        try_lock(pg, event_id).await?;
        debug!(event_id = %event_id, "draw lock acquired");
        Ok(conn)
    }
}

/// Map pool errors to domain repository errors.
fn map_pool_error(error: PoolError) -> DrawRepositoryError {
    map_basic_pool_error(error, |message| DrawRepositoryError::connection(message))
}

/// Map Diesel errors to domain repository errors.
///
/// Serialization failures mean a concurrent transaction won; callers may
/// retry.
fn map_diesel_error(error: diesel::result::Error) -> DrawRepositoryError {
    if is_serialization_failure(&error) {
        return DrawRepositoryError::contention("concurrent transaction conflicted with the draw");
    }
    map_basic_diesel_error(
        error,
        DrawRepositoryError::query,
        DrawRepositoryError::connection,
    )
}

/// Advisory lock key for an event: the first eight bytes of its UUID.
pub(crate) fn advisory_lock_key(event_id: EventId) -> i64 {
    let (high, _) = event_id.as_uuid().as_u64_pair();
    i64::from_be_bytes(high.to_be_bytes())
}

/// Seeds are `u64`; PostgreSQL stores them bit-for-bit in a BIGINT.
pub(crate) fn seed_to_i64(seed: u64) -> i64 {
    i64::from_be_bytes(seed.to_be_bytes())
}

fn count_to_i32(count: usize) -> Result<i32, DrawRepositoryError> {
    i32::try_from(count)
        .map_err(|_| DrawRepositoryError::query("assignment count exceeds supported range"))
}

fn count_to_usize(count: i64) -> Result<usize, DrawRepositoryError> {
    usize::try_from(count).map_err(|_| DrawRepositoryError::query("negative row count"))
}

async fn authorise(
    conn: &mut AsyncPgConnection,
    event_id: EventId,
    actor: &IdentityRef,
) -> Result<(), DrawRepositoryError> {
    let event_uuid = *event_id.as_uuid();
    let created_by: Option<String> = events::table
        .find(event_uuid)
        .select(events::created_by)
        .first(conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
    let Some(created_by) = created_by else {
        return Err(DrawRepositoryError::event_not_found(format!(
            "event {event_id} does not exist"
        )));
    };
    if created_by == actor.as_ref() {
        return Ok(());
    }

    let admin_slots: i64 = participants::table
        .filter(participants::event_id.eq(event_uuid))
        .filter(participants::is_admin.eq(true))
        .filter(participants::bound_identity.eq(actor.as_ref()))
        .count()
        .get_result(conn)
        .await
        .map_err(map_diesel_error)?;
    if admin_slots > 0 {
        Ok(())
    } else {
        Err(DrawRepositoryError::forbidden(format!(
            "only admins of event {event_id} may change its draw"
        )))
    }
}

async fn try_lock(conn: &mut AsyncPgConnection, event_id: EventId) -> Result<(), DrawRepositoryError> {
    let row: AdvisoryLockRow = sql_query(TRY_LOCK_SQL)
        .bind::<BigInt, _>(advisory_lock_key(event_id))
        .get_result(conn)
        .await
        .map_err(map_diesel_error)?;
    if row.locked {
        Ok(())
    } else {
        Err(DrawRepositoryError::contention(format!(
            "event {event_id} is locked by another draw"
        )))
    }
}

/// Lock the event row until the transaction ends.
async fn lock_event_row(
    conn: &mut AsyncPgConnection,
    event_uuid: Uuid,
) -> Result<(), DrawRepositoryError> {
    events::table
        .find(event_uuid)
        .select(events::id)
        .for_update()
        .first::<Uuid>(conn)
        .await
        .optional()
        .map_err(map_diesel_error)?
        .map(|_| ())
        .ok_or_else(|| {
            DrawRepositoryError::event_not_found(format!("event {event_uuid} was deleted"))
        })
}

async fn read_inputs(
    conn: &mut AsyncPgConnection,
    event_uuid: Uuid,
) -> Result<(Vec<ParticipantId>, Vec<Exclusion>), DrawRepositoryError> {
    let ids: Vec<Uuid> = participants::table
        .filter(participants::event_id.eq(event_uuid))
        .select(participants::id)
        .order(participants::id.asc())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    let rows: Vec<ExclusionRow> = exclusions::table
        .filter(exclusions::event_id.eq(event_uuid))
        .select(ExclusionRow::as_select())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;

    let participants = ids.into_iter().map(ParticipantId::from_uuid).collect();
    let exclusions = rows
        .into_iter()
        .map(|row| {
            Exclusion::new(
                ParticipantId::from_uuid(row.giver_id),
                ParticipantId::from_uuid(row.receiver_id),
            )
        })
        .collect();
    Ok((participants, exclusions))
}

struct DieselDrawSession {
    conn: Option<OwnedConnection>,
    event_id: EventId,
}

impl DieselDrawSession {
    fn connection(&mut self) -> Result<&mut AsyncPgConnection, DrawRepositoryError> {
        self.conn
            .as_mut()
            .map(|conn| &mut **conn)
            .ok_or_else(|| DrawRepositoryError::query("draw session already closed"))
    }
}

#[async_trait]
impl DrawSession for DieselDrawSession {
    async fn load_snapshot(&mut self) -> Result<DrawSnapshot, DrawRepositoryError> {
        let event_id = self.event_id;
        let event_uuid = *event_id.as_uuid();
        let conn = self.connection()?;
        let (participants, exclusions) = read_inputs(conn, event_uuid).await?;

        let run: Option<DrawRunStatusRow> = draw_runs::table
            .find(event_uuid)
            .select(DrawRunStatusRow::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let status = run
            .map(|row| row.status.parse::<DrawRunStatus>())
            .transpose()
            .map_err(|err| DrawRepositoryError::query(err.to_string()))?
            .unwrap_or(DrawRunStatus::Pending);
        let stored: i64 = assignments::table
            .filter(assignments::event_id.eq(event_uuid))
            .count()
            .get_result(conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(DrawSnapshot {
            event_id,
            participants,
            exclusions,
            status,
            assignment_count: count_to_usize(stored)?,
        })
    }

    async fn current_fingerprint(&mut self) -> Result<SnapshotFingerprint, DrawRepositoryError> {
        let event_uuid = *self.event_id.as_uuid();
        let conn = self.connection()?;
        lock_event_row(conn, event_uuid).await?;
        let (participants, exclusions) = read_inputs(conn, event_uuid).await?;
        Ok(SnapshotFingerprint::compute(&participants, &exclusions))
    }

    async fn commit(&mut self, commit: DrawCommit) -> Result<(), DrawRepositoryError> {
        let event_uuid = *commit.event_id.as_uuid();
        let rows: Vec<NewAssignmentRow> = commit
            .assignments
            .iter()
            .map(|assignment| NewAssignmentRow {
                event_id: event_uuid,
                giver_id: *assignment.giver.as_uuid(),
                receiver_id: *assignment.receiver.as_uuid(),
                created_at: commit.committed_at,
            })
            .collect();
        let run = DrawRunUpsert {
            event_id: event_uuid,
            status: commit.status.as_str(),
            seed: Some(seed_to_i64(commit.seed)),
            strategy: Some(strategy_label(commit.strategy)),
            assignment_count: count_to_i32(rows.len())?,
            committed_at: Some(commit.committed_at),
            updated_at: commit.committed_at,
        };

        let conn = self.connection()?;
        diesel::insert_into(assignments::table)
            .values(&rows)
            .execute(conn)
            .await
            .map_err(map_diesel_error)?;
        diesel::insert_into(draw_runs::table)
            .values(&run)
            .on_conflict(draw_runs::event_id)
            .do_update()
            .set(&run)
            .execute(conn)
            .await
            .map_err(map_diesel_error)?;
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::commit_transaction(conn)
            .await
            .map_err(map_diesel_error)?;
        self.conn = None;
        Ok(())
    }

    async fn release(&mut self) -> Result<(), DrawRepositoryError> {
        let conn = self.connection()?;
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::rollback_transaction(
            conn,
        )
        .await
        .map_err(map_diesel_error)?;
        self.conn = None;
        Ok(())
    }
}

#[async_trait]
impl DrawRepository for DieselDrawRepository {
    async fn lock_event(
        &self,
        event_id: EventId,
        actor: &IdentityRef,
    ) -> Result<Box<dyn DrawSession>, DrawRepositoryError> {
        let conn = self.open_locked(event_id, actor).await?;
        Ok(Box::new(DieselDrawSession {
            conn: Some(conn),
            event_id,
        }))
    }

    async fn reset(
        &self,
        event_id: EventId,
        actor: &IdentityRef,
    ) -> Result<ResetResult, DrawRepositoryError> {
        let mut conn = self.open_locked(event_id, actor).await?;
        let pg: &mut AsyncPgConnection = &mut conn;
        let event_uuid = *event_id.as_uuid();
        let now = Utc::now();

        let discarded =
            diesel::delete(assignments::table.filter(assignments::event_id.eq(event_uuid)))
                .execute(pg)
                .await
                .map_err(map_diesel_error)?;
        let run = DrawRunUpsert {
            event_id: event_uuid,
            status: DrawRunStatus::Pending.as_str(),
            seed: None,
            strategy: None,
            assignment_count: 0,
            committed_at: None,
            updated_at: now,
        };
        diesel::insert_into(draw_runs::table)
            .values(&run)
            .on_conflict(draw_runs::event_id)
            .do_update()
            .set(&run)
            .execute(pg)
            .await
            .map_err(map_diesel_error)?;
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::commit_transaction(pg)
            .await
            .map_err(map_diesel_error)?;

        Ok(ResetResult {
            discarded_assignments: discarded,
        })
    }
}
