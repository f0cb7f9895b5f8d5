//! PostgreSQL-backed `AssignmentRepository` implementation.
//!
//! Assignments are written in the same transaction that marks the draw
//! committed, so a giver's row is either visible with the rest of the draw or
//! absent; no lock is needed to read it.

use async_trait::async_trait;
use diesel::OptionalExtension;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{AssignmentRepository, AssignmentRepositoryError};
use crate::domain::{AssignedReceiver, Email, EventId, IdentityRef, ParticipantId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::ReceiverRow;
use super::pool::{DbPool, PoolError};
use super::schema::{assignments, events, participants};

/// Diesel-backed implementation of the assignment repository port.
#[derive(Clone)]
pub struct DieselAssignmentRepository {
    pool: DbPool,
}

impl DieselAssignmentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AssignmentRepositoryError {
    map_basic_pool_error(error, |message| AssignmentRepositoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> AssignmentRepositoryError {
    map_basic_diesel_error(
        error,
        AssignmentRepositoryError::query,
        AssignmentRepositoryError::connection,
    )
}

fn to_receiver(row: ReceiverRow) -> Result<AssignedReceiver, AssignmentRepositoryError> {
    let email = Email::parse(&row.email).map_err(|error| {
        AssignmentRepositoryError::query(format!("stored email of {} is invalid: {error}", row.id))
    })?;
    Ok(AssignedReceiver {
        participant_id: ParticipantId::from_uuid(row.id),
        display_name: row.display_name,
        email,
    })
}

/// Participant of `event_id` bound to `viewer`.
async fn viewer_slot(
    conn: &mut AsyncPgConnection,
    event_id: EventId,
    viewer: &IdentityRef,
) -> Result<Uuid, AssignmentRepositoryError> {
    let event_uuid = *event_id.as_uuid();
    let event: Option<Uuid> = events::table
        .find(event_uuid)
        .select(events::id)
        .first(conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
    if event.is_none() {
        return Err(AssignmentRepositoryError::event_not_found(format!(
            "event {event_id} does not exist"
        )));
    }

    participants::table
        .filter(participants::event_id.eq(event_uuid))
        .filter(participants::bound_identity.eq(viewer.as_ref()))
        .select(participants::id)
        .first(conn)
        .await
        .optional()
        .map_err(map_diesel_error)?
        .ok_or_else(|| {
            AssignmentRepositoryError::not_participant(format!(
                "caller has not joined event {event_id}"
            ))
        })
}

#[async_trait]
impl AssignmentRepository for DieselAssignmentRepository {
    async fn receiver_for(
        &self,
        event_id: EventId,
        viewer: &IdentityRef,
    ) -> Result<Option<AssignedReceiver>, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let giver = viewer_slot(&mut conn, event_id, viewer).await?;

        let receiver: Option<Uuid> = assignments::table
            .filter(assignments::event_id.eq(*event_id.as_uuid()))
            .filter(assignments::giver_id.eq(giver))
            .select(assignments::receiver_id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(receiver) = receiver else {
            return Ok(None);
        };

        let row: ReceiverRow = participants::table
            .find(receiver)
            .select(ReceiverRow::as_select())
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        to_receiver(row).map(Some)
    }
}
