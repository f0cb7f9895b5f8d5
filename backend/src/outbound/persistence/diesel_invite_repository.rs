//! PostgreSQL-backed `InviteRepository` implementation.
//!
//! The bind is one `UPDATE ... RETURNING` statement. PostgreSQL re-evaluates
//! the `bound_identity IS NULL` predicate after waiting on a concurrent
//! writer's row lock, so of several racing claims for one token exactly one
//! updates the row and the rest update nothing.

use async_trait::async_trait;
use diesel::sql_query;
use diesel::sql_types::{Nullable, Text, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{ConditionalWrite, InviteClaim, InviteRepository, InviteRepositoryError};
use crate::domain::{Email, EventId};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::ClaimedEventRow;
use super::pool::{DbPool, PoolError};

const CLAIM_UNBOUND_SQL: &str = r#"
UPDATE participants AS p
SET bound_identity = $2, joined = TRUE
WHERE p.invite_token = $1
  AND p.bound_identity IS NULL
  AND ($3::text IS NULL OR lower(p.email) = lower($3))
  AND NOT EXISTS (
      SELECT 1 FROM participants AS other
      WHERE other.event_id = p.event_id
        AND other.bound_identity = $2
  )
RETURNING p.event_id
"#;

/// Diesel-backed implementation of the invite repository port.
#[derive(Clone)]
pub struct DieselInviteRepository {
    pool: DbPool,
}

impl DieselInviteRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> InviteRepositoryError {
    map_basic_pool_error(error, |message| InviteRepositoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> InviteRepositoryError {
    map_basic_diesel_error(
        error,
        InviteRepositoryError::query,
        InviteRepositoryError::connection,
    )
}

/// Translate the rows returned by the conditional update.
fn to_conditional_write(rows: &[ClaimedEventRow]) -> ConditionalWrite {
    ConditionalWrite {
        affected_rows: rows.len(),
        event_id: rows.first().map(|row| EventId::from_uuid(row.event_id)),
    }
}

#[async_trait]
impl InviteRepository for DieselInviteRepository {
    async fn claim_unbound(
        &self,
        claim: InviteClaim,
    ) -> Result<ConditionalWrite, InviteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let result = sql_query(CLAIM_UNBOUND_SQL)
            .bind::<SqlUuid, _>(*claim.token.as_uuid())
            .bind::<Text, _>(claim.identity.as_ref())
            .bind::<Nullable<Text>, _>(claim.required_email.as_ref().map(Email::as_str))
            .load::<ClaimedEventRow>(&mut conn)
            .await;

        match result {
            Ok(rows) => Ok(to_conditional_write(&rows)),
            // A racing claim bound this identity elsewhere in the same event
            // between our predicate check and the index update.
            Err(error) if is_unique_violation(&error) => {
                debug!("invite claim lost to a concurrent bind");
                Ok(ConditionalWrite::unapplied())
            }
            Err(error) => Err(map_diesel_error(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;
    use uuid::Uuid;

    use super::*;

    #[rstest]
    fn empty_result_is_unapplied() {
        assert_eq!(to_conditional_write(&[]), ConditionalWrite::unapplied());
    }

    #[rstest]
    fn single_row_reports_its_event() {
        let event = Uuid::new_v4();
        let write = to_conditional_write(&[ClaimedEventRow { event_id: event }]);
        assert_eq!(write, ConditionalWrite::applied(EventId::from_uuid(event)));
    }

    #[rstest]
    fn every_returned_row_is_counted() {
        let rows = [
            ClaimedEventRow {
                event_id: Uuid::new_v4(),
            },
            ClaimedEventRow {
                event_id: Uuid::new_v4(),
            },
        ];
        assert_eq!(to_conditional_write(&rows).affected_rows, 2);
    }

    #[rstest]
    fn claim_statement_is_a_single_conditional_update() {
        assert!(CLAIM_UNBOUND_SQL.trim_start().starts_with("UPDATE participants"));
        assert!(CLAIM_UNBOUND_SQL.contains("bound_identity IS NULL"));
        assert!(CLAIM_UNBOUND_SQL.contains("RETURNING p.event_id"));
    }
}
