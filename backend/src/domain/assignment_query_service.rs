//! Assignment reveal service.
//!
//! A participant learns only their own receiver, and only once the event's
//! draw is committed. Nobody, organisers included, can read another giver's
//! pairing through this service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::domain::Error;
use crate::domain::ports::{
    AssignmentQuery, AssignmentRepository, AssignmentRepositoryError, MyAssignmentRequest,
    MyAssignmentResponse,
};

fn map_repository_error(error: AssignmentRepositoryError) -> Error {
    match error {
        AssignmentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("assignment repository unavailable: {message}"))
        }
        AssignmentRepositoryError::Query { message } => {
            Error::internal(format!("assignment repository error: {message}"))
        }
        AssignmentRepositoryError::EventNotFound { message } => Error::not_found(message),
        AssignmentRepositoryError::NotParticipant { message } => Error::forbidden(message),
    }
}

/// Domain service implementing [`AssignmentQuery`].
#[derive(Clone)]
pub struct AssignmentQueryService<R> {
    assignment_repo: Arc<R>,
}

impl<R> AssignmentQueryService<R> {
    pub fn new(assignment_repo: Arc<R>) -> Self {
        Self { assignment_repo }
    }
}

#[async_trait]
impl<R> AssignmentQuery for AssignmentQueryService<R>
where
    R: AssignmentRepository,
{
    async fn my_assignment(
        &self,
        request: MyAssignmentRequest,
    ) -> Result<MyAssignmentResponse, Error> {
        let MyAssignmentRequest { event_id, viewer } = request;
        let receiver = self
            .assignment_repo
            .receiver_for(event_id, &viewer)
            .await
            .map_err(map_repository_error)?;

        match receiver {
            Some(receiver) => {
                debug!(event_id = %event_id, "assignment revealed");
                Ok(MyAssignmentResponse { receiver })
            }
            None => Err(
                Error::not_found(format!("the draw for event {event_id} is not committed"))
                    .with_details(json!({ "code": "draw_not_committed" })),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::ports::MockAssignmentRepository;
    use crate::domain::{AssignedReceiver, Email, ErrorCode, EventId, IdentityRef, ParticipantId};

    fn request(event_id: EventId) -> MyAssignmentRequest {
        MyAssignmentRequest {
            event_id,
            viewer: IdentityRef::new("auth0|giver").expect("valid identity"),
        }
    }

    fn repo_returning(
        result: Result<Option<AssignedReceiver>, AssignmentRepositoryError>,
    ) -> MockAssignmentRepository {
        let mut repo = MockAssignmentRepository::new();
        repo.expect_receiver_for()
            .times(1)
            .return_once(move |_, _| result);
        repo
    }

    #[tokio::test]
    async fn reveals_the_viewers_receiver() {
        let event_id = EventId::random();
        let receiver = AssignedReceiver {
            participant_id: ParticipantId::random(),
            display_name: Some("Bea".to_owned()),
            email: Email::parse("bea@example.com").expect("valid email"),
        };
        let mut repo = MockAssignmentRepository::new();
        let expected = receiver.clone();
        repo.expect_receiver_for()
            .withf(move |id, viewer| *id == event_id && viewer.as_ref() == "auth0|giver")
            .times(1)
            .return_once(move |_, _| Ok(Some(expected)));

        let response = AssignmentQueryService::new(Arc::new(repo))
            .my_assignment(request(event_id))
            .await
            .expect("assignment revealed");

        assert_eq!(response.receiver, receiver);
    }

    #[tokio::test]
    async fn uncommitted_draw_is_not_found() {
        let service = AssignmentQueryService::new(Arc::new(repo_returning(Ok(None))));

        let error = service
            .my_assignment(request(EventId::random()))
            .await
            .expect_err("nothing to reveal");

        assert_eq!(error.code(), ErrorCode::NotFound);
        assert_eq!(
            error.details().and_then(|details| details.get("code")),
            Some(&json!("draw_not_committed"))
        );
    }

    #[rstest]
    #[case(AssignmentRepositoryError::not_participant("stranger"), ErrorCode::Forbidden)]
    #[case(AssignmentRepositoryError::event_not_found("missing"), ErrorCode::NotFound)]
    #[case(AssignmentRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(AssignmentRepositoryError::query("bad sql"), ErrorCode::InternalError)]
    #[tokio::test]
    async fn repository_errors_map_to_codes(
        #[case] failure: AssignmentRepositoryError,
        #[case] expected: ErrorCode,
    ) {
        let service = AssignmentQueryService::new(Arc::new(repo_returning(Err(failure))));

        let error = service
            .my_assignment(request(EventId::random()))
            .await
            .expect_err("repository failure");

        assert_eq!(error.code(), expected);
    }
}
