//! Driving port for revealing the caller's own assignment.

use async_trait::async_trait;

use crate::domain::{AssignedReceiver, Error, EventId, IdentityRef};

/// Request for the caller's receiver in an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MyAssignmentRequest {
    pub event_id: EventId,
    pub viewer: IdentityRef,
}

/// The caller's receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MyAssignmentResponse {
    pub receiver: AssignedReceiver,
}

/// Driving port for assignment reveals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentQuery: Send + Sync {
    /// Look up who `request.viewer` drew in `request.event_id`.
    async fn my_assignment(
        &self,
        request: MyAssignmentRequest,
    ) -> Result<MyAssignmentResponse, Error>;
}
