//! Shared fixtures for HTTP integration tests against the in-memory store.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use mockable::DefaultClock;
use santa_backend::Trace;
use santa_backend::domain::ports::{DrawRepository, FixedDrawSeedSource};
use santa_backend::domain::{
    AssignmentQueryService, DrawService, Email, EventId, IdentityRef, InviteClaimPolicy, InviteClaimService, Participant,
    ParticipantId,
};
use santa_backend::inbound::http::assignments::my_assignment;
use santa_backend::inbound::http::draws::{request_draw, reset_draw};
use santa_backend::inbound::http::invites::claim_invite;
use santa_backend::inbound::http::state::HttpState;
use santa_backend::outbound::memory::InMemoryEventStore;
use serde_json::Value;

pub const ORGANISER: &str = "auth0|organiser";
pub const SUBJECT_HEADER: &str = "x-identity-subject";
pub const EMAIL_HEADER: &str = "x-identity-email";

pub fn identity(subject: &str) -> IdentityRef {
    IdentityRef::new(subject).expect("valid identity")
}

/// An event seeded with one participant per name.
pub struct SeededEvent {
    pub store: Arc<InMemoryEventStore>,
    pub event_id: EventId,
    pub participants: Vec<Participant>,
}

impl SeededEvent {
    pub fn new(names: &[&str]) -> Self {
        let store = Arc::new(InMemoryEventStore::new());
        let event_id = store.create_event(identity(ORGANISER));
        let participants = names
            .iter()
            .map(|name| {
                let email = Email::parse(format!("{name}@example.com")).expect("valid email");
                store
                    .add_participant(event_id, email, Some(*name), false)
                    .expect("participant added")
            })
            .collect();
        Self {
            store,
            event_id,
            participants,
        }
    }

    pub fn id(&self, index: usize) -> ParticipantId {
        self.participants
            .get(index)
            .map(Participant::id)
            .expect("participant index in range")
    }

    pub fn exclude(&self, giver: usize, receiver: usize) {
        self.store
            .add_exclusion(self.event_id, self.id(giver), self.id(receiver))
            .expect("exclusion added");
    }

    pub fn draw_uri(&self) -> String {
        format!("/api/v1/events/{}/draw", self.event_id)
    }

    pub fn assignment_uri(&self) -> String {
        format!("/api/v1/events/{}/assignment", self.event_id)
    }

    pub fn claim_uri(&self, index: usize) -> String {
        let token = self
            .participants
            .get(index)
            .map(Participant::invite_token)
            .expect("participant index in range");
        format!("/api/v1/invites/{token}/claim")
    }
}

/// Handler state over an arbitrary draw repository with a fixed seed; invites
/// and assignment reveals use `store`.
pub fn state_with<D>(draw_repo: Arc<D>, store: &Arc<InMemoryEventStore>, seed: u64) -> HttpState
where
    D: DrawRepository + 'static,
{
    HttpState::new(
        Arc::new(DrawService::new(
            draw_repo,
            Arc::new(FixedDrawSeedSource::new(seed)),
            Arc::new(DefaultClock),
        )),
        Arc::new(
            InviteClaimService::new(Arc::clone(store))
                .with_policy(InviteClaimPolicy::default()),
        ),
        Arc::new(AssignmentQueryService::new(Arc::clone(store))),
    )
}

pub fn store_state(store: &Arc<InMemoryEventStore>, seed: u64) -> HttpState {
    state_with(Arc::clone(store), store, seed)
}

pub fn app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().app_data(web::Data::new(state)).wrap(Trace).service(
        web::scope("/api/v1")
            .service(request_draw)
            .service(reset_draw)
            .service(claim_invite)
            .service(my_assignment),
    )
}

/// Send `request` and decode the JSON body alongside the status.
pub async fn call_json(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    request: actix_http::Request,
) -> (StatusCode, Value) {
    let response = test::call_service(app, request).await;
    let status = response.status();
    let body: Value = test::read_body_json(response).await;
    (status, body)
}
