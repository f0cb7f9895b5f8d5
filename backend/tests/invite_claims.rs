//! Invite claim behaviour through the HTTP surface and the in-memory store.

mod support;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test;
use futures::future::join_all;
use rstest::rstest;
use santa_backend::domain::ports::{ClaimInviteRequest, ClaimInviteResponse, InviteClaimCommand};
use santa_backend::domain::{Email, InviteClaimPolicy, InviteClaimService, InviteToken};
use serde_json::{Value, json};
use support::{EMAIL_HEADER, SUBJECT_HEADER, SeededEvent, app, call_json, identity, store_state};

fn claim_request(token: InviteToken, subject: &str, email: Option<&str>) -> test::TestRequest {
    let mut request = test::TestRequest::post()
        .uri(&format!("/api/v1/invites/{token}/claim"))
        .insert_header((SUBJECT_HEADER, subject));
    if let Some(email) = email {
        request = request.insert_header((EMAIL_HEADER, email));
    }
    request
}

fn first_token(event: &SeededEvent) -> InviteToken {
    event
        .participants
        .first()
        .map(|participant| participant.invite_token())
        .expect("participant")
}

#[actix_web::test]
async fn claim_binds_the_caller_to_the_slot() {
    let event = SeededEvent::new(&["ada", "bob"]);
    let app = test::init_service(app(store_state(&event.store, 1))).await;

    let (status, body) = call_json(
        &app,
        claim_request(first_token(&event), "auth0|ada", None).to_request(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"claimed": true, "eventId": event.event_id.to_string()})
    );
    let slot = event.store.participant(event.id(0)).expect("participant");
    assert!(slot.joined());
    assert_eq!(slot.bound_identity(), Some(&identity("auth0|ada")));
}

#[actix_web::test]
async fn consumed_token_is_not_claimed_again() {
    let event = SeededEvent::new(&["ada", "bob"]);
    let app = test::init_service(app(store_state(&event.store, 1))).await;
    let token = first_token(&event);

    let first =
        test::call_service(&app, claim_request(token, "auth0|ada", None).to_request()).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second =
        test::call_service(&app, claim_request(token, "auth0|mallory", None).to_request()).await;

    assert_eq!(second.status(), StatusCode::OK);
    let body: Value = test::read_body_json(second).await;
    assert_eq!(body, json!({"claimed": false}));
    assert_eq!(
        event
            .store
            .participant(event.id(0))
            .and_then(|slot| slot.bound_identity().cloned()),
        Some(identity("auth0|ada"))
    );
}

#[rstest]
#[case("not-a-token")]
#[case("0b8e3c55-7f3e-4d8a-bb61-91f0a7c2d4e1")]
#[actix_web::test]
async fn unknown_tokens_are_indistinguishable_from_lost_races(#[case] token: &str) {
    let event = SeededEvent::new(&["ada", "bob"]);
    let app = test::init_service(app(store_state(&event.store, 1))).await;

    let request = test::TestRequest::post()
        .uri(&format!("/api/v1/invites/{token}/claim"))
        .insert_header((SUBJECT_HEADER, "auth0|ada"))
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body, json!({"claimed": false}));
}

#[actix_web::test]
async fn concurrent_http_claims_have_one_winner() {
    let event = SeededEvent::new(&["ada", "bob"]);
    let app = test::init_service(app(store_state(&event.store, 1))).await;
    let token = first_token(&event);

    let responses = join_all((0..16).map(|n| {
        test::call_service(
            &app,
            claim_request(token, &format!("auth0|claimant-{n}"), None).to_request(),
        )
    }))
    .await;

    let mut winners = 0;
    for response in responses {
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = test::read_body_json(response).await;
        if body.get("claimed") == Some(&json!(true)) {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_claims_across_threads_have_one_winner() {
    let event = SeededEvent::new(&["ada", "bob"]);
    let service = Arc::new(InviteClaimService::new(Arc::clone(&event.store)));
    let token = first_token(&event);

    let handles: Vec<_> = (0..32)
        .map(|n| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .claim_invite(ClaimInviteRequest {
                        token,
                        identity: identity(&format!("auth0|claimant-{n}")),
                        identity_email: None,
                    })
                    .await
                    .expect("claim completes")
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.expect("task joins").is_claimed() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[rstest]
#[case(Some("ada@example.com"), true)]
#[case(Some("someone-else@example.com"), false)]
#[case(None, false)]
#[tokio::test]
async fn matching_policy_requires_the_invited_email(
    #[case] caller_email: Option<&str>,
    #[case] expect_claimed: bool,
) {
    let event = SeededEvent::new(&["ada", "bob"]);
    let service = InviteClaimService::new(Arc::clone(&event.store)).with_policy(
        InviteClaimPolicy {
            require_matching_email: true,
        },
    );

    let response = service
        .claim_invite(ClaimInviteRequest {
            token: first_token(&event),
            identity: identity("auth0|ada"),
            identity_email: caller_email.map(|raw| Email::parse(raw).expect("valid email")),
        })
        .await
        .expect("claim completes");

    assert_eq!(response.is_claimed(), expect_claimed);
    if expect_claimed {
        assert_eq!(
            response,
            ClaimInviteResponse::Claimed {
                event_id: event.event_id
            }
        );
    }
}

#[actix_web::test]
async fn missing_identity_is_unauthorized() {
    let event = SeededEvent::new(&["ada"]);
    let app = test::init_service(app(store_state(&event.store, 1))).await;

    let request = test::TestRequest::post()
        .uri(&format!("/api/v1/invites/{}/claim", first_token(&event)))
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
