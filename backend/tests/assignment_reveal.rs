//! Assignment reveal behaviour through the HTTP surface and the in-memory
//! store.

mod support;

use std::collections::BTreeSet;

use actix_http::Request;
use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};
use support::{ORGANISER, SUBJECT_HEADER, SeededEvent, app, call_json, store_state};

fn as_subject(request: test::TestRequest, subject: &str) -> Request {
    request.insert_header((SUBJECT_HEADER, subject)).to_request()
}

fn subject_of(name: &str) -> String {
    format!("auth0|{name}")
}

#[actix_web::test]
async fn every_giver_sees_only_their_committed_receiver() {
    let names = ["ada", "bob", "cy", "dee"];
    let event = SeededEvent::new(&names);
    let app = test::init_service(app(store_state(&event.store, 5))).await;
    for (index, name) in names.iter().enumerate() {
        let (status, body) = call_json(
            &app,
            as_subject(test::TestRequest::post().uri(&event.claim_uri(index)), &subject_of(name)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("claimed"), Some(&json!(true)));
    }
    let (status, _) = call_json(
        &app,
        as_subject(test::TestRequest::post().uri(&event.draw_uri()), ORGANISER),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let stored = event.store.assignments(event.event_id);
    let mut revealed = BTreeSet::new();
    for (index, name) in names.iter().enumerate() {
        let (status, body) = call_json(
            &app,
            as_subject(test::TestRequest::get().uri(&event.assignment_uri()), &subject_of(name)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let giver = event.id(index);
        let receiver = stored
            .iter()
            .find(|assignment| assignment.giver == giver)
            .map(|assignment| assignment.receiver)
            .expect("every giver has an assignment");
        let slot = event.store.participant(receiver).expect("receiver");
        assert_eq!(
            body,
            json!({
                "receiverId": receiver.to_string(),
                "displayName": slot.display_name(),
                "email": slot.email().as_str(),
            })
        );
        revealed.insert(receiver);
    }
    assert_eq!(revealed.len(), names.len(), "receivers are distinct");
}

#[actix_web::test]
async fn reveal_before_the_draw_is_not_found() {
    let event = SeededEvent::new(&["ada", "bob"]);
    let app = test::init_service(app(store_state(&event.store, 1))).await;
    call_json(
        &app,
        as_subject(test::TestRequest::post().uri(&event.claim_uri(0)), "auth0|ada"),
    )
    .await;

    let (status, body) = call_json(
        &app,
        as_subject(test::TestRequest::get().uri(&event.assignment_uri()), "auth0|ada"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.get("code"), Some(&json!("not_found")));
    assert_eq!(
        body.pointer("/details/code"),
        Some(&Value::from("draw_not_committed"))
    );
}

#[actix_web::test]
async fn organiser_without_a_slot_cannot_peek() {
    let event = SeededEvent::new(&["ada", "bob", "cy"]);
    let app = test::init_service(app(store_state(&event.store, 3))).await;
    let (status, _) = call_json(
        &app,
        as_subject(test::TestRequest::post().uri(&event.draw_uri()), ORGANISER),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call_json(
        &app,
        as_subject(test::TestRequest::get().uri(&event.assignment_uri()), ORGANISER),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.get("code"), Some(&json!("forbidden")));
}

#[actix_web::test]
async fn reset_hides_the_previous_assignment() {
    let event = SeededEvent::new(&["ada", "bob"]);
    let app = test::init_service(app(store_state(&event.store, 2))).await;
    call_json(
        &app,
        as_subject(test::TestRequest::post().uri(&event.claim_uri(0)), "auth0|ada"),
    )
    .await;
    for uri in [event.draw_uri(), format!("{}/reset", event.draw_uri())] {
        let (status, _) =
            call_json(&app, as_subject(test::TestRequest::post().uri(&uri), ORGANISER)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = call_json(
        &app,
        as_subject(test::TestRequest::get().uri(&event.assignment_uri()), "auth0|ada"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
