mod common;

use assessment_console::models::profile::{ProfileStatus, Role};
use assessment_console::services::session_service::AuthEvent;
use assessment_console::utils::time::today;
use axum::http::StatusCode;
use common::{candidate_profile, mint_token, t1, test_app};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn candidate_completes_questionnaire() {
    let app = test_app();
    let test = t1(true);
    let user = Uuid::new_v4();
    app.backend.add_test(test.clone());
    app.backend
        .add_profile(candidate_profile(user, ProfileStatus::Pending, Some(test.id)));
    let token = mint_token(user, Role::Candidate);

    let (status, view) = app.send("GET", "/api/candidate", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["total"], 2);

    let (status, view) = app.send("POST", "/api/candidate/start", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["state"], "in_progress");
    assert!(app.backend.profile_updates.lock().unwrap().is_empty());

    let (status, view) = app
        .send("PUT", "/api/candidate/answer", Some(&token), Some(json!({ "value": 4 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["can_advance"], true);

    let (status, view) = app.send("POST", "/api/candidate/next", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["index"], 1);

    app.send(
        "PUT",
        "/api/candidate/answer",
        Some(&token),
        Some(json!({ "option": "Option B" })),
    )
    .await;

    let (status, view) = app.send("POST", "/api/candidate/submit", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["state"], "completed");

    let deliveries = app.sink.deliveries();
    assert_eq!(deliveries.len(), 1);
    let body = &deliveries[0].body;
    assert_eq!(body.len(), 2);
    assert_eq!(body[0].question_id, "q1");
    assert_eq!(body[0].answer, json!(4));
    assert_eq!(body[1].question_id, "q2");
    assert_eq!(body[1].answer, json!("Option B"));

    let profile = app.backend.profile(user).unwrap();
    assert_eq!(profile.status, ProfileStatus::Completed);
    assert_eq!(profile.completion_date, Some(today()));

    let (status, view) = app.send("GET", "/api/candidate", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["reason"], "already_taken");
    assert_eq!(app.state.registry.open_questionnaires().await, 0);
}

#[tokio::test]
async fn webhook_failure_can_be_retried() {
    let app = test_app();
    let test = t1(true);
    let user = Uuid::new_v4();
    app.backend.add_test(test.clone());
    app.backend
        .add_profile(candidate_profile(user, ProfileStatus::Pending, Some(test.id)));
    let token = mint_token(user, Role::Candidate);

    app.send("POST", "/api/candidate/start", Some(&token), None).await;
    app.send("PUT", "/api/candidate/answer", Some(&token), Some(json!({ "value": 2 })))
        .await;
    app.send("POST", "/api/candidate/next", Some(&token), None).await;
    app.send(
        "PUT",
        "/api/candidate/answer",
        Some(&token),
        Some(json!({ "option": "Option A" })),
    )
    .await;

    app.sink.set_failing(true);
    let (status, view) = app.send("POST", "/api/candidate/submit", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(view["state"], "in_progress");
    assert!(view["error"].is_string());
    assert_eq!(
        app.backend.profile(user).unwrap().status,
        ProfileStatus::Pending
    );

    app.sink.set_failing(false);
    let (status, _) = app.send("POST", "/api/candidate/submit", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.sink.deliveries().len(), 1);
    assert_eq!(
        app.backend.profile(user).unwrap().status,
        ProfileStatus::Completed
    );
}

#[tokio::test]
async fn failed_delivery_survives_sign_out() {
    let app = test_app();
    let test = t1(true);
    let user = Uuid::new_v4();
    app.backend.add_test(test.clone());
    app.backend
        .add_profile(candidate_profile(user, ProfileStatus::Pending, Some(test.id)));
    let token = mint_token(user, Role::Candidate);

    app.send("POST", "/api/candidate/start", Some(&token), None).await;
    app.send("PUT", "/api/candidate/answer", Some(&token), Some(json!({ "value": 5 })))
        .await;
    app.send("POST", "/api/candidate/next", Some(&token), None).await;
    app.send(
        "PUT",
        "/api/candidate/answer",
        Some(&token),
        Some(json!({ "option": "Option B" })),
    )
    .await;

    app.sink.set_failing(true);
    let (status, _) = app.send("POST", "/api/candidate/submit", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    app.state
        .registry
        .apply(AuthEvent::SignedOut { user_id: user })
        .await;
    app.sink.set_failing(false);

    let (status, view) = app.send("POST", "/api/candidate/start", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["state"], "in_progress");
    assert_eq!(view["index"], 0);
    assert_eq!(
        app.backend.profile(user).unwrap().status,
        ProfileStatus::Pending
    );
    assert!(app.sink.deliveries().is_empty());
}

#[tokio::test]
async fn next_requires_an_answer() {
    let app = test_app();
    let test = t1(true);
    let user = Uuid::new_v4();
    app.backend.add_test(test.clone());
    app.backend
        .add_profile(candidate_profile(user, ProfileStatus::Pending, Some(test.id)));
    let token = mint_token(user, Role::Candidate);

    app.send("POST", "/api/candidate/start", Some(&token), None).await;
    let (status, body) = app.send("POST", "/api/candidate/next", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn blocked_candidates_see_reason() {
    let app = test_app();
    let active = t1(true);
    let inactive = t1(false);
    app.backend.add_test(active.clone());
    app.backend.add_test(inactive.clone());

    let cases = [
        (ProfileStatus::Completed, Some(active.id), "already_taken"),
        (ProfileStatus::InProgress, None, "already_taken"),
        (ProfileStatus::Pending, None, "no_test_assigned"),
        (ProfileStatus::Pending, Some(inactive.id), "inactive_test"),
    ];
    for (status, test_id, reason) in cases {
        let user = Uuid::new_v4();
        app.backend.add_profile(candidate_profile(user, status, test_id));
        let token = mint_token(user, Role::Candidate);

        let (code, view) = app.send("POST", "/api/candidate/start", Some(&token), None).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(view["state"], "blocked");
        assert_eq!(view["reason"], reason);
    }
    assert!(app.backend.profile_updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn admin_cannot_use_candidate_routes() {
    let app = test_app();
    let token = mint_token(Uuid::new_v4(), Role::Admin);
    let (status, body) = app.send("GET", "/api/candidate", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["view"], "dashboard");
}
