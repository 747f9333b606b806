mod common;

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_prompt_returns_assistant_reply() {
    let app = common::create_test_app().await;
    let cookie = common::login(&app.router, "rostam", "rakhsh").await;

    let (status, body) = common::send(
        &app.router,
        "POST",
        "/prompt",
        Some(&cookie),
        Some(json!({"user_prompt": "Where is the tower?", "system_prompt_id": 1, "question_id": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "echo: Where is the tower?");

    let calls = app.relay.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 2);
    assert_eq!(calls[0][0].role, "system");
    assert_eq!(calls[0][0].content, "You are Guido, a friendly mechanic.");
    assert_eq!(calls[0][1].role, "user");
}

#[tokio::test]
async fn test_prompt_history_is_replayed() {
    let app = common::create_test_app().await;
    let cookie = common::login(&app.router, "rostam", "rakhsh").await;

    for prompt in ["first", "second"] {
        let (status, _) = common::send(
            &app.router,
            "POST",
            "/prompt",
            Some(&cookie),
            Some(json!({"user_prompt": prompt, "system_prompt_id": 2, "question_id": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let calls = app.relay.calls.lock().unwrap();
    let roles: Vec<&str> = calls[1].iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    assert_eq!(calls[1][1].content, "first");
    assert_eq!(calls[1][2].content, "echo: first");
    assert_eq!(calls[1][3].content, "second");
    drop(calls);

    let (_, user) = common::send(&app.router, "GET", "/user", Some(&cookie), None).await;
    let history = user["per_question"]["2"]["prompt_history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["system_prompt_id"], 2);
    assert_eq!(history[1]["result"], "echo: second");
}

#[tokio::test]
async fn test_prompt_defaults_to_current_question() {
    let app = common::create_test_app().await;
    let cookie = common::login(&app.router, "rostam", "rakhsh").await;
    common::submit_answer(&app.router, &cookie, 1, "paris").await;

    let (status, _) = common::send(
        &app.router,
        "POST",
        "/prompt",
        Some(&cookie),
        Some(json!({"user_prompt": "hint please", "system_prompt_id": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, user) = common::send(&app.router, "GET", "/user", Some(&cookie), None).await;
    assert_eq!(
        user["per_question"]["2"]["prompt_history"][0]["user_prompt"],
        "hint please"
    );
}

#[tokio::test]
async fn test_prompt_with_unknown_persona() {
    let app = common::create_test_app().await;
    let cookie = common::login(&app.router, "rostam", "rakhsh").await;

    let (status, body) = common::send(
        &app.router,
        "POST",
        "/prompt",
        Some(&cookie),
        Some(json!({"user_prompt": "hello", "system_prompt_id": 42, "question_id": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert!(app.relay.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_prompt_with_unknown_question() {
    let app = common::create_test_app().await;
    let cookie = common::login(&app.router, "rostam", "rakhsh").await;

    let (status, _) = common::send(
        &app.router,
        "POST",
        "/prompt",
        Some(&cookie),
        Some(json!({"user_prompt": "hello", "system_prompt_id": 1, "question_id": 77})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.relay.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_prompt_is_rejected() {
    let app = common::create_test_app().await;
    let cookie = common::login(&app.router, "rostam", "rakhsh").await;

    for prompt in ["", "   "] {
        let (status, body) = common::send(
            &app.router,
            "POST",
            "/prompt",
            Some(&cookie),
            Some(json!({"user_prompt": prompt, "system_prompt_id": 1, "question_id": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
    }
    assert!(app.relay.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_relay_failure_maps_to_bad_gateway() {
    let relay = Arc::new(common::StubRelay {
        fail: true,
        ..Default::default()
    });
    let app = common::create_test_app_with_relay(relay).await;
    let cookie = common::login(&app.router, "rostam", "rakhsh").await;

    let (status, body) = common::send(
        &app.router,
        "POST",
        "/prompt",
        Some(&cookie),
        Some(json!({"user_prompt": "hello", "system_prompt_id": 1, "question_id": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["ok"], false);
    assert_eq!(body["description"], "external API error");

    // Nothing is recorded for a failed exchange.
    let (_, user) = common::send(&app.router, "GET", "/user", Some(&cookie), None).await;
    assert!(user["per_question"].get("1").is_none());
}

#[tokio::test]
async fn test_prompt_requires_auth() {
    let app = common::create_test_app().await;

    let (status, _) = common::send(
        &app.router,
        "POST",
        "/prompt",
        None,
        Some(json!({"user_prompt": "hello", "system_prompt_id": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
