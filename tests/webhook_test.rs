mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::*;
use drive_image_bot::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

const SECRET: &str = "123456:test-token";

async fn wait_for_texts(t: &TestBot, count: usize) -> Vec<String> {
    for _ in 0..100 {
        let texts = t.messenger.texts();
        if texts.len() >= count {
            return texts;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    t.messenger.texts()
}

fn app(t: &TestBot) -> axum::Router {
    create_app(AppState {
        bot: t.bot.clone(),
        webhook_secret: SECRET.to_string(),
    })
}

#[tokio::test]
async fn test_health_check() {
    let t = setup_bot().await;

    let response = app(&t)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "connected");
}

#[tokio::test]
async fn test_update_is_acknowledged_and_handled() {
    let t = setup_bot().await;
    let update = json!({
        "update_id": 77,
        "message": {
            "message_id": 1,
            "chat": {"id": USER_ID, "type": "private"},
            "from": {"id": USER_ID, "is_bot": false, "first_name": "Test"},
            "text": "/start"
        }
    });

    let response = app(&t)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/{}", SECRET))
                .header("content-type", "application/json")
                .body(Body::from(update.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let texts = wait_for_texts(&t, 1).await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("👋 Welcome"));
}

#[tokio::test]
async fn test_wrong_path_is_rejected() {
    let t = setup_bot().await;

    let response = app(&t)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/not-the-token")
                .header("content-type", "application/json")
                .body(Body::from(json!({"update_id": 1}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(t.messenger.texts().is_empty());
}

#[tokio::test]
async fn test_malformed_update_is_a_client_error() {
    let t = setup_bot().await;

    let response = app(&t)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/{}", SECRET))
                .header("content-type", "application/json")
                .body(Body::from("{\"message\": 5}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_path_with_garbage_body_is_not_found() {
    let t = setup_bot().await;

    let response = app(&t)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/not-the-token")
                .header("content-type", "text/plain")
                .body(Body::from("not json at all"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
