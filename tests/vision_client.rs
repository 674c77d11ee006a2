//! Retry and rate-limit behavior of the vision query client.

mod common;

use common::{spawn_model_stub, StubReply};
use safewatch::vision_client::{placeholder_jpeg, VisionClient};
use safewatch::Error;

#[tokio::test]
async fn answer_on_first_attempt_has_no_retries() {
    let stub = spawn_model_stub(vec![StubReply::Answer("I see smoke".to_string())]).await;
    let client = VisionClient::new(stub.base_url.as_str()).with_backoff_base(0.01);

    let reply = client
        .query(placeholder_jpeg(), "Do you see smoke?")
        .await
        .unwrap();

    assert_eq!(reply.answer, "I see smoke");
    assert_eq!(reply.retries, 0);
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn two_failures_then_success_records_two_retries() {
    let stub = spawn_model_stub(vec![
        StubReply::Status(500),
        StubReply::Status(502),
        StubReply::Answer("yes".to_string()),
    ])
    .await;
    let client = VisionClient::new(stub.base_url.as_str()).with_backoff_base(0.01);

    let reply = client
        .query(placeholder_jpeg(), "Is there fire?")
        .await
        .unwrap();

    assert_eq!(reply.answer, "yes");
    assert_eq!(reply.retries, 2);
    assert_eq!(stub.hits(), 3);
}

#[tokio::test]
async fn rate_limit_fails_immediately_without_retry() {
    let stub = spawn_model_stub(vec![StubReply::Status(429)]).await;
    let client = VisionClient::new(stub.base_url.as_str()).with_backoff_base(0.01);

    let result = client.query(placeholder_jpeg(), "Is there fire?").await;

    assert!(matches!(result, Err(Error::RateLimited)));
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn exhausted_retries_surface_unreachable() {
    let stub = spawn_model_stub(vec![
        StubReply::Status(500),
        StubReply::Status(500),
        StubReply::Status(500),
    ])
    .await;
    let client = VisionClient::new(stub.base_url.as_str()).with_backoff_base(0.01);

    let result = client.query(placeholder_jpeg(), "Is there fire?").await;

    assert!(matches!(result, Err(Error::Unreachable(_))));
    assert_eq!(stub.hits(), 3);
}

#[tokio::test]
async fn answers_are_trimmed() {
    let stub = spawn_model_stub(vec![StubReply::Answer("  yes \n".to_string())]).await;
    let client = VisionClient::new(stub.base_url.as_str()).with_backoff_base(0.01);

    let reply = client
        .query(placeholder_jpeg(), "Is there fire?")
        .await
        .unwrap();
    assert_eq!(reply.answer, "yes");
}

#[tokio::test]
async fn health_check_reflects_endpoint_state() {
    let stub = spawn_model_stub(vec![StubReply::Answer("yes".to_string())]).await;
    let client = VisionClient::new(stub.base_url.as_str());
    assert!(client.health_check().await);

    let down = VisionClient::new("http://127.0.0.1:1");
    assert!(!down.health_check().await);
}
