use notification_common::ProviderError;
use sms_notification_provider::TwilioClient;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MESSAGES_PATH: &str = "/2010-04-01/Accounts/AC123/Messages.json";

fn create_client(mock_server: &MockServer) -> TwilioClient {
    TwilioClient::new(
        "AC123".to_string(),
        "secret".to_string(),
        Some(mock_server.uri()),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_successful_sms_send() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .and(header_exists("Authorization"))
        .and(body_string_contains("To=%2B15551234567"))
        .and(body_string_contains("From=%2B15550001111"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "sid": "SM123",
            "status": "queued",
            "error_code": null,
            "error_message": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let message = client
        .send_message("+15550001111", "+15551234567", "Low stock: Flour")
        .await
        .unwrap();

    assert_eq!(message.sid, "SM123");
    assert_eq!(message.status.as_deref(), Some("queued"));
}

#[tokio::test]
async fn test_invalid_number_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": 21211,
            "message": "The 'To' number is not a valid phone number.",
            "status": 400
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let err = client
        .send_message("+15550001111", "+15551234567", "hello")
        .await
        .unwrap_err();

    match err {
        ProviderError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("21211"));
        }
        e => panic!("Expected Rejected error, got {:?}", e),
    }
}

#[tokio::test]
async fn test_authentication_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let err = client
        .send_message("+15550001111", "+15551234567", "hello")
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::InvalidAuthentication));
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let err = client
        .send_message("+15550001111", "+15551234567", "hello")
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::ServiceUnavailable { status: 502 }));
}
