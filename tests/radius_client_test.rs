//! RADIUS operations client against a mock HTTP server.

use ispserver::config::RadiusConfig;
use ispserver::integrations::radius::{RadiusError, RadiusOpsClient};

fn test_config(base_url: String) -> RadiusConfig {
    RadiusConfig {
        base_url,
        api_key: "test-key".to_string(),
        realm: "fiber.example.ph".to_string(),
    }
}

#[tokio::test]
async fn reconnect_reports_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/operations")
        .match_header("x-api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "message": "session restored"}"#)
        .create_async()
        .await;

    let client = RadiusOpsClient::new(&test_config(server.url()));
    let result = client
        .reconnect("acc-000123@fiber.example.ph", "Fiber 50")
        .await
        .expect("call should succeed");

    assert!(result.success);
    mock.assert_async().await;
}

#[tokio::test]
async fn refused_operation_is_not_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/operations")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": false, "message": "unknown subscriber"}"#)
        .create_async()
        .await;

    let client = RadiusOpsClient::new(&test_config(server.url()));
    let result = client
        .disconnect("ghost@fiber.example.ph")
        .await
        .expect("a refusal still parses");

    assert!(!result.success);
    assert_eq!(result.message.as_deref(), Some("unknown subscriber"));
}

#[tokio::test]
async fn http_failure_maps_to_api_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/operations")
        .with_status(500)
        .with_body("backend down")
        .create_async()
        .await;

    let client = RadiusOpsClient::new(&test_config(server.url()));
    let err = client
        .remove("acc-000123@fiber.example.ph")
        .await
        .expect_err("500 must become an error");

    assert!(matches!(err, RadiusError::ApiError(_)));
}

#[tokio::test]
async fn missing_api_key_short_circuits() {
    let client = RadiusOpsClient::new(&RadiusConfig {
        base_url: "http://localhost:1".to_string(),
        api_key: String::new(),
        realm: "fiber.example.ph".to_string(),
    });

    let err = client
        .disconnect("acc-000123@fiber.example.ph")
        .await
        .expect_err("unconfigured client must refuse");

    assert!(matches!(err, RadiusError::NotConfigured));
}
