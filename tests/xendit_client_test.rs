//! Xendit invoice client against a mock HTTP server.

use ispserver::config::XenditConfig;
use ispserver::integrations::xendit::{CreateInvoiceParams, XenditClient, XenditError};

fn test_config(base_url: String) -> XenditConfig {
    XenditConfig {
        base_url,
        secret_key: "xnd_development_test".to_string(),
        callback_token: "callback-secret".to_string(),
        success_redirect_url: None,
    }
}

fn test_params() -> CreateInvoiceParams {
    CreateInvoiceParams {
        external_id: "ACC-000123-A1B2C3".to_string(),
        amount: 1499.0,
        description: "Payment for account ACC-000123".to_string(),
        payer_email: Some("ana@example.ph".to_string()),
        success_redirect_url: None,
    }
}

#[tokio::test]
async fn create_invoice_parses_hosted_invoice() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v2/invoices")
        .match_header("authorization", mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "inv-1",
                "external_id": "ACC-000123-A1B2C3",
                "status": "PENDING",
                "amount": 1499.0,
                "invoice_url": "https://checkout.xendit.co/web/inv-1",
                "expiry_date": "2025-02-01T00:00:00Z"
            }"#,
        )
        .create_async()
        .await;

    let client = XenditClient::new(&test_config(server.url()));
    let invoice = client
        .create_invoice(test_params())
        .await
        .expect("invoice should parse");

    assert_eq!(invoice.id, "inv-1");
    assert_eq!(invoice.external_id, "ACC-000123-A1B2C3");
    assert_eq!(invoice.invoice_url, "https://checkout.xendit.co/web/inv-1");
    mock.assert_async().await;
}

#[tokio::test]
async fn create_invoice_surfaces_api_error_details() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v2/invoices")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error_code": "MINIMUM_AMOUNT_ERROR", "message": "Amount is below minimum"}"#)
        .create_async()
        .await;

    let client = XenditClient::new(&test_config(server.url()));
    let err = client
        .create_invoice(test_params())
        .await
        .expect_err("400 must become an error");

    match err {
        XenditError::ApiError(message) => {
            assert!(message.contains("MINIMUM_AMOUNT_ERROR"));
            assert!(message.contains("Amount is below minimum"));
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn create_invoice_without_secret_key_never_calls_out() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v2/invoices")
        .expect(0)
        .create_async()
        .await;

    let config = XenditConfig {
        secret_key: String::new(),
        ..test_config(server.url())
    };
    let client = XenditClient::new(&config);
    let err = client
        .create_invoice(test_params())
        .await
        .expect_err("unconfigured client must refuse");

    assert!(matches!(err, XenditError::NotConfigured));
    mock.assert_async().await;
}
