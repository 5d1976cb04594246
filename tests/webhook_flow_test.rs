//! Handler-level checks that run without a database: the webhook gate and
//! request validation reject before any query is made.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use std::sync::Arc;
use tower::ServiceExt;

use ispserver::api_router::configure_api_routes;
use ispserver::config::{
    AppConfig, DatabaseConfig, RadiusConfig, ServerConfig, SmsConfig, SmtpConfig, XenditConfig,
};
use ispserver::shared::state::AppState;

const CALLBACK_TOKEN: &str = "callback-secret";

fn test_state() -> Arc<AppState> {
    let config = AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            username: "test".to_string(),
            password: String::new(),
            server: "localhost".to_string(),
            port: 5432,
            database: "ispserver_test".to_string(),
        },
        xendit: XenditConfig {
            base_url: "https://api.xendit.co".to_string(),
            secret_key: "xnd_development_test".to_string(),
            callback_token: CALLBACK_TOKEN.to_string(),
            success_redirect_url: None,
        },
        radius: RadiusConfig {
            base_url: "http://localhost:9090".to_string(),
            api_key: "test-key".to_string(),
            realm: "fiber.example.ph".to_string(),
        },
        sms: SmsConfig {
            base_url: "https://api.itexmo.com/api".to_string(),
            api_code: "code".to_string(),
            email: "ops@isp.test".to_string(),
            password: "secret".to_string(),
            sender_id: "ISP".to_string(),
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            username: None,
            password: None,
            from: "noreply@isp.test".to_string(),
        },
    };

    // Lazy pool: these tests only exercise paths that return before any
    // query runs, so no Postgres is needed.
    let manager = ConnectionManager::<PgConnection>::new("postgres://localhost:1/ispserver_test");
    let pool = Pool::builder().build_unchecked(manager);

    Arc::new(AppState::new(config, pool))
}

fn app() -> Router {
    Router::new()
        .merge(configure_api_routes())
        .with_state(test_state())
}

fn webhook_request(token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/payments/webhook")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("x-callback-token", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn webhook_with_wrong_token_is_rejected() {
    let response = app()
        .oneshot(webhook_request(
            Some("wrong"),
            r#"{"external_id": "ACC-000123-XYZ123", "status": "PAID"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn webhook_without_token_is_rejected() {
    let response = app()
        .oneshot(webhook_request(
            None,
            r#"{"external_id": "ACC-000123-XYZ123", "status": "PAID"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn webhook_ignores_statuses_outside_the_mapping() {
    let response = app()
        .oneshot(webhook_request(
            Some(CALLBACK_TOKEN),
            r#"{"external_id": "ACC-000123-XYZ123", "status": "VOIDED"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Event ignored");
}

#[tokio::test]
async fn payment_below_minimum_fails_validation() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/payments")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"account_no": "ACC-000123", "amount": 50.0}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["errors"]["amount"][0]
        .as_str()
        .unwrap()
        .contains("at least 100"));
}

#[tokio::test]
async fn customer_create_without_names_fails_validation() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/customers")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"first_name": "", "last_name": ""}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
