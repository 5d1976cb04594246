use anyhow::Context;
use axum::{routing::get, Json, Router};
use dotenvy::dotenv;
use log::info;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use ispserver::api_router::configure_api_routes;
use ispserver::config::AppConfig;
use ispserver::shared::state::AppState;
use ispserver::shared::utils::create_conn;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::from_env();

    let pool = create_conn(&config.database_url()).context("Failed to create database pool")?;

    let state = Arc::new(AppState::new(config.clone(), pool));

    let app = Router::new()
        .route("/health", get(health))
        .merge(configure_api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}
