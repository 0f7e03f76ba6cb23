use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use trade_analytics::DashboardService;
use trade_ingest::TradeIngestor;
use trade_store::{RestStore, StoreError, TradeStore};

mod diagnostic_routes;
mod request_id;
mod stats_routes;
mod trade_routes;


/// Everything a request handler needs, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<TradeIngestor>,
    pub dashboard: Arc<DashboardService>,
}

impl AppState {
    pub fn new(store: Arc<dyn TradeStore>, collection: &str) -> Self {
        Self {
            ingestor: Arc::new(TradeIngestor::new(store.clone(), collection)),
            dashboard: Arc::new(DashboardService::new(store, collection)),
        }
    }
}

/// Handler-level error. Every failure becomes a non-200 with a JSON
/// `{"error": ...}` body; an unreachable store maps to 503 so clients can
/// tell "no data" apart from "store down".
pub struct AppError(anyhow::Error);

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.downcast_ref::<StoreError>().is_some() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        tracing::error!("request failed: {:#}", self.0);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Server configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub store_base_url: String,
    pub store_auth_token: Option<String>,
    pub store_timeout: Duration,
    pub trades_collection: String,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store_base_url =
            std::env::var("STORE_BASE_URL").context("STORE_BASE_URL must be set")?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT must be a port number")?,
            Err(_) => 10000,
        };

        let timeout_secs = match std::env::var("STORE_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().context("STORE_TIMEOUT_SECS must be an integer")?,
            Err(_) => 10,
        };

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            store_base_url,
            store_auth_token: std::env::var("STORE_AUTH_TOKEN").ok(),
            store_timeout: Duration::from_secs(timeout_secs),
            trades_collection: std::env::var("TRADES_COLLECTION")
                .unwrap_or_else(|_| "trades".to_string()),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .merge(trade_routes::trade_routes())
        .merge(stats_routes::stats_routes())
        .merge(diagnostic_routes::diagnostic_routes())
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        // The dashboard page and the EA upload client call from other
        // origins; the API carries no credentials.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api_server=info,trade_store=info,trade_ingest=info,trade_analytics=info".into()
            }),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let store: Arc<dyn TradeStore> = Arc::new(RestStore::new(
        &config.store_base_url,
        config.store_auth_token.clone(),
        config.store_timeout,
    ));
    let state = AppState::new(store, &config.trades_collection);

    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("forex dashboard listening on {addr}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}

async fn home() -> Html<&'static str> {
    Html(include_str!("../assets/dashboard.html"))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "message": "Forex dashboard is running",
    }))
}
