use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crate::AppState;

pub fn diagnostic_routes() -> Router<AppState> {
    Router::new().route("/api/test", get(store_test))
}

/// Store connectivity diagnostic: reachable or not, how many trades the
/// stats window sees, and one sample record.
async fn store_test(State(state): State<AppState>) -> Response {
    match state.dashboard.connectivity_probe().await {
        Ok(probe) => Json(json!({
            "store_connected": true,
            "trade_count": probe.trade_count,
            "sample_trade": probe.sample_trade,
            "server_time": Utc::now().to_rfc3339(),
            "message": "Store connection successful",
        }))
        .into_response(),
        Err(err) => {
            tracing::error!("store connectivity probe failed: {err}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "store_connected": false,
                    "error": err.to_string(),
                    "message": "Store connection failed",
                })),
            )
                .into_response()
        }
    }
}
