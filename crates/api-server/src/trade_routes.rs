use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use dashboard_core::TradeRecord;
use trade_analytics::LIST_WINDOW;
use trade_ingest::IngestReport;

use crate::{AppError, AppState};

#[derive(Deserialize)]
pub struct ListTradesQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

impl UploadResponse {
    fn from_report(report: IngestReport) -> Self {
        Self {
            success: true,
            message: format!("Successfully uploaded {} trades", report.uploaded),
            uploaded_count: Some(report.uploaded),
            skipped_count: Some(report.skipped_existing),
            failed_count: Some(report.failed),
            error: None,
        }
    }

    fn failure(error: String) -> Self {
        Self {
            success: false,
            message: "Failed to upload trades".to_string(),
            uploaded_count: None,
            skipped_count: None,
            failed_count: None,
            error: Some(error),
        }
    }
}

pub fn trade_routes() -> Router<AppState> {
    Router::new()
        .route("/api/trades", get(list_trades))
        .route("/api/upload-trades", post(upload_trades))
}

/// Most recent trades, default window of 50.
async fn list_trades(
    State(state): State<AppState>,
    Query(query): Query<ListTradesQuery>,
) -> Result<Json<Vec<TradeRecord>>, AppError> {
    let limit = query.limit.unwrap_or(LIST_WINDOW);
    let trades = state.dashboard.recent_trades(limit).await?;
    Ok(Json(trades))
}

/// Receives trades from the external trading system: either one record or
/// a list. A structurally unparseable body is a 400; individual bad
/// records are counted in the report, not fatal.
async fn upload_trades(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(UploadResponse::failure(rejection.body_text())),
            )
                .into_response();
        }
    };

    let batch = match body {
        Value::Array(records) => records,
        record @ Value::Object(_) => vec![record],
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(UploadResponse::failure(format!(
                    "expected a trade record or a list of trade records, got {other}"
                ))),
            )
                .into_response();
        }
    };

    let report = state.ingestor.process_uploaded(batch).await;
    tracing::info!(
        uploaded = report.uploaded,
        skipped = report.skipped_existing,
        failed = report.failed,
        "processed trade upload"
    );

    Json(UploadResponse::from_report(report)).into_response()
}
