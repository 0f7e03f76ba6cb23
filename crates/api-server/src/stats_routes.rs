use axum::{extract::State, routing::get, Json, Router};

use dashboard_core::{EquityPoint, TradeStats};

use crate::{AppError, AppState};

pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stats", get(get_stats))
        .route("/api/equity-curve", get(get_equity_curve))
}

/// Summary statistics over the most recent trades.
async fn get_stats(State(state): State<AppState>) -> Result<Json<TradeStats>, AppError> {
    let stats = state.dashboard.stats().await?;
    Ok(Json(stats))
}

/// Cumulative profit curve for charting.
async fn get_equity_curve(
    State(state): State<AppState>,
) -> Result<Json<Vec<EquityPoint>>, AppError> {
    let curve = state.dashboard.equity_curve().await?;
    Ok(Json(curve))
}
