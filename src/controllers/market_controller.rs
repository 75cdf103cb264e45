use axum::{extract::State, Json};
use chrono::SecondsFormat;
use serde_json::{json, Value};

use crate::{services::market_feed, AppState};

// GET /market
pub async fn get_market(State(state): State<AppState>) -> Json<Value> {
    let stocks = state.market.all().await;
    let fetched_at = state
        .market
        .fetched_at()
        .await
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true));

    Json(json!({ "stocks": stocks, "fetchedAt": fetched_at }))
}

// GET /market/movers
pub async fn get_movers(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.market.all().await;
    let (gainers, losers) = market_feed::market_movers(&snapshot, 5);

    Json(json!({ "gainers": gainers, "losers": losers }))
}
