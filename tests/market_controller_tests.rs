use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use nepfolio::config;
use nepfolio::controllers::market_controller;
use nepfolio::models::MarketStock;
use nepfolio::services::market_feed::{self, MarketCache, MarketFeedClient};
use nepfolio::services::portfolio_service::CommitLocks;
use nepfolio::store::MemStore;
use nepfolio::AppState;

fn test_state() -> AppState {
    let settings = config::load();
    let (events_tx, _events_rx) = tokio::sync::broadcast::channel::<String>(16);

    AppState {
        market_feed: MarketFeedClient::new(settings.market_feed_url.clone()),
        market: MarketCache::new(),
        store: Arc::new(MemStore::new()),
        settings,
        events_tx,
        commit_locks: CommitLocks::new(),
    }
}

fn stock(name: &str, ltp: f64, percent_change: f64) -> MarketStock {
    MarketStock {
        name: name.to_string(),
        ltp,
        percent_change,
        ..Default::default()
    }
}

async fn response_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn get_market_serves_the_cached_snapshot() {
    let state = test_state();

    let mut snapshot = HashMap::new();
    snapshot.insert("NABIL".to_string(), stock("Nabil Bank", 500.0, 1.2));
    state.market.replace(snapshot).await;

    let app = Router::new()
        .route("/market", get(market_controller::get_market))
        .with_state(state);

    let req = Request::builder()
        .method("GET")
        .uri("/market")
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = response_json(res).await;
    assert_eq!(json["stocks"]["NABIL"]["ltp"], 500.0);
    assert_eq!(json["stocks"]["NABIL"]["name"], "Nabil Bank");
    assert!(json["fetchedAt"].is_string());
}

#[tokio::test]
async fn get_market_before_the_first_sync_is_empty() {
    let state = test_state();
    let app = Router::new()
        .route("/market", get(market_controller::get_market))
        .with_state(state);

    let req = Request::builder()
        .method("GET")
        .uri("/market")
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    let json = response_json(res).await;
    assert_eq!(json["stocks"], serde_json::json!({}));
    assert!(json["fetchedAt"].is_null());
}

#[tokio::test]
async fn movers_rank_by_percent_change() {
    let mut snapshot = HashMap::new();
    snapshot.insert("UP1".to_string(), stock("Gainer One", 100.0, 8.0));
    snapshot.insert("UP2".to_string(), stock("Gainer Two", 100.0, 4.0));
    snapshot.insert("FLAT".to_string(), stock("Flat", 100.0, 0.0));
    snapshot.insert("DN1".to_string(), stock("Loser One", 100.0, -6.0));

    let (gainers, losers) = market_feed::market_movers(&snapshot, 2);

    assert_eq!(gainers.len(), 2);
    assert_eq!(gainers[0].symbol, "UP1");
    assert_eq!(gainers[1].symbol, "UP2");

    assert_eq!(losers.len(), 2);
    assert_eq!(losers[0].symbol, "DN1");
    assert_eq!(losers[1].symbol, "FLAT");
}

#[tokio::test]
async fn movers_endpoint_serves_both_lists() {
    let state = test_state();

    let mut snapshot = HashMap::new();
    snapshot.insert("UP1".to_string(), stock("Gainer", 100.0, 8.0));
    snapshot.insert("DN1".to_string(), stock("Loser", 100.0, -6.0));
    state.market.replace(snapshot).await;

    let app = Router::new()
        .route("/market/movers", get(market_controller::get_movers))
        .with_state(state);

    let req = Request::builder()
        .method("GET")
        .uri("/market/movers")
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = response_json(res).await;
    assert_eq!(json["gainers"][0]["symbol"], "UP1");
    assert_eq!(json["losers"][0]["symbol"], "DN1");
}
