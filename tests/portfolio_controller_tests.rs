use std::sync::Arc;

use axum::{
    http::{header, Request, StatusCode},
    routing::{get, post},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use nepfolio::config;
use nepfolio::controllers::portfolio_controller;
use nepfolio::models::CurrentUser;
use nepfolio::services::market_feed::{MarketCache, MarketFeedClient};
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

fn current_user() -> CurrentUser {
    CurrentUser {
        uid: "u1".to_string(),
        email: "test@example.com".to_string(),
        email_verified: true,
    }
}

fn tx_request(body: Value, user: Option<CurrentUser>) -> Request<axum::body::Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri("/portfolio/transactions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    if let Some(u) = user {
        req.extensions_mut().insert(u);
    }
    req
}

async fn response_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn post_transaction_unauthorized_returns_401() {
    let state = test_state();
    let app = Router::new()
        .route("/portfolio/transactions", post(portfolio_controller::post_transaction))
        .with_state(state);

    let body = json!({ "symbol": "NABIL", "type": "BUY", "units": 1, "price": 100.0 });
    let res = app.oneshot(tx_request(body, None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_transaction_invalid_units_returns_400() {
    let state = test_state();
    let app = Router::new()
        .route("/portfolio/transactions", post(portfolio_controller::post_transaction))
        .with_state(state);

    let body = json!({ "symbol": "NABIL", "type": "BUY", "units": 0, "price": 100.0 });
    let res = app.oneshot(tx_request(body, Some(current_user()))).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let json = response_json(res).await;
    assert_eq!(json["error"], "Enter a valid number of units.");
}

#[tokio::test]
async fn post_transaction_oversell_returns_409() {
    let state = test_state();
    let app = Router::new()
        .route("/portfolio/transactions", post(portfolio_controller::post_transaction))
        .with_state(state);

    let buy = json!({ "symbol": "NABIL", "type": "BUY", "units": 5, "price": 100.0 });
    let res = app
        .clone()
        .oneshot(tx_request(buy, Some(current_user())))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let sell = json!({ "symbol": "NABIL", "type": "SELL", "units": 6, "price": 100.0 });
    let res = app.oneshot(tx_request(sell, Some(current_user()))).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let json = response_json(res).await;
    assert_eq!(json["error"], "Only 5 units of NABIL available.");
}

#[tokio::test]
async fn post_transaction_then_holdings_roundtrip() {
    let state = test_state();
    let app = Router::new()
        .route("/portfolio/transactions", post(portfolio_controller::post_transaction))
        .route("/portfolio/holdings", get(portfolio_controller::get_holdings))
        .with_state(state);

    let buy = json!({ "symbol": "nabil", "type": "BUY", "units": 100, "price": 200.0 });
    let res = app
        .clone()
        .oneshot(tx_request(buy, Some(current_user())))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let receipt = response_json(res).await;
    assert_eq!(receipt["symbol"], "NABIL");
    assert_eq!(receipt["holding"]["units"], 100);
    assert_eq!(receipt["holding"]["wacc"], 200.0);

    let mut req = Request::builder()
        .method("GET")
        .uri("/portfolio/holdings")
        .body(axum::body::Body::empty())
        .unwrap();
    req.extensions_mut().insert(current_user());

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = response_json(res).await;
    let holdings = json["holdings"].as_array().unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0]["symbol"], "NABIL");
    assert_eq!(holdings[0]["units"], 100);
    // No live quote in the cache: display price falls back to cost basis.
    assert_eq!(holdings[0]["lastPrice"], 200.0);
    assert_eq!(holdings[0]["live"], false);
}

#[tokio::test]
async fn get_summary_for_an_empty_portfolio_is_all_zero() {
    let state = test_state();
    let app = Router::new()
        .route("/portfolio/summary", get(portfolio_controller::get_summary))
        .with_state(state);

    let mut req = Request::builder()
        .method("GET")
        .uri("/portfolio/summary")
        .body(axum::body::Body::empty())
        .unwrap();
    req.extensions_mut().insert(current_user());

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = response_json(res).await;
    assert_eq!(json["invested"], 0.0);
    assert_eq!(json["value"], 0.0);
    assert_eq!(json["pnl"], 0.0);
    assert_eq!(json["holdingsCount"], 0);
}

#[tokio::test]
async fn get_transactions_lists_newest_first() {
    let state = test_state();
    let app = Router::new()
        .route(
            "/portfolio/transactions",
            post(portfolio_controller::post_transaction).get(portfolio_controller::get_transactions),
        )
        .with_state(state);

    for (units, price) in [(10, 100.0), (5, 110.0)] {
        let body = json!({ "symbol": "ADBL", "type": "BUY", "units": units, "price": price });
        let res = app
            .clone()
            .oneshot(tx_request(body, Some(current_user())))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let mut req = Request::builder()
        .method("GET")
        .uri("/portfolio/transactions")
        .body(axum::body::Body::empty())
        .unwrap();
    req.extensions_mut().insert(current_user());

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = response_json(res).await;
    let entries = json["transactions"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    for entry in entries {
        assert_eq!(entry["symbol"], "ADBL");
        assert_eq!(entry["type"], "BUY");
        assert!(entry["id"].is_string());
    }
    let t0 = entries[0]["timestamp"].as_i64().unwrap();
    let t1 = entries[1]["timestamp"].as_i64().unwrap();
    assert!(t0 >= t1);
}
