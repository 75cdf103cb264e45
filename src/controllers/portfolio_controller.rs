use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    models::{CurrentUser, TransactionInput},
    services::portfolio_service,
    AppState,
};

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

// POST /portfolio/transactions
pub async fn post_transaction(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Json(input): Json<TransactionInput>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized();
    };

    match portfolio_service::apply_transaction(&state, &u.uid, input).await {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(e) => e.into_response(),
    }
}

// GET /portfolio/holdings
pub async fn get_holdings(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized();
    };

    let holdings = match portfolio_service::list_holdings(&state, &u.uid).await {
        Ok(h) => h,
        Err(e) => return e.into_response(),
    };

    let market = state.market.all().await;
    let views = portfolio_service::holding_views(&holdings, &market);

    Json(json!({ "holdings": views })).into_response()
}

// GET /portfolio/summary
pub async fn get_summary(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized();
    };

    let holdings = match portfolio_service::list_holdings(&state, &u.uid).await {
        Ok(h) => h,
        Err(e) => return e.into_response(),
    };

    let market = state.market.all().await;
    let summary = portfolio_service::portfolio_summary(&holdings, &market);

    Json(summary).into_response()
}

// GET /portfolio/transactions
pub async fn get_transactions(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized();
    };

    match portfolio_service::list_transactions(&state, &u.uid).await {
        Ok(entries) => Json(json!({ "transactions": entries })).into_response(),
        Err(e) => e.into_response(),
    }
}
