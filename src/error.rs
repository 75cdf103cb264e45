use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Business-rule failures of the position ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),

    #[error("insufficient holdings: {have} units of {symbol} held, tried to sell {requested}")]
    InsufficientHoldings {
        symbol: String,
        have: i64,
        requested: i64,
    },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        LedgerError::StoreUnavailable(err.to_string())
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            LedgerError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            LedgerError::InsufficientHoldings { have, symbol, .. } => (
                StatusCode::CONFLICT,
                format!("Only {have} units of {symbol} available."),
            ),
            LedgerError::StoreUnavailable(detail) => {
                // Detail stays in the log; the caller gets a generic retry hint.
                tracing::error!("store unavailable: {detail}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Could not reach the data store. Please try again.".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
