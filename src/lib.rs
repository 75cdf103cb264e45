//! Library entrypoint for nepfolio.
//!
//! This file exists mainly to make controller tests easy (integration tests
//! under `tests/` can import the app state, routers, controllers, services).

pub mod config;
pub mod error;
pub mod models;
pub mod store;

// Keep this module at crate root because the codebase references it as
// `crate::auth`.
#[path = "middleware/auth.rs"]
pub mod auth;

pub mod services;

pub mod controllers;
pub mod routes;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub store: Arc<dyn store::TreeStore>,
    pub market_feed: services::market_feed::MarketFeedClient,
    pub market: services::market_feed::MarketCache,
    pub events_tx: tokio::sync::broadcast::Sender<String>,
    pub commit_locks: services::portfolio_service::CommitLocks,
}
