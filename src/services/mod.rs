pub mod market_feed;
pub mod portfolio_service;
pub mod user_service;
