pub mod home_controller;
pub mod market_controller;
pub mod portfolio_controller;
pub mod realtime_controller;
pub mod user_controller;
