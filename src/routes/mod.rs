use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::{controllers::home_controller, AppState};

pub mod home_routes;
pub mod market_routes;
pub mod portfolio_routes;
pub mod realtime_routes;
pub mod user_routes;

pub fn app(state: AppState) -> Router {
    let router = Router::<AppState>::new();

    let router = home_routes::add_routes(router);
    let router = portfolio_routes::add_routes(router);
    let router = market_routes::add_routes(router);
    let router = user_routes::add_routes(router);
    let router = realtime_routes::add_routes(router);

    // CORS sits outermost so preflight requests are answered before the
    // auth layers see them.
    router
        .fallback(home_controller::not_found)
        .layer(from_fn_with_state(state.clone(), crate::auth::require_auth))
        .layer(from_fn_with_state(state.clone(), crate::auth::inject_current_user))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
