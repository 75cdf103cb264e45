use axum::{
    routing::{get, post},
    Router,
};

use crate::{controllers::portfolio_controller, AppState};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/portfolio/transactions",
            post(portfolio_controller::post_transaction)
                .get(portfolio_controller::get_transactions),
        )
        .route("/portfolio/holdings", get(portfolio_controller::get_holdings))
        .route("/portfolio/summary", get(portfolio_controller::get_summary))
}
