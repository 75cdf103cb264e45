use axum::{
    routing::{get, post},
    Router,
};

use crate::{controllers::user_controller, AppState};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/me",
            get(user_controller::get_me).patch(user_controller::patch_me),
        )
        .route("/me/session", post(user_controller::post_session))
}
