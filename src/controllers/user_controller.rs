use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use crate::{models::CurrentUser, services::user_service, AppState};

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

// GET /me
pub async fn get_me(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized();
    };

    match user_service::get_user_info(&state, &u.uid).await {
        Ok(info) => Json(json!({ "user": u, "userInfo": info })).into_response(),
        Err(e) => e.into_response(),
    }
}

// PATCH /me
pub async fn patch_me(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Json(patch): Json<Map<String, Value>>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized();
    };

    if patch.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Nothing to update." })),
        )
            .into_response();
    }

    if let Err(e) = user_service::update_user_info(&state, &u.uid, patch).await {
        return e.into_response();
    }

    match user_service::get_user_info(&state, &u.uid).await {
        Ok(info) => Json(json!({ "userInfo": info })).into_response(),
        Err(e) => e.into_response(),
    }
}

// POST /me/session
pub async fn post_session(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized();
    };

    match user_service::record_session(&state, &u).await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(e) => e.into_response(),
    }
}
