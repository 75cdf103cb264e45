use axum::{
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{models::CurrentUser, AppState};

/// Claims carried by the identity provider's token. The backend only ever
/// verifies tokens; it never mints them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    // user id issued by the identity provider
    pub sub: String,
    // expiry (unix timestamp seconds)
    pub exp: usize,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub email_verified: bool,
}

fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    for part in raw.split(';') {
        let part = part.trim();
        let mut it = part.splitn(2, '=');
        let k = it.next()?.trim();
        let v = it.next()?.trim();
        if k == name {
            return Some(v.to_string());
        }
    }
    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    raw.strip_prefix("Bearer ").map(|t| t.trim().to_string())
}

pub async fn inject_current_user(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = bearer_token(req.headers())
        .or_else(|| get_cookie(req.headers(), state.settings.jwt_cookie_name.as_str()));

    if let Some(token) = token {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(state.settings.jwt_secret.as_bytes()),
            &validation,
        );

        if let Ok(data) = decoded {
            let claims = data.claims;
            // Store user in request extensions so handlers can access it
            req.extensions_mut().insert(CurrentUser {
                uid: claims.sub,
                email: claims.email,
                email_verified: claims.email_verified,
            });
        }
    }

    next.run(req).await
}

fn is_public_path(path: &str) -> bool {
    path == "/health" || path.starts_with("/health/")
}

pub async fn require_auth(
    State(_state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    if is_public_path(&path) {
        return next.run(req).await;
    }

    let Some(user) = req.extensions().get::<CurrentUser>() else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response();
    };

    // The portfolio is gated on a verified email address.
    if path.starts_with("/portfolio") && !user.email_verified {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Please verify your email address." })),
        )
            .into_response();
    }

    next.run(req).await
}
