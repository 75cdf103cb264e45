use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::error::LedgerError;
use crate::models::CurrentUser;
use crate::store::TreeStore;
use crate::AppState;

fn user_info_path(uid: &str) -> String {
    format!("users/{uid}/userInfo")
}

pub async fn get_user_info(state: &AppState, uid: &str) -> Result<Option<Value>, LedgerError> {
    Ok(state.store.get(&user_info_path(uid)).await?)
}

/// Central merge for profile changes. Every merge stamps `lastModified` and
/// `serverTimestamp` alongside the caller's fields.
pub async fn update_user_info(
    state: &AppState,
    uid: &str,
    mut patch: Map<String, Value>,
) -> Result<(), LedgerError> {
    let now = Utc::now();
    patch.insert(
        "lastModified".into(),
        json!(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    patch.insert("serverTimestamp".into(), json!(now.timestamp_millis()));

    state.store.merge(&user_info_path(uid), patch).await?;
    Ok(())
}

/// Mirrors the identity provider's current claims into the profile record
/// and stamps the login instant.
pub async fn record_session(state: &AppState, user: &CurrentUser) -> Result<(), LedgerError> {
    let mut patch = Map::new();
    patch.insert("email".into(), json!(user.email));
    patch.insert("emailVerified".into(), json!(user.email_verified));
    patch.insert(
        "lastLogin".into(),
        json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );

    update_user_info(state, &user.uid, patch).await
}
