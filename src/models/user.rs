use serde::{Deserialize, Serialize};

/// The authenticated identity extracted from the identity provider's token.
///
/// Injected into request extensions by `auth::inject_current_user`; the core
/// never talks to the identity provider beyond these claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
}
