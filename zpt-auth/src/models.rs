use serde::{Deserialize, Serialize};

/// In-memory session created on a successful token exchange. Superseded
/// by a new session on re-login and cleared on logout; never persisted
/// as a whole — only the raw tokens are (see [`PersistedTokens`]).
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub account_id: String,
    pub account_label: String,
    pub scopes: Vec<String>,
}

/// Token pair persisted under fixed keys in secret storage.
///
/// No expiry timestamp is tracked: access-token presence is the sole
/// authentication signal and refresh is out of scope (known limitation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedTokens {
    pub access_token: String,
    pub refresh_token: String,
}
