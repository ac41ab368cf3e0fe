use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(
        "OAuth client credentials are not configured; set client_id and \
         client_secret in config.toml (or the ZPT__CLIENT_ID / \
         ZPT__CLIENT_SECRET environment variables)"
    )]
    MissingCredentials,

    #[error("a login attempt is already in progress")]
    AlreadyInProgress,

    #[error("login attempt timed out waiting for the browser redirect")]
    TimedOut,

    /// The state echoed by the provider does not belong to this login
    /// attempt. Treated as a potential CSRF/replay, never retried.
    #[error("redirect state does not match this login attempt")]
    StateMismatch,

    #[error("could not open the system browser: {0}")]
    BrowserLaunch(String),

    #[error("could not extract code/state from the redirect: {0}")]
    MalformedRedirect(String),

    #[error("login attempt was cancelled")]
    Cancelled,

    #[error("the provider denied the authorization request: {0}")]
    Denied(String),

    #[error("redirect listener error: {0}")]
    Listener(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error(
        "token exchange rejected the redirect URI; it must match the URI \
         registered with the provider byte-for-byte"
    )]
    RedirectUriMismatch,

    #[error("could not fetch account identity: {0}")]
    Identity(String),

    #[error("secret storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for AuthError {
    fn from(err: config::ConfigError) -> Self {
        AuthError::Configuration(err.to_string())
    }
}
