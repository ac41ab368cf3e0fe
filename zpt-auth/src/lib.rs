// OAuth2 authorization-code login against Zoho accounts, with pluggable
// redirect capture and secret-backed token storage.

mod coordinator;
mod error;
mod models;
mod oauth;
pub mod redirect;
mod settings;
mod token_store;

// Always expose testing module (integration tests need it)
pub mod testing;

pub use coordinator::{AuthCoordinator, BrowserOpener, SystemBrowser};
pub use error::AuthError;
pub use models::{AuthSession, PersistedTokens};
pub use oauth::{OAuthClient, SCOPES};
pub use settings::{RedirectSettings, RedirectVariant, Settings};
pub use token_store::{
    FileSecretStore, SecretStore, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
