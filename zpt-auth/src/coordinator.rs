//! Login flow orchestration.
//!
//! One coordinator owns the whole authorization-code dance: start the
//! redirect listener, send the browser to the provider, wait for the
//! redirect (bounded by the login deadline), validate state, exchange the
//! code, resolve the account identity, persist the tokens. The listener
//! is stopped on every exit path, success or not.

use crate::error::AuthError;
use crate::models::{AuthSession, PersistedTokens};
use crate::oauth::{OAuthClient, SCOPES};
use crate::redirect::{AuthorizationResponse, RedirectListener};
use crate::settings::Settings;
use crate::token_store::TokenStore;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Opens a URL in the user's browser. A trait so tests can intercept the
/// authorization URL instead of launching anything.
pub trait BrowserOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), AuthError>;
}

pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), AuthError> {
        open::that(url).map_err(|e| AuthError::BrowserLaunch(e.to_string()))
    }
}

/// At-most-one-login latch. The guard releases the slot on drop, so an
/// early return or panic in the flow cannot wedge future logins.
#[derive(Clone, Default)]
struct PendingSlot {
    busy: Arc<AtomicBool>,
}

struct PendingGuard {
    busy: Arc<AtomicBool>,
}

impl PendingSlot {
    fn acquire(&self) -> Result<PendingGuard, AuthError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AuthError::AlreadyInProgress);
        }
        Ok(PendingGuard {
            busy: Arc::clone(&self.busy),
        })
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(rename = "ZUID")]
    zuid: u64,
    #[serde(rename = "Display_Name")]
    display_name: String,
    #[serde(rename = "Email")]
    email: String,
}

pub struct AuthCoordinator {
    settings: Settings,
    oauth: OAuthClient,
    tokens: TokenStore,
    http: reqwest::Client,
    browser: Box<dyn BrowserOpener>,
    pending: PendingSlot,
    session: RwLock<Option<AuthSession>>,
}

impl AuthCoordinator {
    pub fn new(settings: Settings, tokens: TokenStore) -> Result<Self, AuthError> {
        Self::with_browser(settings, tokens, Box::new(SystemBrowser))
    }

    pub fn with_browser(
        settings: Settings,
        tokens: TokenStore,
        browser: Box<dyn BrowserOpener>,
    ) -> Result<Self, AuthError> {
        settings.validate()?;
        let oauth = OAuthClient::new(&settings)?;
        Ok(Self {
            settings,
            oauth,
            tokens,
            http: reqwest::Client::new(),
            browser,
            pending: PendingSlot::default(),
            session: RwLock::new(None),
        })
    }

    /// Run one complete login attempt over the given redirect listener.
    ///
    /// Concurrent calls beyond the first fail with
    /// [`AuthError::AlreadyInProgress`]; the attempt as a whole is bounded
    /// by the configured login deadline. Nothing is persisted unless
    /// every step, state validation included, succeeds.
    pub async fn login(
        &self,
        listener: &mut dyn RedirectListener,
    ) -> Result<AuthSession, AuthError> {
        let _guard = self.pending.acquire()?;
        if !self.settings.has_credentials() {
            return Err(AuthError::MissingCredentials);
        }

        // The listener starts before the authorization URL is built: the
        // loopback redirect URI is only final once its port is bound.
        listener.start().await?;
        let state = OAuthClient::generate_state_token();
        let outcome = self.drive(listener, &state).await;
        listener.stop().await;
        let response = outcome?;

        if response.state != state {
            tracing::warn!("redirect state mismatch, discarding authorization code");
            return Err(AuthError::StateMismatch);
        }

        let tokens = self
            .oauth
            .exchange_code(&response.code, &listener.redirect_uri())
            .await?;
        let identity = self.fetch_identity(&tokens.access_token).await?;
        self.tokens.save(&tokens).await?;

        let session = AuthSession {
            access_token: tokens.access_token,
            account_id: identity.zuid.to_string(),
            account_label: if identity.display_name.trim().is_empty() {
                identity.email
            } else {
                identity.display_name
            },
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
        };
        *self.session.write().await = Some(session.clone());

        tracing::info!(account = %session.account_label, "signed in");
        Ok(session)
    }

    /// Browser-to-redirect leg of the flow. Failures here still need the
    /// listener stopped, which the caller does unconditionally.
    async fn drive(
        &self,
        listener: &mut dyn RedirectListener,
        state: &str,
    ) -> Result<AuthorizationResponse, AuthError> {
        let redirect_uri = listener.redirect_uri();
        let auth_url = self.oauth.build_authorization_url(&redirect_uri, state)?;

        tracing::info!("opening browser for authorization");
        self.browser.open(&auth_url)?;

        let deadline = Duration::from_secs(self.settings.login_timeout_secs);
        match tokio::time::timeout(deadline, listener.await_response()).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::TimedOut),
        }
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<UserInfo, AuthError> {
        let domain = self.settings.accounts_domain.trim_end_matches('/');
        let response = self
            .http
            .get(format!("{domain}/oauth/user/info"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Identity(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Identity(format!(
                "identity endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<UserInfo>()
            .await
            .map_err(|e| AuthError::Identity(e.to_string()))
    }

    /// Drop the in-memory session and both persisted tokens. Logging out
    /// while logged out succeeds.
    pub async fn logout(&self) -> Result<(), AuthError> {
        *self.session.write().await = None;
        self.tokens.clear().await?;
        tracing::info!("signed out");
        Ok(())
    }

    /// Token presence is the sole authentication signal; no expiry check
    /// is made here. A stale token shows up as a 401 from the API.
    pub async fn is_authenticated(&self) -> Result<bool, AuthError> {
        if self.session.read().await.is_some() {
            return Ok(true);
        }
        Ok(self.tokens.access_token().await?.is_some())
    }

    pub async fn session(&self) -> Option<AuthSession> {
        self.session.read().await.clone()
    }

    /// Access token for API calls: the live session's if present, else
    /// whatever a previous run persisted.
    pub async fn access_token(&self) -> Result<Option<String>, AuthError> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(Some(session.access_token.clone()));
        }
        self.tokens.access_token().await
    }

    pub async fn persisted_tokens(&self) -> Result<Option<PersistedTokens>, AuthError> {
        let (access, refresh) = (
            self.tokens.access_token().await?,
            self.tokens.refresh_token().await?,
        );
        Ok(match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => Some(PersistedTokens {
                access_token,
                refresh_token,
            }),
            _ => None,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
