//! Redirect capture for the OAuth authorization response.
//!
//! Three interchangeable transports deliver the `{code, state}` pair the
//! provider sends back through the browser: an ephemeral loopback HTTP
//! server, a custom URI scheme handler fed by the host, and a manual
//! paste surface. Exactly one is active per login attempt; the
//! coordinator only sees the [`RedirectListener`] trait.

pub mod loopback;
pub mod manual;
pub mod parse;
pub mod scheme;

pub use loopback::LoopbackListener;
pub use manual::{ManualInput, ManualListener};
pub use scheme::{SchemeListener, UriHandlerSlot};

use crate::error::AuthError;
use async_trait::async_trait;

/// The `{code, state}` pair extracted from the provider redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: String,
}

/// One login attempt's redirect transport.
///
/// Lifecycle: `start` acquires the underlying resource (socket, handler
/// slot, input channel), `await_response` resolves with the first
/// captured response or a categorized failure, and `stop` releases
/// everything. `stop` is idempotent and safe to call even if `start`
/// never ran; the coordinator calls it on every exit path.
#[async_trait]
pub trait RedirectListener: Send {
    /// The exact redirect URI to register with the provider. For the
    /// loopback variant this is only final after `start` (the bound port
    /// may differ from the configured one).
    fn redirect_uri(&self) -> String;

    async fn start(&mut self) -> Result<(), AuthError>;

    async fn await_response(&mut self) -> Result<AuthorizationResponse, AuthError>;

    async fn stop(&mut self);
}
