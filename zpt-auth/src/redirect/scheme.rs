//! Custom URI scheme transport.
//!
//! The OS (via the host editor) delivers activation URIs like
//! `zpt://auth/callback?code=...&state=...` to the process; this module
//! routes the first one into the waiting login attempt. The registration
//! is a single-slot owned handle, not a module-level static, so
//! independent coordinators (and tests) cannot leak registrations into
//! each other.

use crate::error::AuthError;
use crate::redirect::{parse, AuthorizationResponse, RedirectListener};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

const CALLBACK_HOST_PATH: &str = "auth/callback";

/// Single-slot registry for the process's URI handler.
///
/// At most one listener may be registered at a time; a second
/// registration fails fast so a concurrent login attempt surfaces as
/// "already in progress" instead of silently stealing the redirect.
#[derive(Default)]
struct SlotState {
    next_id: u64,
    registration: Option<(u64, oneshot::Sender<String>)>,
}

#[derive(Clone, Default)]
pub struct UriHandlerSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl UriHandlerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SlotState> {
        match self.inner.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Deliver a raw activation URI from the host. Returns `false` when
    /// no login attempt is waiting (the URI is dropped).
    pub fn deliver(&self, raw_uri: impl Into<String>) -> bool {
        let registration = self.lock().registration.take();
        match registration {
            Some((_, sender)) => sender.send(raw_uri.into()).is_ok(),
            None => {
                tracing::debug!("activation URI arrived with no pending login");
                false
            }
        }
    }

    pub fn is_registered(&self) -> bool {
        self.lock().registration.is_some()
    }

    fn register(&self) -> Result<(u64, oneshot::Receiver<String>), AuthError> {
        let mut state = self.lock();
        if state.registration.is_some() {
            return Err(AuthError::AlreadyInProgress);
        }
        let id = state.next_id;
        state.next_id += 1;
        let (tx, rx) = oneshot::channel();
        state.registration = Some((id, tx));
        Ok((id, rx))
    }

    /// Remove the registration tagged `id`. A no-op when the slot is
    /// empty or occupied by a later registration, so one listener's
    /// teardown cannot unregister another's.
    fn release(&self, id: u64) {
        let mut state = self.lock();
        if matches!(state.registration, Some((owner, _)) if owner == id) {
            state.registration = None;
        }
    }
}

pub struct SchemeListener {
    slot: UriHandlerSlot,
    redirect_uri: String,
    registration_id: Option<u64>,
    pending: Option<oneshot::Receiver<String>>,
}

impl SchemeListener {
    pub fn new(scheme: &str, slot: UriHandlerSlot) -> Self {
        Self {
            slot,
            redirect_uri: format!("{scheme}://{CALLBACK_HOST_PATH}"),
            registration_id: None,
            pending: None,
        }
    }
}

#[async_trait]
impl RedirectListener for SchemeListener {
    fn redirect_uri(&self) -> String {
        self.redirect_uri.clone()
    }

    async fn start(&mut self) -> Result<(), AuthError> {
        let (id, receiver) = self.slot.register()?;
        self.registration_id = Some(id);
        self.pending = Some(receiver);
        Ok(())
    }

    async fn await_response(&mut self) -> Result<AuthorizationResponse, AuthError> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| AuthError::Listener("listener was never started".to_string()))?;

        let raw = pending.await.map_err(|_| AuthError::Cancelled)?;
        parse::extract(&raw, &self.redirect_uri)
    }

    async fn stop(&mut self) {
        self.pending = None;
        if let Some(id) = self.registration_id.take() {
            self.slot.release(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivered_uri_resolves_the_waiting_listener() {
        let slot = UriHandlerSlot::new();
        let mut listener = SchemeListener::new("zpt", slot.clone());
        listener.start().await.unwrap();

        assert!(slot.deliver("zpt://auth/callback?code=C&state=S"));
        let response = listener.await_response().await.unwrap();
        assert_eq!(response.code, "C");
        assert_eq!(response.state, "S");
    }

    #[tokio::test]
    async fn malformed_delivery_goes_through_the_rewrite_chain() {
        let slot = UriHandlerSlot::new();
        let mut listener = SchemeListener::new("zpt", slot.clone());
        listener.start().await.unwrap();

        // Browser-mangled form: https:// prefix and lost scheme colon.
        assert!(slot.deliver("https://zpt//auth/callback?state=S&code=C"));
        let response = listener.await_response().await.unwrap();
        assert_eq!(response.code, "C");
        assert_eq!(response.state, "S");
    }

    #[tokio::test]
    async fn second_registration_fails_fast() {
        let slot = UriHandlerSlot::new();
        let mut first = SchemeListener::new("zpt", slot.clone());
        first.start().await.unwrap();

        let mut second = SchemeListener::new("zpt", slot.clone());
        let err = second.start().await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyInProgress));

        // The first registration is undisturbed.
        assert!(slot.is_registered());
        first.stop().await;
        assert!(!slot.is_registered());
    }

    #[tokio::test]
    async fn stale_stop_leaves_a_later_registration_intact() {
        let slot = UriHandlerSlot::new();
        let mut first = SchemeListener::new("zpt", slot.clone());
        first.start().await.unwrap();

        // First attempt completes: its registration is consumed.
        assert!(slot.deliver("zpt://auth/callback?code=C1&state=S1"));
        first.await_response().await.unwrap();

        let mut second = SchemeListener::new("zpt", slot.clone());
        second.start().await.unwrap();

        // Tearing down the finished listener must not evict the new one.
        first.stop().await;
        assert!(slot.is_registered());
        assert!(slot.deliver("zpt://auth/callback?code=C2&state=S2"));
        let response = second.await_response().await.unwrap();
        assert_eq!(response.code, "C2");
    }

    #[tokio::test]
    async fn stop_unregisters_and_is_idempotent() {
        let slot = UriHandlerSlot::new();
        let mut listener = SchemeListener::new("zpt", slot.clone());
        listener.stop().await; // never started

        listener.start().await.unwrap();
        listener.stop().await;
        listener.stop().await;
        assert!(!slot.is_registered());
        assert!(!slot.deliver("zpt://auth/callback?code=C&state=S"));
    }
}
