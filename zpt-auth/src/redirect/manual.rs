//! Manual-paste transport: the user copies the redirect URL (or just its
//! query string) out of the browser and pastes it into the tool. The
//! pasted text goes through the same defensive extraction chain as the
//! custom-scheme variant.

use crate::error::AuthError;
use crate::redirect::{parse, AuthorizationResponse, RedirectListener};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Caller-held handle for submitting pasted text to a waiting listener.
#[derive(Clone)]
pub struct ManualInput {
    sender: mpsc::Sender<String>,
}

impl ManualInput {
    /// Returns `false` when the listener has been stopped.
    pub fn submit(&self, pasted: impl Into<String>) -> bool {
        self.sender.try_send(pasted.into()).is_ok()
    }
}

pub struct ManualListener {
    redirect_uri: String,
    sender: mpsc::Sender<String>,
    receiver: Option<mpsc::Receiver<String>>,
    started: bool,
}

impl ManualListener {
    /// `redirect_uri` is still required: it is what the provider redirects
    /// to (and what anchors the malformed-URI rewrites), even though no
    /// local transport listens on it.
    pub fn new(redirect_uri: &str) -> Self {
        let (sender, receiver) = mpsc::channel(1);
        Self {
            redirect_uri: redirect_uri.to_string(),
            sender,
            receiver: Some(receiver),
            started: false,
        }
    }

    pub fn input(&self) -> ManualInput {
        ManualInput {
            sender: self.sender.clone(),
        }
    }
}

#[async_trait]
impl RedirectListener for ManualListener {
    fn redirect_uri(&self) -> String {
        self.redirect_uri.clone()
    }

    async fn start(&mut self) -> Result<(), AuthError> {
        if self.receiver.is_none() {
            return Err(AuthError::Listener(
                "manual listener already consumed".to_string(),
            ));
        }
        self.started = true;
        Ok(())
    }

    async fn await_response(&mut self) -> Result<AuthorizationResponse, AuthError> {
        if !self.started {
            return Err(AuthError::Listener("listener was never started".to_string()));
        }
        let receiver = self
            .receiver
            .as_mut()
            .ok_or(AuthError::Cancelled)?;

        match receiver.recv().await {
            Some(raw) => parse::extract(&raw, &self.redirect_uri),
            None => Err(AuthError::Cancelled),
        }
    }

    async fn stop(&mut self) {
        self.receiver = None;
        self.started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pasted_full_url_is_accepted() {
        let mut listener = ManualListener::new("zpt://auth/callback");
        let input = listener.input();
        listener.start().await.unwrap();

        assert!(input.submit("zpt://auth/callback?code=C&state=S"));
        let response = listener.await_response().await.unwrap();
        assert_eq!(response.code, "C");
        assert_eq!(response.state, "S");
    }

    #[tokio::test]
    async fn pasted_bare_query_fragment_is_accepted() {
        let mut listener = ManualListener::new("zpt://auth/callback");
        let input = listener.input();
        listener.start().await.unwrap();

        assert!(input.submit("code=C2&state=S2"));
        let response = listener.await_response().await.unwrap();
        assert_eq!(response.code, "C2");
        assert_eq!(response.state, "S2");
    }

    #[tokio::test]
    async fn pasted_garbage_is_a_structured_error() {
        let mut listener = ManualListener::new("zpt://auth/callback");
        let input = listener.input();
        listener.start().await.unwrap();

        assert!(input.submit("whatever the user copied"));
        let err = listener.await_response().await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedRedirect(_)));
    }

    #[tokio::test]
    async fn submit_after_stop_reports_closed() {
        let mut listener = ManualListener::new("zpt://auth/callback");
        let input = listener.input();
        listener.start().await.unwrap();
        listener.stop().await;
        listener.stop().await;

        assert!(!input.submit("code=C&state=S"));
    }
}
