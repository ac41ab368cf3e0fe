//! Ephemeral loopback HTTP listener.
//!
//! Binds `http://localhost:<port>/auth-callback`, answers the first
//! matching request with a self-closing success page, hands the extracted
//! `{code, state}` to the coordinator, and is torn down. Any other path
//! is a 404. One request per login attempt.

use crate::error::AuthError;
use crate::redirect::{AuthorizationResponse, RedirectListener};
use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const CALLBACK_PATH: &str = "/auth-callback";

const SUCCESS_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Signed in</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100vh;
            margin: 0;
            background: #f3f4f6;
        }
        .card {
            background: white;
            border-radius: 12px;
            padding: 48px;
            box-shadow: 0 8px 32px rgba(0, 0, 0, 0.1);
            text-align: center;
        }
        h1 { color: #1f2937; font-size: 22px; margin: 0 0 8px 0; }
        p { color: #6b7280; margin: 0; }
    </style>
</head>
<body>
    <div class="card">
        <h1>Signed in to Zoho Projects</h1>
        <p>You can close this window and return to your editor.</p>
    </div>
    <script>setTimeout(function () { window.close(); }, 3000);</script>
</body>
</html>"#;

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

type ResultSender = mpsc::Sender<Result<AuthorizationResponse, AuthError>>;

async fn callback(
    State(results): State<ResultSender>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    // The browser always gets the success page; extraction problems are
    // reported to the coordinator, not the user staring at a blank tab.
    let outcome = match params {
        CallbackParams {
            code: Some(code),
            state: Some(state),
            ..
        } => Ok(AuthorizationResponse { code, state }),
        CallbackParams {
            error: Some(error), ..
        } => Err(AuthError::Denied(error)),
        _ => Err(AuthError::MalformedRedirect(
            "callback request carried no code/state parameters".to_string(),
        )),
    };

    // First result wins; a second request on the same attempt is dropped.
    if results.try_send(outcome).is_err() {
        tracing::debug!("discarding extra callback request");
    }

    Html(SUCCESS_HTML)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

pub struct LoopbackListener {
    configured_port: u16,
    redirect_uri: String,
    results: Option<mpsc::Receiver<Result<AuthorizationResponse, AuthError>>>,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl LoopbackListener {
    pub fn new(port: u16) -> Self {
        Self {
            configured_port: port,
            redirect_uri: redirect_uri_for(port),
            results: None,
            shutdown: None,
            server: None,
        }
    }

    /// Bind the configured port; on AddrInUse, retry once on the next
    /// higher port.
    async fn bind(&self) -> Result<TcpListener, AuthError> {
        let port = self.configured_port;
        match TcpListener::bind(("127.0.0.1", port)).await {
            Ok(listener) => Ok(listener),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse && port != 0 => {
                let next = port.checked_add(1).ok_or_else(|| {
                    AuthError::Listener(format!("port {port} in use and no higher port available"))
                })?;
                tracing::warn!(port, next, "redirect port in use, retrying on next port");
                TcpListener::bind(("127.0.0.1", next))
                    .await
                    .map_err(|e| AuthError::Listener(format!("could not bind port {next}: {e}")))
            }
            Err(e) => Err(AuthError::Listener(format!(
                "could not bind port {port}: {e}"
            ))),
        }
    }
}

fn redirect_uri_for(port: u16) -> String {
    format!("http://localhost:{port}{CALLBACK_PATH}")
}

#[async_trait]
impl RedirectListener for LoopbackListener {
    fn redirect_uri(&self) -> String {
        self.redirect_uri.clone()
    }

    async fn start(&mut self) -> Result<(), AuthError> {
        let listener = self.bind().await?;
        let addr = listener
            .local_addr()
            .map_err(|e| AuthError::Listener(format!("could not read bound address: {e}")))?;
        self.redirect_uri = redirect_uri_for(addr.port());

        let (result_tx, result_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = Router::new()
            .route(CALLBACK_PATH, get(callback))
            .fallback(not_found)
            .with_state(result_tx);

        let server = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                tracing::warn!(error = %e, "loopback listener terminated abnormally");
            }
        });

        tracing::debug!(uri = %self.redirect_uri, "loopback redirect listener started");

        self.results = Some(result_rx);
        self.shutdown = Some(shutdown_tx);
        self.server = Some(server);
        Ok(())
    }

    async fn await_response(&mut self) -> Result<AuthorizationResponse, AuthError> {
        let results = self
            .results
            .as_mut()
            .ok_or_else(|| AuthError::Listener("listener was never started".to_string()))?;

        // A closed channel means stop() ran while we were waiting.
        results.recv().await.unwrap_or(Err(AuthError::Cancelled))
    }

    async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(server) = self.server.take() {
            // The graceful shutdown resolves as soon as the signal lands;
            // don't leave the task dangling if it already panicked.
            let _ = server.await;
        }
        self.results = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn started_listener() -> LoopbackListener {
        let mut listener = LoopbackListener::new(0);
        listener.start().await.unwrap();
        listener
    }

    #[tokio::test]
    async fn captures_first_callback_and_serves_success_page() {
        let mut listener = started_listener().await;
        let uri = listener.redirect_uri();

        let body = reqwest::get(format!("{uri}?code=C1&state=S1"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("close this window"));

        let response = listener.await_response().await.unwrap();
        assert_eq!(
            response,
            AuthorizationResponse {
                code: "C1".to_string(),
                state: "S1".to_string(),
            }
        );
        listener.stop().await;
    }

    #[tokio::test]
    async fn unknown_paths_get_404() {
        let mut listener = started_listener().await;
        let uri = listener.redirect_uri().replace("/auth-callback", "/other");

        let status = reqwest::get(uri).await.unwrap().status();
        assert_eq!(status.as_u16(), 404);
        listener.stop().await;
    }

    #[tokio::test]
    async fn callback_without_params_is_a_malformed_redirect() {
        let mut listener = started_listener().await;

        reqwest::get(listener.redirect_uri()).await.unwrap();
        let err = listener.await_response().await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedRedirect(_)));
        listener.stop().await;
    }

    #[tokio::test]
    async fn provider_error_param_is_surfaced_as_denied() {
        let mut listener = started_listener().await;

        reqwest::get(format!("{}?error=access_denied", listener.redirect_uri()))
            .await
            .unwrap();
        let err = listener.await_response().await.unwrap_err();
        assert!(matches!(err, AuthError::Denied(ref e) if e == "access_denied"));
        listener.stop().await;
    }

    #[tokio::test]
    async fn port_in_use_falls_back_to_next_port() {
        let occupied = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let mut listener = LoopbackListener::new(port);
        listener.start().await.unwrap();
        assert_eq!(listener.redirect_uri(), redirect_uri_for(port + 1));
        listener.stop().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_safe_without_start() {
        let mut never_started = LoopbackListener::new(0);
        never_started.stop().await;
        never_started.stop().await;

        let mut listener = started_listener().await;
        listener.stop().await;
        listener.stop().await;
    }
}
