use base64::Engine;
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    HttpRequest, HttpResponse, RedirectUrl, RequestTokenError, Scope, TokenResponse, TokenUrl,
};
use rand::Rng;

use crate::error::AuthError;
use crate::models::PersistedTokens;
use crate::settings::Settings;

/// Scopes requested on every login. Fixed: the tool reads portals,
/// projects and tasks, and writes time logs.
pub const SCOPES: &[&str] = &[
    "ZohoProjects.portals.READ",
    "ZohoProjects.projects.READ",
    "ZohoProjects.tasks.READ",
    "ZohoProjects.timesheets.CREATE",
];

const AUTH_PATH: &str = "/oauth/v2/auth";
const TOKEN_PATH: &str = "/oauth/v2/token";

// Simple async HTTP client for oauth2
async fn http_client(request: HttpRequest) -> Result<HttpResponse, reqwest::Error> {
    let client = reqwest::Client::new();
    let mut builder = client
        .request(request.method().clone(), request.uri().to_string())
        .body(request.body().clone());

    for (name, value) in request.headers() {
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let response = builder.send().await?;
    let status = response.status();
    let body = response.bytes().await?.to_vec();

    let mut http_response = HttpResponse::new(body);
    *http_response.status_mut() = status;

    Ok(http_response)
}

pub struct OAuthClient {
    client_id: String,
    client_secret: String,
    auth_url: AuthUrl,
    token_url: TokenUrl,
}

impl OAuthClient {
    pub fn new(settings: &Settings) -> Result<Self, AuthError> {
        let domain = settings.accounts_domain.trim_end_matches('/');

        let auth_url = AuthUrl::new(format!("{domain}{AUTH_PATH}"))
            .map_err(|e| AuthError::Configuration(format!("Invalid auth URL: {}", e)))?;

        let token_url = TokenUrl::new(format!("{domain}{TOKEN_PATH}"))
            .map_err(|e| AuthError::Configuration(format!("Invalid token URL: {}", e)))?;

        Ok(Self {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            auth_url,
            token_url,
        })
    }

    /// Build the authorization URL the browser is sent to. `state` is the
    /// anti-CSRF nonce; `redirect_uri` must be byte-identical to what the
    /// active listener registered with the provider.
    pub fn build_authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
    ) -> Result<String, AuthError> {
        let redirect_url = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| AuthError::Configuration(format!("Invalid redirect URI: {}", e)))?;

        let csrf_token = CsrfToken::new(state.to_string());
        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(redirect_url);

        let mut request = client
            .authorize_url(|| csrf_token)
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent");

        for scope in SCOPES {
            request = request.add_scope(Scope::new((*scope).to_string()));
        }

        let (auth_url, _) = request.url();
        Ok(auth_url.to_string())
    }

    /// Exchange the authorization code for a token pair. The redirect URI
    /// is sent along and must match the one used at the authorize step; a
    /// provider-side mismatch is surfaced as its own error because it is
    /// the most common misconfiguration.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<PersistedTokens, AuthError> {
        let redirect_url = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| AuthError::Configuration(format!("Invalid redirect URI: {}", e)))?;

        let token_result = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(redirect_url)
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&http_client)
            .await
            .map_err(map_exchange_error)?;

        let access_token = token_result.access_token().secret().to_string();
        let refresh_token = token_result
            .refresh_token()
            .ok_or_else(|| AuthError::TokenExchange("No refresh token in response".to_string()))?
            .secret()
            .to_string();

        tracing::debug!("Successfully exchanged authorization code for tokens");

        Ok(PersistedTokens {
            access_token,
            refresh_token,
        })
    }

    /// Generate a random state token (CSRF nonce). Only needs to be
    /// unguessable and unique within a session.
    pub fn generate_state_token() -> String {
        let mut rng = rand::rng();
        let random_bytes: Vec<u8> = (0..32).map(|_| rng.random()).collect();
        base64::prelude::BASE64_URL_SAFE_NO_PAD.encode(&random_bytes)
    }
}

fn map_exchange_error<RE>(
    err: RequestTokenError<RE, oauth2::basic::BasicErrorResponse>,
) -> AuthError
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => {
            let message = response.to_string();
            if message.contains("redirect") {
                AuthError::RedirectUriMismatch
            } else {
                AuthError::TokenExchange(message)
            }
        }
        // Zoho answers some failures with 200 + a non-standard body; the
        // raw bytes are the only place the actual error appears.
        RequestTokenError::Parse(_, bytes) => {
            let body = String::from_utf8_lossy(&bytes).to_string();
            if body.contains("redirect_uri") || body.contains("invalid_redirect") {
                AuthError::RedirectUriMismatch
            } else {
                AuthError::TokenExchange(format!("unexpected token response: {}", body))
            }
        }
        other => AuthError::TokenExchange(other.to_string()),
    }
}
