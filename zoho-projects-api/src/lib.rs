pub mod endpoints;
mod error;
mod macros;

pub use crate::error::{ErrorDetail, ZohoApiError};
use reqwest::Client as HttpClient;
pub use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

const BASE_URL: &str = "https://projectsapi.zoho.com/restapi";

/// A typed request against the Zoho Projects REST API.
///
/// Endpoint structs carry their path/query parameters and declare the
/// response shape they decode into. `Client::send` does the rest.
pub trait Endpoint {
    type Response: DeserializeOwned;

    fn method(&self) -> Method;

    /// Path relative to the API base URL, without a leading slash.
    fn path(&self) -> String;

    fn query(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Response type for endpoints that return no meaningful body
/// (e.g. the timer operations). Accepts an empty body, `null`, or any
/// JSON payload and discards it.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyResponse;

impl<'de> serde::Deserialize<'de> for EmptyResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        serde::de::IgnoredAny::deserialize(deserializer)?;
        Ok(EmptyResponse)
    }
}

pub struct Client {
    inner: HttpClient,
    base_url: String,
    access_token: SecretString,
}

impl Client {
    pub fn new(access_token: &str) -> Self {
        Self::with_base_url(access_token, BASE_URL)
    }

    /// Build a client against a non-default base URL (used in tests).
    pub fn with_base_url(access_token: &str, base_url: &str) -> Self {
        Self {
            inner: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: SecretString::from(access_token),
        }
    }

    pub async fn send<E>(&self, endpoint: E) -> Result<E::Response, ZohoApiError>
    where
        E: Endpoint,
    {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        let mut request = self
            .inner
            .request(endpoint.method(), &url)
            .bearer_auth(self.access_token.expose_secret());

        let query = endpoint.query();
        if !query.is_empty() {
            request = request.query(&query);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ZohoApiError::from_response(status, &body));
        }

        // Timer endpoints answer with an empty body on success.
        let source = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(source).map_err(ZohoApiError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::portals::ListPortals;
    use crate::endpoints::timers::StartTimer;
    use crate::endpoints::{PortalId, ProjectId, TaskId};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_bearer_token_and_decodes_portals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/portals/"))
            .and(header("authorization", "Bearer token-123"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"portals":[{"id":123,"name":"acme","default":true}]}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = Client::with_base_url("token-123", &server.uri());
        let portals = client.send(ListPortals::new()).await.unwrap();
        assert_eq!(portals.portals.len(), 1);
        assert_eq!(portals.portals[0].name, "acme");
        assert_eq!(portals.portals[0].id, PortalId::from(123));
    }

    #[tokio::test]
    async fn empty_body_decodes_as_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = Client::with_base_url("token", &server.uri());
        let request = StartTimer::new(PortalId::from(1), ProjectId::from(2), TaskId::from(3));
        client.send(request).await.unwrap();
    }

    #[tokio::test]
    async fn non_2xx_surfaces_status_and_server_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_raw(
                r#"{"error":{"code":6401,"message":"Invalid OAuth token"}}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = Client::with_base_url("bad-token", &server.uri());
        let err = client.send(ListPortals::new()).await.unwrap_err();
        match err {
            ZohoApiError::Api(status, detail) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(detail.code, 6401);
                assert_eq!(detail.message, "Invalid OAuth token");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_is_preserved_as_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_raw("Bad Gateway", "text/plain"))
            .mount(&server)
            .await;

        let client = Client::with_base_url("token", &server.uri());
        let err = client.send(ListPortals::new()).await.unwrap_err();
        match err {
            ZohoApiError::Api(status, detail) => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(detail.message, "Bad Gateway");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
