use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ZohoApiError {
    /// Non-2xx answer from Zoho, with the server's error envelope when it
    /// could be decoded.
    Api(StatusCode, ErrorDetail),
    /// Transport-level failure (connect, TLS, body read).
    Transport(reqwest::Error),
    /// A 2xx answer whose body did not match the expected shape.
    Decode(serde_json::Error),
}

impl ZohoApiError {
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(response) => ZohoApiError::Api(status, response.error),
            // Zoho occasionally returns bare text (gateway errors); keep it.
            Err(_) => ZohoApiError::Api(
                status,
                ErrorDetail {
                    code: 0,
                    message: body.trim().to_string(),
                },
            ),
        }
    }
}

impl From<reqwest::Error> for ZohoApiError {
    fn from(value: reqwest::Error) -> Self {
        ZohoApiError::Transport(value)
    }
}

impl std::fmt::Display for ZohoApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZohoApiError::Api(status, detail) => {
                write!(f, "({}) {}: {}", status, detail.code, detail.message)
            }
            ZohoApiError::Transport(e) => write!(f, "Transport error: {}", e),
            ZohoApiError::Decode(e) => write!(f, "Unexpected response body: {}", e),
        }
    }
}

impl std::error::Error for ZohoApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ZohoApiError::Transport(e) => Some(e),
            ZohoApiError::Decode(e) => Some(e),
            ZohoApiError::Api(..) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: i64,
    pub message: String,
}
