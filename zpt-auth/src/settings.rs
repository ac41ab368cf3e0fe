use crate::error::AuthError;
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_accounts_domain")]
    pub accounts_domain: String,
    #[serde(default = "default_api_domain")]
    pub api_domain: String,
    /// Login attempts expire after this many seconds (redirect never
    /// arrived, user abandoned the browser, ...).
    #[serde(default = "default_login_timeout_secs")]
    pub login_timeout_secs: u64,
    #[serde(default)]
    pub redirect: RedirectSettings,
}

fn default_accounts_domain() -> String {
    "https://accounts.zoho.com".to_string()
}

fn default_api_domain() -> String {
    "https://projectsapi.zoho.com/restapi".to_string()
}

fn default_login_timeout_secs() -> u64 {
    600
}

/// Which redirect-capture transport this build uses.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RedirectVariant {
    #[default]
    Loopback,
    Scheme,
    Manual,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedirectSettings {
    #[serde(default)]
    pub variant: RedirectVariant,
    /// Loopback port. Port 0 asks the OS for an ephemeral port (tests).
    #[serde(default = "default_redirect_port")]
    pub port: u16,
    /// URI scheme for the custom-scheme variant.
    #[serde(default = "default_redirect_scheme")]
    pub scheme: String,
}

fn default_redirect_port() -> u16 {
    3000
}

fn default_redirect_scheme() -> String {
    "zpt".to_string()
}

impl Default for RedirectSettings {
    fn default() -> Self {
        Self {
            variant: RedirectVariant::default(),
            port: default_redirect_port(),
            scheme: default_redirect_scheme(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, AuthError> {
        let config_path = std::env::var("ZPT_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        let settings = Config::builder()
            .add_source(File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("ZPT").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn has_credentials(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if !self.accounts_domain.starts_with("http") {
            return Err(AuthError::Configuration(
                "accounts_domain must be a valid HTTP(S) URL".to_string(),
            ));
        }
        if !self.api_domain.starts_with("http") {
            return Err(AuthError::Configuration(
                "api_domain must be a valid HTTP(S) URL".to_string(),
            ));
        }
        if self.login_timeout_secs == 0 {
            return Err(AuthError::Configuration(
                "login_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.redirect.scheme.is_empty() {
            return Err(AuthError::Configuration(
                "redirect.scheme must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_settings() -> Settings {
        Settings {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            accounts_domain: default_accounts_domain(),
            api_domain: default_api_domain(),
            login_timeout_secs: default_login_timeout_secs(),
            redirect: RedirectSettings::default(),
        }
    }

    #[test]
    fn defaults_validate() {
        base_settings().validate().unwrap();
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut settings = base_settings();
        settings.login_timeout_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn missing_credentials_detected() {
        let mut settings = base_settings();
        settings.client_secret = "  ".to_string();
        assert!(!settings.has_credentials());
    }
}
