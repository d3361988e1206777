use crate::config::Config;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Application registration used against the Microsoft identity platform.
/// The refresh token is not kept here; it lives in the token store.
#[derive(Clone)]
pub struct OutlookCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
}

impl OutlookCredentials {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            client_id: cfg.outlook_client_id.clone(),
            client_secret: cfg.outlook_client_secret.clone(),
            authorize_url: cfg.authorize_url(),
            token_url: cfg.token_url(),
        }
    }
}

impl fmt::Debug for OutlookCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlookCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Short-lived bearer token; held for one run only.
#[derive(Clone, Serialize)]
pub struct AccessToken {
    pub value: String,
    pub expires_in: Option<Duration>,
    pub token_type: String,
}

impl AccessToken {
    pub fn bearer(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_in: None,
            token_type: "Bearer".to_string(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}
