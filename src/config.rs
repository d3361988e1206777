use crate::error::LeadsError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Scope requested on the consent page.
pub const OUTLOOK_SCOPES: [&str; 2] = ["offline_access", "Mail.Read"];

/// Fields requested from the message listing endpoint.
pub const MESSAGE_SELECT: &str = "id,subject,receivedDateTime,from,bodyPreview,isRead";

/// Page size for the message listing endpoint.
pub const MESSAGE_PAGE_SIZE: u32 = 50;

pub const DEFAULT_AI_MODEL: &str = "@cf/meta/llama-3.3-70b-instruct-fp8-fast";

const ENV_KEYS: &[&str] = &[
    "outlook_client_id",
    "outlook_client_secret",
    "outlook_tenant",
    "default_email",
    "cf_account_id",
    "cf_api_token",
    "ai_model",
    "database_url",
    "listen_addr",
    "public_url",
    "proxy",
    "loglevel",
    "login_base",
    "graph_base",
    "ai_base",
    "schedule_interval_secs",
    "lookback_secs",
    "classify_concurrency",
    "step_retries",
    "persist_leads",
    "run_retention",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub outlook_client_id: String,
    pub outlook_client_secret: String,
    /// Microsoft identity tenant segment (`consumers`, `common`, or a tenant id).
    pub outlook_tenant: String,
    /// Mailbox checked by the scheduler; the scheduler is off when unset.
    pub default_email: Option<String>,

    pub cf_account_id: String,
    pub cf_api_token: String,
    pub ai_model: String,

    pub database_url: String,
    pub listen_addr: String,
    /// Origin used to build the OAuth redirect URI. Falls back to the Host header.
    pub public_url: Option<Url>,
    pub proxy: Option<Url>,
    pub loglevel: String,

    pub login_base: Url,
    pub graph_base: Url,
    pub ai_base: Url,

    pub schedule_interval_secs: u64,
    pub lookback_secs: u64,
    /// Upper bound on concurrent classifications per run; unbounded when unset.
    pub classify_concurrency: Option<usize>,
    pub step_retries: usize,
    pub persist_leads: bool,
    pub run_retention: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            outlook_client_id: String::new(),
            outlook_client_secret: String::new(),
            outlook_tenant: "consumers".to_string(),
            default_email: None,
            cf_account_id: String::new(),
            cf_api_token: String::new(),
            ai_model: DEFAULT_AI_MODEL.to_string(),
            database_url: "sqlite:leads.db".to_string(),
            listen_addr: "0.0.0.0:8000".to_string(),
            public_url: None,
            proxy: None,
            loglevel: "info".to_string(),
            login_base: Url::parse("https://login.microsoftonline.com")
                .expect("static login url"),
            graph_base: Url::parse("https://graph.microsoft.com/v1.0").expect("static graph url"),
            ai_base: Url::parse("https://api.cloudflare.com/client/v4").expect("static ai url"),
            schedule_interval_secs: 15 * 60,
            lookback_secs: 16 * 60,
            classify_concurrency: None,
            step_retries: 3,
            persist_leads: false,
            run_retention: 256,
        }
    }
}

impl Config {
    /// Defaults overlaid with the process environment.
    pub fn load() -> Result<Self, LeadsError> {
        let cfg: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(ENV_KEYS))
            .extract()
            .map_err(|e| LeadsError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), LeadsError> {
        if self.lookback_secs < self.schedule_interval_secs {
            return Err(LeadsError::Config(format!(
                "lookback_secs ({}) must not be narrower than schedule_interval_secs ({})",
                self.lookback_secs, self.schedule_interval_secs
            )));
        }
        if self.schedule_interval_secs == 0 {
            return Err(LeadsError::Config(
                "schedule_interval_secs must be positive".to_string(),
            ));
        }
        if self.classify_concurrency == Some(0) {
            return Err(LeadsError::Config(
                "classify_concurrency must be positive when set".to_string(),
            ));
        }
        if self.run_retention == 0 {
            return Err(LeadsError::Config(
                "run_retention must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_secs)
    }

    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_secs)
    }

    pub fn authorize_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/authorize",
            self.login_base.as_str().trim_end_matches('/'),
            self.outlook_tenant
        )
    }

    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_base.as_str().trim_end_matches('/'),
            self.outlook_tenant
        )
    }

    pub fn messages_url(&self) -> String {
        format!("{}/me/messages", self.graph_base.as_str().trim_end_matches('/'))
    }

    pub fn inference_url(&self) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.ai_base.as_str().trim_end_matches('/'),
            self.cf_account_id,
            self.ai_model
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.schedule_interval(), Duration::from_secs(900));
        assert_eq!(cfg.lookback(), Duration::from_secs(960));
    }

    #[test]
    fn lookback_narrower_than_interval_is_rejected() {
        let cfg = Config {
            lookback_secs: 600,
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(LeadsError::Config(_))));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let cfg = Config {
            classify_concurrency: Some(0),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_run_retention_is_rejected() {
        let cfg = Config {
            run_retention: 0,
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(LeadsError::Config(_))));
    }

    #[test]
    fn endpoint_urls_follow_tenant_and_account() {
        let cfg = Config {
            cf_account_id: "acct".to_string(),
            ..Config::default()
        };
        assert_eq!(
            cfg.token_url(),
            "https://login.microsoftonline.com/consumers/oauth2/v2.0/token"
        );
        assert_eq!(
            cfg.authorize_url(),
            "https://login.microsoftonline.com/consumers/oauth2/v2.0/authorize"
        );
        assert_eq!(cfg.messages_url(), "https://graph.microsoft.com/v1.0/me/messages");
        assert_eq!(
            cfg.inference_url(),
            "https://api.cloudflare.com/client/v4/accounts/acct/ai/run/@cf/meta/llama-3.3-70b-instruct-fp8-fast"
        );
    }
}
