pub mod graph_api;
pub mod workers_ai;

use crate::config::Config;
use crate::error::LeadsError;
use std::time::Duration;

pub use graph_api::{GraphApi, MailFetcher};
pub use workers_ai::{InferenceClient, WorkersAi};

/// Shared outbound client. Redirects stay disabled: the OAuth token exchange
/// must not follow them.
pub fn build_http_client(cfg: &Config) -> Result<reqwest::Client, LeadsError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("outlook-leads/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(60));
    if let Some(proxy_url) = cfg.proxy.as_ref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    Ok(builder.build()?)
}
