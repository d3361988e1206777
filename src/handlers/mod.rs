pub mod outlook_oauth;
pub mod workflow;

use crate::{LeadsError, router::LeadsState};
use axum_extra::TypedHeader;
use headers::Host;

/// Origin used to build the OAuth redirect URI.
pub(crate) fn request_origin(state: &LeadsState, host: Option<&TypedHeader<Host>>) -> String {
    if let Some(url) = state.public_url.as_ref() {
        return url.as_str().trim_end_matches('/').to_string();
    }
    match host {
        Some(TypedHeader(host)) => format!("http://{host}"),
        None => "http://localhost".to_string(),
    }
}

/// Any method other than GET on a known path.
pub async fn unsupported_method() -> LeadsError {
    LeadsError::UnsupportedRequest
}
