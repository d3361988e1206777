use super::request_origin;
use crate::{LeadsError, router::LeadsState};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::TypedHeader;
use headers::Host;
use serde::Deserialize;
use tracing::info;

pub const CALLBACK_PATH: &str = "/auth/callback";

const AUTH_SUCCESS: &str = "Authentication successful! You can now close this window.";

#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    pub code: Option<String>,
}

fn redirect_uri(state: &LeadsState, host: Option<&TypedHeader<Host>>) -> String {
    format!("{}{CALLBACK_PATH}", request_origin(state, host))
}

/// GET /auth -> redirects to the Microsoft consent page.
pub async fn outlook_oauth_entry(
    State(state): State<LeadsState>,
    host: Option<TypedHeader<Host>>,
) -> Result<impl IntoResponse, LeadsError> {
    let auth_url = state
        .tokens
        .authorize_url(&redirect_uri(&state, host.as_ref()))?;

    info!("Dispatching OAuth redirect");
    Ok(Redirect::temporary(auth_url.as_str()))
}

/// GET /auth/callback -> exchanges the code and stores the refresh token.
pub async fn outlook_oauth_callback(
    State(state): State<LeadsState>,
    host: Option<TypedHeader<Host>>,
    Query(query): Query<AuthCallbackQuery>,
) -> Result<impl IntoResponse, LeadsError> {
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or(LeadsError::MissingParameter("code"))?;

    state
        .tokens
        .exchange_code(&code, &redirect_uri(&state, host.as_ref()))
        .await?;

    Ok(AUTH_SUCCESS)
}
