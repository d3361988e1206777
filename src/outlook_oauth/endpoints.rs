use crate::config::OUTLOOK_SCOPES;
use crate::error::LeadsError;
use crate::outlook_oauth::credentials::OutlookCredentials;

use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, Client as OAuth2Client, ClientId, ClientSecret,
    CsrfToken, EndpointNotSet, EndpointSet, ExtraTokenFields, RedirectUrl, RefreshToken, Scope,
    StandardRevocableToken, StandardTokenResponse, TokenUrl,
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenType,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

/// Stateless Microsoft identity platform endpoints.
pub(super) struct OutlookOauthEndpoints;

impl OutlookOauthEndpoints {
    /// Consent page URL for the authorization-code flow.
    pub(super) fn build_authorize_url(
        creds: &OutlookCredentials,
        redirect_uri: &str,
    ) -> Result<Url, LeadsError> {
        let client = build_oauth2_client(creds, Some(redirect_uri))?;
        let (url, _csrf) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(OUTLOOK_SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .add_extra_param("response_mode", "query")
            .url();
        Ok(url)
    }

    pub(super) async fn exchange_authorization_code(
        creds: &OutlookCredentials,
        code: AuthorizationCode,
        redirect_uri: &str,
        http_client: &reqwest::Client,
    ) -> Result<OutlookTokenResponse, LeadsError> {
        let client = build_oauth2_client(creds, Some(redirect_uri))?;
        let token_result: OutlookTokenResponse = client
            .exchange_code(code)
            .request_async(http_client)
            .await?;
        info!("Authorization code exchanged successfully");
        Ok(token_result)
    }

    /// Redeem the refresh token for a fresh access token.
    pub(super) async fn refresh_access_token(
        creds: &OutlookCredentials,
        refresh_token: String,
        http_client: &reqwest::Client,
    ) -> Result<OutlookTokenResponse, LeadsError> {
        let client = build_oauth2_client(creds, None)?;
        let token_result: OutlookTokenResponse = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token))
            .request_async(http_client)
            .await?;
        info!("Access token refreshed successfully");
        Ok(token_result)
    }
}

/// Build the OAuth2 client. Client credentials travel in the form body.
fn build_oauth2_client(
    creds: &OutlookCredentials,
    redirect_uri: Option<&str>,
) -> Result<OutlookOauth2Client, LeadsError> {
    let mut client = OAuth2Client::new(ClientId::new(creds.client_id.clone()))
        .set_client_secret(ClientSecret::new(creds.client_secret.clone()))
        .set_auth_uri(AuthUrl::new(creds.authorize_url.clone())?)
        .set_token_uri(TokenUrl::new(creds.token_url.clone())?)
        .set_auth_type(AuthType::RequestBody);
    if let Some(uri) = redirect_uri {
        client = client.set_redirect_uri(RedirectUrl::new(uri.to_string())?);
    }
    Ok(client)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(super) struct OutlookTokenField {
    #[serde(default)]
    pub ext_expires_in: Option<u64>,
}
impl ExtraTokenFields for OutlookTokenField {}

pub(super) type OutlookTokenResponse = StandardTokenResponse<OutlookTokenField, BasicTokenType>;

pub(super) type OutlookOauth2Client = OAuth2Client<
    BasicErrorResponse,
    OutlookTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;
