use super::endpoints::OutlookOauthEndpoints;
use crate::db::traits::TokenStore;
use crate::error::LeadsError;
use crate::outlook_oauth::credentials::{AccessToken, OutlookCredentials};
use async_trait::async_trait;
use oauth2::{AuthorizationCode, TokenResponse};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Anything able to produce a Graph access token for one run.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken, LeadsError>;
}

/// Composes the OAuth endpoints with the refresh-token store.
pub struct TokenManager {
    creds: OutlookCredentials,
    http_client: reqwest::Client,
    store: Arc<dyn TokenStore>,
}

impl TokenManager {
    pub fn new(
        creds: OutlookCredentials,
        http_client: reqwest::Client,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            creds,
            http_client,
            store,
        }
    }

    pub fn authorize_url(&self, redirect_uri: &str) -> Result<Url, LeadsError> {
        OutlookOauthEndpoints::build_authorize_url(&self.creds, redirect_uri)
    }

    /// Redeem the stored refresh token and persist the rotated one.
    pub async fn refresh(&self) -> Result<AccessToken, LeadsError> {
        let Some(refresh_token) = self.store.get_refresh_token().await? else {
            return Err(LeadsError::missing_refresh_token());
        };

        let token = OutlookOauthEndpoints::refresh_access_token(
            &self.creds,
            refresh_token,
            &self.http_client,
        )
        .await?;

        match token.refresh_token() {
            Some(rotated) => self.store.put_refresh_token(rotated.secret()).await?,
            None => warn!("token response carried no refresh_token; keeping the stored one"),
        }

        Ok(AccessToken {
            value: token.access_token().secret().to_string(),
            expires_in: token.expires_in(),
            token_type: token.token_type().as_ref().to_string(),
        })
    }

    /// Complete the consent flow and store the first refresh token.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<(), LeadsError> {
        let token = OutlookOauthEndpoints::exchange_authorization_code(
            &self.creds,
            AuthorizationCode::new(code.to_owned()),
            redirect_uri,
            &self.http_client,
        )
        .await?;

        let Some(refresh_token) = token.refresh_token() else {
            return Err(LeadsError::TokenExchange(
                "token response missing refresh_token; ensure the offline_access scope is granted"
                    .to_string(),
            ));
        };
        self.store.put_refresh_token(refresh_token.secret()).await?;
        info!("OAuth callback stored refresh token");
        Ok(())
    }
}

#[async_trait]
impl AccessTokenSource for TokenManager {
    async fn access_token(&self) -> Result<AccessToken, LeadsError> {
        self.refresh().await
    }
}
