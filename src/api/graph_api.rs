use crate::config::{MESSAGE_PAGE_SIZE, MESSAGE_SELECT};
use crate::error::LeadsError;
use crate::outlook_oauth::AccessToken;
use crate::types::mail::{Message, MessagePage};
use async_trait::async_trait;
use tracing::{debug, error, info};
use url::Url;

/// Source of mailbox messages for one run.
#[async_trait]
pub trait MailFetcher: Send + Sync {
    /// All messages received at or after `since` (all messages when `None`),
    /// newest first, across every page.
    async fn fetch_all(
        &self,
        token: &AccessToken,
        since: Option<&str>,
    ) -> Result<Vec<Message>, LeadsError>;
}

/// Microsoft Graph `me/messages` listing.
pub struct GraphApi {
    client: reqwest::Client,
    messages_url: String,
}

impl GraphApi {
    pub fn new(client: reqwest::Client, messages_url: impl Into<String>) -> Self {
        Self {
            client,
            messages_url: messages_url.into(),
        }
    }

    /// First page request; `since` lands verbatim in the `$filter` lower bound.
    pub fn initial_url(&self, since: Option<&str>) -> Result<Url, LeadsError> {
        let mut url = Url::parse(&self.messages_url)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(since) = since {
                query.append_pair("$filter", &format!("receivedDateTime ge {since}"));
            }
            query
                .append_pair("$orderby", "receivedDateTime desc")
                .append_pair("$select", MESSAGE_SELECT)
                .append_pair("$top", &MESSAGE_PAGE_SIZE.to_string());
        }
        Ok(url)
    }

    async fn fetch_page(&self, token: &AccessToken, url: &str) -> Result<MessagePage, LeadsError> {
        debug!(url, "fetching message page");
        let resp = self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(%status, body = %body, "Failed to fetch emails");
            return Err(LeadsError::Fetch { status, body });
        }
        Ok(resp.json::<MessagePage>().await?)
    }
}

#[async_trait]
impl MailFetcher for GraphApi {
    async fn fetch_all(
        &self,
        token: &AccessToken,
        since: Option<&str>,
    ) -> Result<Vec<Message>, LeadsError> {
        let mut messages = Vec::new();
        let mut next_link = Some(self.initial_url(since)?.to_string());

        while let Some(link) = next_link {
            let page = self.fetch_page(token, &link).await?;
            let retrieved = page.value.len();
            messages.extend(page.value);
            next_link = page.next_link;
            info!(retrieved, total = messages.len(), "message page retrieved");
        }

        Ok(messages)
    }
}
