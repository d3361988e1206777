//! Storage seams the workflow depends on.

use async_trait::async_trait;

use crate::error::LeadsError;
use crate::types::lead::LeadRecord;

/// Holds the single rotating refresh token. Last writer wins.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get_refresh_token(&self) -> Result<Option<String>, LeadsError>;

    async fn put_refresh_token(&self, token: &str) -> Result<(), LeadsError>;
}

/// Destination for extracted leads.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Insert one lead. Re-inserting the same `email_id` is a no-op.
    async fn insert(&self, lead: &LeadRecord) -> Result<(), LeadsError>;
}

/// Lead sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLeadStore;

#[async_trait]
impl LeadStore for NoopLeadStore {
    async fn insert(&self, _lead: &LeadRecord) -> Result<(), LeadsError> {
        Ok(())
    }
}
