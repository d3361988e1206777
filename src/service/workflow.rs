//! One end-to-end run: token → fetch → classify every message → store leads.

use crate::api::graph_api::MailFetcher;
use crate::db::traits::LeadStore;
use crate::error::LeadsError;
use crate::outlook_oauth::AccessTokenSource;
use crate::service::classifier::LeadClassifier;
use crate::service::step::{StepPolicy, step};
use crate::types::lead::LeadRecord;
use crate::types::mail::{Message, ProcessedMessage};
use crate::types::run::{RunParams, WorkflowOutput};
use futures::future::try_join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::info;

/// Collaborators a run is executed against.
pub struct Workflow {
    tokens: Arc<dyn AccessTokenSource>,
    mail: Arc<dyn MailFetcher>,
    classifier: LeadClassifier,
    leads: Arc<dyn LeadStore>,
    policy: StepPolicy,
    concurrency: Option<usize>,
}

impl Workflow {
    pub fn new(
        tokens: Arc<dyn AccessTokenSource>,
        mail: Arc<dyn MailFetcher>,
        classifier: LeadClassifier,
        leads: Arc<dyn LeadStore>,
        policy: StepPolicy,
    ) -> Self {
        Self {
            tokens,
            mail,
            classifier,
            leads,
            policy,
            concurrency: None,
        }
    }

    /// Cap the number of messages classified at once. `None` is unbounded.
    pub fn with_concurrency(mut self, limit: Option<usize>) -> Self {
        self.concurrency = limit.filter(|n| *n > 0);
        self
    }

    pub async fn run(&self, params: &RunParams) -> Result<WorkflowOutput, LeadsError> {
        info!(user_email = %params.user_email, since = ?params.since, "run started");

        let tokens = &self.tokens;
        let token = step("get-ms-graph-token", &self.policy, move || tokens.access_token()).await?;

        let mail = &self.mail;
        let token_ref = &token;
        let since = params.since.as_deref();
        let messages = step("fetch-emails", &self.policy, move || {
            mail.fetch_all(token_ref, since)
        })
        .await?;
        info!(count = messages.len(), "messages fetched");

        let processed = self.classify_all(messages).await?;
        self.store_leads(&processed).await?;

        let leads = processed.iter().filter(|p| p.lead_info.is_lead).count();
        info!(messages = processed.len(), leads, "run finished");
        Ok(WorkflowOutput {
            messages: processed,
        })
    }

    /// All-or-nothing and order-preserving: the first failure fails the run.
    async fn classify_all(
        &self,
        messages: Vec<Message>,
    ) -> Result<Vec<ProcessedMessage>, LeadsError> {
        let classify = |message: Message| async move {
            let lead_info = self.classifier.classify(&message).await?;
            Ok::<_, LeadsError>(ProcessedMessage { message, lead_info })
        };

        match self.concurrency {
            None => try_join_all(messages.into_iter().map(classify)).await,
            Some(limit) => {
                stream::iter(messages)
                    .map(classify)
                    .buffered(limit)
                    .try_collect()
                    .await
            }
        }
    }

    async fn store_leads(&self, processed: &[ProcessedMessage]) -> Result<(), LeadsError> {
        let records: Vec<LeadRecord> = processed
            .iter()
            .filter(|p| p.lead_info.is_lead)
            .map(|p| LeadRecord::new(&p.message, &p.lead_info))
            .collect();
        if records.is_empty() {
            return Ok(());
        }

        let leads = &self.leads;
        let records = &records;
        step("store-leads", &self.policy, move || async move {
            for record in records {
                leads.insert(record).await?;
            }
            Ok::<(), LeadsError>(())
        })
        .await
    }
}
