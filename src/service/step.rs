//! Named units of external work, retried on transient failure.

use crate::error::LeadsError;
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry budget applied to every step of a run.
#[derive(Debug, Clone, Copy)]
pub struct StepPolicy {
    pub max_retries: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl StepPolicy {
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }

    /// Single attempt, no backoff.
    pub fn no_retry() -> Self {
        Self::new(0)
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

impl Default for StepPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Run `op` as the step `name`. Only errors reporting `is_retryable` are retried.
pub async fn step<T, F, Fut>(name: &str, policy: &StepPolicy, op: F) -> Result<T, LeadsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LeadsError>>,
{
    debug!(step = name, "step started");
    op.retry(policy.backoff())
        .when(|e: &LeadsError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(step = name, error = %err, "step retrying after {:?}", dur);
        })
        .await
}
