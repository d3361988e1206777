use crate::service::runs_actor::RunsHandle;
use crate::types::run::RunParams;
use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{info, warn};

/// Params for a scheduled run. The lookback must be at least as wide as the
/// trigger interval or messages fall between runs.
pub fn scheduled_params(user_email: &str, now: DateTime<Utc>, lookback: Duration) -> RunParams {
    let since = now - chrono::Duration::from_std(lookback).unwrap_or(chrono::Duration::zero());
    RunParams {
        user_email: user_email.to_string(),
        since: Some(since.to_rfc3339_opts(SecondsFormat::Millis, true)),
    }
}

/// Create a run for `user_email` every `interval`, first one after one full interval.
pub fn spawn_scheduler(
    runs: RunsHandle,
    user_email: String,
    interval: Duration,
    lookback: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            user_email = %user_email,
            interval_secs = interval.as_secs(),
            lookback_secs = lookback.as_secs(),
            "Scheduler started"
        );

        let mut tick = tokio::time::interval_at(Instant::now() + interval, interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(tick);

        while ticks.next().await.is_some() {
            info!("Running scheduled email check");
            let params = scheduled_params(&user_email, Utc::now(), lookback);
            match runs.create(params).await {
                Ok(snapshot) => info!(run_id = %snapshot.id, "Created scheduled run"),
                Err(e) => warn!(error = %e, "Failed to create scheduled run"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn since_is_now_minus_lookback_in_millis() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let params = scheduled_params("owner@x.com", now, Duration::from_secs(16 * 60));

        assert_eq!(params.user_email, "owner@x.com");
        assert_eq!(params.since.as_deref(), Some("2024-05-01T09:44:00.000Z"));
    }

    #[test]
    fn since_crosses_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 5, 0).unwrap();
        let params = scheduled_params("owner@x.com", now, Duration::from_secs(16 * 60));
        assert_eq!(params.since.as_deref(), Some("2024-04-30T23:49:00.000Z"));
    }
}
