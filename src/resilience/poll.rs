//! Bounded, cancellable polling.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::config::PollingConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;
use crate::resilience::cancel::CancelToken;

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    /// Done; stop polling and return the value.
    Ready(T),
    /// Not there yet; back off and check again.
    Pending,
}

/// Limits for one polling loop.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub settle_delay: Duration,
    pub backoff: Backoff,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn from_config(config: &PollingConfig) -> Self {
        Self {
            settle_delay: config.settle_delay(),
            backoff: Backoff::new(config.base_delay_ms, config.max_delay_ms),
            max_attempts: config.max_attempts.max(1),
            timeout: config.timeout(),
        }
    }
}

/// Probe until it reports [`PollStatus::Ready`].
///
/// Waits `settle_delay` first, then checks with backoff between attempts. Ends
/// with `Timeout` once attempts or wall-clock time run out, with `Cancelled`
/// when `cancel` fires, or with the first check error.
pub async fn poll_until<T, F, Fut>(
    policy: &PollPolicy,
    cancel: &CancelToken,
    target: &'static str,
    mut check: F,
) -> OrchestratorResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = OrchestratorResult<PollStatus<T>>>,
{
    let max_attempts = policy.max_attempts.max(1);

    let work = async {
        sleep(policy.settle_delay).await;

        for attempt in 1..=max_attempts {
            metrics::record_poll_attempt(target);
            match check(attempt).await? {
                PollStatus::Ready(value) => return Ok(value),
                PollStatus::Pending => {
                    tracing::debug!(target_kind = target, attempt, "Still pending");
                }
            }

            if attempt < max_attempts {
                sleep(policy.backoff.delay(attempt)).await;
            }
        }

        Err(OrchestratorError::Timeout(format!(
            "{} still pending after {} attempts",
            target, max_attempts
        )))
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!(target_kind = target, "Polling cancelled");
            Err(OrchestratorError::Cancelled)
        }
        result = timeout(policy.timeout, work) => match result {
            Ok(outcome) => outcome,
            Err(_) => Err(OrchestratorError::Timeout(format!(
                "{} did not settle within {:?}",
                target, policy.timeout
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            settle_delay: Duration::from_millis(1),
            backoff: Backoff::new(1, 5),
            max_attempts,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_ready_after_pending() {
        let calls = AtomicU32::new(0);
        let result = poll_until(&fast_policy(10), &CancelToken::new(), "test", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt >= 3 {
                    Ok(PollStatus::Ready(attempt))
                } else {
                    Ok(PollStatus::Pending)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_attempts_exhausted() {
        let result: OrchestratorResult<()> =
            poll_until(&fast_policy(2), &CancelToken::new(), "test", |_| async {
                Ok(PollStatus::Pending)
            })
            .await;
        assert!(matches!(result, Err(OrchestratorError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_wall_clock_timeout() {
        let mut policy = fast_policy(1_000);
        policy.backoff = Backoff::new(50, 50);
        policy.timeout = Duration::from_millis(80);

        let result: OrchestratorResult<()> =
            poll_until(&policy, &CancelToken::new(), "test", |_| async {
                Ok(PollStatus::Pending)
            })
            .await;
        match result {
            Err(OrchestratorError::Timeout(msg)) => assert!(msg.contains("did not settle")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_error_stops_polling() {
        let calls = AtomicU32::new(0);
        let result: OrchestratorResult<()> =
            poll_until(&fast_policy(10), &CancelToken::new(), "test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(OrchestratorError::Transport("connection refused".into())) }
            })
            .await;
        assert!(matches!(result, Err(OrchestratorError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancellation() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let mut policy = fast_policy(1_000);
        policy.backoff = Backoff::new(10, 10);

        let result: OrchestratorResult<()> =
            poll_until(&policy, &cancel, "test", |_| async { Ok(PollStatus::Pending) }).await;
        assert!(matches!(result, Err(OrchestratorError::Cancelled)));
    }
}
