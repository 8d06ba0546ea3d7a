use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};

use crate::config::RetrySettings;

/// Upper bound for a single backoff delay.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Exponential backoff: `initial_delay`, then multiplied by `factor` after every
/// failed attempt, for at most `max_attempts` attempts in total.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    settings: RetrySettings,
}

impl BackoffPolicy {
    pub fn new(settings: RetrySettings) -> Self {
        Self { settings }
    }

    pub fn max_attempts(&self) -> u32 {
        self.settings.max_attempts.max(1)
    }

    /// The backon builder. The first attempt is not a retry, hence `max_attempts - 1`.
    pub fn builder(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.settings.initial_delay)
            .with_factor(self.settings.factor)
            .with_max_delay(MAX_DELAY)
            .with_max_times((self.max_attempts() - 1) as usize)
    }

    /// Delays slept between attempts, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.builder().build().collect()
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(RetrySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backon::Retryable;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };
    use tokio::time::Instant;

    #[test]
    fn test_delays_grow_by_factor() {
        let policy = BackoffPolicy::new(RetrySettings {
            max_attempts: 4,
            initial_delay: Duration::from_millis(100),
            factor: 2.0,
        });
        assert_eq!(
            policy.delays(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
            ]
        );
    }

    #[test]
    fn test_single_attempt_never_sleeps() {
        let policy = BackoffPolicy::new(RetrySettings {
            max_attempts: 1,
            ..RetrySettings::default()
        });
        assert!(policy.delays().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_sleeps_increasing_delays() {
        let policy = BackoffPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let started = Instant::now();
        let stamps = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        let result = (|| {
            let calls = calls.clone();
            let stamps = stamps.clone();
            async move {
                stamps.lock().await.push(started.elapsed());
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("not yet")
                } else {
                    Ok("done")
                }
            }
        })
        .retry(policy.builder())
        .sleep(tokio::time::sleep)
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let stamps = stamps.lock().await;
        let first_gap = stamps[1] - stamps[0];
        let second_gap = stamps[2] - stamps[1];
        assert!(first_gap >= Duration::from_millis(500));
        assert!(second_gap > first_gap);
    }
}
