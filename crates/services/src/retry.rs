use std::future::Future;
use std::time::Duration;

/// Bounded exponential backoff for delivery to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter_max: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            jitter_max: Some(Duration::from_millis(100)),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Single attempt, no waiting.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            jitter_max: None,
        }
    }
}

/// Run `f` until it succeeds or the policy runs out of attempts.
///
/// Returns the last error together with the number of attempts made.
pub(crate) async fn retry_with_policy<F, Fut, T, E>(
    policy: RetryPolicy,
    mut f: F,
) -> Result<(T, usize), (E, usize)>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = policy.base_backoff;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match f(attempt).await {
            Ok(value) => return Ok((value, attempt)),
            Err(err) if attempt >= max_attempts => return Err((err, attempt)),
            Err(_) => {
                let jitter = policy.jitter_max.map_or(Duration::ZERO, |max| {
                    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
                    if max_ms == 0 {
                        Duration::ZERO
                    } else {
                        Duration::from_millis(rand::random::<u64>() % (max_ms + 1))
                    }
                });
                tokio::time::sleep(backoff + jitter).await;
                backoff = std::cmp::min(backoff * 2, policy.max_backoff);
            }
        }
    }
}
