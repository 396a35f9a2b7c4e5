use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use super::errors::ApiError;

const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);
const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// How catalog and watch-state calls are repeated after transient failures.
///
/// Waits double per retry up to `max_backoff`. A rate-limited response
/// waits for the server's hint instead, under the same cap.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
    pub max_backoff: Duration,
    /// No retry starts once this much time has passed since the first call
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            backoff: DEFAULT_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

impl RetryPolicy {
    pub fn with_retries(retries: u32) -> Self {
        Self {
            retries,
            ..Default::default()
        }
    }

    pub fn none() -> Self {
        Self::with_retries(0)
    }

    fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry);
        self.backoff.saturating_mul(factor).min(self.max_backoff)
    }

    fn wait_before(&self, retry: u32, error: &ApiError) -> Duration {
        match error.retry_after() {
            Some(secs) => Duration::from_secs(secs).min(self.max_backoff),
            None => self.backoff_for(retry),
        }
    }

    /// Call `request` until it succeeds or fails for good.
    ///
    /// Permanent errors are returned immediately. Otherwise the last
    /// transient error is returned once retries or the deadline run out.
    pub async fn execute<F, Fut, T>(&self, operation: &str, mut request: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let started = Instant::now();
        let mut retry = 0;

        loop {
            let error = match request().await {
                Ok(value) => {
                    if retry > 0 {
                        debug!("{} succeeded on retry {}", operation, retry);
                    }
                    return Ok(value);
                }
                Err(error) if !error.is_transient() => {
                    debug!("{} failed permanently: {}", operation, error);
                    return Err(error);
                }
                Err(error) => error,
            };

            if retry >= self.retries {
                warn!("{} gave up after {} retries: {}", operation, retry, error);
                return Err(error);
            }

            let wait = self.wait_before(retry, &error);
            if started.elapsed() + wait >= self.deadline {
                warn!("{} out of time after {:?}: {}", operation, started.elapsed(), error);
                return Err(error);
            }

            retry += 1;
            debug!("{} failed ({}), retry {} in {:?}", operation, error, retry, wait);
            sleep(wait).await;
        }
    }
}
