//! Exponential backoff retry for text-generation requests.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::debug;

const INITIAL_INTERVAL_MILLIS: u64 = 500;
const MAX_INTERVAL_SECS: u64 = 10;

/// Retry an async operation with exponential backoff.
///
/// `attempt` is called up to `max_attempts` times (at least once). Errors for
/// which `is_retryable` returns false are returned immediately. When every
/// attempt failed and more than one was made, `wrap_exhausted` converts the
/// last error into the caller's `RetriesExhausted` variant.
pub async fn retry_with_backoff<T, E, Fut, F, R, W>(
    max_attempts: u32,
    mut attempt: F,
    is_retryable: R,
    wrap_exhausted: W,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    W: FnOnce(E) -> E,
    E: std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut backoff = ExponentialBackoff {
        initial_interval: Duration::from_millis(INITIAL_INTERVAL_MILLIS),
        max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempts = 0;
    loop {
        attempts += 1;

        let error = match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !is_retryable(&error) {
            return Err(error);
        }
        if attempts >= max_attempts {
            return Err(if attempts > 1 { wrap_exhausted(error) } else { error });
        }

        debug!(attempt = attempts, max_attempts, "Retrying after error: {error}");
        if let Some(wait_duration) = backoff.next_backoff() {
            tokio::time::sleep(wait_duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient(String),
        Permanent(String),
        RetriesExhausted(Box<TestError>),
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{self:?}")
        }
    }

    fn retryable(e: &TestError) -> bool {
        matches!(e, TestError::Transient(_))
    }

    fn exhausted(e: TestError) -> TestError {
        TestError::RetriesExhausted(Box::new(e))
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_on_first_attempt() {
        let result: Result<&str, TestError> =
            retry_with_backoff(3, || async { Ok("ok") }, retryable, exhausted).await;
        assert_eq!(result.unwrap(), "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_after_max_attempts() {
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = count.clone();

        let result: Result<(), TestError> = retry_with_backoff(
            3,
            move || {
                let c = count_clone.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Transient("fail".to_string()))
                }
            },
            retryable,
            exhausted,
        )
        .await;

        assert!(matches!(result, Err(TestError::RetriesExhausted(_))));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_failures() {
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = count.clone();

        let result: Result<&str, TestError> = retry_with_backoff(
            3,
            move || {
                let c = count_clone.clone();
                async move {
                    let n = c.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(TestError::Transient("transient".to_string()))
                    } else {
                        Ok("recovered")
                    }
                }
            },
            retryable,
            exhausted,
        )
        .await;

        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = count.clone();

        let result: Result<(), TestError> = retry_with_backoff(
            5,
            move || {
                let c = count_clone.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Permanent("bad key".to_string()))
                }
            },
            retryable,
            exhausted,
        )
        .await;

        assert_eq!(result, Err(TestError::Permanent("bad key".to_string())));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_returns_error_unwrapped() {
        let result: Result<(), TestError> = retry_with_backoff(
            1,
            || async { Err(TestError::Transient("timeout".to_string())) },
            retryable,
            exhausted,
        )
        .await;

        assert_eq!(result, Err(TestError::Transient("timeout".to_string())));
    }
}
