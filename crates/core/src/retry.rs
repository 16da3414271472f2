//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Run `op` up to `attempts` times, sleeping between tries with a doubling
/// delay starting at `base`. Retries only while `is_transient` holds for the
/// error; the last error is returned when attempts run out.
pub async fn with_backoff<T, E, F, Fut>(
    attempts: u32,
    base: Duration,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.max(1);
    let mut delay = base;

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts && is_transient(&err) => {
                warn!(attempt, %err, "transient failure, retrying after {delay:?}");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("loop returns on the last attempt")
}
