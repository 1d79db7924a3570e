//! Retry for transient host failures

use crate::config::RetryPolicy;
use crate::error::{Error, Result};
use std::future::Future;
use tracing::warn;

/// Run a host call, retrying transient failures with exponential backoff.
///
/// Permanent failures are returned immediately. When the attempt budget runs
/// out the last transient error is folded into
/// [`Error::RemoteUnavailable`].
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = policy.base_delay;
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                warn!(%err, attempt, what, "transient host failure, retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) if err.is_transient() => {
                return Err(Error::RemoteUnavailable {
                    attempts: policy.max_attempts,
                    last: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }
}
