use std::time::Duration;

use async_trait::async_trait;
use tokio::time;
use tracing::warn;

use crate::Result;
use crate::transport::{ApiRequest, RawResponse, SendRequest};

/// Backoff schedule applied when the server itself reports the request
/// quota as exceeded.
///
/// Client-side throttling keeps requests under the quota in the first
/// place; this policy covers the case where the quota is hit anyway, for
/// example when the same credentials are used concurrently elsewhere.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Delay before the first retry; doubles after each further throttle.
    pub initial_backoff: Duration,
    /// Total attempts before the throttle error is surfaced to the
    /// caller. `None` retries for as long as the server keeps throttling.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_attempts: Some(10),
        }
    }
}

/// Resends a request while the inner transport reports the throttle
/// signal. Every other error propagates on the first attempt.
#[derive(Clone, Debug)]
pub(crate) struct RetryingDispatcher<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: SendRequest> RetryingDispatcher<T> {
    pub(crate) fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<T: SendRequest> SendRequest for RetryingDispatcher<T> {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        let mut delay = self.policy.initial_backoff;
        let mut attempts = 1_u32;
        loop {
            let err = match self.inner.send(request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_throttled() => err,
                Err(err) => return Err(err),
            };
            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    return Err(err);
                }
            }
            attempts += 1;
            warn!(
                url = %request.url,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "server throttled the request, backing off"
            );
            time::sleep(delay).await;
            delay = delay.saturating_mul(2);
            // The next attempt goes back through the transport, which
            // re-signs with a fresh timestamp.
        }
    }
}
