use std::{future::Future, time::Duration};

use tokio::time;

use crate::Error;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub initial_backoff: Duration,
	pub max_backoff: Duration,
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			initial_backoff: Duration::from_millis(200),
			max_backoff: Duration::from_secs(2),
		}
	}
}

/// Runs `op` until it succeeds, fails with a non-transient error, or the attempts run out.
/// Backoff doubles after every failed attempt and is capped at `max_backoff`.
pub async fn with_backoff<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, Error>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, Error>>,
{
	let max_attempts = policy.max_attempts.max(1);
	let mut backoff = policy.initial_backoff;
	let mut attempt = 1;

	loop {
		match op().await {
			Ok(value) => return Ok(value),
			Err(err) if attempt < max_attempts && err.is_transient() => {
				tracing::debug!(attempt, error = %err, "Provider call failed; retrying.");

				time::sleep(backoff).await;

				backoff = backoff.saturating_mul(2).min(policy.max_backoff);
				attempt += 1;
			},
			Err(err) => return Err(err),
		}
	}
}
