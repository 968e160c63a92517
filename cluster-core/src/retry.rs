//! A higher-order retry harness wrapping every network-touching operation.
//!
//! Call sites look like `Retrier::default().retry(|state| async move { .. })`:
//! a builder-configured [`Retrier`] runs an attempt closure that receives a
//! [`RetryState`] and reports back on one of two distinct failure channels,
//! retry or bail, rather than a single `Result`.

use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;

/// Backoff and attempt-budget configuration for a [`Retrier`].
///
/// Defaults match the common Kafka-client retry defaults: a 300ms initial
/// backoff, doubling each attempt, damped by a 0.2 factor, capped at 30s,
/// with up to 5 retries after the first attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub initial_retry_time: Duration,
    pub max_retry_time: Duration,
    pub factor: f64,
    pub multiplier: f64,
    pub retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            initial_retry_time: Duration::from_millis(300),
            max_retry_time: Duration::from_secs(30),
            factor: 0.2,
            multiplier: 2.0,
            retries: 5,
        }
    }
}

/// What an attempt closure knows about its own progress.
#[derive(Debug, Clone, Copy)]
pub struct RetryState {
    /// The current attempt count, starting at 0 for the first try.
    pub attempt: usize,
    /// Wall-clock time elapsed since the first attempt started.
    pub elapsed: Duration,
}

/// The two independent failure channels an attempt can use.
///
/// `Retry(e)` means "this failed in a way that's worth trying again";
/// `Bail(e)` means "do not retry, surface this immediately".
#[derive(Debug)]
pub enum Bail<E> {
    Retry(E),
    Bail(E),
}

/// The outcome of a retry loop that never produced a value.
#[derive(Error, Debug)]
pub enum RetryError<E> {
    #[error("retries exhausted: {0}")]
    Exhausted(E),
    #[error("bailed: {0}")]
    Bailed(E),
}

impl<E> RetryError<E> {
    /// The error that caused the loop to stop, regardless of which channel
    /// it arrived on.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted(e) => e,
            RetryError::Bailed(e) => e,
        }
    }
}

/// Wraps an attempt function in an exponential-backoff retry loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct Retrier {
    config: RetryConfig,
}

impl Retrier {
    pub fn new(config: RetryConfig) -> Self {
        Retrier { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Runs `attempt` repeatedly until it returns `Ok`, bails, or exhausts
    /// the configured retry budget.
    pub async fn retry<T, E, F, Fut>(&self, mut attempt: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(RetryState) -> Fut,
        Fut: Future<Output = Result<T, Bail<E>>>,
    {
        let start = Instant::now();
        let mut attempt_count = 0usize;
        loop {
            let state = RetryState {
                attempt: attempt_count,
                elapsed: start.elapsed(),
            };
            match attempt(state).await {
                Ok(value) => return Ok(value),
                Err(Bail::Bail(err)) => return Err(RetryError::Bailed(err)),
                Err(Bail::Retry(err)) => {
                    if attempt_count >= self.config.retries {
                        return Err(RetryError::Exhausted(err));
                    }
                    let backoff = self.backoff(attempt_count);
                    tracing::debug!(
                        attempt = attempt_count,
                        ?backoff,
                        error = %err,
                        "retrying after backoff"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt_count += 1;
                }
            }
        }
    }

    /// `min(maxRetryTime, initialRetryTime * multiplier^attempt * factor *
    /// rand(0.5..1.0))`.
    fn backoff(&self, attempt: usize) -> Duration {
        let jitter = rand::thread_rng().gen_range(0.5..1.0_f64);
        let raw = self.config.initial_retry_time.as_secs_f64()
            * self.config.multiplier.powi(attempt as i32)
            * self.config.factor
            * jitter;
        Duration::from_secs_f64(raw.min(self.config.max_retry_time.as_secs_f64()))
    }
}
