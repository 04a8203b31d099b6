// src/error_recovery.rs
//! Call-site retry with exponential backoff and observable state.
//!
//! `RetryOrchestrator` wraps a whole logical operation (usually one client
//! call) and publishes `{is_retrying, attempt_count, last_error}` so a
//! front end can show what is going on. It sits above the transport's own
//! connection-level retries.

use crate::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF,
};
use crate::error::RequestError;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Errors the orchestrator knows how to treat.
pub trait RetryClassify {
    /// Whether another attempt could plausibly succeed.
    fn is_retriable(&self) -> bool;

    /// The error reported by an operation abandoned through `reset()`.
    fn cancelled() -> Self;
}

impl RetryClassify for RequestError {
    fn is_retriable(&self) -> bool {
        RequestError::is_retriable(self)
    }

    /// Carries an empty endpoint; the orchestrator only sees a closure.
    fn cancelled() -> Self {
        RequestError::Cancelled {
            endpoint: String::new(),
        }
    }
}

/// Observable progress of the wrapped operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryState<E> {
    pub is_retrying: bool,
    /// Failed attempts since the last `execute()` or `reset()`.
    pub attempt_count: u32,
    pub last_error: Option<E>,
}

impl<E> Default for RetryState<E> {
    fn default() -> Self {
        Self {
            is_retrying: false,
            attempt_count: 0,
            last_error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryOptions {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
    /// Retry inside `execute()`/`retry()` without waiting for the caller.
    pub auto_retry: bool,
    /// Stop scheduling retries once this much time has gone by.
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_BACKOFF,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_delay: DEFAULT_MAX_BACKOFF,
            auto_retry: true,
            max_elapsed: None,
        }
    }
}

impl RetryOptions {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, factor: f64, max: Duration) -> Self {
        self.initial_delay = initial;
        self.backoff_factor = factor;
        self.max_delay = max;
        self
    }

    pub fn with_auto_retry(mut self, auto_retry: bool) -> Self {
        self.auto_retry = auto_retry;
        self
    }

    pub fn with_max_elapsed(mut self, budget: Duration) -> Self {
        self.max_elapsed = Some(budget);
        self
    }

    /// Wait before the next attempt after `failures` failed ones:
    /// `min(initial * factor^(failures - 1), max_delay)`.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }
}

type ExhaustedCallback<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Retries a fallible async operation and reports its progress.
///
/// Meant to live for one logical operation (a page load, a command) and be
/// dropped afterwards.
pub struct RetryOrchestrator<E> {
    options: RetryOptions,
    state: watch::Sender<RetryState<E>>,
    cancel: Mutex<CancellationToken>,
    on_max_attempts_reached: Option<ExhaustedCallback<E>>,
}

impl<E> RetryOrchestrator<E>
where
    E: RetryClassify + Clone + fmt::Display,
{
    pub fn new(options: RetryOptions) -> Self {
        let (state, _) = watch::channel(RetryState::default());
        Self {
            options,
            state,
            cancel: Mutex::new(CancellationToken::new()),
            on_max_attempts_reached: None,
        }
    }

    /// Called with the final error once `max_attempts` failures accumulate.
    pub fn on_max_attempts_reached<F>(mut self, callback: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.on_max_attempts_reached = Some(Box::new(callback));
        self
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RetryState<E> {
        self.state.borrow().clone()
    }

    /// Receives every state change.
    pub fn subscribe(&self) -> watch::Receiver<RetryState<E>> {
        self.state.subscribe()
    }

    /// Starts over from zero and runs `operation`, retrying as configured.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.state.send_replace(RetryState::default());
        self.run(operation, false).await
    }

    /// Runs `operation` again, continuing from the current attempt count.
    ///
    /// Permitted even past `max_attempts`; the count is advisory for
    /// caller-driven retries.
    pub async fn retry<T, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(operation, true).await
    }

    /// Clears the state and abandons any operation in flight.
    ///
    /// The abandoned call returns `E::cancelled()` and leaves the fresh
    /// state alone.
    pub fn reset(&self) {
        let mut cancel = self.cancel.lock();
        cancel.cancel();
        *cancel = CancellationToken::new();
        self.state.send_replace(RetryState::default());
    }

    async fn run<T, F, Fut>(&self, mut operation: F, wait_first: bool) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let token = self.cancel.lock().clone();
        let started = Instant::now();

        if wait_first {
            let failures = self.state.borrow().attempt_count;
            if failures > 0 {
                self.state.send_modify(|s| s.is_retrying = true);
                if !self.pause(&token, self.options.delay_for(failures)).await {
                    return Err(E::cancelled());
                }
            }
        }

        loop {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(E::cancelled()),
                outcome = operation() => outcome,
            };

            if token.is_cancelled() {
                return Err(E::cancelled());
            }

            let err = match outcome {
                Ok(value) => {
                    self.state.send_replace(RetryState::default());
                    return Ok(value);
                }
                Err(err) => err,
            };

            let mut failures = 0;
            self.state.send_modify(|s| {
                s.attempt_count += 1;
                s.last_error = Some(err.clone());
                s.is_retrying = true;
                failures = s.attempt_count;
            });

            let delay = self.options.delay_for(failures);
            let within_budget = self
                .options
                .max_elapsed
                .map_or(true, |budget| started.elapsed() + delay <= budget);

            if self.options.auto_retry
                && err.is_retriable()
                && failures < self.options.max_attempts
                && within_budget
            {
                log::warn!(
                    "Attempt {}/{} failed: {}; retrying after {:?}",
                    failures,
                    self.options.max_attempts,
                    err,
                    delay
                );
                if !self.pause(&token, delay).await {
                    return Err(E::cancelled());
                }
                continue;
            }

            self.state.send_modify(|s| s.is_retrying = false);
            if failures >= self.options.max_attempts {
                log::error!("Giving up after {} attempts: {}", failures, err);
                if let Some(callback) = &self.on_max_attempts_reached {
                    callback(&err);
                }
            } else {
                log::debug!("Not retrying after attempt {}: {}", failures, err);
            }
            return Err(err);
        }
    }

    /// Sleeps for `delay`; returns false if cancelled first.
    async fn pause(&self, token: &CancellationToken, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

impl<E> Default for RetryOrchestrator<E>
where
    E: RetryClassify + Clone + fmt::Display,
{
    fn default() -> Self {
        Self::new(RetryOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::ValidationError;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn network_error() -> RequestError {
        RequestError::NetworkFailure {
            endpoint: "posts".into(),
            message: "connection refused".into(),
            attempts: 1,
        }
    }

    fn options() -> RetryOptions {
        RetryOptions::default().with_backoff(
            Duration::from_millis(100),
            2.0,
            Duration::from_secs(1),
        )
    }

    #[test]
    fn delay_grows_geometrically_and_is_capped() {
        let opts = options();
        assert_eq!(opts.delay_for(1), Duration::from_millis(100));
        assert_eq!(opts.delay_for(2), Duration::from_millis(200));
        assert_eq!(opts.delay_for(3), Duration::from_millis(400));
        assert_eq!(opts.delay_for(5), Duration::from_secs(1));
        assert_eq!(opts.delay_for(200), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn success_returns_value_and_resets_state() {
        let orchestrator = RetryOrchestrator::<RequestError>::new(options());
        let calls = AtomicU32::new(0);

        let value = orchestrator
            .execute(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(network_error())
                } else {
                    Ok("done")
                }
            })
            .await
            .unwrap();

        assert_eq!(value, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(orchestrator.state(), RetryState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_retry_stops_at_max_attempts_and_reports_exhaustion() {
        let exhausted = Arc::new(AtomicU32::new(0));
        let seen = exhausted.clone();
        let orchestrator = RetryOrchestrator::<RequestError>::new(options())
            .on_max_attempts_reached(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let err = orchestrator
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(network_error())
            })
            .await
            .unwrap_err();

        assert_eq!(err, network_error());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 100ms + 200ms between the three attempts.
        assert_eq!(started.elapsed(), Duration::from_millis(300));
        let state = orchestrator.state();
        assert_eq!(state.attempt_count, 3);
        assert!(!state.is_retrying);
        assert_eq!(state.last_error, Some(network_error()));
        assert_eq!(exhausted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn caller_driven_retries_accumulate_attempts() {
        let orchestrator =
            RetryOrchestrator::<RequestError>::new(options().with_auto_retry(false));
        let failing = || async { Err::<(), _>(network_error()) };

        let first = orchestrator.execute(failing).await.unwrap_err();
        orchestrator.retry(failing).await.unwrap_err();
        let last = orchestrator.retry(failing).await.unwrap_err();

        assert_eq!(orchestrator.state().attempt_count, 3);
        assert_eq!(first, last);
        assert_eq!(last.kind(), ErrorKind::Network);

        // Manual retry past the ceiling is still allowed.
        orchestrator.retry(failing).await.unwrap_err();
        assert_eq!(orchestrator.state().attempt_count, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retriable_errors_fail_fast() {
        let orchestrator = RetryOrchestrator::<RequestError>::new(options());
        let calls = AtomicU32::new(0);

        let err = orchestrator
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(RequestError::from(ValidationError::EmptyField("slug")))
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.state().attempt_count, 1);
        assert!(!orchestrator.state().is_retrying);
    }

    #[tokio::test(start_paused = true)]
    async fn execute_starts_from_zero_again() {
        let orchestrator =
            RetryOrchestrator::<RequestError>::new(options().with_auto_retry(false));
        let failing = || async { Err::<(), _>(network_error()) };

        orchestrator.execute(failing).await.unwrap_err();
        orchestrator.retry(failing).await.unwrap_err();
        orchestrator.execute(failing).await.unwrap_err();
        assert_eq!(orchestrator.state().attempt_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_budget_cuts_retries_short() {
        let orchestrator = RetryOrchestrator::<RequestError>::new(
            options()
                .with_max_attempts(10)
                .with_max_elapsed(Duration::from_millis(350)),
        );
        let calls = AtomicU32::new(0);

        orchestrator
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(network_error())
            })
            .await
            .unwrap_err();

        // Waits of 100 and 200 fit the budget; the next 400 would not.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_abandons_the_operation_in_flight() {
        let orchestrator = Arc::new(RetryOrchestrator::<RequestError>::new(options()));
        let running = orchestrator.clone();

        let task = tokio::spawn(async move {
            running
                .execute(|| async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok::<_, RequestError>(1)
                })
                .await
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        orchestrator.reset();

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(err.endpoint(), "");
        assert_eq!(orchestrator.state(), RetryState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_retrying_state_during_backoff() {
        let orchestrator = Arc::new(RetryOrchestrator::<RequestError>::new(
            options().with_backoff(Duration::from_secs(5), 2.0, Duration::from_secs(10)),
        ));
        let mut updates = orchestrator.subscribe();
        let running = orchestrator.clone();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let task = tokio::spawn(async move {
            running
                .execute(move || {
                    let counter = counter.clone();
                    async move {
                        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                            Err(network_error())
                        } else {
                            Ok(())
                        }
                    }
                })
                .await
        });

        updates
            .wait_for(|s| s.is_retrying && s.attempt_count == 1)
            .await
            .unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!orchestrator.state().is_retrying);
    }
}
