use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,   // Requests pass through
    Open,     // Requests are rejected until the cool-down elapses
    HalfOpen, // Probing: a few requests may pass
}

/// Thresholds for a [`CircuitBreaker`]
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerPolicy {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: usize,
    /// Consecutive HalfOpen successes that close it again.
    pub success_threshold: usize,
    /// Time spent Open before probing.
    pub cool_down: Duration,
}

impl Default for CircuitBreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            cool_down: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct Tracker {
    state: CircuitState,
    failures: usize,
    successes: usize,
    opened_at: Option<Instant>,
}

impl Tracker {
    /// Returns the remaining cool-down when the request must be rejected.
    fn admit(&mut self, policy: &CircuitBreakerPolicy, name: &str) -> Option<Duration> {
        if self.state != CircuitState::Open {
            return None;
        }
        let elapsed = self.opened_at.map(|t| t.elapsed()).unwrap_or_default();
        if elapsed >= policy.cool_down {
            info!("CircuitBreaker [{}]: Open -> HalfOpen", name);
            self.state = CircuitState::HalfOpen;
            self.successes = 0;
            None
        } else {
            Some(policy.cool_down - elapsed)
        }
    }

    fn record_success(&mut self, policy: &CircuitBreakerPolicy, name: &str) {
        match self.state {
            CircuitState::HalfOpen => {
                self.successes += 1;
                if self.successes >= policy.success_threshold {
                    info!(
                        "CircuitBreaker [{}]: HalfOpen -> Closed ({} successes)",
                        name, self.successes
                    );
                    self.state = CircuitState::Closed;
                    self.failures = 0;
                    self.successes = 0;
                }
            }
            CircuitState::Closed => self.failures = 0,
            CircuitState::Open => {
                warn!("CircuitBreaker [{}]: Success recorded while Open", name);
            }
        }
    }

    fn record_failure(&mut self, policy: &CircuitBreakerPolicy, name: &str) {
        self.failures += 1;
        match self.state {
            CircuitState::Closed if self.failures >= policy.failure_threshold => {
                error!(
                    "CircuitBreaker [{}]: Closed -> Open ({} failures)",
                    name, self.failures
                );
                self.state = CircuitState::Open;
                self.opened_at = Some(Instant::now());
            }
            CircuitState::HalfOpen => {
                warn!("CircuitBreaker [{}]: HalfOpen -> Open (probe failed)", name);
                self.state = CircuitState::Open;
                self.opened_at = Some(Instant::now());
                self.successes = 0;
            }
            _ => {}
        }
    }
}

/// Stops hammering an exchange endpoint that keeps failing.
///
/// The loop already backs off between cycles; the breaker additionally turns
/// a run of failures into fast `Open` rejections until the cool-down passes.
pub struct CircuitBreaker {
    name: String,
    policy: CircuitBreakerPolicy,
    tracker: Mutex<Tracker>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, policy: CircuitBreakerPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            tracker: Mutex::new(Tracker {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                opened_at: None,
            }),
        }
    }

    /// Runs `call` unless the circuit is open.
    pub async fn call<F, T, E>(&self, call: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        if let Some(remaining) = self.tracker.lock().await.admit(&self.policy, &self.name) {
            return Err(CircuitBreakerError::Open(format!(
                "[{}] retry in {:?}",
                self.name, remaining
            )));
        }

        let outcome = call.await;
        let mut tracker = self.tracker.lock().await;
        match outcome {
            Ok(value) => {
                tracker.record_success(&self.policy, &self.name);
                Ok(value)
            }
            Err(e) => {
                tracker.record_failure(&self.policy, &self.name);
                Err(CircuitBreakerError::Inner(e))
            }
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.tracker.lock().await.state
    }
}

/// Error type for circuit breaker
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker is open: {0}")]
    Open(String),

    #[error(transparent)]
    Inner(E),
}
