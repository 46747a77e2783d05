//! Circuit breaker shared across all calls to one dependency.
//!
//! Closed → Open after `threshold` consecutive transient failures. While open,
//! calls fail fast with [`PolicyError::CircuitOpen`] without being attempted.
//! After the break duration one trial call is admitted (half-open); its
//! success closes the circuit, its failure opens it again.

use crate::error::{PolicyError, Transient};
use motorcover_core::ResilienceConfig;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls are rejected until the break duration elapses.
    Open,
    /// A single trial call is in flight or may be admitted.
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Closed,
    Open { until: Instant },
    HalfOpen { trial: u64, trial_started: Instant },
}

#[derive(Debug)]
struct Inner {
    state: State,
    consecutive_failures: u32,
    trials: u64,
}

/// Permission to make one call, handed back with its outcome.
///
/// A permit issued for a half-open trial carries that trial's number; only
/// the outcome of the current trial may close or re-open the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct CallPermit {
    trial: Option<u64>,
}

/// Consecutive-failure circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    threshold: u32,
    break_duration: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    #[must_use]
    pub fn new(name: impl Into<String>, threshold: u32, break_duration: Duration) -> Self {
        Self {
            name: name.into(),
            threshold: threshold.max(1),
            break_duration,
            inner: Mutex::new(Inner {
                state: State::Closed,
                consecutive_failures: 0,
                trials: 0,
            }),
        }
    }

    /// Build from the `[resilience]` config section.
    #[must_use]
    pub fn from_config(name: impl Into<String>, config: &ResilienceConfig) -> Self {
        Self::new(name, config.circuit_breaker_threshold, config.break_duration())
    }

    /// Dependency name used in log lines.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state. An open circuit whose break has elapsed reports half-open.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        match self.lock().state {
            State::Closed => CircuitState::Closed,
            State::Open { until } if Instant::now() < until => CircuitState::Open,
            State::Open { .. } | State::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Ask permission to make a call.
    ///
    /// Returns the remaining break time when the call must be rejected.
    pub fn try_acquire(&self) -> Result<CallPermit, Duration> {
        let now = Instant::now();
        let mut inner = self.lock();

        match inner.state {
            State::Closed => Ok(CallPermit { trial: None }),
            State::Open { until } => {
                if now < until {
                    return Err(until - now);
                }
                tracing::info!("Circuit breaker '{}' half-open, admitting trial call", self.name);
                Ok(inner.start_trial(now))
            }
            State::HalfOpen { trial_started, .. } => {
                // A trial that never reported back frees the slot after another break
                let expires = trial_started + self.break_duration;
                if now < expires {
                    return Err(expires - now);
                }
                Ok(inner.start_trial(now))
            }
        }
    }

    /// Record a call that did not fail transiently.
    pub fn record_success(&self, permit: CallPermit) {
        let mut inner = self.lock();

        match inner.state {
            State::Closed => inner.consecutive_failures = 0,
            State::HalfOpen { trial, .. } if permit.trial == Some(trial) => {
                tracing::info!("Circuit breaker '{}' reset.", self.name);
                inner.state = State::Closed;
                inner.consecutive_failures = 0;
            }
            // Late result from a call admitted before the circuit opened,
            // or from an abandoned trial
            State::Open { .. } | State::HalfOpen { .. } => {}
        }
    }

    /// Record a transient failure.
    pub fn record_failure(&self, permit: CallPermit) {
        let now = Instant::now();
        let mut inner = self.lock();

        match inner.state {
            State::HalfOpen { trial, .. } if permit.trial == Some(trial) => {
                tracing::error!(
                    "Circuit breaker '{}' trial call failed, opening for {:?}",
                    self.name,
                    self.break_duration
                );
                inner.state = State::Open {
                    until: now + self.break_duration,
                };
            }
            State::Closed => {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                if inner.consecutive_failures >= self.threshold {
                    tracing::error!(
                        "Circuit breaker '{}' opened after {} consecutive failures, breaking for {:?}",
                        self.name,
                        inner.consecutive_failures,
                        self.break_duration
                    );
                    inner.state = State::Open {
                        until: now + self.break_duration,
                    };
                }
            }
            State::Open { .. } | State::HalfOpen { .. } => {}
        }
    }

    /// Run `fut` through the breaker.
    ///
    /// Transient errors count towards opening the circuit. Any other outcome,
    /// including a non-transient error, counts as success.
    pub async fn call<T, E, Fut>(&self, fut: Fut) -> Result<T, PolicyError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Transient,
    {
        let permit = match self.try_acquire() {
            Ok(permit) => permit,
            Err(retry_after) => {
                tracing::debug!(
                    "Circuit breaker '{}' is open, rejecting call for another {:?}",
                    self.name,
                    retry_after
                );
                return Err(PolicyError::CircuitOpen { retry_after });
            }
        };

        match fut.await {
            Ok(value) => {
                self.record_success(permit);
                Ok(value)
            }
            Err(e) => {
                if e.is_transient() {
                    self.record_failure(permit);
                } else {
                    self.record_success(permit);
                }
                Err(PolicyError::Inner(e))
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn start_trial(&mut self, now: Instant) -> CallPermit {
        self.trials = self.trials.wrapping_add(1);
        self.state = State::HalfOpen {
            trial: self.trials,
            trial_started: now,
        };
        CallPermit {
            trial: Some(self.trials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Flaky(bool);

    impl Transient for Flaky {
        fn is_transient(&self) -> bool {
            self.0
        }
    }

    async fn fail(breaker: &CircuitBreaker, attempts: &AtomicU32) -> Result<(), PolicyError<Flaky>> {
        breaker
            .call(async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Flaky(true))
            })
            .await
    }

    async fn succeed(breaker: &CircuitBreaker) -> Result<u32, PolicyError<Flaky>> {
        breaker.call(async { Ok::<_, Flaky>(7) }).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_after_threshold() {
        let breaker = CircuitBreaker::new("vehicle", 3, Duration::from_secs(30));
        let attempts = AtomicU32::new(0);

        for _ in 0..3 {
            let err = fail(&breaker, &attempts).await.unwrap_err();
            assert!(!err.is_circuit_open());
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        // Open circuit fails fast without attempting the call
        let err = fail(&breaker, &attempts).await.unwrap_err();
        assert!(err.is_circuit_open());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_failure_count() {
        let breaker = CircuitBreaker::new("vehicle", 3, Duration::from_secs(30));
        let attempts = AtomicU32::new(0);

        let _ = fail(&breaker, &attempts).await;
        let _ = fail(&breaker, &attempts).await;
        assert_eq!(succeed(&breaker).await.expect("closed circuit"), 7);
        let _ = fail(&breaker, &attempts).await;
        let _ = fail(&breaker, &attempts).await;

        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_errors_do_not_trip() {
        let breaker = CircuitBreaker::new("vehicle", 2, Duration::from_secs(30));

        for _ in 0..5 {
            let result: Result<(), _> = breaker.call(async { Err(Flaky(false)) }).await;
            assert!(matches!(result, Err(PolicyError::Inner(Flaky(false)))));
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_trial_success_closes() {
        let breaker = CircuitBreaker::new("vehicle", 1, Duration::from_secs(30));
        let attempts = AtomicU32::new(0);

        let _ = fail(&breaker, &attempts).await;
        assert_eq!(breaker.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        assert_eq!(succeed(&breaker).await.expect("trial call"), 7);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_trial_failure_reopens() {
        let breaker = CircuitBreaker::new("vehicle", 1, Duration::from_secs(30));
        let attempts = AtomicU32::new(0);

        let _ = fail(&breaker, &attempts).await;
        tokio::time::advance(Duration::from_secs(31)).await;

        let err = fail(&breaker, &attempts).await.unwrap_err();
        assert!(!err.is_circuit_open());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(breaker.state(), CircuitState::Open);

        // Full break applies again
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(breaker.try_acquire().is_err());
    }

    fn trip(breaker: &CircuitBreaker) {
        let permit = breaker.try_acquire().expect("closed circuit");
        breaker.record_failure(permit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_admits_single_trial() {
        let breaker = CircuitBreaker::new("vehicle", 1, Duration::from_secs(30));
        trip(&breaker);
        tokio::time::advance(Duration::from_secs(31)).await;

        let abandoned = breaker.try_acquire().expect("first trial");
        assert!(breaker.try_acquire().is_err());

        // Abandoned trial frees the slot after another break
        tokio::time::advance(Duration::from_secs(31)).await;
        let trial = breaker.try_acquire().expect("second trial");

        // Only the current trial decides
        breaker.record_failure(abandoned);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.record_success(trial);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_keeps_circuit_open() {
        let breaker = CircuitBreaker::new("vehicle", 1, Duration::from_secs(30));
        let attempts = AtomicU32::new(0);

        // Admitted while closed, finishes a second after the circuit opens
        let slow = breaker.call(async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Err::<(), _>(Flaky(false))
        });
        let tripping = async {
            let result = fail(&breaker, &attempts).await;
            assert_eq!(breaker.state(), CircuitState::Open);
            result
        };
        let (slow, tripping) = tokio::join!(slow, tripping);

        assert!(matches!(slow, Err(PolicyError::Inner(Flaky(false)))));
        assert!(!tripping.unwrap_err().is_circuit_open());
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(succeed(&breaker).await.unwrap_err().is_circuit_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_success_does_not_close_half_open() {
        let breaker = CircuitBreaker::new("vehicle", 1, Duration::from_secs(30));
        let early = breaker.try_acquire().expect("closed circuit");
        trip(&breaker);
        tokio::time::advance(Duration::from_secs(31)).await;
        let trial = breaker.try_acquire().expect("trial");

        breaker.record_success(early);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(breaker.try_acquire().is_err());

        breaker.record_failure(trial);
        assert_eq!(breaker.state(), CircuitState::Open);
    }
}
