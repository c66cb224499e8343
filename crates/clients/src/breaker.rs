//! Circuit breaker for calls to flaky dependencies.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Circuit breaker configuration.
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    /// Consecutive transport failures before the breaker opens.
    pub failure_threshold: u32,
    /// How long the breaker stays open before allowing a trial call.
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
        }
    }
}

/// The state of a circuit breaker.
///
/// State transitions:
/// ```text
/// Closed ──(threshold failures)──► Open ──(cooldown)──► HalfOpen
///   ▲                                ▲                      │
///   └────────(trial success)─────────┴──(trial failure)─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls pass through; failures are counted.
    Closed,
    /// Calls short-circuit immediately to the fallback.
    Open,
    /// One trial call is allowed after the cooldown.
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
    trial_started_at: Option<Instant>,
}

/// An explicit circuit breaker call wrapper.
///
/// Callers acquire a permit with [`try_acquire`](CircuitBreaker::try_acquire)
/// before issuing the remote call and report the outcome with
/// [`record_success`](CircuitBreaker::record_success) or
/// [`record_failure`](CircuitBreaker::record_failure). Business outcomes such
/// as a remote 404 must be recorded as successes; only transport failures
/// count toward opening the breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Creates a new breaker in the Closed state.
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
                trial_started_at: None,
            }),
        }
    }

    /// Returns the current state without advancing it.
    pub fn state(&self) -> BreakerState {
        self.inner.lock().unwrap().state
    }

    /// Requests permission to issue a call.
    ///
    /// Returns `false` while the breaker is open (or a half-open trial is
    /// already in flight); the caller must then take its fallback path
    /// without touching the remote.
    ///
    /// A trial whose outcome is never recorded (the guarded future was
    /// dropped, e.g. the request was cancelled) is considered abandoned once
    /// it is a full cooldown old; the next acquire takes a fresh trial
    /// instead of wedging the breaker half-open forever.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                let cooled_down = inner
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.config.cooldown);
                if cooled_down {
                    inner.state = BreakerState::HalfOpen;
                    inner.trial_in_flight = true;
                    inner.trial_started_at = Some(Instant::now());
                    tracing::info!("circuit breaker half-open, allowing trial call");
                    true
                } else {
                    false
                }
            }
            BreakerState::HalfOpen => {
                let abandoned = inner
                    .trial_started_at
                    .is_some_and(|at| at.elapsed() >= self.config.cooldown);
                if inner.trial_in_flight && !abandoned {
                    false
                } else {
                    if inner.trial_in_flight {
                        tracing::warn!("half-open trial never reported, allowing a new trial");
                    }
                    inner.trial_in_flight = true;
                    inner.trial_started_at = Some(Instant::now());
                    true
                }
            }
        }
    }

    /// Records a successful call (or a business outcome like not-found),
    /// closing the breaker.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != BreakerState::Closed {
            tracing::info!("circuit breaker closed");
        }
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.trial_in_flight = false;
        inner.trial_started_at = None;
    }

    /// Records a transport failure, opening the breaker once the threshold
    /// is reached (a half-open trial failure re-opens immediately).
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            BreakerState::HalfOpen => {
                Self::open(&mut inner, "trial call failed");
            }
            BreakerState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    Self::open(&mut inner, "failure threshold reached");
                }
            }
            BreakerState::Open => {}
        }
    }

    fn open(inner: &mut BreakerInner, reason: &str) {
        inner.state = BreakerState::Open;
        inner.opened_at = Some(Instant::now());
        inner.trial_in_flight = false;
        inner.trial_started_at = None;
        metrics::counter!("circuit_breaker_opened_total").increment(1);
        tracing::warn!(reason, "circuit breaker opened");
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, cooldown_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(BreakerConfig {
            failure_threshold: threshold,
            cooldown: Duration::from_millis(cooldown_ms),
        })
    }

    #[test]
    fn test_opens_after_threshold() {
        let b = breaker(3, 10_000);
        assert_eq!(b.state(), BreakerState::Closed);

        for _ in 0..2 {
            assert!(b.try_acquire());
            b.record_failure();
        }
        assert_eq!(b.state(), BreakerState::Closed);

        assert!(b.try_acquire());
        b.record_failure();
        assert_eq!(b.state(), BreakerState::Open);
        assert!(!b.try_acquire());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let b = breaker(3, 10_000);
        b.record_failure();
        b.record_failure();
        b.record_success();
        b.record_failure();
        b.record_failure();
        assert_eq!(b.state(), BreakerState::Closed);
    }

    #[test]
    fn test_half_open_after_cooldown_then_closes_on_success() {
        let b = breaker(1, 20);
        b.record_failure();
        assert_eq!(b.state(), BreakerState::Open);
        assert!(!b.try_acquire());

        std::thread::sleep(Duration::from_millis(30));
        assert!(b.try_acquire());
        assert_eq!(b.state(), BreakerState::HalfOpen);
        // Only one trial call is allowed while half-open.
        assert!(!b.try_acquire());

        b.record_success();
        assert_eq!(b.state(), BreakerState::Closed);
        assert!(b.try_acquire());
    }

    #[test]
    fn test_unreported_trial_is_abandoned_after_cooldown() {
        let b = breaker(1, 20);
        b.record_failure();
        std::thread::sleep(Duration::from_millis(30));

        // Trial taken but its outcome never recorded: the guarded call was
        // dropped before completing.
        assert!(b.try_acquire());
        assert!(!b.try_acquire());

        // One cooldown later the stale trial no longer blocks new calls.
        std::thread::sleep(Duration::from_millis(30));
        assert!(b.try_acquire());
        assert_eq!(b.state(), BreakerState::HalfOpen);

        b.record_success();
        assert_eq!(b.state(), BreakerState::Closed);
    }

    #[test]
    fn test_half_open_reopens_on_trial_failure() {
        let b = breaker(1, 20);
        b.record_failure();
        std::thread::sleep(Duration::from_millis(30));
        assert!(b.try_acquire());

        b.record_failure();
        assert_eq!(b.state(), BreakerState::Open);
        assert!(!b.try_acquire());
    }
}
