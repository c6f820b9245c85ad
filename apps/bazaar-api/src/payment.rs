//! # Payment Gateway
//!
//! Creates payment intents for new orders.
//!
//! ## Retry Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    RetryingGateway::create_intent                       │
//! │                                                                         │
//! │  attempt ──timeout(attempt_timeout)──► inner.create_intent             │
//! │     │                                                                   │
//! │     ├── Ok ─────────────────────────────────────► PaymentIntent        │
//! │     ├── Rejected (permanent) ───────────────────► error                │
//! │     └── Unavailable / Timeout                                          │
//! │            │                                                            │
//! │            ├── retries left → sleep(exponential backoff) → attempt     │
//! │            └── exhausted ──────────────────────► error                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tokio::time::timeout;
use tracing::{debug, error, warn};
use uuid::Uuid;

use bazaar_core::Money;

/// Handle the client uses to confirm the payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub client_secret: String,
}

/// Payment provider failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PaymentError {
    /// Provider unreachable or returned a server error.
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),

    /// No answer within the per-attempt timeout.
    #[error("payment provider timed out after {0:?}")]
    Timeout(Duration),

    /// Provider refused the request; retrying will not help.
    #[error("payment rejected: {0}")]
    Rejected(String),
}

impl PaymentError {
    pub fn is_transient(&self) -> bool {
        !matches!(self, PaymentError::Rejected(_))
    }
}

/// External payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, amount: Money, currency: &str) -> Result<PaymentIntent, PaymentError>;
}

/// In-process provider that always succeeds.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway;

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn create_intent(&self, amount: Money, currency: &str) -> Result<PaymentIntent, PaymentError> {
        if amount.is_negative() {
            return Err(PaymentError::Rejected(format!("negative amount {amount}")));
        }

        debug!(amount = %amount, currency = %currency, "Simulated payment intent");
        Ok(PaymentIntent {
            client_secret: format!("pi_{}_secret", Uuid::new_v4().simple()),
        })
    }
}

/// Bounds for [`RetryingGateway`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub attempt_timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            attempt_timeout: Duration::from_secs(5),
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    fn create_backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: Some(self.attempt_timeout * (self.max_retries + 1)),
            ..Default::default()
        };
        // Default seeds current_interval from its own initial_interval.
        backoff.reset();
        backoff
    }
}

/// Wraps a gateway with per-attempt timeouts and exponential backoff.
pub struct RetryingGateway<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: PaymentGateway> RetryingGateway<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        RetryingGateway { inner, policy }
    }
}

#[async_trait]
impl<G: PaymentGateway> PaymentGateway for RetryingGateway<G> {
    async fn create_intent(&self, amount: Money, currency: &str) -> Result<PaymentIntent, PaymentError> {
        let mut backoff = self.policy.create_backoff();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let result = match timeout(
                self.policy.attempt_timeout,
                self.inner.create_intent(amount, currency),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(PaymentError::Timeout(self.policy.attempt_timeout)),
            };

            let err = match result {
                Ok(intent) => return Ok(intent),
                Err(e) => e,
            };

            if !err.is_transient() || attempt > self.policy.max_retries {
                error!(attempt, error = %err, "Payment intent creation failed");
                return Err(err);
            }

            match backoff.next_backoff() {
                Some(delay) => {
                    warn!(attempt, ?delay, error = %err, "Payment intent creation failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!(attempt, error = %err, "Payment retry budget exhausted");
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Fails the first `failures` calls, then succeeds.
    pub(crate) struct FlakyGateway {
        pub failures: u32,
        pub calls: Arc<AtomicU32>,
        pub error: PaymentError,
    }

    impl FlakyGateway {
        pub(crate) fn new(failures: u32, error: PaymentError) -> Self {
            FlakyGateway {
                failures,
                calls: Arc::new(AtomicU32::new(0)),
                error,
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for FlakyGateway {
        async fn create_intent(&self, amount: Money, currency: &str) -> Result<PaymentIntent, PaymentError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(self.error.clone());
            }
            SimulatedGateway.create_intent(amount, currency).await
        }
    }

    /// Never answers.
    struct HangingGateway;

    #[async_trait]
    impl PaymentGateway for HangingGateway {
        async fn create_intent(&self, _: Money, _: &str) -> Result<PaymentIntent, PaymentError> {
            std::future::pending().await
        }
    }

    pub(crate) fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            attempt_timeout: Duration::from_millis(50),
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_first_delay_follows_initial_backoff() {
        let policy = RetryPolicy {
            max_retries: 3,
            attempt_timeout: Duration::from_millis(100),
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(40),
        };
        let mut backoff = policy.create_backoff();

        let first = backoff.next_backoff().unwrap();
        assert!(first >= Duration::from_millis(5), "{first:?}");
        assert!(first <= Duration::from_millis(15), "{first:?}");

        let second = backoff.next_backoff().unwrap();
        assert!(second <= Duration::from_millis(30), "{second:?}");
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let flaky = FlakyGateway::new(2, PaymentError::Unavailable("503".into()));
        let calls = flaky.calls.clone();
        let gateway = RetryingGateway::new(flaky, fast_policy(3));

        let intent = gateway
            .create_intent(Money::from_cents(1000), "egp")
            .await
            .unwrap();

        assert!(intent.client_secret.starts_with("pi_"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let flaky = FlakyGateway::new(10, PaymentError::Unavailable("503".into()));
        let calls = flaky.calls.clone();
        let gateway = RetryingGateway::new(flaky, fast_policy(2));

        let err = gateway
            .create_intent(Money::from_cents(1000), "egp")
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Unavailable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let flaky = FlakyGateway::new(10, PaymentError::Rejected("card declined".into()));
        let calls = flaky.calls.clone();
        let gateway = RetryingGateway::new(flaky, fast_policy(3));

        assert!(gateway
            .create_intent(Money::from_cents(1000), "egp")
            .await
            .is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempt_timeout() {
        let gateway = RetryingGateway::new(HangingGateway, fast_policy(1));

        let err = gateway
            .create_intent(Money::from_cents(1000), "egp")
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Timeout(_)));
    }
}
