//! Rate-limited referral replay
//!
//! Each fake referral adds quota to the account. The WARP API flags bursts of
//! registrations, so calls are strictly sequential and spaced by a fixed delay.
//! A failed call ends the run; there is no retry.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::account::AccountCredential;
use crate::client::ProvisioningClient;
use crate::config::{DelayPolicy, ReferralConfig};
use crate::error::Result;
use crate::events::{EventSink, StatusEvent};

/// Source of the throttle delay
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct QuotaIncrementer<'a> {
    client: &'a dyn ProvisioningClient,
    sleeper: &'a dyn Sleeper,
    events: &'a dyn EventSink,
    delay: Duration,
    policy: DelayPolicy,
}

impl<'a> QuotaIncrementer<'a> {
    pub fn new(
        client: &'a dyn ProvisioningClient,
        sleeper: &'a dyn Sleeper,
        events: &'a dyn EventSink,
        settings: &ReferralConfig,
    ) -> Self {
        Self {
            client,
            sleeper,
            events,
            delay: settings.delay(),
            policy: settings.delay_policy,
        }
    }

    /// Perform `count` fake referrals. Returns the number completed, which is
    /// always `count` on success.
    pub async fn run(&self, credential: &AccountCredential, count: u32) -> Result<u32> {
        if count == 0 {
            return Ok(0);
        }
        self.events.emit(StatusEvent::ReferralsStarting { count });

        for index in 1..=count {
            if self.should_wait(index) {
                debug!("waiting {:?} before referral #{}", self.delay, index);
                self.sleeper.sleep(self.delay).await;
            }
            self.client.fake_referral(credential).await?;
            self.events.emit(StatusEvent::ReferralCompleted { index, total: count });
        }

        self.events.emit(StatusEvent::ReferralsFinished { completed: count });
        Ok(count)
    }

    fn should_wait(&self, index: u32) -> bool {
        match self.policy {
            DelayPolicy::BeforeEach => true,
            DelayPolicy::BetweenCalls => index > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::types::fixtures;
    use crate::account::AccountStatus;
    use crate::crypto::Keypair;
    use crate::error::WarpError;
    use crate::events::RecordingSink;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Step {
        Sleep(Duration),
        Referral,
    }

    /// Referral-only client sharing a step log with the sleeper
    struct ReferralClient<'a> {
        log: &'a Mutex<Vec<Step>>,
        fail_on: Option<usize>,
    }

    #[async_trait]
    impl ProvisioningClient for ReferralClient<'_> {
        async fn register(&self, _keypair: &Keypair) -> Result<AccountCredential> {
            unreachable!("register is not part of a referral run")
        }

        async fn enable_entitlement(&self, _credential: &AccountCredential) -> Result<()> {
            unreachable!("enable_entitlement is not part of a referral run")
        }

        async fn fetch_info(&self, _credential: &AccountCredential) -> Result<AccountStatus> {
            unreachable!("fetch_info is not part of a referral run")
        }

        async fn fake_referral(&self, _credential: &AccountCredential) -> Result<()> {
            let mut log = self.log.lock().unwrap();
            let done = log.iter().filter(|s| **s == Step::Referral).count();
            if self.fail_on == Some(done + 1) {
                return Err(WarpError::Api {
                    operation: "fake_referral",
                    status: 429,
                    body: "slow down".to_string(),
                });
            }
            log.push(Step::Referral);
            Ok(())
        }
    }

    struct LogSleeper<'a> {
        log: &'a Mutex<Vec<Step>>,
    }

    #[async_trait]
    impl Sleeper for LogSleeper<'_> {
        async fn sleep(&self, duration: Duration) {
            self.log.lock().unwrap().push(Step::Sleep(duration));
        }
    }

    async fn run_with(policy: DelayPolicy, count: u32, fail_on: Option<usize>) -> (Result<u32>, Vec<Step>, RecordingSink) {
        let log = Mutex::new(Vec::new());
        let client = ReferralClient { log: &log, fail_on };
        let sleeper = LogSleeper { log: &log };
        let events = RecordingSink::new();
        let settings = ReferralConfig { delay_secs: 20, delay_policy: policy };

        let result = QuotaIncrementer::new(&client, &sleeper, &events, &settings)
            .run(&fixtures::credential(), count)
            .await;
        let steps = log.into_inner().unwrap();
        (result, steps, events)
    }

    #[tokio::test]
    async fn test_delay_before_each_call() {
        let (result, steps, _) = run_with(DelayPolicy::BeforeEach, 3, None).await;
        let wait = Step::Sleep(Duration::from_secs(20));

        assert_eq!(result.unwrap(), 3);
        assert_eq!(
            steps,
            vec![wait.clone(), Step::Referral, wait.clone(), Step::Referral, wait, Step::Referral]
        );
    }

    #[tokio::test]
    async fn test_delay_between_calls() {
        let (result, steps, _) = run_with(DelayPolicy::BetweenCalls, 3, None).await;
        let wait = Step::Sleep(Duration::from_secs(20));

        assert_eq!(result.unwrap(), 3);
        assert_eq!(
            steps,
            vec![Step::Referral, wait.clone(), Step::Referral, wait, Step::Referral]
        );
    }

    #[tokio::test]
    async fn test_zero_count_does_nothing() {
        let (result, steps, events) = run_with(DelayPolicy::BeforeEach, 0, None).await;

        assert_eq!(result.unwrap(), 0);
        assert!(steps.is_empty());
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_calls() {
        let (result, steps, events) = run_with(DelayPolicy::BeforeEach, 5, Some(2)).await;

        assert!(matches!(result, Err(WarpError::Api { status: 429, .. })));
        assert_eq!(steps.iter().filter(|s| **s == Step::Referral).count(), 1);
        assert_eq!(
            events.events(),
            vec![
                StatusEvent::ReferralsStarting { count: 5 },
                StatusEvent::ReferralCompleted { index: 1, total: 5 },
            ]
        );
    }
}
