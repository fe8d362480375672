//! The sampling loop: acquire, append, publish, sleep.

use crate::interval::SamplingInterval;
use crate::mqtt::ReadingPublisher;
use crate::reading::Reading;
use crate::sensor::SensorReader;
use crate::sheet::{RowAppender, SheetConnector};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// What a single cycle did; used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Reading appended and published.
    Logged,
    /// Sensor produced no reliable measurement; retried after the short backoff.
    SensorRetry,
    /// Row append failed; session dropped and publish skipped.
    AppendFailed,
    /// No sink session this cycle; reading published anyway.
    PublishedWithoutSink,
}

/// Drives the unbounded sample/append/publish cycle.
///
/// The sink session is established lazily and dropped on any append error,
/// so the next cycle logs in again. A reading is published to the data topic
/// whether or not the sink is reachable; only an append *failure* skips the
/// publish for that cycle.
pub struct Sampler<R, C, P> {
    reader: R,
    connector: C,
    publisher: P,
    interval: Arc<SamplingInterval>,
    sensor_retry: Duration,
    session: Option<Box<dyn RowAppender>>,
}

impl<R, C, P> Sampler<R, C, P>
where
    R: SensorReader,
    C: SheetConnector,
    P: ReadingPublisher,
{
    pub fn new(
        reader: R,
        connector: C,
        publisher: P,
        interval: Arc<SamplingInterval>,
        sensor_retry: Duration,
    ) -> Self {
        Self {
            reader,
            connector,
            publisher,
            interval,
            sensor_retry,
            session: None,
        }
    }

    /// Run cycles forever. Collaborator failures never terminate the loop.
    pub async fn run(&mut self) {
        loop {
            self.cycle().await;
        }
    }

    /// One full cycle, including its sleeps.
    pub async fn cycle(&mut self) -> CycleOutcome {
        // Log in if necessary; a failed login does not abort the cycle.
        if self.session.is_none() {
            match self.connector.connect().await {
                Ok(session) => {
                    info!("Sink session established");
                    self.session = Some(session);
                }
                Err(e) => {
                    warn!("Unable to log in and open the spreadsheet: {}", e);
                }
            }
        }

        // Timing-sensitive sensors misread under load; retry soon rather
        // than waiting out the full interval.
        let (humidity, temperature) = match self.reader.read().await {
            Ok(sample) => sample,
            Err(e) => {
                debug!("Sensor read failed ({}), retrying in {:?}", e, self.sensor_retry);
                tokio::time::sleep(self.sensor_retry).await;
                return CycleOutcome::SensorRetry;
            }
        };
        let reading = Reading::now(temperature, humidity);

        if let Some(session) = &self.session {
            if let Err(e) = session.append(&reading).await {
                // Most likely stale credentials: drop the session so the
                // next cycle logs in again.
                warn!("Append error ({}), logging in again next cycle", e);
                self.session = None;
                tokio::time::sleep(self.interval.get()).await;
                return CycleOutcome::AppendFailed;
            }
        }

        if let Err(e) = self.publisher.publish(&reading).await {
            warn!("Failed to publish reading: {}", e);
        }

        let outcome = if self.session.is_some() {
            CycleOutcome::Logged
        } else {
            CycleOutcome::PublishedWithoutSink
        };

        let sleep_for = self.interval.get();
        debug!("Sleeping for {}s", sleep_for.as_secs());
        tokio::time::sleep(sleep_for).await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PublishError, SensorError, SheetError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    struct ScriptedSensor {
        script: VecDeque<Result<(f32, f32), SensorError>>,
    }

    impl ScriptedSensor {
        fn new(script: Vec<Result<(f32, f32), SensorError>>) -> Self {
            Self {
                script: script.into(),
            }
        }

        fn always_ok() -> Self {
            Self::new(Vec::new())
        }
    }

    #[async_trait]
    impl SensorReader for ScriptedSensor {
        async fn read(&mut self) -> Result<(f32, f32), SensorError> {
            self.script.pop_front().unwrap_or(Ok((48.2, 21.5)))
        }
    }

    #[derive(Default)]
    struct SinkStats {
        logins: AtomicUsize,
        appends: AtomicUsize,
        fail_login: AtomicBool,
        fail_next_append: AtomicBool,
    }

    struct MockConnector {
        stats: Arc<SinkStats>,
    }

    struct MockAppender {
        stats: Arc<SinkStats>,
    }

    #[async_trait]
    impl SheetConnector for MockConnector {
        async fn connect(&self) -> Result<Box<dyn RowAppender>, SheetError> {
            self.stats.logins.fetch_add(1, Ordering::SeqCst);
            if self.stats.fail_login.load(Ordering::SeqCst) {
                return Err(SheetError::Api {
                    status: 503,
                    message: "service unavailable".to_string(),
                });
            }
            Ok(Box::new(MockAppender {
                stats: self.stats.clone(),
            }))
        }
    }

    #[async_trait]
    impl RowAppender for MockAppender {
        async fn append(&self, _reading: &Reading) -> Result<(), SheetError> {
            self.stats.appends.fetch_add(1, Ordering::SeqCst);
            if self.stats.fail_next_append.swap(false, Ordering::SeqCst) {
                return Err(SheetError::Auth("token expired".to_string()));
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingPublisher {
        published: Arc<Mutex<Vec<Reading>>>,
    }

    impl RecordingPublisher {
        fn count(&self) -> usize {
            self.published.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ReadingPublisher for RecordingPublisher {
        async fn publish(&self, reading: &Reading) -> Result<(), PublishError> {
            self.published.lock().unwrap().push(reading.clone());
            Ok(())
        }
    }

    const INTERVAL: u64 = 30;
    const RETRY: Duration = Duration::from_secs(2);

    fn sampler(
        sensor: ScriptedSensor,
    ) -> (
        Sampler<ScriptedSensor, MockConnector, RecordingPublisher>,
        Arc<SinkStats>,
        RecordingPublisher,
        Arc<SamplingInterval>,
    ) {
        let stats = Arc::new(SinkStats::default());
        let publisher = RecordingPublisher::default();
        let interval = Arc::new(SamplingInterval::new(INTERVAL).unwrap());
        let sampler = Sampler::new(
            sensor,
            MockConnector {
                stats: stats.clone(),
            },
            publisher.clone(),
            interval.clone(),
            RETRY,
        );
        (sampler, stats, publisher, interval)
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_cycle_appends_and_publishes() {
        let (mut sampler, stats, publisher, _) = sampler(ScriptedSensor::always_ok());

        let outcome = sampler.cycle().await;

        assert_eq!(outcome, CycleOutcome::Logged);
        assert_eq!(stats.logins.load(Ordering::SeqCst), 1);
        assert_eq!(stats.appends.load(Ordering::SeqCst), 1);
        assert_eq!(publisher.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sensor_failure_skips_append_and_publish() {
        let (mut sampler, stats, publisher, _) = sampler(ScriptedSensor::new(vec![Err(
            SensorError::Unreliable,
        )]));

        let start = Instant::now();
        let outcome = sampler.cycle().await;

        assert_eq!(outcome, CycleOutcome::SensorRetry);
        assert_eq!(stats.appends.load(Ordering::SeqCst), 0);
        assert_eq!(publisher.count(), 0);
        // Short backoff, not the full interval
        assert_eq!(start.elapsed(), RETRY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_sensor_failures_then_one_success() {
        let (mut sampler, stats, publisher, _) = sampler(ScriptedSensor::new(vec![
            Err(SensorError::Unreliable),
            Err(SensorError::Unreliable),
            Err(SensorError::Unreliable),
            Ok((48.2, 21.5)),
        ]));

        for _ in 0..3 {
            assert_eq!(sampler.cycle().await, CycleOutcome::SensorRetry);
        }
        assert_eq!(sampler.cycle().await, CycleOutcome::Logged);

        assert_eq!(stats.appends.load(Ordering::SeqCst), 1);
        assert_eq!(publisher.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_append_failure_drops_session_and_skips_publish() {
        let (mut sampler, stats, publisher, _) = sampler(ScriptedSensor::always_ok());
        stats.fail_next_append.store(true, Ordering::SeqCst);

        let start = Instant::now();
        let outcome = sampler.cycle().await;

        assert_eq!(outcome, CycleOutcome::AppendFailed);
        assert_eq!(publisher.count(), 0);
        // The failed cycle waits out the full interval before retrying
        assert_eq!(start.elapsed(), Duration::from_secs(INTERVAL));

        // Next cycle logs in again and recovers
        let outcome = sampler.cycle().await;
        assert_eq!(outcome, CycleOutcome::Logged);
        assert_eq!(stats.logins.load(Ordering::SeqCst), 2);
        assert_eq!(stats.appends.load(Ordering::SeqCst), 2);
        assert_eq!(publisher.count(), 1);
    }

    // A cycle whose login failed still publishes the reading to the data
    // topic; only the append is skipped until a login succeeds.
    #[tokio::test(start_paused = true)]
    async fn test_login_failure_still_publishes() {
        let (mut sampler, stats, publisher, _) = sampler(ScriptedSensor::always_ok());
        stats.fail_login.store(true, Ordering::SeqCst);

        let outcome = sampler.cycle().await;

        assert_eq!(outcome, CycleOutcome::PublishedWithoutSink);
        assert_eq!(stats.appends.load(Ordering::SeqCst), 0);
        assert_eq!(publisher.count(), 1);

        // Login is retried on the following cycle
        sampler.cycle().await;
        assert_eq!(stats.logins.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_applies_at_next_cycle_boundary() {
        let (mut sampler, _, _, interval) = sampler(ScriptedSensor::always_ok());

        // A control message arriving mid-sleep must not shorten the sleep
        // already in progress
        let setter = {
            let interval = interval.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(10)).await;
                assert!(interval.set(45));
            })
        };

        let start = Instant::now();
        sampler.cycle().await;
        assert_eq!(start.elapsed(), Duration::from_secs(INTERVAL));
        setter.await.unwrap();

        // The following cycle picks up the new value
        let start = Instant::now();
        sampler.cycle().await;
        assert_eq!(start.elapsed(), Duration::from_secs(45));
    }
}
