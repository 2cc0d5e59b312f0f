//! Recurring registration scheduler
//!
//! Drives the registration controller on a fixed interval with a short
//! first-run delay. The hosting runtime guarantees at-least-once
//! invocation per interval but not mutual exclusion across overlapping
//! runs; the controller and registry are built to tolerate that, so the
//! loop simply fires ticks and logs their outcomes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use feedsync_core::{RegistrationController, TickOutcome};
use feedsync_domain::constants::{REGISTRATION_FIRST_RUN_DELAY, REGISTRATION_INTERVAL};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the registration scheduler
#[derive(Debug, Clone)]
pub struct RegistrationSchedulerConfig {
    /// Interval between reconciliation ticks
    pub interval: Duration,
    /// Delay before the first tick after arming the schedule
    pub first_run_delay: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for RegistrationSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: REGISTRATION_INTERVAL,
            first_run_delay: REGISTRATION_FIRST_RUN_DELAY,
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// A unit of work the scheduler fires once per interval.
///
/// The job result is observability only; a failed tick never fails the
/// schedule.
#[async_trait]
pub trait RegistrationJob: Send + Sync {
    /// Run one reconciliation tick
    async fn run(&self) -> TickOutcome;
}

#[async_trait]
impl RegistrationJob for RegistrationController {
    async fn run(&self) -> TickOutcome {
        self.handle_registration().await
    }
}

/// Recurring scheduler with explicit lifecycle management
pub struct RegistrationScheduler {
    job: Arc<dyn RegistrationJob>,
    config: RegistrationSchedulerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl RegistrationScheduler {
    /// Create a new scheduler for the given job
    pub fn new(job: Arc<dyn RegistrationJob>, config: RegistrationSchedulerConfig) -> Self {
        Self { job, config, cancellation: CancellationToken::new(), task_handle: None }
    }

    /// Arm the schedule, spawning the background task.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyRunning`] when already armed.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> SchedulerResult<()> {
        if self.is_scheduled() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(
            interval_secs = self.config.interval.as_secs(),
            first_run_delay_secs = self.config.first_run_delay.as_secs(),
            "Starting registration scheduler"
        );

        // Create a fresh cancellation token (supports restart after stop)
        self.cancellation = CancellationToken::new();

        let job = Arc::clone(&self.job);
        let config = self.config.clone();
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::tick_loop(job, config, cancel).await;
        });
        self.task_handle = Some(handle);

        info!("Registration scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the background task to finish.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NotRunning`] when not armed, or a
    /// timeout/join error when the task does not wind down.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_scheduled() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping registration scheduler");
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            let join_timeout = self.config.join_timeout;
            match tokio::time::timeout(join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(error = %err, "Scheduler task panicked");
                    return Err(SchedulerError::TaskJoinFailed(err.to_string()));
                }
                Err(_) => {
                    warn!("Scheduler task did not complete within timeout");
                    return Err(SchedulerError::Timeout { seconds: join_timeout.as_secs() });
                }
            }
        }

        info!("Registration scheduler stopped");
        Ok(())
    }

    /// Whether the recurring task is currently armed
    pub fn is_scheduled(&self) -> bool {
        self.task_handle.as_ref().map(|handle| !handle.is_finished()).unwrap_or(false)
    }

    async fn tick_loop(
        job: Arc<dyn RegistrationJob>,
        config: RegistrationSchedulerConfig,
        cancel: CancellationToken,
    ) {
        let mut delay = config.first_run_delay;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Registration tick loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(delay) => {
                    let outcome = job.run().await;
                    debug!(?outcome, "Registration tick completed");
                    delay = config.interval;
                }
            }
        }
    }
}

/// Ensure the background task is cancelled when dropped
impl Drop for RegistrationScheduler {
    fn drop(&mut self) {
        if self.is_scheduled() {
            warn!("RegistrationScheduler dropped while running; cancelling");
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingJob {
        ticks: AtomicUsize,
    }

    impl CountingJob {
        fn new() -> Self {
            Self { ticks: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl RegistrationJob for CountingJob {
        async fn run(&self) -> TickOutcome {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            TickOutcome::Registered
        }
    }

    fn fast_config() -> RegistrationSchedulerConfig {
        RegistrationSchedulerConfig {
            interval: Duration::from_millis(25),
            first_run_delay: Duration::from_millis(5),
            join_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn scheduler_lifecycle() {
        let job = Arc::new(CountingJob::new());
        let mut scheduler = RegistrationScheduler::new(job, fast_config());

        assert!(!scheduler.is_scheduled());

        scheduler.start().unwrap();
        assert!(scheduler.is_scheduled());

        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_scheduled());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn double_start_fails() {
        let job = Arc::new(CountingJob::new());
        let mut scheduler = RegistrationScheduler::new(job, fast_config());

        scheduler.start().unwrap();
        assert!(matches!(scheduler.start(), Err(SchedulerError::AlreadyRunning)));

        scheduler.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_without_start_fails() {
        let job = Arc::new(CountingJob::new());
        let mut scheduler = RegistrationScheduler::new(job, fast_config());

        let result = scheduler.stop().await;
        assert!(matches!(result, Err(SchedulerError::NotRunning)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn ticks_fire_after_first_run_delay() {
        let job = Arc::new(CountingJob::new());
        let mut scheduler = RegistrationScheduler::new(job.clone(), fast_config());

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        scheduler.stop().await.unwrap();

        assert!(job.ticks.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restart_after_stop_works() {
        let job = Arc::new(CountingJob::new());
        let mut scheduler = RegistrationScheduler::new(job.clone(), fast_config());

        scheduler.start().unwrap();
        scheduler.stop().await.unwrap();

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        scheduler.stop().await.unwrap();

        assert!(job.ticks.load(Ordering::SeqCst) >= 1);
    }
}
