//! Job poller
//!
//! [`Waiter::wait`] polls a [`Refresh`] source until the classifier reports a
//! terminal phase, the timeout elapses, or the [`Context`] is cancelled. The
//! poller never retries a failed fetch and never polls again once the
//! deadline has passed.

use crate::context::Context;
use crate::error::WaitError;
use crate::status::{Classify, Phase};
use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant};

/// Result of a single poll attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub status: String,
    pub payload: T,
}

impl<T> Snapshot<T> {
    pub fn new(status: impl Into<String>, payload: T) -> Self {
        Self {
            status: status.into(),
            payload,
        }
    }
}

/// Source of job status. `Ok(None)` means the observed object does not exist.
#[async_trait]
pub trait Refresh: Send + Sync {
    type Payload: Send;
    type Error: Send;

    async fn refresh(&self) -> Result<Option<Snapshot<Self::Payload>>, Self::Error>;
}

/// [`Refresh`] backed by an async closure.
pub struct FnRefresh<F>(F);

pub fn refresh_fn<F, Fut, T, E>(f: F) -> FnRefresh<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Snapshot<T>>, E>> + Send,
{
    FnRefresh(f)
}

#[async_trait]
impl<F, Fut, T, E> Refresh for FnRefresh<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Snapshot<T>>, E>> + Send,
    T: Send,
    E: Send,
{
    type Payload = T;
    type Error = E;

    async fn refresh(&self) -> Result<Option<Snapshot<T>>, E> {
        (self.0)().await
    }
}

/// Spacing between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollSchedule {
    Fixed(Duration),
    /// Doubles from `min` after every poll, capped at `max`.
    Backoff { min: Duration, max: Duration },
}

impl PollSchedule {
    /// Interval to sleep after the poll numbered `attempt` (zero based).
    pub fn interval(&self, attempt: u32) -> Duration {
        match *self {
            PollSchedule::Fixed(interval) => interval,
            PollSchedule::Backoff { min, max } => {
                let factor = 1u32 << attempt.min(16);
                min.saturating_mul(factor).min(max)
            }
        }
    }

    fn first(&self) -> Duration {
        self.interval(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitConfig {
    pub timeout: Duration,
    /// Sleep before the first poll.
    pub delay: Duration,
    pub schedule: PollSchedule,
    /// Consecutive "not found" polls tolerated before giving up.
    pub not_found_checks: u32,
    /// Consecutive target observations required before succeeding.
    pub continuous_target_occurrence: u32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            delay: Duration::ZERO,
            schedule: PollSchedule::Fixed(Duration::from_secs(10)),
            not_found_checks: 20,
            continuous_target_occurrence: 1,
        }
    }
}

impl WaitConfig {
    /// Short-lived job: 2s initial delay, then every 10s.
    pub fn job(timeout: Duration) -> Self {
        Self::default()
            .timeout(timeout)
            .delay(Duration::from_secs(2))
            .interval(Duration::from_secs(10))
    }

    /// Instance teardown: 60s initial delay, then every 20s.
    pub fn instance_delete(timeout: Duration) -> Self {
        Self::default()
            .timeout(timeout)
            .delay(Duration::from_secs(60))
            .interval(Duration::from_secs(20))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.schedule = PollSchedule::Fixed(interval);
        self
    }

    pub fn backoff(mut self, min: Duration, max: Duration) -> Self {
        self.schedule = PollSchedule::Backoff { min, max };
        self
    }

    pub fn not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    pub fn continuous_target_occurrence(mut self, occurrence: u32) -> Self {
        self.continuous_target_occurrence = occurrence;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        if self.schedule.first().is_zero() {
            return Err("poll interval must be greater than zero".to_string());
        }
        if let PollSchedule::Backoff { min, max } = self.schedule {
            if max < min {
                return Err(format!(
                    "maximum poll interval {:?} is below the minimum {:?}",
                    max, min
                ));
            }
        }
        if self.continuous_target_occurrence == 0 {
            return Err("continuous target occurrence must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Terminal success of a wait.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub job_id: String,
    /// Last observed status, `None` when the wait ended on absence.
    pub status: Option<String>,
    pub payload: Option<T>,
    pub polls: u32,
    pub elapsed: Duration,
}

impl<T> Outcome<T> {
    pub fn into_payload(self) -> Option<T> {
        self.payload
    }
}

/// Progress events emitted during a wait.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitEvent {
    Started {
        job_id: String,
    },
    Polled {
        job_id: String,
        status: Option<String>,
        attempt: u32,
        elapsed: Duration,
    },
    Completed {
        job_id: String,
        elapsed: Duration,
    },
    Failed {
        job_id: String,
        error: String,
    },
}

/// Callback for progress updates, e.g. to drive a spinner.
pub type ProgressCallback = Box<dyn Fn(WaitEvent) + Send + Sync>;

/// Polls a job until it reaches a terminal status under a caller-supplied
/// vocabulary.
pub struct Waiter<C> {
    config: WaitConfig,
    classifier: C,
    on_progress: Option<ProgressCallback>,
}

impl<C: Classify> Waiter<C> {
    pub fn new(config: WaitConfig, classifier: C) -> Self {
        Self {
            config,
            classifier,
            on_progress: None,
        }
    }

    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn config(&self) -> &WaitConfig {
        &self.config
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Blocks the calling task until the job identified by `job_id` reaches a
    /// terminal status, the timeout elapses or `ctx` is cancelled.
    pub async fn wait<R>(
        &self,
        ctx: &Context,
        job_id: &str,
        refresh: &R,
    ) -> Result<Outcome<R::Payload>, WaitError<R::Error>>
    where
        R: Refresh + ?Sized,
        R::Error: Display,
    {
        if job_id.is_empty() {
            return Err(WaitError::InvalidJobId);
        }
        self.config.validate().map_err(WaitError::InvalidConfig)?;

        let start = Instant::now();
        let deadline = start + self.config.timeout;
        let mut polls = 0u32;
        let mut not_found = 0u32;
        let mut target_hits = 0u32;
        let mut last_status: Option<String> = None;

        tracing::debug!(
            job_id,
            timeout = ?self.config.timeout,
            delay = ?self.config.delay,
            "Waiting for job"
        );
        self.emit(|| WaitEvent::Started {
            job_id: job_id.to_string(),
        });

        if !self.config.delay.is_zero() {
            self.pause(ctx, job_id, deadline, self.config.delay).await?;
        }

        loop {
            if Instant::now() >= deadline {
                return self.fail(WaitError::Timeout {
                    job_id: job_id.to_string(),
                    timeout: self.config.timeout,
                    last_status,
                });
            }

            let attempt = polls;
            polls += 1;

            let snapshot = tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    return self.fail(WaitError::Cancelled { job_id: job_id.to_string() });
                }
                _ = time::sleep_until(deadline) => {
                    return self.fail(WaitError::Timeout {
                        job_id: job_id.to_string(),
                        timeout: self.config.timeout,
                        last_status,
                    });
                }
                result = refresh.refresh() => match result {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        tracing::debug!(job_id, attempt, "Status refresh failed: {}", e);
                        return self.fail(WaitError::Refresh(e));
                    }
                },
            };

            let elapsed = start.elapsed();

            match snapshot {
                None => {
                    self.emit(|| WaitEvent::Polled {
                        job_id: job_id.to_string(),
                        status: None,
                        attempt,
                        elapsed,
                    });

                    if self.classifier.awaits_absence() {
                        tracing::info!(job_id, polls, ?elapsed, "Object is gone");
                        self.emit(|| WaitEvent::Completed {
                            job_id: job_id.to_string(),
                            elapsed,
                        });
                        return Ok(Outcome {
                            job_id: job_id.to_string(),
                            status: None,
                            payload: None,
                            polls,
                            elapsed,
                        });
                    }

                    not_found += 1;
                    target_hits = 0;
                    tracing::debug!(job_id, attempt, not_found, "Job not found");
                    if not_found > self.config.not_found_checks {
                        return self.fail(WaitError::NotFound {
                            job_id: job_id.to_string(),
                            checks: not_found,
                        });
                    }
                }
                Some(Snapshot { status, payload }) => {
                    not_found = 0;
                    let phase = self.classifier.classify(&status);
                    tracing::debug!(job_id, attempt, %status, ?phase, "Polled job status");
                    self.emit(|| WaitEvent::Polled {
                        job_id: job_id.to_string(),
                        status: Some(status.clone()),
                        attempt,
                        elapsed,
                    });

                    match phase {
                        Phase::Target => {
                            target_hits += 1;
                            if target_hits >= self.config.continuous_target_occurrence {
                                tracing::info!(job_id, %status, polls, ?elapsed, "Job completed");
                                self.emit(|| WaitEvent::Completed {
                                    job_id: job_id.to_string(),
                                    elapsed,
                                });
                                return Ok(Outcome {
                                    job_id: job_id.to_string(),
                                    status: Some(status),
                                    payload: Some(payload),
                                    polls,
                                    elapsed,
                                });
                            }
                        }
                        Phase::Failed => {
                            return self.fail(WaitError::Failed {
                                job_id: job_id.to_string(),
                                status,
                            });
                        }
                        Phase::Missing => {
                            return self.fail(WaitError::StatusNotFound {
                                job_id: job_id.to_string(),
                            });
                        }
                        Phase::Unknown => {
                            return self.fail(WaitError::UnexpectedStatus {
                                job_id: job_id.to_string(),
                                status,
                                expected: self.classifier.expected(),
                            });
                        }
                        Phase::Pending => {
                            target_hits = 0;
                        }
                    }

                    last_status = Some(status);
                }
            }

            let interval = self.config.schedule.interval(attempt);
            self.pause(ctx, job_id, deadline, interval).await?;
        }
    }

    /// Sleeps for `duration`, clipped to `deadline`, unless `ctx` is cancelled first.
    async fn pause<E: Display>(
        &self,
        ctx: &Context,
        job_id: &str,
        deadline: Instant,
        duration: Duration,
    ) -> Result<(), WaitError<E>> {
        let wake = (Instant::now() + duration).min(deadline);
        tokio::select! {
            biased;
            _ = ctx.cancelled() => self.fail(WaitError::Cancelled { job_id: job_id.to_string() }),
            _ = time::sleep_until(wake) => Ok(()),
        }
    }

    fn fail<T, E: Display>(&self, err: WaitError<E>) -> Result<T, WaitError<E>> {
        tracing::debug!("Wait ended: {}", err);
        if let Some(cb) = &self.on_progress {
            cb(WaitEvent::Failed {
                job_id: err.job_id().unwrap_or_default().to_string(),
                error: err.to_string(),
            });
        }
        Err(err)
    }

    fn emit(&self, event: impl FnOnce() -> WaitEvent) {
        if let Some(cb) = &self.on_progress {
            cb(event());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(WaitConfig::default().validate().is_ok());
    }

    #[test]
    fn presets_keep_their_timings() {
        let job = WaitConfig::job(Duration::from_secs(300));
        assert_eq!(job.timeout, Duration::from_secs(300));
        assert_eq!(job.delay, Duration::from_secs(2));
        assert_eq!(job.schedule, PollSchedule::Fixed(Duration::from_secs(10)));

        let delete = WaitConfig::instance_delete(Duration::from_secs(1800));
        assert_eq!(delete.delay, Duration::from_secs(60));
        assert_eq!(delete.schedule, PollSchedule::Fixed(Duration::from_secs(20)));
    }

    #[test]
    fn validation_rejects_zero_values() {
        let err = WaitConfig::default().timeout(Duration::ZERO).validate();
        assert!(err.unwrap_err().contains("timeout"));

        let err = WaitConfig::default().interval(Duration::ZERO).validate();
        assert!(err.unwrap_err().contains("poll interval"));

        let err = WaitConfig::default()
            .continuous_target_occurrence(0)
            .validate();
        assert!(err.unwrap_err().contains("occurrence"));

        let err = WaitConfig::default()
            .backoff(Duration::from_secs(10), Duration::from_secs(1))
            .validate();
        assert!(err.unwrap_err().contains("minimum"));
    }

    #[test]
    fn backoff_doubles_until_capped() {
        let schedule = PollSchedule::Backoff {
            min: Duration::from_secs(1),
            max: Duration::from_secs(10),
        };
        assert_eq!(schedule.interval(0), Duration::from_secs(1));
        assert_eq!(schedule.interval(1), Duration::from_secs(2));
        assert_eq!(schedule.interval(3), Duration::from_secs(8));
        assert_eq!(schedule.interval(4), Duration::from_secs(10));
        assert_eq!(schedule.interval(40), Duration::from_secs(10));
    }

    #[test]
    fn fixed_schedule_ignores_attempt() {
        let schedule = PollSchedule::Fixed(Duration::from_secs(20));
        assert_eq!(schedule.interval(0), schedule.interval(9));
    }
}
