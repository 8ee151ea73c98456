//! Poll scheduler.
//!
//! Every registered [`PollJob`] gets its own ticker task. A job's `poll` is
//! synchronous and never overlaps itself; shutting down aborts the tickers,
//! which only takes effect between polls.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{error, info, warn};

#[cfg(test)]
mod tests;

/// Unit of periodic work
pub trait PollJob: Send + Sync {
    fn name(&self) -> &str;

    fn poll(&self) -> Result<()>;
}

/// Closure-backed job
pub struct FnJob<F> {
    name: String,
    f: F,
}

impl<F> FnJob<F>
where
    F: Fn() -> Result<()> + Send + Sync,
{
    pub fn new(name: &str, f: F) -> Self {
        Self {
            name: name.to_string(),
            f,
        }
    }
}

impl<F> PollJob for FnJob<F>
where
    F: Fn() -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&self) -> Result<()> {
        (self.f)()
    }
}

/// Shortest accepted poll interval; `tokio::time::interval` rejects zero
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

struct Registration {
    job: Arc<dyn PollJob>,
    every: Duration,
    initial_delay: Duration,
}

/// Collects jobs and their intervals before [`PollScheduler::start`].
#[derive(Default)]
pub struct PollScheduler {
    jobs: Vec<Registration>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `job`; an interval below [`MIN_INTERVAL`] is raised to it.
    pub fn add(&mut self, job: Arc<dyn PollJob>, every: Duration, initial_delay: Duration) -> &mut Self {
        if every < MIN_INTERVAL {
            warn!(
                job = %job.name(),
                interval_ms = every.as_millis() as u64,
                "Poll interval too short, using minimum"
            );
        }
        self.jobs.push(Registration {
            job,
            every: every.max(MIN_INTERVAL),
            initial_delay,
        });
        self
    }

    pub fn add_fn<F>(&mut self, name: &str, every: Duration, initial_delay: Duration, f: F) -> &mut Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.add(Arc::new(FnJob::new(name, f)), every, initial_delay)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Spawn one ticker task per job on the current runtime.
    pub fn start(self) -> SchedulerHandle {
        let tasks = self
            .jobs
            .into_iter()
            .map(|registration| {
                info!(
                    job = %registration.job.name(),
                    interval_ms = registration.every.as_millis() as u64,
                    initial_delay_ms = registration.initial_delay.as_millis() as u64,
                    "Scheduling poll job"
                );
                tokio::spawn(run_job(registration))
            })
            .collect();

        SchedulerHandle { tasks }
    }
}

async fn run_job(registration: Registration) {
    let Registration {
        job,
        every,
        initial_delay,
    } = registration;

    if !initial_delay.is_zero() {
        sleep(initial_delay).await;
    }

    let mut timer = interval(every);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        timer.tick().await;

        // Polls are synchronous, so an abort can only land between them
        if let Err(e) = job.poll() {
            error!(job = %job.name(), error = %e, "Poll job failed");
        }
    }
}

/// Running scheduler
pub struct SchedulerHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop scheduling new polls and wait for every ticker to exit.
    pub async fn shutdown(self) {
        info!(job_count = self.tasks.len(), "Stopping poll jobs");
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!(error = %e, "Poll task ended abnormally");
                }
            }
        }
        info!("Poll scheduler stopped");
    }
}
