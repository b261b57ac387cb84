//! Fixed-interval polling with an explicit tick and stop handle.
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::{Error, Result};

/// Counters for one polling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub seen: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// One unit of periodic work.
#[async_trait]
pub trait PollJob: Send {
    fn name(&self) -> &'static str;

    async fn poll(&mut self) -> Result<PassReport>;
}

#[derive(Debug)]
pub enum TickOutcome {
    Completed(PassReport),
    /// The pass stopped on a failure that was already logged where it happened.
    Handled(Error),
    Unexpected(String),
}

impl TickOutcome {
    /// Collapse the outcome back into a pass result.
    pub fn into_result(self) -> Result<PassReport> {
        match self {
            TickOutcome::Completed(report) => Ok(report),
            TickOutcome::Handled(err) => Err(err),
            TickOutcome::Unexpected(msg) => Err(Error::Unexpected(msg)),
        }
    }
}

pub struct Scheduler<J> {
    job: J,
    interval: Duration,
    cooldown: Duration,
}

impl<J: PollJob> Scheduler<J> {
    pub fn new(job: J, interval: Duration, cooldown: Duration) -> Self {
        Self {
            job,
            interval,
            cooldown,
        }
    }

    pub fn job(&self) -> &J {
        &self.job
    }

    /// Run a single pass. Panics inside the job are caught and reported as
    /// unexpected outcomes.
    pub async fn tick(&mut self) -> TickOutcome {
        let name = self.job.name();
        match AssertUnwindSafe(self.job.poll()).catch_unwind().await {
            Ok(Ok(report)) => {
                info!(
                    job = name,
                    seen = report.seen,
                    processed = report.processed,
                    skipped = report.skipped,
                    failed = report.failed,
                    "pass complete"
                );
                TickOutcome::Completed(report)
            }
            Ok(Err(err)) if err.is_handled() => {
                warn!(job = name, %err, "pass aborted");
                TickOutcome::Handled(err)
            }
            Ok(Err(err)) => {
                error!(job = name, %err, "unexpected error during pass");
                TickOutcome::Unexpected(err.to_string())
            }
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                error!(job = name, %msg, "pass panicked");
                TickOutcome::Unexpected(msg)
            }
        }
    }

    /// Pause before the next tick: the cooldown only follows unexpected outcomes.
    pub fn delay_after(&self, outcome: &TickOutcome) -> Duration {
        match outcome {
            TickOutcome::Completed(_) | TickOutcome::Handled(_) => self.interval,
            TickOutcome::Unexpected(_) => self.cooldown,
        }
    }

    /// Tick until `stop` flips to true. The job is handed back on return.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> J {
        info!(
            job = self.job.name(),
            interval_secs = self.interval.as_secs(),
            "starting polling loop"
        );
        while !*stop.borrow() {
            let outcome = self.tick().await;
            let delay = self.delay_after(&outcome);
            info!(job = self.job.name(), wait_secs = delay.as_secs(), "waiting before next pass");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!(job = self.job.name(), "polling loop stopped");
        self.job
    }
}

impl<J: PollJob + 'static> Scheduler<J> {
    /// Spawn the polling loop onto the runtime.
    pub fn start(self) -> RunningScheduler<J> {
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(self.run(stop_rx));
        RunningScheduler { stop_tx, handle }
    }
}

pub struct RunningScheduler<J> {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<J>,
}

impl<J> RunningScheduler<J> {
    /// Ask the loop to stop and wait for the pass in flight to finish.
    pub async fn stop(self) -> Result<J> {
        let _ = self.stop_tx.send(true);
        self.handle
            .await
            .map_err(|e| Error::Unexpected(format!("polling task failed: {e}")))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
