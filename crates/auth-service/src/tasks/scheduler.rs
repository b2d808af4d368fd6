//! Interval-driven background task scheduler.
//!
//! Tasks are registered as named closures with a fixed period; the
//! scheduler owns the timing loop so task bodies contain only their
//! actual work. Each task runs on its own loop with two guarantees:
//!
//! * No overlap: the next tick is not processed until the current
//!   execution finishes.
//! * Skip, not queue: ticks that elapse while an execution is in
//!   flight (or while the process was suspended) are dropped rather
//!   than replayed in a burst.
//!
//! A task that returns an error is logged and retried at the next
//! tick; it never takes the scheduler down.
//!
//! # Graceful Shutdown
//!
//! All task loops share a cancellation token. When the token is
//! cancelled, each loop finishes its current execution (if any) and
//! exits cleanly.

use crate::errors::ApiError;
use crate::observability::metrics::record_task_failure;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

type TaskFuture = Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send>>;
type TaskFn = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

struct ScheduledTask {
    name: &'static str,
    period: Duration,
    run: TaskFn,
}

/// Registry of periodic tasks. Build with [`Scheduler::new`], add
/// tasks with [`Scheduler::register`], then start all loops with
/// [`Scheduler::spawn`].
#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named task to run every `period`.
    ///
    /// The first execution happens one full period after startup, not
    /// immediately; anything that must run at boot belongs in startup
    /// code, not here.
    pub fn register<F, Fut>(&mut self, name: &'static str, period: Duration, task: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        self.tasks.push(ScheduledTask {
            name,
            period,
            run: Arc::new(move || Box::pin(task())),
        });
    }

    /// Spawn one loop per registered task. Returns the join handles so
    /// the caller can await clean exit after cancelling the token.
    pub fn spawn(self, cancel_token: CancellationToken) -> Vec<JoinHandle<()>> {
        self.tasks
            .into_iter()
            .map(|task| {
                let token = cancel_token.clone();
                tokio::spawn(run_task_loop(task, token))
            })
            .collect()
    }
}

#[instrument(skip_all, fields(task = task.name))]
async fn run_task_loop(task: ScheduledTask, cancel_token: CancellationToken) {
    info!(
        period_seconds = task.period.as_secs(),
        "Starting scheduled task"
    );

    let mut interval = tokio::time::interval(task.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The default interval fires immediately; push the first tick out
    // a full period.
    interval.reset();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                // Awaiting inline is what prevents overlap: a slow run
                // holds the loop, and Skip drops the ticks it missed.
                if let Err(e) = (task.run)().await {
                    record_task_failure(task.name);
                    error!(error = %e, "Scheduled task failed, will retry at next tick");
                }
            }
            _ = cancel_token.cancelled() => {
                info!("Scheduled task received shutdown signal, exiting");
                break;
            }
        }
    }

    info!("Scheduled task stopped");
}
