//! Task execution engine
//!
//! Submits one unit of work, then polls its status at a fixed cadence
//! until the task reaches a terminal state or the wall-clock deadline
//! passes.
//!
//! Dropping a wait future only stops local polling. The remote task is
//! never told to cancel and keeps running server-side; the same holds
//! after a `TASK_TIMEOUT`, and [`TaskEngine::wait`] can pick the task up
//! again later.

use crate::cloud::{Task, TaskStatus};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Anything that can report the current state of a remote task
pub trait TaskStatusSource: Send + Sync {
    fn task_status(&self, task_id: &str) -> impl Future<Output = Result<Task>> + Send;
}

impl<S: TaskStatusSource> TaskStatusSource for Arc<S> {
    fn task_status(&self, task_id: &str) -> impl Future<Output = Result<Task>> + Send {
        (**self).task_status(task_id)
    }
}

/// Drives submitted tasks to a terminal state.
///
/// The engine holds no per-task state, so one instance serves any number
/// of concurrent waits. The only suspension points are the status
/// requests and the inter-poll `tokio::time::sleep`.
#[derive(Debug, Clone)]
pub struct TaskEngine<S> {
    source: S,
    poll_interval: Duration,
    default_timeout: Duration,
}

impl<S: TaskStatusSource> TaskEngine<S> {
    pub fn new(source: S, poll_interval: Duration, default_timeout: Duration) -> Self {
        Self {
            source,
            poll_interval,
            default_timeout,
        }
    }

    /// Engine using the timing from an [`ApiConfig`]
    pub fn from_config(source: S, config: &ApiConfig) -> Self {
        Self::new(source, config.poll_interval, config.default_timeout)
    }

    /// Run `submit` once and wait for the task it created.
    ///
    /// `submit` must return the new task id. It is never re-invoked: a
    /// failed submission is returned as is and no polling happens.
    pub async fn submit_and_wait<F, Fut>(&self, submit: F, timeout: Option<Duration>) -> Result<Task>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let task_id = submit().await?;
        debug!(task_id = %task_id, "task submitted");
        self.wait(&task_id, timeout).await
    }

    /// Poll `task_id` until it completes, fails, or `timeout` elapses.
    ///
    /// The first poll happens immediately. The deadline is fixed when the
    /// call starts, so slow status requests shorten the remaining budget
    /// instead of extending it.
    pub async fn wait(&self, task_id: &str, timeout: Option<Duration>) -> Result<Task> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let start = Instant::now();
        let deadline = start.checked_add(timeout);
        let mut polls: u32 = 0;

        loop {
            let mut task = self.source.task_status(task_id).await?;
            polls += 1;

            if task.task_id.is_empty() {
                task.task_id = task_id.to_string();
            }

            debug!(
                task_id,
                status = ?task.status,
                progress = task.progress,
                polls,
                "polled task status"
            );

            match task.status {
                TaskStatus::Completed => {
                    info!(
                        task_id,
                        polls,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "task completed"
                    );
                    return Ok(task);
                }
                TaskStatus::Failed => {
                    let err = task.failure(task_id);
                    warn!(task_id, error = %err, "task failed");
                    return Err(err);
                }
                TaskStatus::Pending | TaskStatus::Processing | TaskStatus::Unknown => {}
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(task_id, timeout_secs = timeout.as_secs_f64(), polls, "task wait timed out");
                return Err(Error::TaskTimeout {
                    task_id: task_id.to_string(),
                    timeout,
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
