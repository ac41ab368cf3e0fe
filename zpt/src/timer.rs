//! Task timer state machine.
//!
//! One timer per process: Stopped, Running, or Paused. Elapsed time is
//! wall-clock time since start minus the sum of completed pauses. Every
//! transition talks to Zoho first and only mutates local state once the
//! remote call succeeds, so local and remote timers cannot drift apart
//! on a failed request.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use zoho_projects_api::endpoints::{BillStatus, PortalId, ProjectId, TaskId};

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("a timer is already running for \"{0}\"; stop it first")]
    AlreadyRunning(String),

    #[error("no timer is running")]
    NotRunning,

    #[error("the timer is already paused")]
    AlreadyPaused,

    #[error("the timer is not paused")]
    NotPaused,

    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

/// Time source seam; tests drive transitions with a controllable clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The task a timer runs against, with enough context to address the
/// timer and log endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub portal_id: PortalId,
    pub project_id: ProjectId,
    pub task_id: TaskId,
    pub task_name: String,
}

/// Time log derived from a stopped timer. Hours and minutes are the
/// elapsed time truncated to whole minutes; a sub-minute session logs
/// as 0:00.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLogEntry {
    pub task: TaskRef,
    pub work_date: NaiveDate,
    pub hours: u32,
    pub minutes: u32,
    pub bill_status: BillStatus,
    pub notes: Option<String>,
}

/// Remote side of each transition.
#[async_trait]
pub trait TimerRemote: Send + Sync {
    async fn start_timer(&self, task: &TaskRef) -> anyhow::Result<()>;
    async fn pause_timer(&self, task: &TaskRef) -> anyhow::Result<()>;
    async fn resume_timer(&self, task: &TaskRef) -> anyhow::Result<()>;
    async fn stop_timer(&self, task: &TaskRef) -> anyhow::Result<()>;
    async fn submit_log(&self, task: &TaskRef, entry: &TimeLogEntry) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Stopped,
    Running,
    Paused,
}

impl Display for TimerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerPhase::Stopped => f.write_str("stopped"),
            TimerPhase::Running => f.write_str("running"),
            TimerPhase::Paused => f.write_str("paused"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimerStatus {
    pub phase: TimerPhase,
    pub task: Option<TaskRef>,
    pub elapsed: Duration,
}

/// Persistable view of the timer, so a session can outlive the process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub task: Option<TaskRef>,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub paused_ms: i64,
}

impl TimerSnapshot {
    /// Status as of `now`, without a live timer. Lets callers report on
    /// a persisted session before wiring up a remote.
    pub fn status(&self, now: DateTime<Utc>) -> TimerStatus {
        let inner = Inner {
            task: self.task.clone(),
            started_at: self.started_at,
            paused_at: self.paused_at,
            paused: Duration::milliseconds(self.paused_ms),
        };
        TimerStatus {
            phase: inner.phase(),
            task: inner.task.clone(),
            elapsed: inner.elapsed(now),
        }
    }
}

#[derive(Debug, Clone)]
struct Inner {
    task: Option<TaskRef>,
    started_at: Option<DateTime<Utc>>,
    paused_at: Option<DateTime<Utc>>,
    paused: Duration,
}

impl Inner {
    fn cleared() -> Self {
        Self {
            task: None,
            started_at: None,
            paused_at: None,
            paused: Duration::zero(),
        }
    }

    fn phase(&self) -> TimerPhase {
        match (&self.task, self.paused_at) {
            (None, _) => TimerPhase::Stopped,
            (Some(_), Some(_)) => TimerPhase::Paused,
            (Some(_), None) => TimerPhase::Running,
        }
    }

    /// Elapsed net of pauses. While paused the value is frozen at the
    /// moment the pause began.
    fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::zero();
        };
        let end = self.paused_at.unwrap_or(now);
        let elapsed = (end - started_at) - self.paused;
        elapsed.max(Duration::zero())
    }
}

pub struct TaskTimer<R, C = SystemClock> {
    remote: R,
    clock: C,
    inner: Mutex<Inner>,
}

impl<R: TimerRemote, C: Clock> TaskTimer<R, C> {
    pub fn new(remote: R, clock: C) -> Self {
        Self {
            remote,
            clock,
            inner: Mutex::new(Inner::cleared()),
        }
    }

    pub fn restore(remote: R, clock: C, snapshot: TimerSnapshot) -> Self {
        Self {
            remote,
            clock,
            inner: Mutex::new(Inner {
                task: snapshot.task,
                started_at: snapshot.started_at,
                paused_at: snapshot.paused_at,
                paused: Duration::milliseconds(snapshot.paused_ms),
            }),
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let inner = self.lock();
        TimerSnapshot {
            task: inner.task.clone(),
            started_at: inner.started_at,
            paused_at: inner.paused_at,
            paused_ms: inner.paused.num_milliseconds(),
        }
    }

    pub fn status(&self) -> TimerStatus {
        let inner = self.lock();
        TimerStatus {
            phase: inner.phase(),
            task: inner.task.clone(),
            elapsed: inner.elapsed(self.clock.now()),
        }
    }

    pub fn elapsed(&self) -> Duration {
        let inner = self.lock();
        inner.elapsed(self.clock.now())
    }

    /// Start timing `task`. Starting over a paused timer for the same
    /// task resumes it; any other active timer is a rejection.
    pub async fn start(&self, task: TaskRef) -> Result<(), TimerError> {
        let resume_same_task = {
            let inner = self.lock();
            match &inner.task {
                None => false,
                Some(active) if inner.paused_at.is_some() && active.task_id == task.task_id => {
                    true
                }
                Some(active) => {
                    return Err(TimerError::AlreadyRunning(active.task_name.clone()));
                }
            }
        };
        if resume_same_task {
            return self.resume().await;
        }

        self.remote.start_timer(&task).await?;

        let mut inner = self.lock();
        tracing::info!(task = %task.task_name, "timer started");
        *inner = Inner {
            task: Some(task),
            started_at: Some(self.clock.now()),
            paused_at: None,
            paused: Duration::zero(),
        };
        Ok(())
    }

    pub async fn pause(&self) -> Result<(), TimerError> {
        let task = {
            let inner = self.lock();
            match (&inner.task, inner.paused_at) {
                (None, _) => return Err(TimerError::NotRunning),
                (Some(_), Some(_)) => return Err(TimerError::AlreadyPaused),
                (Some(task), None) => task.clone(),
            }
        };

        self.remote.pause_timer(&task).await?;

        let mut inner = self.lock();
        inner.paused_at = Some(self.clock.now());
        tracing::info!(task = %task.task_name, "timer paused");
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), TimerError> {
        let task = {
            let inner = self.lock();
            match (&inner.task, inner.paused_at) {
                (None, _) => return Err(TimerError::NotRunning),
                (Some(_), None) => return Err(TimerError::NotPaused),
                (Some(task), Some(_)) => task.clone(),
            }
        };

        self.remote.resume_timer(&task).await?;

        let mut inner = self.lock();
        if let Some(paused_at) = inner.paused_at.take() {
            inner.paused += self.clock.now() - paused_at;
        }
        tracing::info!(task = %task.task_name, "timer resumed");
        Ok(())
    }

    /// Stop the timer and log the elapsed time against the task.
    ///
    /// The local timer is only reset after both the remote stop and the
    /// log submission succeed; a failure leaves it intact so the user
    /// can retry without losing the session.
    pub async fn stop(&self, notes: Option<String>) -> Result<TimeLogEntry, TimerError> {
        let (task, entry) = {
            let inner = self.lock();
            let task = inner.task.clone().ok_or(TimerError::NotRunning)?;
            let now = self.clock.now();
            let total_minutes = inner.elapsed(now).num_minutes().max(0) as u32;
            let notes = notes.unwrap_or_else(|| format!("Worked on {}", task.task_name));
            let entry = TimeLogEntry {
                task: task.clone(),
                work_date: now.date_naive(),
                hours: total_minutes / 60,
                minutes: total_minutes % 60,
                bill_status: BillStatus::default(),
                notes: Some(notes),
            };
            (task, entry)
        };

        self.remote.stop_timer(&task).await?;
        self.remote.submit_log(&task, &entry).await?;

        let mut inner = self.lock();
        *inner = Inner::cleared();
        tracing::info!(
            task = %task.task_name,
            logged = %format!("{}:{:02}", entry.hours, entry.minutes),
            "timer stopped and time logged"
        );
        Ok(entry)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Render an elapsed duration as `HH:MM:SS`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_elapsed_renders_hours_minutes_seconds() {
        assert_eq!(format_elapsed(Duration::zero()), "00:00:00");
        assert_eq!(format_elapsed(Duration::seconds(59)), "00:00:59");
        assert_eq!(format_elapsed(Duration::seconds(3661)), "01:01:01");
        assert_eq!(format_elapsed(Duration::seconds(-5)), "00:00:00");
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = TimerSnapshot {
            task: Some(TaskRef {
                portal_id: PortalId::from(1),
                project_id: ProjectId::from(2),
                task_id: TaskId::from(3),
                task_name: "Write report".to_string(),
            }),
            started_at: Some(Utc::now()),
            paused_at: None,
            paused_ms: 12_000,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: TimerSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.task, snapshot.task);
        assert_eq!(restored.started_at, snapshot.started_at);
        assert_eq!(restored.paused_ms, 12_000);
    }
}
