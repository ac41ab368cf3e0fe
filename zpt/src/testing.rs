//! Test doubles for the timer: a controllable clock and a recording
//! remote with injectable failures.

use crate::timer::{Clock, TaskRef, TimeLogEntry, TimerRemote};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Starts at a fixed, readable instant.
    pub fn new() -> Self {
        let start = Utc.with_ymd_and_hms(2026, 8, 23, 9, 0, 0).single();
        Self {
            now: Arc::new(Mutex::new(start.unwrap_or_else(Utc::now))),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Records every remote call in order; individual operations can be made
/// to fail by name (`"start"`, `"pause"`, `"resume"`, `"stop"`, `"log"`).
#[derive(Clone, Default)]
pub struct MockRemote {
    calls: Arc<Mutex<Vec<String>>>,
    logs: Arc<Mutex<Vec<TimeLogEntry>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, operation: &str) {
        self.failing.lock().unwrap().insert(operation.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted_logs(&self) -> Vec<TimeLogEntry> {
        self.logs.lock().unwrap().clone()
    }

    fn record(&self, operation: &str) -> anyhow::Result<()> {
        if self.failing.lock().unwrap().contains(operation) {
            anyhow::bail!("injected {operation} failure");
        }
        self.calls.lock().unwrap().push(operation.to_string());
        Ok(())
    }
}

#[async_trait]
impl TimerRemote for MockRemote {
    async fn start_timer(&self, _task: &TaskRef) -> anyhow::Result<()> {
        self.record("start")
    }

    async fn pause_timer(&self, _task: &TaskRef) -> anyhow::Result<()> {
        self.record("pause")
    }

    async fn resume_timer(&self, _task: &TaskRef) -> anyhow::Result<()> {
        self.record("resume")
    }

    async fn stop_timer(&self, _task: &TaskRef) -> anyhow::Result<()> {
        self.record("stop")
    }

    async fn submit_log(&self, _task: &TaskRef, entry: &TimeLogEntry) -> anyhow::Result<()> {
        self.record("log")?;
        self.logs.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
