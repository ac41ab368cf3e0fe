//! Timer state machine scenarios: elapsed accounting across pauses,
//! transition ordering against the remote, and log derivation.

use chrono::Duration;
use zoho_projects_api::endpoints::{BillStatus, PortalId, ProjectId, TaskId};
use zpt::testing::{MockClock, MockRemote};
use zpt::timer::{format_elapsed, TaskRef, TaskTimer, TimerError, TimerPhase};

fn task() -> TaskRef {
    TaskRef {
        portal_id: PortalId::from(1),
        project_id: ProjectId::from(2),
        task_id: TaskId::from(3),
        task_name: "Write report".to_string(),
    }
}

fn timer() -> (TaskTimer<MockRemote, MockClock>, MockRemote, MockClock) {
    let remote = MockRemote::new();
    let clock = MockClock::new();
    let timer = TaskTimer::new(remote.clone(), clock.clone());
    (timer, remote, clock)
}

#[tokio::test]
async fn elapsed_is_zero_immediately_after_start() {
    let (timer, _, _) = timer();
    timer.start(task()).await.unwrap();

    let status = timer.status();
    assert_eq!(status.phase, TimerPhase::Running);
    assert_eq!(status.elapsed, Duration::zero());
}

#[tokio::test]
async fn pause_freezes_elapsed_until_resume() {
    let (timer, _, clock) = timer();
    timer.start(task()).await.unwrap();

    clock.advance(Duration::seconds(5));
    timer.pause().await.unwrap();
    assert_eq!(timer.elapsed(), Duration::seconds(5));

    // Time passing while paused does not count.
    clock.advance(Duration::seconds(60));
    assert_eq!(timer.elapsed(), Duration::seconds(5));
    assert_eq!(timer.status().phase, TimerPhase::Paused);

    timer.resume().await.unwrap();
    clock.advance(Duration::seconds(3));
    assert_eq!(timer.elapsed(), Duration::seconds(8));
}

#[tokio::test]
async fn stop_logs_elapsed_net_of_pauses_truncated_to_minutes() {
    let (timer, remote, clock) = timer();
    timer.start(task()).await.unwrap();

    // Run 10s, pause for 5s, run 10s more: 20s of tracked work.
    clock.advance(Duration::seconds(10));
    timer.pause().await.unwrap();
    clock.advance(Duration::seconds(5));
    timer.resume().await.unwrap();
    clock.advance(Duration::seconds(10));

    let entry = timer.stop(Some("daily report".to_string())).await.unwrap();

    // Sub-minute sessions truncate to a 0:00 log, dated by the clock.
    assert_eq!((entry.hours, entry.minutes), (0, 0));
    assert_eq!(
        entry.work_date,
        chrono::NaiveDate::from_ymd_opt(2026, 8, 23).unwrap()
    );
    assert_eq!(entry.bill_status, BillStatus::Billable);
    assert_eq!(entry.notes.as_deref(), Some("daily report"));
    assert_eq!(entry.task, task());

    assert_eq!(timer.status().phase, TimerPhase::Stopped);
    assert_eq!(remote.calls(), ["start", "pause", "resume", "stop", "log"]);
    assert_eq!(remote.submitted_logs(), [entry]);
}

#[tokio::test]
async fn long_session_logs_hours_and_minutes() {
    let (timer, remote, clock) = timer();
    timer.start(task()).await.unwrap();

    clock.advance(Duration::minutes(95) + Duration::seconds(59));
    let entry = timer.stop(None).await.unwrap();

    assert_eq!((entry.hours, entry.minutes), (1, 35));
    // No caller notes: a note is generated from the task name.
    assert_eq!(entry.notes.as_deref(), Some("Worked on Write report"));
    assert_eq!(remote.submitted_logs().len(), 1);
}

#[tokio::test]
async fn starting_over_a_running_timer_is_rejected() {
    let (timer, remote, _) = timer();
    timer.start(task()).await.unwrap();

    // Same task or a different one, a second start is refused.
    let err = timer.start(task()).await.unwrap_err();
    assert!(matches!(err, TimerError::AlreadyRunning(ref name) if name == "Write report"));

    let mut other = task();
    other.task_id = TaskId::from(99);
    other.task_name = "Other".to_string();
    assert!(matches!(
        timer.start(other).await,
        Err(TimerError::AlreadyRunning(_))
    ));

    // The rejected attempts never reached the remote.
    assert_eq!(remote.calls(), ["start"]);
}

#[tokio::test]
async fn starting_the_same_task_while_paused_resumes_it() {
    let (timer, remote, clock) = timer();
    timer.start(task()).await.unwrap();

    clock.advance(Duration::seconds(10));
    timer.pause().await.unwrap();
    clock.advance(Duration::seconds(30));

    timer.start(task()).await.unwrap();
    assert_eq!(timer.status().phase, TimerPhase::Running);
    assert_eq!(timer.elapsed(), Duration::seconds(10));
    assert_eq!(remote.calls(), ["start", "pause", "resume"]);
}

#[tokio::test]
async fn transitions_require_the_right_phase() {
    let (timer, _, _) = timer();

    assert!(matches!(timer.pause().await, Err(TimerError::NotRunning)));
    assert!(matches!(timer.resume().await, Err(TimerError::NotRunning)));
    assert!(matches!(timer.stop(None).await, Err(TimerError::NotRunning)));

    timer.start(task()).await.unwrap();
    assert!(matches!(timer.resume().await, Err(TimerError::NotPaused)));

    timer.pause().await.unwrap();
    assert!(matches!(timer.pause().await, Err(TimerError::AlreadyPaused)));
}

#[tokio::test]
async fn failed_remote_start_leaves_the_timer_stopped() {
    let (timer, remote, _) = timer();
    remote.fail("start");

    assert!(matches!(
        timer.start(task()).await,
        Err(TimerError::Remote(_))
    ));
    assert_eq!(timer.status().phase, TimerPhase::Stopped);
}

#[tokio::test]
async fn failed_log_submission_keeps_the_session_for_retry() {
    let (timer, remote, clock) = timer();
    timer.start(task()).await.unwrap();
    clock.advance(Duration::minutes(2));

    remote.fail("log");
    assert!(matches!(timer.stop(None).await, Err(TimerError::Remote(_))));

    // Nothing was reset, so the elapsed time is still there to retry.
    assert_eq!(timer.status().phase, TimerPhase::Running);
    assert_eq!(timer.elapsed(), Duration::minutes(2));
}

#[tokio::test]
async fn snapshot_restores_a_running_session() {
    let (timer, _, clock) = timer();
    timer.start(task()).await.unwrap();
    clock.advance(Duration::seconds(30));

    let snapshot = timer.snapshot();
    let restored = TaskTimer::restore(MockRemote::new(), clock.clone(), snapshot);

    assert_eq!(restored.status().phase, TimerPhase::Running);
    assert_eq!(restored.elapsed(), Duration::seconds(30));
    assert_eq!(format_elapsed(restored.elapsed()), "00:00:30");
}
