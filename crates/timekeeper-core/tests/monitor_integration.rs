//! Integration tests for the threaded session monitor.
//!
//! Each test runs a real monitor thread with a millisecond tick interval,
//! a scripted process probe and a ledger in a temp directory.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tempfile::TempDir;
use timekeeper_core::clock;
use timekeeper_core::monitor::{self, MonitorContext, MonitorSettings};
use timekeeper_core::probe::{self, ProcessProbe};
use timekeeper_core::{
    Event, LedgerPaths, ModeConfig, MonitorState, Notification, Notifier, NotifyError,
    RewardLedger, Session, Timekeeper,
};

/// Replays a fixed sequence of answers, then repeats the last one.
struct ScriptedProbe {
    answers: VecDeque<bool>,
    last: bool,
}

impl ScriptedProbe {
    fn new(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            last: false,
        }
    }
}

impl ProcessProbe for ScriptedProbe {
    fn is_running(&mut self, _name: &str) -> bool {
        if let Some(next) = self.answers.pop_front() {
            self.last = next;
        }
        self.last
    }
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Notification>>>);

impl Recorder {
    fn seen(&self) -> Vec<Notification> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for Recorder {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.0.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

struct Unavailable;

impl Notifier for Unavailable {
    fn notify(&self, _: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Unavailable("no display".into()))
    }
}

fn context(dir: &TempDir, probe: ScriptedProbe, notifier: Arc<dyn Notifier>) -> MonitorContext {
    MonitorContext {
        settings: MonitorSettings {
            process_name: "Game.exe".into(),
            tick_interval: Duration::from_millis(5),
            ..MonitorSettings::default()
        },
        probe: probe::shared(probe),
        ledger: RewardLedger::new(LedgerPaths::in_dir(dir.path())),
        notifier,
    }
}

fn finished_state(events: &[Event]) -> Option<MonitorState> {
    match events.last() {
        Some(Event::Finished { state, .. }) => Some(*state),
        _ => None,
    }
}

#[test]
fn test_early_finish_awards_points_and_logs_row() {
    let dir = TempDir::new().unwrap();
    let recorder = Recorder::default();
    let ctx = context(&dir, ScriptedProbe::new(&[true, false]), Arc::new(recorder.clone()));
    let ledger = ctx.ledger.clone();

    let session = Session::for_duration(0, 30, 0, clock::now()).unwrap();
    let (tx, rx) = mpsc::channel();
    let handle = monitor::spawn(session, ctx, Box::new(tx)).unwrap();

    assert_eq!(handle.join(), MonitorState::EarlyFinished);
    let events: Vec<Event> = rx.try_iter().collect();
    assert_eq!(finished_state(&events), Some(MonitorState::EarlyFinished));

    // Display is reset right before the final event.
    assert!(matches!(
        events[events.len() - 2],
        Event::Tick { remaining_secs: 0, .. }
    ));

    let seen = recorder.seen();
    assert!(matches!(seen.first(), Some(Notification::Started { .. })));
    assert_eq!(
        seen.last(),
        Some(&Notification::EarlyFinish {
            early_minutes: 29,
            points: 290,
            total_points: Some(290),
        })
    );

    let rows = ledger.rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].early_minutes, 29);
    assert_eq!(rows[0].points_awarded, 290);
    assert_eq!(rows[0].mode, "duration 0h 30m 0s");
    assert_eq!(ledger.total_points(), 290);
}

#[test]
fn test_total_is_sum_of_awards_across_sessions() {
    let dir = TempDir::new().unwrap();
    let ledger = RewardLedger::new(LedgerPaths::in_dir(dir.path()));

    for minutes in [10, 20] {
        let ctx = context(&dir, ScriptedProbe::new(&[true, false]), Arc::new(Recorder::default()));
        let session = Session::for_duration(0, minutes, 0, clock::now()).unwrap();
        let handle = monitor::spawn(session, ctx, Box::new(timekeeper_core::events::NullSink)).unwrap();
        assert_eq!(handle.join(), MonitorState::EarlyFinished);
    }

    let rows = ledger.rows().unwrap();
    let sum: u64 = rows.iter().map(|r| r.points_awarded).sum();
    assert_eq!(rows.len(), 2);
    assert_eq!(sum, 90 + 190);
    assert_eq!(ledger.total_points(), sum);
}

#[test]
fn test_time_up_with_process_running_gives_no_reward() {
    let dir = TempDir::new().unwrap();
    let recorder = Recorder::default();
    let ctx = context(&dir, ScriptedProbe::new(&[true]), Arc::new(recorder.clone()));
    let ledger = ctx.ledger.clone();

    let now = clock::now();
    let session = Session::new(now - ChronoDuration::minutes(30), now - ChronoDuration::seconds(1), "test");
    let (tx, rx) = mpsc::channel();
    let handle = monitor::spawn(session, ctx, Box::new(tx)).unwrap();

    assert_eq!(handle.join(), MonitorState::Completed);
    let events: Vec<Event> = rx.try_iter().collect();
    assert_eq!(finished_state(&events), Some(MonitorState::Completed));
    assert_eq!(recorder.seen().last(), Some(&Notification::TimeUp));
    assert!(ledger.rows().unwrap().is_empty());
    assert_eq!(ledger.total_points(), 0);
}

#[test]
fn test_stop_request_ends_loop() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, ScriptedProbe::new(&[true]), Arc::new(Recorder::default()));

    let session = Session::for_duration(1, 0, 0, clock::now()).unwrap();
    let (tx, rx) = mpsc::channel();
    let handle = monitor::spawn(session, ctx, Box::new(tx)).unwrap();

    // Let it tick a few times first.
    let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(first, Event::Notification { notification: Notification::Started { .. }, .. }));
    handle.stop();
    assert_eq!(handle.join(), MonitorState::Stopped);

    let events: Vec<Event> = rx.try_iter().collect();
    assert_eq!(finished_state(&events), Some(MonitorState::Stopped));
}

#[test]
fn test_failed_notifications_do_not_abort_session() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, ScriptedProbe::new(&[true, false]), Arc::new(Unavailable));
    let ledger = ctx.ledger.clone();

    let session = Session::for_duration(0, 5, 0, clock::now()).unwrap();
    let handle = monitor::spawn(session, ctx, Box::new(timekeeper_core::events::NullSink)).unwrap();

    assert_eq!(handle.join(), MonitorState::EarlyFinished);
    assert_eq!(ledger.total_points(), 40);
}

#[test]
fn test_process_never_seen_keeps_counting() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, ScriptedProbe::new(&[false]), Arc::new(Recorder::default()));

    let session = Session::for_duration(0, 0, 1, clock::now()).unwrap();
    let handle = monitor::spawn(session, ctx, Box::new(timekeeper_core::events::NullSink)).unwrap();

    assert_eq!(handle.join(), MonitorState::Completed);
}

#[test]
fn test_timekeeper_runs_one_session_at_a_time() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, ScriptedProbe::new(&[true]), Arc::new(Recorder::default()));
    let mut timekeeper = Timekeeper::new(ctx);

    let (tx, rx) = mpsc::channel();
    let handle = timekeeper.start(&ModeConfig::duration("0", "30", "0"), tx).unwrap();
    assert_eq!(handle.session().total_secs(), 1800);
    assert!(timekeeper.is_running());
    assert!(timekeeper.process_running());

    let err = timekeeper
        .start(&ModeConfig::duration("0", "10", "0"), timekeeper_core::events::NullSink)
        .unwrap_err();
    assert!(matches!(err, timekeeper_core::CoreError::AlreadyRunning));

    handle.stop();
    assert_eq!(timekeeper.wait(), Some(MonitorState::Stopped));
    let events: Vec<Event> = rx.try_iter().collect();
    assert_eq!(finished_state(&events), Some(MonitorState::Stopped));
}

#[test]
fn test_five_minute_reminder_reaches_notifier_and_events() {
    let dir = TempDir::new().unwrap();
    let recorder = Recorder::default();
    let ctx = context(&dir, ScriptedProbe::new(&[false]), Arc::new(recorder.clone()));

    // Inside the five-minute band from the first tick onwards.
    let now = clock::now();
    let session = Session::new(now - ChronoDuration::minutes(25), now + ChronoDuration::seconds(290), "test");
    let (tx, rx) = mpsc::channel();
    let handle = monitor::spawn(session, ctx, Box::new(tx)).unwrap();

    // The reminder is announced right after the first tick; keep ticking well past it.
    let mut events = Vec::new();
    let mut ticks = 0;
    while ticks < 20 {
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        if matches!(event, Event::Tick { .. }) {
            ticks += 1;
        }
        events.push(event);
    }
    handle.stop();
    assert_eq!(handle.join(), MonitorState::Stopped);
    events.extend(rx.try_iter());

    let reminders: Vec<Notification> = recorder
        .seen()
        .into_iter()
        .filter(|n| matches!(n, Notification::Reminder { .. }))
        .collect();
    assert_eq!(reminders, vec![Notification::Reminder { minutes: 5 }]);

    let reminder_events = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                Event::Notification { notification: Notification::Reminder { minutes: 5 }, .. }
            )
        })
        .count();
    assert_eq!(reminder_events, 1);
    assert_eq!(finished_state(&events), Some(MonitorState::Stopped));
}

#[test]
fn test_thirty_minute_session_closed_after_twenty_five_minutes() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, ScriptedProbe::new(&[true, false]), Arc::new(Recorder::default()));
    let ledger = ctx.ledger.clone();

    // Five minutes left, plus slack so tick jitter cannot drop a whole minute.
    let now = clock::now();
    let session = Session::new(
        now - ChronoDuration::minutes(25),
        now + ChronoDuration::minutes(5) + ChronoDuration::seconds(30),
        "duration 0h 30m 0s",
    );
    let handle = monitor::spawn(session, ctx, Box::new(timekeeper_core::events::NullSink)).unwrap();
    assert_eq!(handle.join(), MonitorState::EarlyFinished);

    let rows = ledger.rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].early_minutes, 5);
    assert_eq!(rows[0].points_awarded, 50);
    assert_eq!(ledger.total_points(), 50);
}
