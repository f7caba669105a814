//! Background thread that drives a [`SessionMonitor`] at roughly 1 Hz.
//!
//! The thread is the only writer of the ledger files. Cancellation is
//! cooperative: the stop flag is checked once per iteration, so a stop can
//! take up to one tick interval to land.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::clock::{self, Session};
use crate::events::{Event, EventSink};
use crate::ledger::{RewardLedger, RewardRow};
use crate::notify::{self, Notification, Notifier};
use crate::probe::{self, SharedProbe};

use super::engine::{MonitorState, Outcome, SessionMonitor};

/// Points awarded per whole minute left on an early finish.
pub const POINTS_PER_EARLY_MINUTE: u64 = 10;

/// Knobs for the monitor loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Process to watch, matched case-insensitively.
    pub process_name: String,
    pub points_per_minute: u64,
    pub tick_interval: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            process_name: "Terraria.exe".into(),
            points_per_minute: POINTS_PER_EARLY_MINUTE,
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Collaborators shared by every session the application runs.
#[derive(Clone)]
pub struct MonitorContext {
    pub settings: MonitorSettings,
    pub probe: SharedProbe,
    pub ledger: RewardLedger,
    pub notifier: Arc<dyn Notifier>,
}

/// Cooperative cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A monitor thread in flight.
pub struct MonitorHandle {
    token: StopToken,
    thread: JoinHandle<MonitorState>,
}

impl MonitorHandle {
    pub fn token(&self) -> StopToken {
        self.token.clone()
    }

    /// Ask the loop to stop at its next iteration.
    pub fn stop(&self) {
        self.token.stop();
    }

    /// The loop has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the loop to exit and return its final state.
    pub fn join(self) -> MonitorState {
        self.thread.join().unwrap_or_else(|_| {
            tracing::error!("session monitor thread panicked");
            MonitorState::Stopped
        })
    }
}

/// Start monitoring `session` on a new thread.
pub fn spawn(
    session: Session,
    ctx: MonitorContext,
    sink: Box<dyn EventSink>,
) -> std::io::Result<MonitorHandle> {
    let token = StopToken::new();
    let thread_token = token.clone();
    let thread = thread::Builder::new()
        .name("session-monitor".into())
        .spawn(move || run(session, &ctx, sink.as_ref(), &thread_token))?;
    Ok(MonitorHandle { token, thread })
}

fn run(session: Session, ctx: &MonitorContext, sink: &dyn EventSink, token: &StopToken) -> MonitorState {
    let mut monitor = SessionMonitor::new(session, ctx.settings.points_per_minute);
    monitor.begin();

    let session = monitor.session().clone();
    tracing::info!(
        mode = session.mode(),
        planned_end = %session.planned_end(),
        process = %ctx.settings.process_name,
        "session started"
    );
    announce(
        ctx,
        sink,
        Notification::Started {
            mode: session.mode().to_string(),
            planned_end: session.planned_end(),
        },
    );

    while !token.is_stopped() {
        let now = clock::now();
        let report = monitor.tick(now, || probe::query(&ctx.probe, &ctx.settings.process_name));
        sink.emit(Event::tick(report.display_secs()));

        if let Some(minutes) = report.reminder {
            tracing::info!(minutes, "reminder");
            announce(ctx, sink, Notification::Reminder { minutes });
        }

        match report.outcome {
            Some(Outcome::TimeUp) => {
                tracing::info!("planned end reached");
                announce(ctx, sink, Notification::TimeUp);
                break;
            }
            Some(Outcome::EarlyFinish(reward)) => {
                let row = RewardRow {
                    session_start: session.start(),
                    mode: session.mode().to_string(),
                    planned_end: session.planned_end(),
                    actual_end: now,
                    early_minutes: reward.early_minutes,
                    points_awarded: reward.points,
                };
                let total_points = ctx.ledger.credit(&row);
                tracing::info!(
                    early_minutes = reward.early_minutes,
                    points = reward.points,
                    ?total_points,
                    "early finish"
                );
                announce(
                    ctx,
                    sink,
                    Notification::EarlyFinish {
                        early_minutes: reward.early_minutes,
                        points: reward.points,
                        total_points,
                    },
                );
                break;
            }
            None => {}
        }

        thread::sleep(ctx.settings.tick_interval);
    }

    if monitor.stop() {
        tracing::info!("session stopped");
    }
    let state = monitor.state();
    sink.emit(Event::tick(0));
    sink.emit(Event::finished(state));
    state
}

fn announce(ctx: &MonitorContext, sink: &dyn EventSink, notification: Notification) {
    notify::deliver(ctx.notifier.as_ref(), &notification);
    sink.emit(Event::notification(notification));
}
