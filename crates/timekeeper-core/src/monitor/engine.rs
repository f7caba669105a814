//! Session monitor state machine.
//!
//! Like the rest of the core, the engine has no thread of its own: the
//! caller decides when to `tick()` and what time it is. The runner in
//! [`super::runner`] drives it once per second.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Completed | EarlyFinished | Stopped)
//! ```
//!
//! ## One tick
//!
//! 1. remaining = planned end - now
//! 2. remaining <= 0: time is up, nothing else is checked
//! 3. at most one reminder whose band contains `remaining` and has not fired
//! 4. probe the process; running -> not running with a whole minute or more
//!    left is an early finish

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::clock::Session;

/// Reminder thresholds in minutes before the planned end.
pub const REMINDER_MINUTES: [u8; 3] = [5, 3, 1];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Idle,
    Running,
    /// Planned end reached.
    Completed,
    /// Game closed before the planned end; points awarded.
    EarlyFinished,
    /// Cancelled by the user.
    Stopped,
}

impl MonitorState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MonitorState::Completed | MonitorState::EarlyFinished | MonitorState::Stopped
        )
    }
}

/// Reward for closing the game before the planned end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarlyFinish {
    pub early_minutes: u64,
    pub points: u64,
}

/// Why a tick ended the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    TimeUp,
    EarlyFinish(EarlyFinish),
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Seconds until the planned end; negative once it has passed.
    pub remaining_secs: f64,
    /// Reminder that fired on this tick, in minutes.
    pub reminder: Option<u8>,
    pub outcome: Option<Outcome>,
}

impl TickReport {
    /// Whole seconds left, clamped at zero, for display.
    pub fn display_secs(&self) -> u64 {
        self.remaining_secs.max(0.0) as u64
    }
}

/// `(lower, upper]` band in seconds during which the `minutes` reminder fires.
pub fn reminder_band(minutes: u8) -> (f64, f64) {
    let upper = f64::from(minutes) * 60.0;
    (upper - 60.0, upper)
}

/// Points for an early finish: `floor(remaining / 60) * points_per_minute`.
///
/// `None` when less than a whole minute was left.
pub fn early_finish_reward(remaining_secs: f64, points_per_minute: u64) -> Option<EarlyFinish> {
    if remaining_secs < 60.0 {
        return None;
    }
    let early_minutes = (remaining_secs / 60.0).floor() as u64;
    Some(EarlyFinish {
        early_minutes,
        points: early_minutes.saturating_mul(points_per_minute),
    })
}

/// Monitor for a single session.
#[derive(Debug, Clone)]
pub struct SessionMonitor {
    session: Session,
    state: MonitorState,
    /// Reminders already shown this session.
    fired: BTreeSet<u8>,
    /// Sticky: the game was seen running at least once.
    seen_running: bool,
    points_per_minute: u64,
}

impl SessionMonitor {
    pub fn new(session: Session, points_per_minute: u64) -> Self {
        Self {
            session,
            state: MonitorState::Idle,
            fired: BTreeSet::new(),
            seen_running: false,
            points_per_minute,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn fired_reminders(&self) -> &BTreeSet<u8> {
        &self.fired
    }

    pub fn seen_running(&self) -> bool {
        self.seen_running
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Idle -> Running. Returns false if the monitor was not idle.
    pub fn begin(&mut self) -> bool {
        if self.state != MonitorState::Idle {
            return false;
        }
        self.state = MonitorState::Running;
        true
    }

    /// Running -> Stopped. Returns false if the session was not running.
    pub fn stop(&mut self) -> bool {
        if self.state != MonitorState::Running {
            return false;
        }
        self.state = MonitorState::Stopped;
        true
    }

    /// Advance the session to `now`.
    ///
    /// `process_running` is only consulted when the session is still running
    /// after the time-up check.
    pub fn tick(
        &mut self,
        now: NaiveDateTime,
        process_running: impl FnOnce() -> bool,
    ) -> TickReport {
        let remaining_secs = self.session.remaining_secs(now);
        let mut report = TickReport {
            remaining_secs,
            reminder: None,
            outcome: None,
        };
        if self.state != MonitorState::Running {
            return report;
        }

        if remaining_secs <= 0.0 {
            self.state = MonitorState::Completed;
            report.outcome = Some(Outcome::TimeUp);
            return report;
        }

        // Bands are disjoint, so at most one reminder can match.
        report.reminder = REMINDER_MINUTES.into_iter().find(|&m| {
            let (lower, upper) = reminder_band(m);
            remaining_secs > lower && remaining_secs <= upper && !self.fired.contains(&m)
        });
        if let Some(m) = report.reminder {
            self.fired.insert(m);
        }

        let running = process_running();
        if running {
            self.seen_running = true;
        } else if self.seen_running {
            if let Some(reward) = early_finish_reward(remaining_secs, self.points_per_minute) {
                self.state = MonitorState::EarlyFinished;
                report.outcome = Some(Outcome::EarlyFinish(reward));
            }
        }

        report
    }
}
