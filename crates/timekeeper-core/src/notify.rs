//! User-facing alerts and the notifier seam.
//!
//! Delivery is fire-and-forget: [`deliver`] logs a failed notification and
//! moves on.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A session began.
    Started {
        mode: String,
        planned_end: NaiveDateTime,
    },
    /// `minutes` remain before the planned end.
    Reminder { minutes: u8 },
    /// The planned end was reached.
    TimeUp,
    /// The game closed early and points were awarded.
    EarlyFinish {
        early_minutes: u64,
        points: u64,
        /// `None` when the total could not be updated.
        total_points: Option<u64>,
    },
}

impl Notification {
    pub fn title(&self) -> &'static str {
        match self {
            Notification::Started { .. } => "Timekeeper",
            Notification::Reminder { .. } => "Reminder",
            Notification::TimeUp => "Time's up!",
            Notification::EarlyFinish { .. } => "Early finish reward",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notification::Started { mode, planned_end } => {
                format!("Timer started: {mode} (ends {})", planned_end.format("%H:%M:%S"))
            }
            Notification::Reminder { minutes: 1 } => {
                "1 minute remaining - prepare to save and close the game".to_string()
            }
            Notification::Reminder { minutes } => {
                format!("{minutes} minutes remaining - prepare to save and close the game")
            }
            Notification::TimeUp => {
                "Your planned play time has ended. Please save and close the game now.".to_string()
            }
            Notification::EarlyFinish {
                early_minutes,
                points,
                total_points,
            } => {
                let mut msg = format!("Finished {early_minutes} minutes early! +{points} points");
                if let Some(total) = total_points {
                    msg.push_str(&format!(" (total {total})"));
                }
                msg
            }
        }
    }
}

/// Displays notifications to the user (toast, popup, terminal, ...).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Send `notification`, logging instead of failing.
pub fn deliver(notifier: &dyn Notifier, notification: &Notification) {
    if let Err(e) = notifier.notify(notification) {
        tracing::warn!(
            error = %e,
            title = notification.title(),
            message = %notification.message(),
            "notification delivery failed"
        );
    }
}

/// Log-only notifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(title = notification.title(), "{}", notification.message());
        Ok(())
    }
}
