//! # Timekeeper Core Library
//!
//! This library provides the core logic for Timekeeper, a play-session timer
//! for one game process. It warns as the planned end approaches and rewards
//! closing the game early with points that persist across runs. A
//! presentation shell (the `timekeeper` CLI, or any GUI) drives it through
//! [`Timekeeper`] and renders the [`Event`]s it emits.
//!
//! ## Architecture
//!
//! - **Session Clock**: turns a duration or an `HH:MM` end time into a
//!   [`Session`] with a planned end
//! - **Process Probe**: "is the game running?" against the OS process table
//! - **Reward Ledger**: append-only CSV log plus a JSON point total
//! - **Session Monitor**: a state machine ticked once per second on a
//!   background thread; fires 5/3/1-minute reminders once each and detects
//!   early finishes
//!
//! ## Key Components
//!
//! - [`Timekeeper`]: start/stop entry point, one session at a time
//! - [`SessionMonitor`]: per-session state machine
//! - [`RewardLedger`]: persisted rewards
//! - [`Config`]: application configuration management

pub mod clock;
pub mod controller;
pub mod error;
pub mod events;
pub mod ledger;
pub mod monitor;
pub mod notify;
pub mod probe;
pub mod storage;

pub use clock::{ModeConfig, Session};
pub use controller::{SessionHandle, Timekeeper};
pub use error::{ConfigError, CoreError, LedgerError, NotifyError, Result, ValidationError};
pub use events::{Event, EventSink};
pub use ledger::{LedgerPaths, RewardLedger, RewardRow};
pub use monitor::{MonitorContext, MonitorSettings, MonitorState, SessionMonitor};
pub use notify::{LogNotifier, Notification, Notifier};
pub use probe::{ProcessProbe, SharedProbe, SystemProbe};
pub use storage::Config;
