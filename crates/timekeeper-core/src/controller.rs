//! Application-facing entry point.
//!
//! [`Timekeeper`] owns the collaborators and at most one running monitor.
//! A presentation shell calls `start` / `stop` and reads events from the
//! sink it hands in.

use crate::clock::{self, ModeConfig, Session};
use crate::error::{CoreError, Result};
use crate::events::EventSink;
use crate::ledger::RewardLedger;
use crate::monitor::{self, MonitorContext, MonitorHandle, MonitorSettings, MonitorState, StopToken};
use crate::probe::{self, SharedProbe};

/// What the caller gets back from a successful start.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session: Session,
    token: StopToken,
}

impl SessionHandle {
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Request cancellation. Takes effect within one tick.
    pub fn stop(&self) {
        self.token.stop();
    }

    pub fn stop_requested(&self) -> bool {
        self.token.is_stopped()
    }
}

pub struct Timekeeper {
    ctx: MonitorContext,
    active: Option<MonitorHandle>,
}

impl Timekeeper {
    pub fn new(ctx: MonitorContext) -> Self {
        Self { ctx, active: None }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &MonitorSettings {
        &self.ctx.settings
    }

    pub fn ledger(&self) -> &RewardLedger {
        &self.ctx.ledger
    }

    pub fn probe(&self) -> &SharedProbe {
        &self.ctx.probe
    }

    /// Is the watched process running right now?
    pub fn process_running(&self) -> bool {
        probe::query(&self.ctx.probe, &self.ctx.settings.process_name)
    }

    /// A session is being monitored.
    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|h| !h.is_finished())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a session. Events for it are emitted into `sink`.
    ///
    /// # Errors
    /// [`CoreError::AlreadyRunning`] while another session is active,
    /// [`CoreError::Validation`] for bad mode input.
    pub fn start(&mut self, mode: &ModeConfig, sink: impl EventSink + 'static) -> Result<SessionHandle> {
        if self.is_running() {
            return Err(CoreError::AlreadyRunning);
        }
        if let Some(finished) = self.active.take() {
            finished.join();
        }

        let session = Session::from_mode(mode, clock::now())?;
        let handle = monitor::spawn(session.clone(), self.ctx.clone(), Box::new(sink))?;
        let token = handle.token();
        self.active = Some(handle);
        Ok(SessionHandle { session, token })
    }

    /// Stop the active session and wait for its thread.
    ///
    /// Returns the final state, or `None` if nothing was running.
    pub fn stop(&mut self) -> Option<MonitorState> {
        let handle = self.active.take()?;
        handle.stop();
        Some(handle.join())
    }

    /// Wait for the active session to end on its own.
    pub fn wait(&mut self) -> Option<MonitorState> {
        self.active.take().map(MonitorHandle::join)
    }
}

impl Drop for Timekeeper {
    fn drop(&mut self) {
        self.stop();
    }
}
