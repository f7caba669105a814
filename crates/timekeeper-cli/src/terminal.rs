//! Terminal rendering: the countdown line and alert banners.

use std::io::Write;

use timekeeper_core::clock::format_remaining;
use timekeeper_core::{Notification, Notifier, NotifyError};

/// Prints alerts to stderr, optionally ringing the bell.
pub struct TerminalNotifier {
    pub bell: bool,
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut err = std::io::stderr().lock();
        let bell = if self.bell { "\x07" } else { "" };
        writeln!(
            err,
            "\n{bell}[{}] {}",
            notification.title(),
            notification.message()
        )?;
        err.flush()?;
        Ok(())
    }
}

/// Overwrite the countdown line in place.
pub fn render_remaining(secs: u64) {
    let mut out = std::io::stdout().lock();
    let _ = write!(out, "\rRemaining: {:<10}", format_remaining(secs));
    let _ = out.flush();
}

pub fn render_status(process: &str, running: bool) {
    let status = if running { "running" } else { "not detected" };
    println!("\n{process}: {status}");
}
