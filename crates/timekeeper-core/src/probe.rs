//! Process probe: "is the target process running right now?"

use std::sync::{Arc, Mutex};

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// Answers whether a process with the given name is currently running.
///
/// Implementations never fail: anything that prevents a definite answer
/// counts as "not running".
pub trait ProcessProbe: Send {
    fn is_running(&mut self, name: &str) -> bool;
}

/// Probe shared between the monitor thread and the presentation shell.
pub type SharedProbe = Arc<Mutex<dyn ProcessProbe>>;

/// Wrap a probe so it can be shared across threads.
pub fn shared(probe: impl ProcessProbe + 'static) -> SharedProbe {
    Arc::new(Mutex::new(probe))
}

/// Query a shared probe, treating a poisoned lock as "not running".
pub fn query(probe: &SharedProbe, name: &str) -> bool {
    match probe.lock() {
        Ok(mut guard) => guard.is_running(name),
        Err(_) => {
            tracing::warn!(process = name, "process probe lock poisoned; assuming not running");
            false
        }
    }
}

/// Probe backed by the OS process table.
pub struct SystemProbe {
    system: System,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for SystemProbe {
    fn is_running(&mut self, name: &str) -> bool {
        // Names only; no CPU, memory or exe path.
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, ProcessRefreshKind::new());

        // Processes that vanish mid-scan or hide their name are simply skipped.
        self.system
            .processes()
            .values()
            .any(|process| name_matches(&process.name().to_string_lossy(), name))
    }
}

/// Case-insensitive exact match on the process name.
fn name_matches(candidate: &str, target: &str) -> bool {
    !candidate.is_empty() && candidate.eq_ignore_ascii_case(target)
}
