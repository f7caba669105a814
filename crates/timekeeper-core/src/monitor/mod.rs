mod engine;
mod runner;

pub use engine::{
    early_finish_reward, reminder_band, EarlyFinish, MonitorState, Outcome, SessionMonitor,
    TickReport, REMINDER_MINUTES,
};
pub use runner::{
    spawn, MonitorContext, MonitorHandle, MonitorSettings, StopToken, POINTS_PER_EARLY_MINUTE,
};
