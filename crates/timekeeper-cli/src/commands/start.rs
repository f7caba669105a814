use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use timekeeper_core::clock::TIMESTAMP_FORMAT;
use timekeeper_core::probe::{self, SharedProbe, SystemProbe};
use timekeeper_core::storage::DefaultsConfig;
use timekeeper_core::{
    Config, Event, LogNotifier, ModeConfig, MonitorContext, MonitorState, Notifier, Timekeeper,
};

use tokio::sync::mpsc::UnboundedSender;

use crate::terminal::{self, TerminalNotifier};

#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Hours to play
    #[arg(long)]
    pub hours: Option<String>,
    /// Minutes to play
    #[arg(long)]
    pub minutes: Option<String>,
    /// Seconds to play
    #[arg(long)]
    pub seconds: Option<String>,
    /// Play until this time of day (24-hour HH:MM)
    #[arg(long, conflicts_with_all = ["hours", "minutes", "seconds"])]
    pub until: Option<String>,
    /// Process to watch instead of the configured one
    #[arg(long)]
    pub process: Option<String>,
}

impl StartArgs {
    /// Mode from the flags; configured defaults when none are given.
    pub fn mode_config(&self, defaults: &DefaultsConfig) -> ModeConfig {
        if let Some(until) = &self.until {
            return ModeConfig::until(until.clone());
        }
        if self.hours.is_none() && self.minutes.is_none() && self.seconds.is_none() {
            return ModeConfig::duration(
                defaults.hours.to_string(),
                defaults.minutes.to_string(),
                defaults.seconds.to_string(),
            );
        }
        let field = |f: &Option<String>| f.clone().unwrap_or_default();
        ModeConfig::duration(field(&self.hours), field(&self.minutes), field(&self.seconds))
    }
}

fn notifier_for(config: &Config) -> Arc<dyn Notifier> {
    if config.notifications.enabled {
        Arc::new(TerminalNotifier {
            bell: config.notifications.bell,
        })
    } else {
        Arc::new(LogNotifier)
    }
}

pub fn run(args: StartArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mode = args.mode_config(&config.defaults);

    let mut settings = config.monitor_settings();
    if let Some(process) = args.process {
        settings.process_name = process;
    }

    let mut timekeeper = Timekeeper::new(MonitorContext {
        settings,
        probe: probe::shared(SystemProbe::new()),
        ledger: super::open_ledger(&config)?,
        notifier: notifier_for(&config),
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let state = runtime.block_on(shell(&mut timekeeper, &mode))?;

    println!();
    match state {
        MonitorState::EarlyFinished => {
            println!("Session finished early. Total points: {}", timekeeper.ledger().total_points());
        }
        MonitorState::Completed => println!("Session complete."),
        MonitorState::Stopped => println!("Session stopped."),
        MonitorState::Idle | MonitorState::Running => {}
    }
    Ok(())
}

/// Presentation loop: render ticks, poll process status, stop on Ctrl-C.
async fn shell(
    timekeeper: &mut Timekeeper,
    mode: &ModeConfig,
) -> Result<MonitorState, Box<dyn std::error::Error>> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = timekeeper.start(mode, tx)?;

    let session = handle.session();
    println!(
        "Watching {} ({}), planned end {}. Press Ctrl-C to stop.",
        timekeeper.settings().process_name,
        session.mode(),
        session.planned_end().format(TIMESTAMP_FORMAT)
    );

    // The shell probes with its own System so it never waits on the monitor's lock.
    let (status_tx, mut status_rx) = tokio::sync::mpsc::unbounded_channel();
    let status_task = tokio::spawn(poll_status(
        probe::shared(SystemProbe::new()),
        timekeeper.settings().process_name.clone(),
        status_tx,
    ));
    let mut last_status = None;
    let mut final_state = MonitorState::Stopped;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(Event::Tick { remaining_secs, .. }) => terminal::render_remaining(remaining_secs),
                Some(Event::Notification { notification, .. }) => {
                    tracing::debug!(?notification, "notification event");
                }
                Some(Event::Finished { state, .. }) => final_state = state,
                None => break,
            },
            Some(running) = status_rx.recv() => {
                if last_status != Some(running) {
                    terminal::render_status(&timekeeper.settings().process_name, running);
                    last_status = Some(running);
                }
            }
            result = &mut ctrl_c, if !handle.stop_requested() => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "failed to listen for Ctrl-C");
                }
                handle.stop();
            }
        }
    }

    status_task.abort();
    timekeeper.wait();
    Ok(final_state)
}

/// Report whether `process` is running once a second. The process table
/// refresh blocks, so it runs on the blocking pool.
async fn poll_status(shared: SharedProbe, process: String, tx: UnboundedSender<bool>) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        interval.tick().await;
        let (shared, name) = (shared.clone(), process.clone());
        let running = match tokio::task::spawn_blocking(move || probe::query(&shared, &name)).await {
            Ok(running) => running,
            Err(e) => {
                tracing::warn!(error = %e, "process status poll failed");
                false
            }
        };
        if tx.send(running).is_err() {
            break;
        }
    }
}
