use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "timekeeper", version, about = "Timekeeper CLI: play-session timer with early-finish rewards")]
pub(crate) struct Cli {
    /// Show debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session and watch the game until it ends
    Start(commands::start::StartArgs),
    /// Check whether the game process is running
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print accumulated reward points
    Points,
    /// Print the reward log
    History {
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Only the most recent N rows
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Start(args) => commands::start::run(args),
        Commands::Status { json } => commands::status::run(json),
        Commands::Points => commands::rewards::points(),
        Commands::History { json, limit } => commands::rewards::history(json, limit),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
