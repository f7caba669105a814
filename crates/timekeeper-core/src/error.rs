//! Core error types for timekeeper-core.
//!
//! Only [`CoreError::Validation`] and [`CoreError::AlreadyRunning`] ever reach
//! the caller of [`crate::Timekeeper::start`]. Ledger, notification and probe
//! failures are logged and swallowed inside the monitor so a countdown never
//! dies mid-session.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for timekeeper-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// User input could not be turned into a session
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A session is already being monitored
    #[error("A session is already running; stop it before starting a new one")]
    AlreadyRunning,

    /// Reward ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation errors raised while building a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A duration field is not a non-negative integer
    #[error("Invalid value for '{field}': expected a non-negative integer, got '{value}'")]
    NotAnInteger { field: &'static str, value: String },

    /// The duration adds up to zero seconds
    #[error("Duration must be greater than zero")]
    NonPositiveDuration,

    /// The duration runs past the representable calendar
    #[error("Duration is too long")]
    DurationTooLong,

    /// Time of day is not `HH:MM` in 24-hour format
    #[error("Invalid time of day '{0}': expected HH:MM (24-hour), e.g. 22:30")]
    InvalidTimeOfDay(String),
}

/// Reward ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Reading or writing one of the ledger files failed
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The total points file could not be encoded or decoded
    #[error("Invalid total points file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A session log line does not have the expected columns
    #[error("Malformed log row at line {line}: {message}")]
    MalformedRow { line: usize, message: String },
}

impl LedgerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LedgerError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Could not determine or create the data directory
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Notification delivery errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The notification backend is not available
    #[error("Notification backend unavailable: {0}")]
    Unavailable(String),

    /// The backend accepted the request but failed to display it
    #[error("Failed to display notification: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
