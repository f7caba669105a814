//! Reward ledger.
//!
//! Two small files in the data directory:
//! - an append-only CSV session log, one row per early finish
//! - a JSON object `{"total_points": N}` overwritten on every update
//!
//! Both files are created on first use. Writes are best effort: the
//! read-modify-write of the total is not atomic against another process
//! doing the same thing.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::clock::TIMESTAMP_FORMAT;
use crate::error::LedgerError;

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

/// Column names, written once as the first line of the session log.
pub const LOG_HEADER: [&str; 6] = [
    "session_start",
    "mode",
    "planned_end",
    "actual_end",
    "early_minutes",
    "points_awarded",
];

/// One early-finish event. Never modified after it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRow {
    pub session_start: NaiveDateTime,
    pub mode: String,
    pub planned_end: NaiveDateTime,
    pub actual_end: NaiveDateTime,
    pub early_minutes: u64,
    pub points_awarded: u64,
}

impl RewardRow {
    fn to_fields(&self) -> [String; 6] {
        [
            self.session_start.format(TIMESTAMP_FORMAT).to_string(),
            self.mode.clone(),
            self.planned_end.format(TIMESTAMP_FORMAT).to_string(),
            self.actual_end.format(TIMESTAMP_FORMAT).to_string(),
            self.early_minutes.to_string(),
            self.points_awarded.to_string(),
        ]
    }

    fn from_fields(line: usize, fields: &[String]) -> Result<Self> {
        let malformed = |message: String| LedgerError::MalformedRow { line, message };
        if fields.len() != LOG_HEADER.len() {
            return Err(malformed(format!(
                "expected {} columns, found {}",
                LOG_HEADER.len(),
                fields.len()
            )));
        }
        let timestamp = |i: usize| {
            NaiveDateTime::parse_from_str(&fields[i], TIMESTAMP_FORMAT)
                .map_err(|e| malformed(format!("{}: {e}", LOG_HEADER[i])))
        };
        let number = |i: usize| {
            fields[i]
                .parse::<u64>()
                .map_err(|e| malformed(format!("{}: {e}", LOG_HEADER[i])))
        };
        Ok(Self {
            session_start: timestamp(0)?,
            mode: fields[1].clone(),
            planned_end: timestamp(2)?,
            actual_end: timestamp(3)?,
            early_minutes: number(4)?,
            points_awarded: number(5)?,
        })
    }
}

/// Locations of the two ledger files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPaths {
    pub log: PathBuf,
    pub total: PathBuf,
}

impl LedgerPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            log: dir.join("rewards_log.csv"),
            total: dir.join("rewards_total.json"),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TotalFile {
    #[serde(default)]
    total_points: u64,
}

/// Append-only session log plus running point total.
#[derive(Debug, Clone)]
pub struct RewardLedger {
    paths: LedgerPaths,
}

impl RewardLedger {
    pub fn new(paths: LedgerPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    /// Create the log (with header) and the total (at zero) if missing.
    pub fn ensure_files(&self) -> Result<()> {
        for path in [&self.paths.log, &self.paths.total] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))?;
            }
        }
        if !self.paths.log.exists() {
            let mut line = encode_line(&LOG_HEADER.map(String::from));
            line.push('\n');
            fs::write(&self.paths.log, line).map_err(|e| LedgerError::io(&self.paths.log, e))?;
        }
        if !self.paths.total.exists() {
            self.write_total(0)?;
        }
        Ok(())
    }

    /// Append one row to the session log.
    pub fn record(&self, row: &RewardRow) -> Result<()> {
        self.ensure_files()?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.paths.log)
            .map_err(|e| LedgerError::io(&self.paths.log, e))?;
        writeln!(file, "{}", encode_line(&row.to_fields()))
            .map_err(|e| LedgerError::io(&self.paths.log, e))?;
        Ok(())
    }

    /// Add `points` to the running total and return the new total.
    pub fn add_points(&self, points: u64) -> Result<u64> {
        self.ensure_files()?;
        let new_total = self.total_points().saturating_add(points);
        self.write_total(new_total)?;
        Ok(new_total)
    }

    /// Current total. A missing or unreadable total file counts as zero.
    pub fn total_points(&self) -> u64 {
        match self.read_total() {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!(error = %e, "could not read total points; starting from zero");
                0
            }
        }
    }

    /// Every row in the session log, oldest first.
    pub fn rows(&self) -> Result<Vec<RewardRow>> {
        let content = match fs::read_to_string(&self.paths.log) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LedgerError::io(&self.paths.log, e)),
        };
        split_records(&content)
            .into_iter()
            .skip(1)
            .filter(|(_, record)| !record.trim().is_empty())
            .map(|(line, record)| RewardRow::from_fields(line, &decode_line(&record)))
            .collect()
    }

    /// Record `row` and credit its points, logging instead of failing.
    ///
    /// Returns the new total if the total was updated. Points are only added
    /// once the row is in the log, so the total never runs ahead of it.
    pub fn credit(&self, row: &RewardRow) -> Option<u64> {
        if let Err(e) = self.record(row) {
            tracing::warn!(
                error = %e,
                points = row.points_awarded,
                "failed to append reward log row; points not credited"
            );
            return None;
        }
        match self.add_points(row.points_awarded) {
            Ok(total) => Some(total),
            Err(e) => {
                tracing::warn!(error = %e, points = row.points_awarded, "failed to update total points");
                None
            }
        }
    }

    fn read_total(&self) -> Result<u64> {
        let content = match fs::read_to_string(&self.paths.total) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(LedgerError::io(&self.paths.total, e)),
        };
        let file: TotalFile = serde_json::from_str(&content).map_err(|source| LedgerError::Json {
            path: self.paths.total.clone(),
            source,
        })?;
        Ok(file.total_points)
    }

    fn write_total(&self, total_points: u64) -> Result<()> {
        let content = serde_json::to_string_pretty(&TotalFile { total_points }).map_err(|source| {
            LedgerError::Json {
                path: self.paths.total.clone(),
                source,
            }
        })?;
        fs::write(&self.paths.total, content).map_err(|e| LedgerError::io(&self.paths.total, e))
    }
}

fn encode_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn encode_line(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| encode_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Split file content into records, keeping quoted newlines inside their
/// record. Each record comes with the 1-based line it starts on.
fn split_records(content: &str) -> Vec<(usize, String)> {
    let mut records = Vec::new();
    let mut pending: Option<(usize, String)> = None;
    for (i, line) in content.lines().enumerate() {
        let (start, mut record) = match pending.take() {
            Some((start, mut record)) => {
                record.push('\n');
                (start, record)
            }
            None => (i + 1, String::new()),
        };
        record.push_str(line);
        // An odd quote count means a quoted field is still open.
        if record.matches('"').count() % 2 == 1 {
            pending = Some((start, record));
        } else {
            records.push((start, record));
        }
    }
    records.extend(pending);
    records
}

fn decode_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            ('"', true) => quoted = false,
            ('"', false) if current.is_empty() => quoted = true,
            (',', false) => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
