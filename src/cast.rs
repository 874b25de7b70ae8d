//! asciicast v3 reading and writing.
//!
//! The on-disk format is one JSON header object on the first line followed by
//! one 3-element JSON array per event: `[interval, "o"|"x", payload]`.
//! Intervals are seconds since the previous event, already idle-capped by the
//! timing model before they reach this module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// asciicast format version written by this crate
pub const FORMAT_VERSION: u32 = 3;

/// Maximum file size accepted by [`inspect_file`] (50MB)
const MAX_INSPECT_SIZE: u64 = 50 * 1024 * 1024;

/// Terminal geometry block of the header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermInfo {
    pub cols: u16,
    pub rows: u16,
    #[serde(rename = "type")]
    pub term_type: String,
}

/// Environment hints recorded in the header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastEnv {
    #[serde(rename = "SHELL")]
    pub shell: String,
}

/// asciicast v3 header - the first line of a `.cast` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub term: TermInfo,
    /// Unix timestamp of the session start, in whole seconds
    pub timestamp: u64,
    pub title: String,
    pub idle_time_limit: f64,
    pub env: CastEnv,
}

/// Event kind: terminal output or child exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Output,
    Exit,
}

impl EventKind {
    /// Single-letter code used in the serialized event array
    pub fn code(self) -> &'static str {
        match self {
            EventKind::Output => "o",
            EventKind::Exit => "x",
        }
    }
}

/// A finalized recording event: idle-capped interval, kind, payload
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub interval: f64,
    pub kind: EventKind,
    pub data: String,
}

impl Event {
    /// Serialize to one line of the `.cast` file (no trailing newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&(self.interval, self.kind.code(), self.data.as_str()))
    }
}

/// Aggregate statistics reported after a recording is saved
#[derive(Debug, Clone)]
pub struct CastStats {
    pub path: PathBuf,
    pub events: usize,
    /// Sum of event intervals (replay duration, post idle-capping)
    pub duration: f64,
    pub size_bytes: u64,
}

/// Metadata recovered from an existing `.cast` file
#[derive(Debug, Clone)]
pub struct CastMeta {
    pub version: u32,
    pub cols: u16,
    pub rows: u16,
    pub title: Option<String>,
    pub idle_time_limit: Option<f64>,
    pub events: usize,
    pub duration: f64,
    pub size_bytes: u64,
}

/// Errors for `.cast` file operations
#[derive(Debug, thiserror::Error)]
pub enum CastError {
    #[error("Failed to write recording to '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("'{path}' is not a valid asciicast file: {reason}")]
    Invalid { path: PathBuf, reason: String },
    #[error("Failed to encode recording event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Write a complete recording to disk as a single flush.
///
/// The header line and all event lines are built in memory first and written
/// with one `fs::write` call. A failure therefore never leaves a truncated
/// header or a half-written event line behind, and the caller still owns the
/// event list for a retry.
pub fn write_file(path: &Path, header: &Header, events: &[Event]) -> Result<CastStats, CastError> {
    let mut contents = serde_json::to_string(header)?;
    contents.push('\n');
    for event in events {
        contents.push_str(&event.to_json_line()?);
        contents.push('\n');
    }

    std::fs::write(path, contents.as_bytes()).map_err(|e| CastError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(CastStats {
        path: path.to_path_buf(),
        events: events.len(),
        duration: events.iter().map(|e| e.interval).sum(),
        size_bytes: contents.len() as u64,
    })
}

/// Parse and validate an existing `.cast` file.
///
/// Accepts v2 and v3 files for inspection (only v3 is ever written). Blank
/// lines and `#` comment lines between events are skipped; event lines that
/// fail to parse are ignored rather than failing the whole file.
pub fn inspect_file(path: &Path) -> Result<CastMeta, CastError> {
    let invalid = |reason: &str| CastError::Invalid {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if path.extension().and_then(|e| e.to_str()) != Some("cast") {
        return Err(invalid("file must have .cast extension"));
    }

    let size_bytes = std::fs::metadata(path)
        .map_err(|e| CastError::Read {
            path: path.to_path_buf(),
            source: e,
        })?
        .len();
    if size_bytes > MAX_INSPECT_SIZE {
        return Err(invalid("file exceeds maximum size of 50MB"));
    }

    let text = std::fs::read_to_string(path).map_err(|e| CastError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut lines = text.lines();

    let header_line = lines.next().ok_or_else(|| invalid("file is empty"))?;
    let header: serde_json::Value =
        serde_json::from_str(header_line).map_err(|_| invalid("header line is not valid JSON"))?;

    let version = header
        .get("version")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| invalid("header has no version field"))?;
    if version != 2 && version != 3 {
        return Err(invalid(&format!(
            "unsupported asciicast version {} (supported: v2, v3)",
            version
        )));
    }
    let term = header
        .get("term")
        .ok_or_else(|| invalid("header has no term field"))?;

    let mut events = 0usize;
    let mut duration = 0f64;
    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Ok(serde_json::Value::Array(event)) = serde_json::from_str(line) {
            if let Some(interval) = event.first().and_then(|v| v.as_f64()) {
                events += 1;
                duration += interval;
            }
        }
    }

    Ok(CastMeta {
        version: version as u32,
        cols: term.get("cols").and_then(|v| v.as_u64()).unwrap_or(80) as u16,
        rows: term.get("rows").and_then(|v| v.as_u64()).unwrap_or(24) as u16,
        title: header
            .get("title")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        idle_time_limit: header.get("idle_time_limit").and_then(|v| v.as_f64()),
        events,
        duration,
        size_bytes,
    })
}

/// Format a byte count for display (e.g. "12.4 KB")
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 bytes".to_string();
    }
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    if exp == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[exp])
    }
}

/// Format a duration in seconds as "1h 2m 3s"
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{}s", secs));
    }
    parts.join(" ")
}
