use chrono::{DateTime, Utc};

use crate::db::services::LogEntry;

/// Classified result of one probe.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The request completed with a non-error status.
    Up { status_code: u16, response_time_ms: f64 },
    /// The request completed but the server answered 4xx/5xx.
    HttpFailure { status_code: u16, response_time_ms: f64 },
    /// No response was obtained at all.
    TransportFailure { error_kind: String },
}

impl Outcome {
    pub fn is_up(&self) -> bool {
        matches!(self, Outcome::Up { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Outcome::Up { status_code, .. } | Outcome::HttpFailure { status_code, .. } => {
                Some(*status_code)
            }
            Outcome::TransportFailure { .. } => None,
        }
    }

    pub fn response_time_ms(&self) -> Option<f64> {
        match self {
            Outcome::Up { response_time_ms, .. }
            | Outcome::HttpFailure { response_time_ms, .. } => Some(*response_time_ms),
            Outcome::TransportFailure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            Outcome::Up { .. } => None,
            Outcome::HttpFailure { status_code, .. } => Some(format!("HTTP Error: {status_code}")),
            Outcome::TransportFailure { error_kind } => Some(format!("Request Error: {error_kind}")),
        }
    }

    /// The log row this outcome produces when recorded at `timestamp`.
    pub fn to_log_entry(&self, timestamp: DateTime<Utc>) -> LogEntry {
        LogEntry {
            timestamp,
            is_up: self.is_up(),
            status_code: self.status_code().map(i32::from),
            response_time_ms: self.response_time_ms(),
            error_message: self.error_message(),
        }
    }
}
