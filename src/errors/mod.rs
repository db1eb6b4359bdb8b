use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub type MetagameResult<T> = Result<T, MetagameError>;

/// Fatal and per-record failures raised by the analysis core
#[derive(Error, Debug)]
pub enum MetagameError {
    #[error("Failed to load rules from {}: {reason}", path.display())]
    RuleLoad { path: PathBuf, reason: String },

    #[error("Aggregation failed: {0}")]
    Aggregation(AggregationDiagnostic),

    #[error("Invalid record {context}: {reason}")]
    InvalidRecord { context: String, reason: String },

    #[error("Deadline exceeded during {stage}")]
    DeadlineExceeded { stage: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MetagameError {
    pub fn rule_load(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::RuleLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_record(context: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidRecord {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    pub fn aggregation(subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Aggregation(AggregationDiagnostic {
            subject: subject.into(),
            detail: detail.into(),
        })
    }

    /// Per-record errors are skipped by the batch, everything else aborts it
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidRecord { .. })
    }
}

/// Identifies the archetype, pair or tournament that broke an aggregate invariant
#[derive(Debug, Clone, Serialize)]
pub struct AggregationDiagnostic {
    pub subject: String,
    pub detail: String,
}

impl fmt::Display for AggregationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.detail, self.subject)
    }
}

/// Several definitions matched with equal specificity; resolved by priority, then name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationAmbiguity {
    pub tournament_id: String,
    pub player: String,
    pub chosen: String,
    pub candidates: Vec<String>,
}

/// A statistic that was computed but rests on fewer samples than required
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsufficientDataWarning {
    pub subject: String,
    pub sample_size: u32,
    pub required: u32,
}

/// Add context to load errors
pub fn load_context(what: &str, path: &std::path::Path) -> String {
    format!("Failed to load {} from {}", what, path.display())
}

/// Add context to parse errors
pub fn parse_context(data_type: &str) -> String {
    format!("Failed to parse {}", data_type)
}

/// Add context to write errors
pub fn write_context(path: &std::path::Path) -> String {
    format!("Failed to write {}", path.display())
}
