use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LogError>;

/// Anything that makes a session, and therefore its whole root, unusable.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected a JSON object in {0}")]
    NotAnObject(PathBuf),

    #[error("Key {key:?} not found in {path}")]
    MissingKey { path: PathBuf, key: String },

    #[error("Invalid value for {key:?} in {path}: {value}")]
    InvalidValue {
        path: PathBuf,
        key: String,
        value: String,
    },

    #[error("Invalid feedback ledger {path}: {source}")]
    Feedback {
        path: PathBuf,
        #[source]
        source: FeedbackError,
    },

    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("Session {index}: {source}")]
    Session {
        index: u64,
        #[source]
        source: Box<LogError>,
    },
}

impl LogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LogError::Io {
            path: path.into(),
            source,
        }
    }

    /// Index of the session that broke the root, if the error came from one.
    pub fn session_index(&self) -> Option<u64> {
        match self {
            LogError::Session { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Problems in `feedback.csv`. Line numbers are 1-based and count the header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("missing column {0:?}")]
    MissingColumn(String),

    #[error("line {line}: expected at least {expected} fields, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid timestamp {value:?}")]
    InvalidTimestamp { line: usize, value: String },

    #[error("line {line}: unknown feedback label {label:?}")]
    UnknownLabel { line: usize, label: String },

    #[error("line {line}: timestamp {current} does not follow {previous}")]
    NonMonotonic {
        line: usize,
        previous: i64,
        current: i64,
    },
}
