//! Structured error handling and exit codes.

use serde::Serialize;

/// Process exit codes.
///
/// - 0: Success
/// - 1: General error (I/O, unwritable cache or preference file, ...)
/// - 2: No matches (a query ran but matched no block)
/// - 3: Usage error (empty query, no graph path given or remembered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed.
    Success = 0,
    /// General error: an unexpected failure.
    GeneralError = 1,
    /// No matches: the query completed without results.
    NoMatches = 2,
    /// Usage error: the command was called with unusable input.
    UsageError = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "PD000",
            Self::GeneralError => "PD001",
            Self::NoMatches => "PD002",
            Self::UsageError => "PD003",
        }
    }
}

/// Input the application refuses before doing any work.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// No graph path on the command line and none remembered.
    #[error("No graph path given and none remembered; pass a PATH or run `propdex sync PATH` first")]
    NoGraph,
    /// The query failed to parse.
    #[error(transparent)]
    Query(#[from] crate::query::QueryError),
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "PD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}

/// Pick the exit code for an error returned by the application.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if err.downcast_ref::<UsageError>().is_some() {
        ExitCode::UsageError
    } else {
        ExitCode::GeneralError
    }
}
