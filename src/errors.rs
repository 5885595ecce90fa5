//! Error types for the query-execution engine
//!
//! Error codes:
//! - MULTIQ_SUBQUERY_FAILED (ERROR)
//! - MULTIQ_FETCH_FAILED (ERROR)
//! - MULTIQ_CACHE_FAILED (ERROR)
//! - MULTIQ_INVALID_QUERY (ERROR)
//! - MULTIQ_WORKER_PANIC (FATAL)
//!
//! Upstream failures (sub-query runs, batched gets, cache calls) are
//! propagated unchanged; there is no partial-success mode and no local
//! retry. Retry policy belongs to the transport layer.

use std::fmt;

/// Severity levels for query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation failed but the engine is healthy
    Error,
    /// A merge worker died; the execution state is unrecoverable
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Engine-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorCode {
    /// A sub-query execution raised during fan-out
    SubqueryFailed,
    /// A batched key-fetch against the datastore raised
    FetchFailed,
    /// A result-cache get/put raised
    CacheFailed,
    /// A sub-query handed to the dispatcher is malformed (e.g. no key filter)
    InvalidQuery,
    /// A fan-out worker panicked (FATAL)
    WorkerPanic,
}

impl QueryErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::SubqueryFailed => "MULTIQ_SUBQUERY_FAILED",
            QueryErrorCode::FetchFailed => "MULTIQ_FETCH_FAILED",
            QueryErrorCode::CacheFailed => "MULTIQ_CACHE_FAILED",
            QueryErrorCode::InvalidQuery => "MULTIQ_INVALID_QUERY",
            QueryErrorCode::WorkerPanic => "MULTIQ_WORKER_PANIC",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            QueryErrorCode::WorkerPanic => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query error type with full context
#[derive(Debug, Clone)]
pub struct QueryError {
    /// Error code
    code: QueryErrorCode,
    /// Human-readable message
    message: String,
}

impl QueryError {
    /// Create a sub-query failure
    pub fn subquery_failed(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::SubqueryFailed,
            message: reason.into(),
        }
    }

    /// Create a batched-fetch failure
    pub fn fetch_failed(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::FetchFailed,
            message: reason.into(),
        }
    }

    /// Create a cache failure
    pub fn cache_failed(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::CacheFailed,
            message: reason.into(),
        }
    }

    /// Create an invalid-query error
    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::InvalidQuery,
            message: reason.into(),
        }
    }

    /// Create a worker-panic error (FATAL)
    pub fn worker_panic(query_index: usize) -> Self {
        Self {
            code: QueryErrorCode::WorkerPanic,
            message: format!("fan-out worker for sub-query {} panicked", query_index),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> QueryErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for QueryError {}

/// Result type for engine operations
pub type QueryResult<T> = Result<T, QueryError>;
