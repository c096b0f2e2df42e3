//! Error types for memtrail operations.
//!
//! Storage engine failures are carried verbatim: the underlying
//! `rusqlite::Error` stays attached as the error source.

use thiserror::Error;

/// Result type alias for memtrail operations.
pub type MemtrailResult<T> = Result<T, MemtrailError>;

/// Main error type for all memtrail operations.
#[derive(Error, Debug)]
pub enum MemtrailError {
    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input validation failed (caller-side checks only).
    #[error("Validation error: {message}")]
    Validation { message: String, code: ErrorCode },

    /// Stored value could not be decoded.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,
    ValTooLong,

    // Database (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,
    DbConstraintViolation,

    // Configuration (CFG_xxx)
    CfgInvalid,

    // Parse (PARSE_xxx)
    ParseInvalidTimestamp,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::ValTooLong => "VAL_003",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::DbConstraintViolation => "DB_003",
            ErrorCode::CfgInvalid => "CFG_001",
            ErrorCode::ParseInvalidTimestamp => "PARSE_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl MemtrailError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
        }
    }

    /// Create a validation error for a missing required field.
    pub fn missing_field(field: &str) -> Self {
        Self::Validation {
            message: format!("'{}' must not be empty", field),
            code: ErrorCode::ValMissingField,
        }
    }

    /// Create a validation error for a field over its length limit.
    pub fn too_long(field: &str, max: usize, actual: usize) -> Self {
        Self::Validation {
            message: format!("'{}' is {} characters, limit is {}", field, actual, max),
            code: ErrorCode::ValTooLong,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a parse error for a stored timestamp.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidTimestamp,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Database { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Configuration(_) => ErrorCode::CfgInvalid,
            _ => ErrorCode::Internal,
        }
    }

    /// The underlying SQLite error, when this error came from the storage engine.
    pub fn sqlite_error(&self) -> Option<&rusqlite::Error> {
        match self {
            Self::Database {
                source: Some(source),
                ..
            } => source.downcast_ref::<rusqlite::Error>(),
            _ => None,
        }
    }

    /// Whether the storage engine rejected the write because of a constraint.
    pub fn is_constraint_violation(&self) -> bool {
        self.code() == ErrorCode::DbConstraintViolation
    }
}

impl From<rusqlite::Error> for MemtrailError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => ErrorCode::DbConstraintViolation,
            Some(rusqlite::ErrorCode::CannotOpen) => ErrorCode::DbConnectionFailed,
            _ => ErrorCode::DbOperationFailed,
        };
        Self::Database {
            message: err.to_string(),
            code,
            source: Some(Box::new(err)),
        }
    }
}
