// LogRetrieval - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation: every failure is a variant that keeps
// its underlying cause available through `source()`.
//
// Messages of client-facing variants (RetrievalError, FilterError) only ever
// mention the filename the client supplied, never the resolved path, so an
// error body cannot disclose anything about the filesystem layout.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level error type for all LogRetrieval operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogRetrievalError {
    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// A log retrieval request failed.
    Retrieval(RetrievalError),

    /// I/O error with path context (startup only: index page).
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },

    /// The listener could not be bound or the server loop failed.
    Server {
        addr: SocketAddr,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for LogRetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Retrieval(e) => write!(f, "Retrieval error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
            Self::Server {
                addr,
                operation,
                source,
            } => write!(f, "Server error during {operation} on {addr}: {source}"),
        }
    }
}

impl std::error::Error for LogRetrievalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Retrieval(e) => Some(e),
            Self::Io { source, .. } | Self::Server { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Retrieval errors
// ---------------------------------------------------------------------------

/// Errors produced by a single `RetrievalEngine::read` call.
#[derive(Debug)]
pub enum RetrievalError {
    /// The requested filename resolves outside the log root.
    PathViolation { requested: String },

    /// The requested file does not exist or is not a regular file.
    NotFound { requested: String },

    /// The filter could not be compiled.
    InvalidFilter(FilterError),

    /// Opening or reading the file failed part-way through.
    Io {
        requested: String,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathViolation { requested } => {
                write!(f, "Invalid file path: {requested}")
            }
            Self::NotFound { requested } => write!(f, "Log file not found: {requested}"),
            Self::InvalidFilter(e) => write!(f, "{e}"),
            Self::Io {
                requested,
                operation,
                source,
            } => write!(f, "Error during {operation} of log file '{requested}': {source}"),
        }
    }
}

impl std::error::Error for RetrievalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidFilter(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<RetrievalError> for LogRetrievalError {
    fn from(e: RetrievalError) -> Self {
        Self::Retrieval(e)
    }
}

impl From<FilterError> for RetrievalError {
    fn from(e: FilterError) -> Self {
        Self::InvalidFilter(e)
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors related to filter compilation.
#[derive(Debug)]
pub enum FilterError {
    /// User-provided regex is invalid.
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },

    /// User-provided pattern exceeds the maximum allowed length.
    PatternTooLong { length: usize, max_length: usize },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex { pattern, source } => {
                write!(f, "Invalid filter regex '{pattern}': {source}")
            }
            Self::PatternTooLong { length, max_length } => write!(
                f,
                "Filter pattern is {length} chars, exceeds maximum of {max_length}"
            ),
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
            Self::PatternTooLong { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading and engine construction.
#[derive(Debug)]
pub enum ConfigError {
    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// The configured log root does not exist or is not accessible.
    RootNotFound { path: PathBuf, source: io::Error },

    /// The configured log root is not a directory.
    RootNotADirectory { path: PathBuf },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::RootNotFound { path, source } => {
                write!(f, "Log root '{}' is not accessible: {source}", path.display())
            }
            Self::RootNotADirectory { path } => {
                write!(f, "Log root '{}' is not a directory", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RootNotFound { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LogRetrievalError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for LogRetrieval results.
pub type Result<T> = std::result::Result<T, LogRetrievalError>;
