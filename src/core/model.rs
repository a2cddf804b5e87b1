// LogRetrieval - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no HTTP
// dependencies; the shared vocabulary between the engine and the gateway.

use serde::Serialize;

// =============================================================================
// Query
// =============================================================================

/// One retrieval request, as handed to `RetrievalEngine::read`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    /// Path of the log file relative to the log root. Untrusted.
    pub filename: String,

    /// Maximum number of lines wanted. `None` or `Some(0)` means "the
    /// engine's configured maximum"; larger values are capped to it.
    pub limit: Option<usize>,

    /// Case-insensitive filter. `None` or empty means every line matches.
    pub filter: Option<String>,
}

impl LogQuery {
    /// Query for the most recent lines of `filename`, engine defaults otherwise.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            limit: None,
            filter: None,
        }
    }

    /// Set the line limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the filter text.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

// =============================================================================
// Result
// =============================================================================

/// Lines returned by one retrieval, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalResult {
    /// Matching lines, newest first, terminators stripped.
    pub lines: Vec<String>,

    /// Bytes read from the file to produce `lines`.
    pub bytes_scanned: u64,

    /// Size of the file when the scan started.
    pub file_size: u64,

    /// True when the scan stopped because the limit was reached rather than
    /// because the start of the file was reached.
    pub limit_reached: bool,
}

impl RetrievalResult {
    /// Number of lines returned.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when no line matched.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Wire format
// =============================================================================

/// JSON body of a successful `GET /logs` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogsResponse {
    /// Filename exactly as the client supplied it.
    pub filename: String,
    /// Number of entries in `entries`.
    pub total_entries: usize,
    /// Lines, most recent first.
    pub entries: Vec<String>,
}

impl LogsResponse {
    pub fn new(filename: String, result: RetrievalResult) -> Self {
        Self {
            filename,
            total_entries: result.lines.len(),
            entries: result.lines,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logs_response_counts_entries() {
        let result = RetrievalResult {
            lines: vec!["b".to_string(), "a".to_string()],
            ..Default::default()
        };
        let response = LogsResponse::new("f.log".to_string(), result);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "filename": "f.log",
                "total_entries": 2,
                "entries": ["b", "a"],
            })
        );
    }

    #[test]
    fn test_query_builder() {
        let query = LogQuery::new("app.log").with_limit(5).with_filter("error");
        assert_eq!(query.filename, "app.log");
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.filter.as_deref(), Some("error"));
    }
}
