// LogRetrieval - api/logs.rs
//
// `GET /logs`: authenticate, validate parameters, run the retrieval on the
// blocking pool, wrap the lines in the JSON envelope.

use super::error::ApiError;
use super::GatewayState;
use crate::core::model::{LogQuery, LogsResponse};
use crate::util::logging::preview;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use std::num::IntErrorKind;

/// Raw query parameters. `lines` stays a string so that a bad value can be
/// reported as a validation error instead of a generic rejection.
#[derive(Debug, Default, Deserialize)]
pub struct LogsParams {
    pub filename: Option<String>,
    pub lines: Option<String>,
    pub filter: Option<String>,
}

impl LogsParams {
    /// Validate into an engine query.
    pub fn into_query(self) -> Result<LogQuery, ApiError> {
        let filename = self
            .filename
            .filter(|f| !f.is_empty())
            .ok_or(ApiError::MissingFilename)?;

        let limit = self.lines.as_deref().map(parse_lines).transpose()?;

        Ok(LogQuery {
            filename,
            limit,
            filter: self.filter,
        })
    }
}

/// Parse the `lines` parameter as a positive integer.
///
/// Digit strings too large for `usize` saturate; the engine caps them to
/// its maximum anyway.
pub fn parse_lines(raw: &str) -> Result<usize, ApiError> {
    let invalid = || ApiError::InvalidLines {
        raw: raw.to_string(),
    };
    match raw.parse::<usize>() {
        Ok(0) => Err(invalid()),
        Ok(n) => Ok(n),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(usize::MAX),
        Err(_) => Err(invalid()),
    }
}

/// Handler for `GET /logs`.
pub async fn logs_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    params: Result<Query<LogsParams>, QueryRejection>,
) -> Result<Json<LogsResponse>, ApiError> {
    // Credentials are checked before anything about the request is examined.
    state.auth().authorize(&headers)?;

    let Query(params) = params.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    let query = params.into_query()?;

    tracing::info!(
        file = preview(&query.filename),
        lines = ?query.limit,
        filtered = query.filter.as_deref().is_some_and(|f| !f.is_empty()),
        "Retrieval requested"
    );

    let engine = state.engine();
    let (query, result) = tokio::task::spawn_blocking(move || {
        let result = engine.read(&query);
        (query, result)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("retrieval task failed: {e}")))?;

    let result = result?;
    Ok(Json(LogsResponse::new(query.filename, result)))
}
