// LogRetrieval - api/auth.rs
//
// Bearer-token authentication for the data endpoint.
//
// The mode is chosen once at startup and never changes. Open access is an
// explicit variant, not the absence of a token check somewhere: a gateway
// built with `AuthMode::Open` skips authentication on purpose, and `main`
// announces it at startup.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use std::fmt;

/// How `/logs` requests are authenticated.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// No credential required.
    Open,
    /// `Authorization: Bearer <token>` required on every request.
    Bearer(String),
}

// Never print the token itself.
impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("Open"),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

impl AuthMode {
    /// `Bearer` for a non-empty token, `Open` otherwise.
    pub fn from_token(token: Option<String>) -> Self {
        match token {
            Some(t) if !t.is_empty() => Self::Bearer(t),
            _ => Self::Open,
        }
    }

    /// True when a token is required.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Bearer(_))
    }

    /// Check the request headers against this mode.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AuthFailure> {
        let expected = match self {
            Self::Open => return Ok(()),
            Self::Bearer(token) => token,
        };

        let value = headers
            .get(AUTHORIZATION)
            .ok_or(AuthFailure::MissingHeader)?
            .to_str()
            .map_err(|_| AuthFailure::MalformedHeader)?;

        let presented = value
            .strip_prefix("Bearer ")
            .filter(|t| !t.is_empty())
            .ok_or(AuthFailure::MalformedHeader)?;

        if constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
            Ok(())
        } else {
            Err(AuthFailure::InvalidToken)
        }
    }
}

/// Why a request failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No `Authorization` header.
    MissingHeader,
    /// Header present but not `Bearer <token>`.
    MalformedHeader,
    /// Well-formed header carrying the wrong token.
    InvalidToken,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader | Self::MalformedHeader => {
                f.write_str("Authorization header missing or invalid")
            }
            Self::InvalidToken => f.write_str("Invalid token"),
        }
    }
}

impl std::error::Error for AuthFailure {}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
