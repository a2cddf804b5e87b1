// LogRetrieval - api/mod.rs
//
// HTTP gateway. Routes:
//   GET /      static index page
//   GET /logs  most recent lines of a log file, JSON
// Anything else is a JSON 404.
//
// Dependencies: app (engine), core (model), axum, tower-http.

pub mod auth;
pub mod error;
pub mod index;
pub mod logs;

use crate::app::engine::RetrievalEngine;
use auth::AuthMode;
use error::ApiError;
use index::{index_handler, IndexPage};
use logs::logs_handler;
use std::sync::Arc;

/// Shared gateway state, handed to every handler through axum's `State`.
#[derive(Clone)]
pub struct GatewayState {
    inner: Arc<GatewayStateInner>,
}

struct GatewayStateInner {
    engine: Arc<RetrievalEngine>,
    auth: AuthMode,
    index: IndexPage,
}

impl GatewayState {
    pub fn new(engine: RetrievalEngine, auth: AuthMode, index: IndexPage) -> Self {
        Self {
            inner: Arc::new(GatewayStateInner {
                engine: Arc::new(engine),
                auth,
                index,
            }),
        }
    }

    /// Shared handle to the engine, movable onto the blocking pool.
    pub fn engine(&self) -> Arc<RetrievalEngine> {
        Arc::clone(&self.inner.engine)
    }

    pub fn auth(&self) -> &AuthMode {
        &self.inner.auth
    }

    pub fn index(&self) -> &IndexPage {
        &self.inner.index
    }
}

/// JSON 404 for unknown paths and unsupported methods.
async fn not_found_handler() -> ApiError {
    ApiError::RouteNotFound
}

/// Build the router with every endpoint and request tracing.
pub fn build_router(state: GatewayState) -> axum::Router {
    use axum::routing::get;
    use tower_http::trace::TraceLayer;

    axum::Router::new()
        .route("/", get(index_handler).fallback(not_found_handler))
        .route("/logs", get(logs_handler).fallback(not_found_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
