// LogRetrieval - api/index.rs
//
// Static index page served at `GET /`. Either the built-in page compiled into
// the binary or a file named in config.toml, read once at startup.

use super::GatewayState;
use crate::util::constants;
use crate::util::error::{LogRetrievalError, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Html;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Built-in page, embedded so the server never depends on its working directory.
static BUILTIN_INDEX: &[u8] = include_bytes!("../../assets/index.html");

/// HTML served at `/`. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IndexPage(Bytes);

impl IndexPage {
    /// The page compiled into the binary.
    pub fn builtin() -> Self {
        Self(Bytes::from_static(BUILTIN_INDEX))
    }

    /// Read a custom page from disk.
    ///
    /// Files larger than `MAX_INDEX_FILE_SIZE` are rejected rather than
    /// truncated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let io_error = |operation, source| LogRetrievalError::Io {
            path: path.to_path_buf(),
            operation,
            source,
        };

        let file = File::open(path).map_err(|e| io_error("open", e))?;
        let mut contents = Vec::new();
        file.take(constants::MAX_INDEX_FILE_SIZE + 1)
            .read_to_end(&mut contents)
            .map_err(|e| io_error("read", e))?;

        if contents.len() as u64 > constants::MAX_INDEX_FILE_SIZE {
            return Err(io_error(
                "read",
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "index page exceeds {} bytes",
                        constants::MAX_INDEX_FILE_SIZE
                    ),
                ),
            ));
        }

        tracing::debug!(path = %path.display(), bytes = contents.len(), "Loaded index page");
        Ok(Self(Bytes::from(contents)))
    }

    /// Page contents.
    pub fn bytes(&self) -> &Bytes {
        &self.0
    }
}

impl Default for IndexPage {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Handler for `GET /`.
pub async fn index_handler(State(state): State<GatewayState>) -> Html<Bytes> {
    Html(state.index().bytes().clone())
}
