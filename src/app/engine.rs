// LogRetrieval - app/engine.rs
//
// RetrievalEngine: resolves a client-supplied filename inside the log root
// and returns its most recent lines, optionally filtered.
//
// Architecture:
//   - The engine holds only immutable configuration (canonical root, limits,
//     filter mode) and is shared across requests behind an `Arc`.
//   - Each `read` opens its own file handle, drives a `ReverseLines` scan,
//     and drops the handle on every exit path (early limit, error, EOF).
//   - The filter and the limit are applied while walking backwards, so a
//     request for the last 10 lines of a multi-gigabyte file reads only the
//     tail of that file.
//
// Path safety is enforced twice: lexically (core::path) before any
// filesystem call, then against the canonical path once the file is known to
// exist, which catches symlinks pointing out of the root. Neither check
// reveals anything about paths outside the root: a lexical violation is
// reported before the filesystem is consulted, and a symlink escape is
// reported as a violation regardless of what the target is. When the
// candidate does not resolve, the deepest existing entry on its path decides
// containment before "not found" is reported.

use crate::core::filter::{FilterMode, LineFilter};
use crate::core::model::{LogQuery, RetrievalResult};
use crate::core::path::{self, Containment};
use crate::core::reverse::ReverseLines;
use crate::util::constants;
use crate::util::error::{ConfigError, RetrievalError};
use crate::util::logging::preview;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Upper bound on the output vector's initial allocation. The limit may be
/// large while the file holds only a handful of lines.
const INITIAL_OUTPUT_CAPACITY: usize = 256;

// =============================================================================
// Configuration
// =============================================================================

/// Immutable engine settings, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Default and maximum number of lines returned per read.
    pub max_lines: usize,

    /// Bytes read per step of the backward scan.
    pub chunk_size: usize,

    /// Grammar used for filter strings.
    pub filter_mode: FilterMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_lines: constants::DEFAULT_MAX_LINES,
            chunk_size: constants::DEFAULT_CHUNK_SIZE,
            filter_mode: FilterMode::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults with a different line cap.
    pub fn with_max_lines(max_lines: usize) -> Self {
        Self {
            max_lines,
            ..Self::default()
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Reverse log-line retrieval over a single root directory.
#[derive(Debug, Clone)]
pub struct RetrievalEngine {
    root: PathBuf,
    config: EngineConfig,
}

impl RetrievalEngine {
    /// Create an engine serving files below `root`.
    ///
    /// Fails if `root` does not exist, cannot be accessed, or is not a
    /// directory, or if `config.max_lines` is zero.
    pub fn new(root: impl AsRef<Path>, config: EngineConfig) -> Result<Self, ConfigError> {
        let root = root.as_ref();

        if config.max_lines < constants::MIN_MAX_LINES {
            return Err(ConfigError::ValueOutOfRange {
                field: "max_lines".to_string(),
                value: config.max_lines.to_string(),
                expected: format!(">= {}", constants::MIN_MAX_LINES),
            });
        }

        let canonical = std::fs::canonicalize(root).map_err(|e| ConfigError::RootNotFound {
            path: root.to_path_buf(),
            source: e,
        })?;
        if !canonical.is_dir() {
            return Err(ConfigError::RootNotADirectory {
                path: root.to_path_buf(),
            });
        }

        tracing::debug!(
            root = %canonical.display(),
            max_lines = config.max_lines,
            chunk_size = config.chunk_size,
            filter_mode = %config.filter_mode,
            "Retrieval engine ready"
        );

        Ok(Self {
            root: canonical,
            config,
        })
    }

    /// Canonical log root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configured line cap.
    pub fn max_lines(&self) -> usize {
        self.config.max_lines
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of lines a read with the given requested limit may return.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(n) if n > 0 => n.min(self.config.max_lines),
            _ => self.config.max_lines,
        }
    }

    /// Resolve `filename` to the canonical path of a regular file in the root.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, RetrievalError> {
        let candidate = path::resolve_within(&self.root, filename).map_err(|reason| {
            match reason {
                // The root itself: a directory, never a readable log.
                Containment::IsRoot => RetrievalError::NotFound {
                    requested: filename.to_string(),
                },
                Containment::Absolute | Containment::Escapes | Containment::NulByte => {
                    tracing::warn!(
                        requested = preview(filename),
                        reason = ?reason,
                        "Rejected path outside log root"
                    );
                    RetrievalError::PathViolation {
                        requested: filename.to_string(),
                    }
                }
            }
        })?;

        let canonical = match std::fs::canonicalize(&candidate) {
            Ok(p) => p,
            // The containment verdict must not depend on whether the target
            // exists, so it is settled before "not found" is.
            Err(_) if self.escapes_root(&candidate) => {
                return Err(symlink_violation(filename));
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(RetrievalError::Io {
                    requested: filename.to_string(),
                    operation: "resolve",
                    source: e,
                });
            }
            // Missing file, missing directory, or a file used as a directory.
            Err(_) => {
                return Err(RetrievalError::NotFound {
                    requested: filename.to_string(),
                })
            }
        };

        if !canonical.starts_with(&self.root) {
            return Err(symlink_violation(filename));
        }

        if !canonical.is_file() {
            return Err(RetrievalError::NotFound {
                requested: filename.to_string(),
            });
        }

        Ok(canonical)
    }

    /// For a candidate that cannot be canonicalised: true when the deepest
    /// existing entry on its path resolves outside the root, or is a symlink
    /// whose target cannot be resolved at all.
    fn escapes_root(&self, candidate: &Path) -> bool {
        for ancestor in candidate.ancestors() {
            if ancestor == self.root.as_path() {
                return false;
            }
            let Ok(meta) = std::fs::symlink_metadata(ancestor) else {
                continue;
            };
            return match std::fs::canonicalize(ancestor) {
                Ok(real) => !real.starts_with(&self.root),
                Err(_) => meta.file_type().is_symlink(),
            };
        }
        false
    }

    /// Return the most recent lines of `query.filename`, newest first.
    ///
    /// At most `effective_limit(query.limit)` lines are returned. Lines that
    /// fail the filter are skipped and do not count toward the limit. An
    /// empty file yields an empty result. A read error part-way through the
    /// scan is returned as an error; partial output is discarded so it can
    /// never be mistaken for "no more matches".
    pub fn read(&self, query: &LogQuery) -> Result<RetrievalResult, RetrievalError> {
        let limit = self.effective_limit(query.limit);
        let path = self.resolve(&query.filename)?;
        let filter = LineFilter::compile(
            query.filter.as_deref().unwrap_or_default(),
            self.config.filter_mode,
        )?;

        let file = File::open(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                // Removed between resolve and open.
                RetrievalError::NotFound {
                    requested: query.filename.clone(),
                }
            } else {
                io_failure(query, "open", e)
            }
        })?;
        let mut lines = ReverseLines::new(file, self.config.chunk_size)
            .map_err(|e| io_failure(query, "seek", e))?;

        let mut output = Vec::with_capacity(limit.min(INITIAL_OUTPUT_CAPACITY));
        for line in lines.by_ref() {
            let line = line.map_err(|e| io_failure(query, "read", e))?;
            if filter.as_ref().map_or(true, |f| f.matches(&line)) {
                output.push(line);
                if output.len() >= limit {
                    break;
                }
            }
        }

        let result = RetrievalResult {
            limit_reached: output.len() >= limit,
            lines: output,
            bytes_scanned: lines.bytes_read(),
            file_size: lines.source_len(),
        };

        tracing::debug!(
            file = preview(&query.filename),
            lines = result.len(),
            limit,
            filtered = filter.is_some(),
            bytes_scanned = result.bytes_scanned,
            file_size = result.file_size,
            "Retrieval complete"
        );

        Ok(result)
    }
}

fn symlink_violation(filename: &str) -> RetrievalError {
    tracing::warn!(
        requested = preview(filename),
        "Rejected symlink resolving outside log root"
    );
    RetrievalError::PathViolation {
        requested: filename.to_string(),
    }
}

fn io_failure(query: &LogQuery, operation: &'static str, source: io::Error) -> RetrievalError {
    RetrievalError::Io {
        requested: query.filename.clone(),
        operation,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: [&str; 3] = [
        "2023-01-01 ERROR: System failure",
        "2023-01-02 INFO: Normal operation",
        "2023-01-03 WARNING: Disk space low",
    ];

    fn setup(config: EngineConfig) -> (TempDir, RetrievalEngine) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.log"), SAMPLE.join("\n")).unwrap();
        let engine = RetrievalEngine::new(dir.path(), config).unwrap();
        (dir, engine)
    }

    fn read(engine: &RetrievalEngine, query: LogQuery) -> Vec<String> {
        engine.read(&query).unwrap().lines
    }

    #[test]
    fn test_new_rejects_missing_root() {
        let dir = TempDir::new().unwrap();
        let result = RetrievalEngine::new(dir.path().join("nope"), EngineConfig::default());
        assert!(matches!(result, Err(ConfigError::RootNotFound { .. })));
    }

    #[test]
    fn test_new_rejects_file_as_root() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.log");
        fs::write(&file, "x").unwrap();
        let result = RetrievalEngine::new(&file, EngineConfig::default());
        assert!(matches!(result, Err(ConfigError::RootNotADirectory { .. })));
    }

    #[test]
    fn test_new_rejects_zero_max_lines() {
        let dir = TempDir::new().unwrap();
        let result = RetrievalEngine::new(dir.path(), EngineConfig::with_max_lines(0));
        assert!(matches!(result, Err(ConfigError::ValueOutOfRange { .. })));
    }

    #[test]
    fn test_read_all_lines_newest_first() {
        let (_dir, engine) = setup(EngineConfig::default());
        let lines = read(&engine, LogQuery::new("test.log"));
        assert_eq!(lines, vec![SAMPLE[2], SAMPLE[1], SAMPLE[0]]);
    }

    #[test]
    fn test_read_respects_limit() {
        let (_dir, engine) = setup(EngineConfig::default());
        let lines = read(&engine, LogQuery::new("test.log").with_limit(2));
        assert_eq!(lines, vec![SAMPLE[2], SAMPLE[1]]);
    }

    #[test]
    fn test_read_filter_is_case_insensitive() {
        let (_dir, engine) = setup(EngineConfig::default());
        let lines = read(&engine, LogQuery::new("test.log").with_filter("error"));
        assert_eq!(lines, vec![SAMPLE[0]]);
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let (_dir, engine) = setup(EngineConfig::default());
        let lines = read(&engine, LogQuery::new("test.log").with_filter(""));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_configured_max_lines_caps_default_and_requested_limit() {
        let (_dir, engine) = setup(EngineConfig::with_max_lines(2));
        assert_eq!(read(&engine, LogQuery::new("test.log")).len(), 2);
        assert_eq!(
            read(&engine, LogQuery::new("test.log").with_limit(50)).len(),
            2
        );
    }

    #[test]
    fn test_zero_limit_means_default() {
        let (_dir, engine) = setup(EngineConfig::default());
        assert_eq!(
            read(&engine, LogQuery::new("test.log").with_limit(0)).len(),
            3
        );
    }

    #[test]
    fn test_traversal_is_path_violation() {
        let (_dir, engine) = setup(EngineConfig::default());
        for name in ["../etc/passwd", "../x", "/etc/passwd", "a/../../b"] {
            let result = engine.read(&LogQuery::new(name));
            assert!(
                matches!(result, Err(RetrievalError::PathViolation { .. })),
                "{name}: {result:?}"
            );
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let (_dir, engine) = setup(EngineConfig::default());
        let result = engine.read(&LogQuery::new("nonexistent.log"));
        assert!(matches!(result, Err(RetrievalError::NotFound { .. })));
    }

    #[test]
    fn test_directory_is_not_found() {
        let (dir, engine) = setup(EngineConfig::default());
        fs::create_dir(dir.path().join("nginx")).unwrap();
        for name in ["nginx", ".", "test.log/inner"] {
            let result = engine.read(&LogQuery::new(name));
            assert!(
                matches!(result, Err(RetrievalError::NotFound { .. })),
                "{name}: {result:?}"
            );
        }
    }

    #[test]
    fn test_nested_file_is_readable() {
        let (dir, engine) = setup(EngineConfig::default());
        fs::create_dir(dir.path().join("nginx")).unwrap();
        fs::write(dir.path().join("nginx").join("access.log"), "GET /\n").unwrap();
        let lines = read(&engine, LogQuery::new("nginx/access.log"));
        assert_eq!(lines, vec!["GET /"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escaping_root_is_path_violation() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.log"), "secret\n").unwrap();
        let (dir, engine) = setup(EngineConfig::default());
        std::os::unix::fs::symlink(
            outside.path().join("secret.log"),
            dir.path().join("link.log"),
        )
        .unwrap();

        let result = engine.read(&LogQuery::new("link.log"));
        assert!(matches!(result, Err(RetrievalError::PathViolation { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_dir_outside_root_hides_target_existence() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("exists.log"), "secret\n").unwrap();
        let (dir, engine) = setup(EngineConfig::default());
        std::os::unix::fs::symlink(outside.path(), dir.path().join("ext")).unwrap();

        for name in ["ext/exists.log", "ext/missing.log", "ext/deeper/missing.log"] {
            let result = engine.read(&LogQuery::new(name));
            assert!(
                matches!(result, Err(RetrievalError::PathViolation { .. })),
                "{name}: {result:?}"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_out_of_root_is_path_violation() {
        let outside = TempDir::new().unwrap();
        let (dir, engine) = setup(EngineConfig::default());
        std::os::unix::fs::symlink(
            outside.path().join("missing.log"),
            dir.path().join("gone.log"),
        )
        .unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("missing_dir"),
            dir.path().join("gone_dir"),
        )
        .unwrap();

        for name in ["gone.log", "gone_dir/app.log"] {
            let result = engine.read(&LogQuery::new(name));
            assert!(
                matches!(result, Err(RetrievalError::PathViolation { .. })),
                "{name}: {result:?}"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_file_under_in_root_symlink_is_not_found() {
        let (dir, engine) = setup(EngineConfig::default());
        fs::create_dir(dir.path().join("archive")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("archive"), dir.path().join("old")).unwrap();

        let result = engine.read(&LogQuery::new("old/missing.log"));
        assert!(matches!(result, Err(RetrievalError::NotFound { .. })));
    }

    #[test]
    fn test_file_used_as_directory_is_not_found() {
        let (_dir, engine) = setup(EngineConfig::default());
        let result = engine.read(&LogQuery::new("test.log/inner.log"));
        assert!(matches!(result, Err(RetrievalError::NotFound { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_within_root_is_followed() {
        let (dir, engine) = setup(EngineConfig::default());
        std::os::unix::fs::symlink(dir.path().join("test.log"), dir.path().join("current.log"))
            .unwrap();
        assert_eq!(read(&engine, LogQuery::new("current.log")).len(), 3);
    }

    #[test]
    fn test_empty_file_yields_empty_result() {
        let (dir, engine) = setup(EngineConfig::default());
        fs::write(dir.path().join("empty.log"), "").unwrap();
        let result = engine.read(&LogQuery::new("empty.log")).unwrap();
        assert!(result.is_empty());
        assert!(!result.limit_reached);
    }

    #[test]
    fn test_regex_mode() {
        let (_dir, engine) = setup(EngineConfig {
            filter_mode: FilterMode::Regex,
            ..EngineConfig::default()
        });
        let lines = read(&engine, LogQuery::new("test.log").with_filter("^2023-01-0[23]"));
        assert_eq!(lines, vec![SAMPLE[2], SAMPLE[1]]);
    }

    #[test]
    fn test_invalid_regex_is_invalid_filter() {
        let (_dir, engine) = setup(EngineConfig {
            filter_mode: FilterMode::Regex,
            ..EngineConfig::default()
        });
        let result = engine.read(&LogQuery::new("test.log").with_filter("[oops"));
        assert!(matches!(result, Err(RetrievalError::InvalidFilter(_))));
    }

    #[test]
    fn test_limit_stops_scan_near_end_of_large_file() {
        let dir = TempDir::new().unwrap();
        let mut text = String::new();
        for i in 0..10_000 {
            text.push_str(&format!("2023-01-01 INFO: request {i}\n"));
        }
        fs::write(dir.path().join("big.log"), &text).unwrap();
        let engine = RetrievalEngine::new(
            dir.path(),
            EngineConfig {
                chunk_size: 4096,
                ..EngineConfig::default()
            },
        )
        .unwrap();

        let result = engine.read(&LogQuery::new("big.log").with_limit(5)).unwrap();
        assert_eq!(result.lines[0], "2023-01-01 INFO: request 9999");
        assert_eq!(result.lines[4], "2023-01-01 INFO: request 9995");
        assert!(result.limit_reached);
        assert_eq!(result.bytes_scanned, 4096);
    }

    #[test]
    fn test_sparse_filter_scans_whole_file() {
        let dir = TempDir::new().unwrap();
        let mut text = String::from("2023-01-01 ERROR: the only one\n");
        for i in 0..2_000 {
            text.push_str(&format!("2023-01-01 INFO: request {i}\n"));
        }
        fs::write(dir.path().join("sparse.log"), &text).unwrap();
        let engine = RetrievalEngine::new(
            dir.path(),
            EngineConfig {
                chunk_size: 4096,
                ..EngineConfig::default()
            },
        )
        .unwrap();

        let result = engine
            .read(&LogQuery::new("sparse.log").with_filter("error"))
            .unwrap();
        assert_eq!(result.lines, vec!["2023-01-01 ERROR: the only one"]);
        assert_eq!(result.bytes_scanned, result.file_size);
        assert!(!result.limit_reached);
    }

    #[test]
    fn test_read_is_idempotent() {
        let (_dir, engine) = setup(EngineConfig::default());
        let query = LogQuery::new("test.log").with_limit(2).with_filter("o");
        assert_eq!(engine.read(&query).unwrap(), engine.read(&query).unwrap());
    }
}
