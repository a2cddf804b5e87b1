// LogRetrieval - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Every bound the engine or gateway enforces is declared here so limits are
// auditable in one place.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogRetrieval";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "LogRetrieval";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Server defaults
// =============================================================================

/// Default TCP port the HTTP server listens on.
pub const DEFAULT_PORT: u16 = 8000;

/// Default bind address (all interfaces).
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Environment variable consulted for the bearer token when `--token` is not
/// given on the command line.
pub const TOKEN_ENV_VAR: &str = "LOGRETRIEVAL_TOKEN";

/// Maximum size of a custom index page read at startup.
pub const MAX_INDEX_FILE_SIZE: u64 = 1024 * 1024; // 1 MiB

// =============================================================================
// Retrieval limits
// =============================================================================

/// Default directory that requested log files are resolved against.
pub const DEFAULT_LOG_ROOT: &str = "/var/log";

/// Default (and maximum) number of lines returned by a single request.
pub const DEFAULT_MAX_LINES: usize = 1_000;

/// Minimum sensible value for the configured max-lines limit.
pub const MIN_MAX_LINES: usize = 1;

/// Hard upper bound on the configured max-lines limit. Each returned line is
/// held in memory until the response is serialised, so this caps the
/// per-request heap alongside the chunk size.
pub const ABSOLUTE_MAX_LINES: usize = 100_000;

/// Default size of the byte window read on each step of the backward scan.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024; // 64 KiB

/// Smallest configurable chunk size.
pub const MIN_CHUNK_SIZE: usize = 4 * 1024; // 4 KiB

/// Largest configurable chunk size.
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024; // 1 MiB

/// Maximum filter pattern length, applied in regex mode to bound compile cost.
pub const MAX_FILTER_PATTERN_LENGTH: usize = 4_096;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of a client-supplied value echoed into diagnostic output.
pub const DEBUG_MAX_VALUE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
