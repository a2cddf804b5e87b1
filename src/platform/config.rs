// LogRetrieval - platform/config.rs
//
// Platform-specific config directory resolution and config.toml loading with
// startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.
//
// Every value is validated against the named constants in util::constants.
// Out-of-range values produce an actionable warning and fall back to the
// default; the server still starts but the operator is told why.

use crate::app::engine::EngineConfig;
use crate::core::filter::FilterMode;
use crate::util::constants;
use directories::ProjectDirs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Resolved platform paths for LogRetrieval configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logretrieval/)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Runs before logging is initialised, so problems are pushed onto
    /// `warnings` for the caller to log. Falls back to the current directory
    /// if platform dirs cannot be determined.
    pub fn resolve(warnings: &mut Vec<String>) -> Self {
        match ProjectDirs::from("", "", constants::APP_ID) {
            Some(proj_dirs) => Self {
                config_dir: proj_dirs.config_dir().to_path_buf(),
            },
            None => {
                warnings.push(
                    "Could not determine platform directories, using current directory"
                        .to_string(),
                );
                Self {
                    config_dir: PathBuf::from("."),
                }
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[server]` section.
    pub server: ServerSection,
    /// `[logs]` section.
    pub logs: LogsSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[server]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// TCP port to listen on.
    pub port: Option<i64>,
    /// Address to bind.
    pub bind_address: Option<String>,
    /// Bearer token; absent means open access.
    pub auth_token: Option<String>,
    /// HTML file served at `/` instead of the built-in page.
    pub index_file: Option<String>,
}

/// `[logs]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LogsSection {
    /// Directory log files are served from.
    pub root: Option<String>,
    /// Default and maximum lines per request.
    pub max_lines: Option<usize>,
    /// Backward-scan window size in bytes.
    pub chunk_size_bytes: Option<usize>,
    /// "substring" or "regex".
    pub filter_mode: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration.
///
/// Built from defaults, then config.toml, then CLI overrides applied by
/// `main`. Immutable once the server starts.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Server --
    /// TCP port.
    pub port: u16,
    /// Bind address.
    pub bind_address: IpAddr,
    /// Bearer token. `None` selects open-access mode.
    pub auth_token: Option<String>,
    /// Custom index page.
    pub index_file: Option<PathBuf>,

    // -- Logs --
    /// Log root directory.
    pub log_root: PathBuf,
    /// Default and maximum lines per request.
    pub max_lines: usize,
    /// Backward-scan window size in bytes.
    pub chunk_size: usize,
    /// Filter grammar.
    pub filter_mode: FilterMode,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,

    /// config.toml the values were read from; `None` when running on defaults.
    pub loaded_from: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: constants::DEFAULT_PORT,
            bind_address: IpAddr::from([0, 0, 0, 0]),
            auth_token: None,
            index_file: None,
            log_root: PathBuf::from(constants::DEFAULT_LOG_ROOT),
            max_lines: constants::DEFAULT_MAX_LINES,
            chunk_size: constants::DEFAULT_CHUNK_SIZE,
            filter_mode: FilterMode::default(),
            log_level: None,
            loaded_from: None,
        }
    }
}

impl AppConfig {
    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_lines: self.max_lines,
            chunk_size: self.chunk_size,
            filter_mode: self.filter_mode,
        }
    }
}

/// Validate a max-lines value from any source (config file or CLI).
pub fn validate_max_lines(value: usize) -> Result<usize, String> {
    if (constants::MIN_MAX_LINES..=constants::ABSOLUTE_MAX_LINES).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "max_lines = {value} is out of range ({}-{})",
            constants::MIN_MAX_LINES,
            constants::ABSOLUTE_MAX_LINES,
        ))
    }
}

/// Load and validate `config.toml` at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings.
/// If the file is unparseable, returns defaults with a warning.
///
/// Called before logging is initialised (the file may set the level), so
/// nothing here is logged directly: every problem goes into the warnings.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(e) => {
            let msg = format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!(
                "Failed to parse config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let mut config = validate(raw, &mut warnings);
    config.loaded_from = Some(config_path.to_path_buf());

    (config, warnings)
}

/// Apply each raw field over the defaults, accumulating warnings.
fn validate(raw: RawConfig, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- Server: port --
    if let Some(port) = raw.server.port {
        match u16::try_from(port) {
            Ok(p) if p > 0 => config.port = p,
            _ => warnings.push(format!(
                "[server] port = {port} is out of range (1-65535). Using default ({}).",
                constants::DEFAULT_PORT,
            )),
        }
    }

    // -- Server: bind_address --
    if let Some(ref addr) = raw.server.bind_address {
        match addr.parse::<IpAddr>() {
            Ok(ip) => config.bind_address = ip,
            Err(_) => warnings.push(format!(
                "[server] bind_address = \"{addr}\" is not an IP address. Using default ({}).",
                constants::DEFAULT_BIND_ADDRESS,
            )),
        }
    }

    // -- Server: auth_token --
    if let Some(token) = raw.server.auth_token {
        if token.trim().is_empty() {
            warnings.push(
                "[server] auth_token is empty. Authentication is disabled (open access)."
                    .to_string(),
            );
        } else {
            config.auth_token = Some(token);
        }
    }

    // -- Server: index_file --
    if let Some(ref file) = raw.server.index_file {
        if !file.is_empty() {
            config.index_file = Some(PathBuf::from(file));
        }
    }

    // -- Logs: root --
    if let Some(ref root) = raw.logs.root {
        if root.is_empty() {
            warnings.push(format!(
                "[logs] root is empty. Using default ({}).",
                constants::DEFAULT_LOG_ROOT,
            ));
        } else {
            config.log_root = PathBuf::from(root);
        }
    }

    // -- Logs: max_lines --
    if let Some(lines) = raw.logs.max_lines {
        match validate_max_lines(lines) {
            Ok(v) => config.max_lines = v,
            Err(msg) => warnings.push(format!(
                "[logs] {msg}. Using default ({}).",
                constants::DEFAULT_MAX_LINES,
            )),
        }
    }

    // -- Logs: chunk_size_bytes --
    if let Some(size) = raw.logs.chunk_size_bytes {
        if (constants::MIN_CHUNK_SIZE..=constants::MAX_CHUNK_SIZE).contains(&size) {
            config.chunk_size = size;
        } else {
            warnings.push(format!(
                "[logs] chunk_size_bytes = {size} is out of range ({}-{}). Using default ({}).",
                constants::MIN_CHUNK_SIZE,
                constants::MAX_CHUNK_SIZE,
                constants::DEFAULT_CHUNK_SIZE,
            ));
        }
    }

    // -- Logs: filter_mode --
    if let Some(ref mode) = raw.logs.filter_mode {
        match FilterMode::from_name(mode) {
            Some(m) => config.filter_mode = m,
            None => warnings.push(format!(
                "[logs] filter_mode = \"{mode}\" is not recognised. \
                 Expected \"substring\" or \"regex\". Using default (substring).",
            )),
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load(content: &str) -> (AppConfig, Vec<String>) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        load_config(&path)
    }

    #[test]
    fn test_missing_file_returns_defaults_without_warnings() {
        let dir = TempDir::new().unwrap();
        let (config, warnings) = load_config(&dir.path().join("config.toml"));
        assert!(warnings.is_empty());
        assert_eq!(config.port, constants::DEFAULT_PORT);
        assert_eq!(config.log_root, PathBuf::from(constants::DEFAULT_LOG_ROOT));
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_valid_file_is_applied() {
        let (config, warnings) = load(
            r#"
            [server]
            port = 9000
            bind_address = "127.0.0.1"
            auth_token = "abc"

            [logs]
            root = "/srv/logs"
            max_lines = 50
            chunk_size_bytes = 8192
            filter_mode = "regex"

            [logging]
            level = "debug"
            "#,
        );
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.port, 9000);
        assert_eq!(config.bind_address, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(config.auth_token.as_deref(), Some("abc"));
        assert_eq!(config.log_root, PathBuf::from("/srv/logs"));
        assert_eq!(config.max_lines, 50);
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.filter_mode, FilterMode::Regex);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_out_of_range_values_warn_and_fall_back() {
        let (config, warnings) = load(
            r#"
            [server]
            port = 70000

            [logs]
            max_lines = 0
            chunk_size_bytes = 1
            filter_mode = "glob"
            "#,
        );
        assert_eq!(warnings.len(), 4, "{warnings:?}");
        assert_eq!(config.port, constants::DEFAULT_PORT);
        assert_eq!(config.max_lines, constants::DEFAULT_MAX_LINES);
        assert_eq!(config.chunk_size, constants::DEFAULT_CHUNK_SIZE);
        assert_eq!(config.filter_mode, FilterMode::Substring);
    }

    #[test]
    fn test_source_recorded_only_when_file_is_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let (config, _) = load_config(&path);
        assert!(config.loaded_from.is_none());

        std::fs::write(&path, "[logs]\nmax_lines = 10\n").unwrap();
        let (config, warnings) = load_config(&path);
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.loaded_from.as_deref(), Some(path.as_path()));

        std::fs::write(&path, "not = = toml").unwrap();
        let (config, warnings) = load_config(&path);
        assert!(config.loaded_from.is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_platform_paths_report_problems_as_warnings() {
        let mut warnings = Vec::new();
        let paths = PlatformPaths::resolve(&mut warnings);
        assert!(paths.config_file().ends_with(constants::CONFIG_FILE_NAME));
        if paths.config_dir == PathBuf::from(".") {
            assert_eq!(warnings.len(), 1);
        } else {
            assert!(warnings.is_empty(), "{warnings:?}");
        }
    }

    #[test]
    fn test_filter_mode_name_is_case_insensitive() {
        let (config, warnings) = load("[logs]\nfilter_mode = \"Regex\"\n");
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.filter_mode, FilterMode::Regex);
    }

    #[test]
    fn test_empty_token_means_open_access() {
        let (config, warnings) = load("[server]\nauth_token = \"  \"\n");
        assert!(config.auth_token.is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_unparseable_file_returns_defaults_with_warning() {
        let (config, warnings) = load("this is = = not toml");
        assert_eq!(warnings.len(), 1);
        assert_eq!(config.max_lines, constants::DEFAULT_MAX_LINES);
    }

    #[test]
    fn test_engine_config_mirrors_app_config() {
        let config = AppConfig {
            max_lines: 7,
            chunk_size: 4096,
            filter_mode: FilterMode::Regex,
            ..AppConfig::default()
        };
        let engine = config.engine_config();
        assert_eq!(engine.max_lines, 7);
        assert_eq!(engine.chunk_size, 4096);
        assert_eq!(engine.filter_mode, FilterMode::Regex);
    }
}
