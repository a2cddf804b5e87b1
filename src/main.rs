// LogRetrieval - main.rs
//
// Server entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation
// 3. CLI overrides on top of the file configuration
// 4. Engine and index page construction
// 5. HTTP serving until Ctrl-C / SIGTERM

use clap::Parser;
use logretrieval::api::auth::AuthMode;
use logretrieval::api::index::IndexPage;
use logretrieval::api::{build_router, GatewayState};
use logretrieval::app::engine::RetrievalEngine;
use logretrieval::core::filter::FilterMode;
use logretrieval::platform::config::{self, AppConfig, PlatformPaths};
use logretrieval::util;
use logretrieval::util::error::LogRetrievalError;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// LogRetrieval - serve the most recent lines of log files over HTTP.
///
/// Files are read backwards from the end in fixed-size chunks, so even very
/// large logs are answered without loading them into memory.
#[derive(Parser, Debug)]
#[command(name = "logretrieval", version, about)]
struct Cli {
    /// Port to listen on.
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Bearer token required on /logs. Open access when unset.
    #[arg(short = 't', long = "token", env = util::constants::TOKEN_ENV_VAR, hide_env_values = true)]
    token: Option<String>,

    /// Directory log files are served from.
    #[arg(long = "log-dir")]
    log_dir: Option<PathBuf>,

    /// Default and maximum number of lines per request.
    #[arg(long = "max-lines", value_parser = parse_max_lines)]
    max_lines: Option<usize>,

    /// Address to bind.
    #[arg(long = "bind")]
    bind: Option<IpAddr>,

    /// Filter grammar: "substring" or "regex".
    #[arg(long = "filter-mode", value_parser = parse_filter_mode)]
    filter_mode: Option<FilterMode>,

    /// Path to config.toml (defaults to the platform config directory).
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn parse_max_lines(raw: &str) -> Result<usize, String> {
    let value = raw
        .parse::<usize>()
        .map_err(|e| format!("'{raw}' is not a valid line count: {e}"))?;
    config::validate_max_lines(value)
}

fn parse_filter_mode(raw: &str) -> Result<FilterMode, String> {
    FilterMode::from_name(raw)
        .ok_or_else(|| format!("unknown filter mode '{raw}' (expected 'substring' or 'regex')"))
}

impl Cli {
    /// Apply command-line values over the file configuration.
    fn apply(self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(token) = self.token {
            config.auth_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(dir) = self.log_dir {
            config.log_root = dir;
        }
        if let Some(max_lines) = self.max_lines {
            config.max_lines = max_lines;
        }
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(mode) = self.filter_mode {
            config.filter_mode = mode;
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The config file may set the log level, so it is read before logging
    // starts; anything worth reporting comes back as a warning.
    let mut startup_warnings = Vec::new();
    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => PlatformPaths::resolve(&mut startup_warnings).config_file(),
    };
    let (mut app_config, config_warnings) = config::load_config(&config_path);
    startup_warnings.extend(config_warnings);

    util::logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "LogRetrieval starting"
    );
    match &app_config.loaded_from {
        Some(path) => tracing::info!(path = %path.display(), "Loaded config.toml"),
        None => tracing::debug!(
            path = %config_path.display(),
            "No usable config.toml; using defaults"
        ),
    }
    for warning in &startup_warnings {
        tracing::warn!("{}", warning);
    }

    cli.apply(&mut app_config);

    if let Err(e) = run(app_config).await {
        tracing::error!(error = %e, "LogRetrieval failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Build the gateway and serve until shutdown.
async fn run(app_config: AppConfig) -> util::error::Result<()> {
    let engine = RetrievalEngine::new(&app_config.log_root, app_config.engine_config())?;

    let index = match &app_config.index_file {
        Some(path) => IndexPage::from_file(path)?,
        None => IndexPage::builtin(),
    };

    let auth = AuthMode::from_token(app_config.auth_token.clone());
    let addr = SocketAddr::new(app_config.bind_address, app_config.port);

    println!(
        "Serving logs from {} on port {}",
        engine.root().display(),
        app_config.port
    );
    if auth.is_enabled() {
        println!("Authentication enabled: Bearer token required on /logs");
    } else {
        println!("Authentication disabled: /logs is open to every client");
        tracing::warn!("No token configured; serving /logs in open-access mode");
    }

    let state = GatewayState::new(engine, auth, index);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LogRetrievalError::Server {
            addr,
            operation: "bind",
            source: e,
        })?;

    tracing::info!(%addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LogRetrievalError::Server {
            addr,
            operation: "serve",
            source: e,
        })?;

    tracing::info!("LogRetrieval stopped");
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
