use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hylla_server::config;
use hylla_server::oidc::OidcClient;
use hylla_server::server::{run_server, RequestsLoggingLevel, ServerConfig, ServerState};

/// Makes a CLI path absolute. Paths that do not exist yet are accepted, the
/// database directory for one is created on first start.
fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    match path.canonicalize() {
        Ok(canonical) => Ok(canonical),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => std::path::absolute(&path)
            .map_err(|e| format!("Cannot make {:?} absolute: {}", s, e)),
        Err(e) => Err(format!("Cannot resolve {:?}: {}", s, e)),
    }
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// TOML configuration file. Its values take precedence over these flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory of the database file, created if missing.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Database file name, without extension.
    #[clap(long)]
    pub db_name: Option<String>,

    /// HTTP port.
    #[clap(short, long, default_value_t = 5000)]
    pub port: u16,

    /// How much of each request to log.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Built web frontend, served in place of the JSON home page.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Where uploaded branding images are stored. Defaults to <db_dir>/uploads.
    #[clap(long, value_parser = parse_path)]
    pub uploads_dir: Option<PathBuf>,

    /// Do not check or repair the database schema at startup.
    #[clap(long, default_value_t = false)]
    pub skip_db_init: bool,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            db_name: args.db_name.clone(),
            port: args.port,
            logging_level: args.logging_level.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
            uploads_dir: args.uploads_dir.clone(),
            skip_db_init: args.skip_db_init,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // TOML overrides CLI
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  database: {:?}", app_config.db_path());
    info!("  uploads_dir: {:?}", app_config.uploads_dir);
    info!("  port: {}", app_config.port);
    info!("  logging_level: {}", app_config.logging_level);
    info!(
        "  metadata: tmdb={} omdb={}",
        app_config.metadata.tmdb_api_key.is_some(),
        app_config.metadata.omdb_api_key.is_some()
    );

    // Login stays unavailable when the provider cannot be reached, the rest
    // of the server keeps working.
    let oidc_client = match &app_config.oidc {
        Some(oidc_config) => match OidcClient::new(oidc_config.clone()).await {
            Ok(client) => Some(Arc::new(client)),
            Err(err) => {
                error!("OIDC initialization failed, login disabled: {:#}", err);
                None
            }
        },
        None => {
            warn!("No [oidc] section configured, login disabled");
            None
        }
    };

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        frontend_dir_path: app_config.frontend_dir_path.clone(),
    };
    let state = ServerState::new(server_config, &app_config, oidc_client);

    if app_config.skip_db_init {
        info!("Skipping database schema check");
    } else {
        let guardian = state.schema_guardian.clone();
        let report = tokio::task::spawn_blocking(move || guardian.ensure_schema()).await?;
        if report.is_healthy() {
            info!(
                "Database ready ({} table(s) created)",
                report.created_tables.len()
            );
        } else {
            // Startup continues: the admin health page can retry the repair.
            error!("Database schema check failed: {:?}", report.failure);
        }
    }

    tokio::select! {
        result = run_server(state) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
