//! Fills in plot, poster, rating and year of every movie without a poster,
//! using the first TMDB search hit for its title.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hylla_server::catalog::{CatalogStore, SqliteCatalogStore};
use hylla_server::config::{DEFAULT_DB_NAME, DEFAULT_METADATA_TIMEOUT_MS};
use hylla_server::metadata::TmdbProvider;
use hylla_server::settings::{SettingsStore, SqliteSettingsStore, TMDB_API_KEY_SETTING};
use hylla_server::sqlite_persistence::Database;

const PAUSE_BETWEEN_UPDATES: Duration = Duration::from_millis(200);

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the database file.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: PathBuf,

    /// Database file name, without extension.
    #[clap(long, default_value = DEFAULT_DB_NAME)]
    pub db_name: String,

    /// TMDB read access token. Defaults to the `tmdb_api_key` app setting.
    #[clap(long)]
    pub tmdb_api_key: Option<String>,
}

#[derive(Debug, Default)]
struct BackfillSummary {
    updated: usize,
    no_match: usize,
    failed: usize,
}

fn resolve_token(cli_token: Option<String>, settings: &dyn SettingsStore) -> Result<String> {
    if let Some(token) = cli_token.filter(|t| !t.trim().is_empty()) {
        return Ok(token);
    }
    match settings.get_setting(TMDB_API_KEY_SETTING)? {
        Some(token) if !token.trim().is_empty() => Ok(token),
        _ => bail!(
            "No TMDB token: pass --tmdb-api-key or set the {} setting",
            TMDB_API_KEY_SETTING
        ),
    }
}

async fn backfill(catalog: &dyn CatalogStore, tmdb: &TmdbProvider) -> Result<BackfillSummary> {
    let movies = catalog
        .movies_missing_poster()
        .context("Failed to list movies without a poster")?;
    info!("{} movie(s) without a poster", movies.len());

    let mut summary = BackfillSummary::default();
    for movie in movies {
        let title = movie.fields.display_title().to_string();
        info!("Updating: {}...", title);

        let hits = match tmdb.search_movies(&title).await {
            Ok(hits) => hits,
            Err(err) => {
                warn!("Failed to update {}: {}", title, err);
                summary.failed += 1;
                continue;
            }
        };
        let Some(first) = hits.first() else {
            info!("No TMDB match for {}", title);
            summary.no_match += 1;
            continue;
        };

        match catalog.apply_backfill(movie.id, &first.to_backfill_update()) {
            Ok(()) => summary.updated += 1,
            Err(err) => {
                warn!("Failed to update {}: {:#}", title, err);
                summary.failed += 1;
                continue;
            }
        }
        tokio::time::sleep(PAUSE_BETWEEN_UPDATES).await;
    }
    Ok(summary)
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

    let database = Database::new(&cli_args.db_dir, &cli_args.db_name);
    if !database.path().exists() {
        bail!("Database not found at {:?}", database.path());
    }

    let settings = SqliteSettingsStore::new(database.clone());
    let token = resolve_token(cli_args.tmdb_api_key, &settings)?;
    let tmdb = TmdbProvider::new(token, Duration::from_millis(DEFAULT_METADATA_TIMEOUT_MS))?;
    let catalog = SqliteCatalogStore::new(database);

    let summary = backfill(&catalog, &tmdb).await?;
    info!(
        "Done! {} updated, {} without a match, {} failed",
        summary.updated, summary.no_match, summary.failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use hylla_server::catalog::MovieFields;
    use hylla_server::schema::SchemaGuardian;
    use hylla_server::sqlite_persistence::RetryPolicy;
    use std::collections::HashMap;
    use tempfile::TempDir;

    async fn spawn_fake_tmdb() -> String {
        let app = Router::new().route(
            "/search/movie",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let results = if params.get("query").map(String::as_str) == Some("Alien") {
                    serde_json::json!([{
                        "id": 348, "title": "Alien", "release_date": "1979-05-25",
                        "poster_path": "/alien.jpg", "overview": "In deep space...",
                        "vote_average": 8.1
                    }])
                } else {
                    serde_json::json!([])
                };
                Json(serde_json::json!({ "results": results }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    fn create_tmp_database() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let database = Database::new(temp_dir.path(), "hylla");
        assert!(SchemaGuardian::new(database.clone(), RetryPolicy::none())
            .ensure_schema()
            .is_healthy());
        (database, temp_dir)
    }

    fn titled(title: &str) -> MovieFields {
        MovieFields {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn token_comes_from_flag_then_setting() {
        let (database, _temp_dir) = create_tmp_database();
        let settings = SqliteSettingsStore::new(database);

        assert!(resolve_token(None, &settings).is_err());
        assert!(resolve_token(Some("  ".to_string()), &settings).is_err());

        settings.set_setting(TMDB_API_KEY_SETTING, "from-settings").unwrap();
        assert_eq!(resolve_token(None, &settings).unwrap(), "from-settings");
        assert_eq!(
            resolve_token(Some("from-flag".to_string()), &settings).unwrap(),
            "from-flag"
        );
    }

    #[tokio::test]
    async fn fills_movies_without_poster() {
        let (database, _temp_dir) = create_tmp_database();
        let catalog = SqliteCatalogStore::new(database);
        let alien = catalog.add_movie(&titled("Alien")).unwrap();
        let obscure = catalog.add_movie(&titled("Nothing Matches This")).unwrap();
        let with_poster = catalog
            .add_movie(&MovieFields {
                poster: Some("https://example.com/p.jpg".to_string()),
                ..titled("Heat")
            })
            .unwrap();

        let base_url = spawn_fake_tmdb().await;
        let tmdb = TmdbProvider::with_base_url(base_url, "token", Duration::from_secs(5)).unwrap();

        let summary = backfill(&catalog, &tmdb).await.unwrap();

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.no_match, 1);
        assert_eq!(summary.failed, 0);

        let alien = catalog.get_movie(alien).unwrap().unwrap();
        assert_eq!(alien.fields.year, Some(1979));
        assert_eq!(alien.fields.rating, Some(8.1));
        assert_eq!(
            alien.fields.poster.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/alien.jpg")
        );
        assert_eq!(alien.fields.plot.as_deref(), Some("In deep space..."));

        assert!(catalog.get_movie(obscure).unwrap().unwrap().fields.poster.is_none());
        assert_eq!(
            catalog.get_movie(with_poster).unwrap().unwrap().fields.poster.as_deref(),
            Some("https://example.com/p.jpg")
        );
    }
}
