mod file_config;

pub use file_config::{FileConfig, MetadataFileConfig, OidcFileConfig, SchemaFileConfig};

use crate::server::RequestsLoggingLevel;
use crate::sqlite_persistence::{Database, RetryPolicy};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_NAME: &str = "hylla";
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_METADATA_TIMEOUT_MS: u64 = 2000;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub db_name: Option<String>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub uploads_dir: Option<PathBuf>,
    pub skip_db_init: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub db_name: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub uploads_dir: PathBuf,
    pub skip_db_init: bool,

    pub schema: SchemaSettings,
    /// None when the identity provider is not configured; login is then
    /// unavailable.
    pub oidc: Option<OidcConfig>,
    pub metadata: MetadataSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSettings {
    pub connect_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OidcConfig {
    pub provider_url: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub admin_group: Option<String>,
}

pub fn default_oidc_scopes() -> Vec<String> {
    ["openid", "profile", "email", "groups"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataSettings {
    pub tmdb_api_key: Option<String>,
    pub omdb_api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            omdb_api_key: None,
            timeout_ms: DEFAULT_METADATA_TIMEOUT_MS,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        // A missing directory is created by the schema guardian.
        if db_dir.exists() && !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let db_name = file
            .db_name
            .or_else(|| cli.db_name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_NAME.to_string());
        if db_name.contains(['/', '\\']) {
            bail!("db_name must be a plain file name: {}", db_name);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let uploads_dir = file
            .uploads_dir
            .map(PathBuf::from)
            .or_else(|| cli.uploads_dir.clone())
            .unwrap_or_else(|| db_dir.join("uploads"));

        let skip_db_init = file.skip_db_init.unwrap_or(cli.skip_db_init);

        let schema_file = file.schema.unwrap_or_default();
        let schema = SchemaSettings {
            connect_attempts: schema_file
                .connect_attempts
                .unwrap_or(DEFAULT_CONNECT_ATTEMPTS),
            retry_delay_ms: schema_file
                .retry_delay_ms
                .unwrap_or(DEFAULT_RETRY_DELAY_MS),
        };

        let oidc = match file.oidc {
            Some(oidc_file) => Some(resolve_oidc(oidc_file)?),
            None => None,
        };

        let metadata_file = file.metadata.unwrap_or_default();
        let metadata = MetadataSettings {
            tmdb_api_key: metadata_file.tmdb_api_key.filter(|k| !k.is_empty()),
            omdb_api_key: metadata_file.omdb_api_key.filter(|k| !k.is_empty()),
            timeout_ms: metadata_file
                .timeout_ms
                .unwrap_or(DEFAULT_METADATA_TIMEOUT_MS),
        };

        Ok(Self {
            db_dir,
            db_name,
            port,
            logging_level,
            frontend_dir_path,
            uploads_dir,
            skip_db_init,
            schema,
            oidc,
            metadata,
        })
    }

    pub fn database(&self) -> Database {
        Database::new(&self.db_dir, &self.db_name)
    }

    pub fn db_path(&self) -> PathBuf {
        self.database().path()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.schema.connect_attempts,
            Duration::from_millis(self.schema.retry_delay_ms),
        )
    }
}

fn resolve_oidc(file: OidcFileConfig) -> Result<OidcConfig> {
    let required = |value: Option<String>, name: &str| -> Result<String> {
        match value.filter(|v| !v.trim().is_empty()) {
            Some(v) => Ok(v),
            None => bail!("[oidc] section requires {}", name),
        }
    };
    Ok(OidcConfig {
        provider_url: required(file.provider_url, "provider_url")?,
        client_id: required(file.client_id, "client_id")?,
        client_secret: file.client_secret,
        redirect_uri: required(file.redirect_uri, "redirect_uri")?,
        scopes: file
            .scopes
            .filter(|s| !s.is_empty())
            .unwrap_or_else(default_oidc_scopes),
        admin_group: file.admin_group.filter(|g| !g.trim().is_empty()),
    })
}

/// Case-insensitive, so "Headers" in a TOML file works too.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_in(dir: &TempDir) -> CliConfig {
        CliConfig {
            db_dir: Some(dir.path().to_path_buf()),
            port: 5000,
            ..Default::default()
        }
    }

    fn oidc_section(client_id: Option<&str>) -> OidcFileConfig {
        OidcFileConfig {
            provider_url: Some("https://auth.example.org".to_string()),
            client_id: client_id.map(str::to_string),
            redirect_uri: Some("https://hylla.example.org/auth/callback".to_string()),
            admin_group: Some("  ".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn logging_level_names_ignore_case() {
        assert_eq!(parse_logging_level("none"), Some(RequestsLoggingLevel::None));
        assert_eq!(parse_logging_level("Headers"), Some(RequestsLoggingLevel::Headers));
        assert_eq!(parse_logging_level("BODY"), Some(RequestsLoggingLevel::Body));
        assert_eq!(parse_logging_level("verbose"), None);
    }

    #[test]
    fn defaults_derive_from_db_dir() {
        let dir = TempDir::new().unwrap();

        let config = AppConfig::resolve(&cli_in(&dir), None).unwrap();

        assert_eq!(config.db_name, DEFAULT_DB_NAME);
        assert_eq!(config.db_path(), dir.path().join("hylla.db"));
        assert_eq!(config.uploads_dir, dir.path().join("uploads"));
        assert_eq!(config.port, 5000);
        assert!(!config.skip_db_init);
        assert_eq!(config.schema, SchemaSettings::default());
        assert_eq!(config.metadata.timeout_ms, 2000);
        assert!(config.oidc.is_none());
    }

    #[test]
    fn cli_values_are_used_without_a_file() {
        let dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_name: Some("films".to_string()),
            logging_level: RequestsLoggingLevel::Headers,
            frontend_dir_path: Some("/srv/hylla-web".to_string()),
            skip_db_init: true,
            ..cli_in(&dir)
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_path(), dir.path().join("films.db"));
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.frontend_dir_path.as_deref(), Some("/srv/hylla-web"));
        assert!(config.skip_db_init);
    }

    #[test]
    fn file_values_win_over_cli() {
        let dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/nowhere")),
            ..cli_in(&dir)
        };
        let file = FileConfig {
            db_dir: Some(dir.path().to_string_lossy().to_string()),
            port: Some(8080),
            logging_level: Some("body".to_string()),
            uploads_dir: Some("/srv/uploads".to_string()),
            schema: Some(SchemaFileConfig {
                connect_attempts: Some(5),
                retry_delay_ms: None,
            }),
            metadata: Some(MetadataFileConfig {
                tmdb_api_key: Some("tmdb-token".to_string()),
                omdb_api_key: Some(String::new()),
                timeout_ms: Some(750),
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file)).unwrap();

        assert_eq!(config.db_dir, dir.path());
        assert_eq!(config.port, 8080);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.uploads_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(config.schema.connect_attempts, 5);
        assert_eq!(config.schema.retry_delay_ms, DEFAULT_RETRY_DELAY_MS);
        assert_eq!(config.metadata.tmdb_api_key.as_deref(), Some("tmdb-token"));
        // Blank keys count as unset.
        assert_eq!(config.metadata.omdb_api_key, None);
        assert_eq!(config.metadata.timeout_ms, 750);
    }

    #[test]
    fn oidc_section_gets_default_scopes() {
        let dir = TempDir::new().unwrap();
        let file = FileConfig {
            oidc: Some(oidc_section(Some("hylla"))),
            ..Default::default()
        };

        let oidc = AppConfig::resolve(&cli_in(&dir), Some(file))
            .unwrap()
            .oidc
            .unwrap();

        assert_eq!(oidc.client_id, "hylla");
        assert_eq!(oidc.scopes, default_oidc_scopes());
        assert_eq!(oidc.admin_group, None);
    }

    #[test]
    fn oidc_section_without_client_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = FileConfig {
            oidc: Some(oidc_section(None)),
            ..Default::default()
        };

        let err = AppConfig::resolve(&cli_in(&dir), Some(file)).unwrap_err();
        assert!(err.to_string().contains("client_id"), "{}", err);
    }

    #[test]
    fn db_dir_is_required() {
        let err = AppConfig::resolve(&CliConfig::default(), None).unwrap_err();
        assert!(err.to_string().contains("--db-dir"), "{}", err);
    }

    #[test]
    fn db_dir_may_not_exist_yet_but_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        let later = CliConfig {
            db_dir: Some(dir.path().join("created-by-guardian")),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&later, None).is_ok());

        let file = tempfile::NamedTempFile::new().unwrap();
        let not_a_dir = CliConfig {
            db_dir: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&not_a_dir, None).is_err());
    }

    #[test]
    fn db_name_must_be_a_plain_name() {
        let dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_name: Some("../escape".to_string()),
            ..cli_in(&dir)
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }
}
