use super::tables::CANONICAL_TABLES;
use crate::sqlite_persistence::{list_tables, Database};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Ok,
    Error,
    Missing,
    Drift,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    pub detail: String,
}

impl HealthCheck {
    fn new(name: impl Into<String>, status: HealthStatus, detail: impl Into<String>) -> Self {
        HealthCheck {
            name: name.into(),
            status,
            detail: detail.into(),
        }
    }
}

/// The non-database parts of the deployment the report looks at.
#[derive(Debug, Clone, Default)]
pub struct HealthEnvironment {
    pub tmdb_configured: bool,
    pub omdb_configured: bool,
    pub oidc_configured: bool,
}

fn table_checks(database: &Database) -> Vec<HealthCheck> {
    let conn = match database.connect() {
        Ok(conn) => conn,
        Err(err) => {
            warn!("Health check could not open the database: {}", err);
            return vec![HealthCheck::new(
                "Database Connection",
                HealthStatus::Error,
                format!("Connection failed: {}", err),
            )];
        }
    };

    let mut checks = vec![HealthCheck::new(
        "Database Connection",
        HealthStatus::Ok,
        format!("Connected to {}", database.path().display()),
    )];

    let existing_tables = match list_tables(&conn) {
        Ok(tables) => tables,
        Err(err) => {
            checks[0] = HealthCheck::new(
                "Database Connection",
                HealthStatus::Error,
                format!("Could not list tables: {:#}", err),
            );
            return checks;
        }
    };

    for table in CANONICAL_TABLES {
        let name = format!("Table: {}", table.name);
        if !existing_tables.iter().any(|t| t == table.name) {
            checks.push(HealthCheck::new(
                name,
                HealthStatus::Missing,
                "Table not found (Repair needed)",
            ));
            continue;
        }
        let check = match table.detect_drift(&conn) {
            Ok(None) => HealthCheck::new(name, HealthStatus::Ok, "Exists"),
            Ok(Some(drift)) => HealthCheck::new(name, HealthStatus::Drift, drift),
            Err(err) => HealthCheck::new(name, HealthStatus::Error, format!("{:#}", err)),
        };
        checks.push(check);
    }
    checks
}

/// Builds the admin health report. Read-only: nothing is created or repaired.
pub fn check_health(database: &Database, environment: &HealthEnvironment) -> Vec<HealthCheck> {
    let mut checks = table_checks(database);

    checks.push(if environment.tmdb_configured {
        HealthCheck::new("TMDB Configuration", HealthStatus::Ok, "Key Configured")
    } else {
        HealthCheck::new(
            "TMDB Configuration",
            HealthStatus::Warning,
            "Missing TMDB API key",
        )
    });
    checks.push(if environment.omdb_configured {
        HealthCheck::new("OMDB Configuration", HealthStatus::Ok, "Key Configured")
    } else {
        HealthCheck::new(
            "OMDB Configuration",
            HealthStatus::Warning,
            "Missing OMDB API key",
        )
    });
    checks.push(if environment.oidc_configured {
        HealthCheck::new(
            "OIDC Identity Provider",
            HealthStatus::Ok,
            "Provider Configured",
        )
    } else {
        HealthCheck::new(
            "OIDC Identity Provider",
            HealthStatus::Error,
            "Missing OIDC configuration",
        )
    });

    checks
}
