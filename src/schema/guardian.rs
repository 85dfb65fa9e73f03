use super::tables::CANONICAL_TABLES;
use crate::audit::{append_entry, AuditAction, SYSTEM_ACTOR};
use crate::sqlite_persistence::{list_tables, Database, RetryPolicy};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, error, info, warn};

pub const REPAIR_SUBJECT: &str = "Database Structure";

/// Outcome of a schema check.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SchemaReport {
    /// The database file did not exist and was created.
    pub database_created: bool,
    /// Tables that were absent and have been created, in creation order.
    pub created_tables: Vec<String>,
    pub repair_recorded: bool,
    pub failure: Option<String>,
}

impl SchemaReport {
    pub fn is_healthy(&self) -> bool {
        self.failure.is_none()
    }
}

/// Makes sure the target database and all its tables exist.
///
/// Every method here is blocking; call it from `spawn_blocking` in async code.
#[derive(Clone)]
pub struct SchemaGuardian {
    database: Database,
    retry_policy: RetryPolicy,
}

impl SchemaGuardian {
    pub fn new(database: Database, retry_policy: RetryPolicy) -> Self {
        SchemaGuardian {
            database,
            retry_policy,
        }
    }

    /// Idempotent: on a complete schema this changes nothing and records
    /// nothing. Never fails; problems end up in the report and in the logs.
    pub fn ensure_schema(&self) -> SchemaReport {
        info!("Checking database schema at {:?}...", self.database.path());
        let mut report = SchemaReport::default();

        match self.database.connect() {
            Ok(_) => debug!("Database {} exists", self.database.name()),
            Err(err) => {
                warn!(
                    "Database {} not accessible ({}), attempting to create it",
                    self.database.name(),
                    err
                );
                match self
                    .retry_policy
                    .run("Database creation", || self.database.create_if_missing())
                {
                    Ok(()) => {
                        info!("Created database {:?}", self.database.path());
                        report.database_created = true;
                    }
                    // Keep going, the tables step reports whatever is still wrong.
                    Err(err) => warn!(
                        "Could not create database {:?}: {:#}",
                        self.database.path(),
                        err
                    ),
                }
            }
        }

        if let Err(err) = self.ensure_tables(&mut report) {
            error!("CRITICAL: database schema initialization failed: {:#}", err);
            report.failure = Some(format!("{:#}", err));
        }

        report
    }

    fn ensure_tables(&self, report: &mut SchemaReport) -> Result<()> {
        let conn = self
            .database
            .connect()
            .with_context(|| format!("Failed to open database {:?}", self.database.path()))?;
        let existing_tables = list_tables(&conn).context("Failed to list existing tables")?;

        for table in CANONICAL_TABLES {
            table
                .create_if_not_exists(&conn)
                .with_context(|| format!("Failed to create table {}", table.name))?;
            if !existing_tables.iter().any(|name| name == table.name) {
                report.created_tables.push(table.name.to_string());
            }
        }

        if report.created_tables.is_empty() {
            info!("Database schema is complete");
            return Ok(());
        }

        let details = format!(
            "System recovered missing tables: {}",
            report.created_tables.join(", ")
        );
        warn!("{}", details);
        append_entry(
            &conn,
            SYSTEM_ACTOR,
            AuditAction::Repair,
            REPAIR_SUBJECT,
            &details,
        )
        .context("Failed to record schema repair")?;
        report.repair_recorded = true;
        Ok(())
    }
}
