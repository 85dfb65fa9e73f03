use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Location of the target database: a directory (the "server") holding the
/// `<name>.db` file.
#[derive(Debug, Clone)]
pub struct Database {
    dir: PathBuf,
    name: String,
}

impl Database {
    pub fn new<P: AsRef<Path>>(dir: P, name: &str) -> Self {
        Database {
            dir: dir.as_ref().to_path_buf(),
            name: name.to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.db", self.name))
    }

    /// Opens a connection scoped to the target database. Never creates the
    /// file, so this fails when the database does not exist yet.
    pub fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open_with_flags(
            self.path(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Server-scoped creation: makes sure the directory exists, then creates
    /// the database file. A no-op when the file is already there.
    pub fn create_if_missing(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create database directory {:?}", self.dir))?;
        let conn = Connection::open_with_flags(
            self.path(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to create database {:?}", self.path()))?;
        // SQLite defers writing the file until the first write.
        conn.execute_batch("PRAGMA user_version = 1;")?;
        Ok(())
    }
}

/// Fixed-count, fixed-delay retry used while probing the database at startup.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// A single attempt, no waiting.
    pub fn none() -> Self {
        RetryPolicy::new(1, Duration::ZERO)
    }

    /// Runs `f` until it succeeds or the attempts are exhausted, returning the
    /// last error. Blocks the calling thread between attempts.
    pub fn run<T, F>(&self, label: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut attempt = 1;
        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.attempts => {
                    warn!(
                        "{} failed (attempt {}/{}): {:#}. Retrying in {}ms",
                        label,
                        attempt,
                        self.attempts,
                        err,
                        self.delay.as_millis()
                    );
                    std::thread::sleep(self.delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(3, Duration::from_secs(2))
    }
}
