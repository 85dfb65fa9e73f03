use anyhow::Result;
use rusqlite::{params, Connection};

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // mutated only when options such as `non_null = true` are given
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }

    fn from_declared(declared: &str) -> Option<&'static SqlType> {
        match declared.to_uppercase().as_str() {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" => Some(&SqlType::Real),
            _ => None,
        }
    }
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub default_value: Option<&'static str>,
}

/// A canonical table definition. The creation statement is always rendered
/// with `IF NOT EXISTS`, so running it against a database that already has
/// the table is a no-op.
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub fn creation_sql(&self) -> String {
        let mut create_sql = format!("CREATE TABLE IF NOT EXISTS {} (", self.name);
        for (column_index, column) in self.columns.iter().enumerate() {
            if column_index > 0 {
                create_sql.push_str(", ");
            }
            // Quoted because some column names (`cast`) are SQL keywords.
            create_sql.push_str(&format!("\"{}\" {}", column.name, column.sql_type.as_sql()));
            if column.is_primary_key {
                create_sql.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                create_sql.push_str(" NOT NULL");
            }
            if let Some(default_value) = column.default_value {
                create_sql.push_str(&format!(" DEFAULT {}", default_value));
            }
        }
        create_sql.push_str(");");
        create_sql
    }

    pub fn create_if_not_exists(&self, conn: &Connection) -> Result<()> {
        conn.execute(&self.creation_sql(), params![])?;
        Ok(())
    }

    /// Compares the live table layout with this definition.
    ///
    /// Returns `Ok(None)` when the table matches, `Ok(Some(description))` when
    /// the columns drifted, and `Err` when the table could not be inspected.
    /// A missing table is reported as drift with no columns.
    pub fn detect_drift(&self, conn: &Connection) -> Result<Option<String>> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual_columns: Vec<(String, String, bool)> = stmt
            .query_map(params![], |row| {
                Ok((
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i32>(5)? > 0,
                ))
            })?
            .collect::<rusqlite::Result<_>>()?;

        if actual_columns.len() != self.columns.len() {
            return Ok(Some(format!(
                "Table {} has {} columns, expected {}. Found: {}, expected: {}",
                self.name,
                actual_columns.len(),
                self.columns.len(),
                actual_columns
                    .iter()
                    .map(|(name, _, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        for ((name, declared_type, is_pk), expected) in actual_columns.iter().zip(self.columns) {
            if name != expected.name {
                return Ok(Some(format!(
                    "Table {} column name mismatch: expected {}, got {}",
                    self.name, expected.name, name
                )));
            }
            if SqlType::from_declared(declared_type) != Some(expected.sql_type) {
                return Ok(Some(format!(
                    "Table {} column {} type mismatch: expected {:?}, got {}",
                    self.name, expected.name, expected.sql_type, declared_type
                )));
            }
            if *is_pk != expected.is_primary_key {
                return Ok(Some(format!(
                    "Table {} column {} primary key mismatch: expected {}, got {}",
                    self.name, expected.name, expected.is_primary_key, is_pk
                )));
            }
        }
        Ok(None)
    }
}

/// Names of all the user tables currently present in the database.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TABLE: Table = Table {
        name: "test_table",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("name", &SqlType::Text, non_null = true),
            sqlite_column!("cast", &SqlType::Text),
            sqlite_column!("score", &SqlType::Real, default_value = Some("0")),
        ],
    };

    #[test]
    fn renders_idempotent_creation_statement() {
        assert_eq!(
            TEST_TABLE.creation_sql(),
            "CREATE TABLE IF NOT EXISTS test_table (\"id\" INTEGER PRIMARY KEY, \"name\" TEXT NOT NULL, \"cast\" TEXT, \"score\" REAL DEFAULT 0);"
        );
    }

    #[test]
    fn creating_twice_is_harmless() {
        let conn = Connection::open_in_memory().unwrap();
        TEST_TABLE.create_if_not_exists(&conn).unwrap();
        conn.execute("INSERT INTO test_table (name) VALUES ('kept')", [])
            .unwrap();
        TEST_TABLE.create_if_not_exists(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM test_table", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn freshly_created_table_has_no_drift() {
        let conn = Connection::open_in_memory().unwrap();
        TEST_TABLE.create_if_not_exists(&conn).unwrap();
        assert!(TEST_TABLE.detect_drift(&conn).unwrap().is_none());
    }

    #[test]
    fn detects_missing_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE test_table (id INTEGER PRIMARY KEY, name TEXT NOT NULL, \"cast\" TEXT)",
            [],
        )
        .unwrap();

        let drift = TEST_TABLE.detect_drift(&conn).unwrap().unwrap();
        assert!(drift.contains("has 3 columns, expected 4"));
    }

    #[test]
    fn detects_type_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE test_table (id INTEGER PRIMARY KEY, name TEXT NOT NULL, \"cast\" TEXT, score TEXT)",
            [],
        )
        .unwrap();

        let drift = TEST_TABLE.detect_drift(&conn).unwrap().unwrap();
        assert!(drift.contains("column score type mismatch"));
    }

    #[test]
    fn lists_user_tables_only() {
        let conn = Connection::open_in_memory().unwrap();
        TEST_TABLE.create_if_not_exists(&conn).unwrap();
        conn.execute("CREATE TABLE other (id INTEGER)", []).unwrap();

        let mut tables = list_tables(&conn).unwrap();
        tables.sort();
        assert_eq!(tables, vec!["other".to_string(), "test_table".to_string()]);
    }
}
