//! `SQLite` schema definitions for qrvault.
//!
//! This module contains the SQL statements for creating the database schema.
//! Every statement is idempotent, so the schema is simply applied on open.

use rusqlite::Connection;

use crate::error::Result;

/// SQL statement to create the clients table.
pub const CREATE_CLIENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the records table.
///
/// The foreign key has no `ON DELETE` action: removing a client must go
/// through [`super::Session::purge_client`], which deletes the records first.
pub const CREATE_RECORDS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL CHECK (length(trim(content)) > 0),
    created_at TEXT NOT NULL,
    owner_id INTEGER NOT NULL REFERENCES clients(id)
)
";

/// SQL statement to create an index on `external_id` for client lookup.
pub const CREATE_EXTERNAL_ID_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_clients_external_id ON clients(external_id)
";

/// SQL statement to create an index serving the per-owner history query.
pub const CREATE_OWNER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_records_owner_created ON records(owner_id, created_at DESC)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_CLIENTS_TABLE,
    CREATE_RECORDS_TABLE,
    CREATE_EXTERNAL_ID_INDEX,
    CREATE_OWNER_INDEX,
];

/// Apply the schema to a connection.
///
/// Also turns on foreign key enforcement, which `SQLite` leaves off per
/// connection by default.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Connection {
        Connection::open_in_memory().expect("failed to create in-memory database")
    }

    fn table_exists(conn: &Connection, name: &str) -> bool {
        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |row| row.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_create_clients_table_contains_required_columns() {
        assert!(CREATE_CLIENTS_TABLE.contains("id INTEGER PRIMARY KEY"));
        assert!(CREATE_CLIENTS_TABLE.contains("external_id TEXT NOT NULL UNIQUE"));
        assert!(CREATE_CLIENTS_TABLE.contains("created_at TEXT NOT NULL"));
    }

    #[test]
    fn test_create_records_table_references_clients() {
        assert!(CREATE_RECORDS_TABLE.contains("REFERENCES clients(id)"));
        assert!(!CREATE_RECORDS_TABLE.contains("ON DELETE"));
    }

    #[test]
    fn test_initialize_schema_creates_tables() {
        let conn = create_test_db();
        initialize_schema(&conn).expect("failed to initialize schema");

        assert!(table_exists(&conn, "clients"));
        assert!(table_exists(&conn, "records"));
    }

    #[test]
    fn test_initialize_schema_idempotent() {
        let conn = create_test_db();
        initialize_schema(&conn).expect("first init failed");
        initialize_schema(&conn).expect("second init failed");
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO records (content, created_at, owner_id) VALUES ('x', '2024-01-01', 42)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_content_rejected() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO clients (external_id, created_at) VALUES ('abc', '2024-01-01')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO records (content, created_at, owner_id) VALUES ('   ', '2024-01-01', 1)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_indexes_created() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();

        let indexes: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(indexes.iter().any(|n| n.contains("external_id")));
        assert!(indexes.iter().any(|n| n.contains("owner")));
    }
}
