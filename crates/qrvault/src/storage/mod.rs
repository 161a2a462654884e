//! Storage layer for qrvault.
//!
//! This module provides `SQLite`-based persistent storage for clients and
//! their saved records. All access goes through a [`Session`], a per-request
//! lease on the connection; every write inside a session runs in its own
//! transaction that commits on success and rolls back when dropped.

pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{format_timestamp, parse_timestamp, Client, Record};

const MEMORY_PATH: &str = ":memory:";

/// Storage engine for clients and records.
///
/// Owns a single `SQLite` connection. The handle is `Sync` and is meant to be
/// shared behind an `Arc`; callers obtain a [`Session`] per unit of work.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// then applies the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL lets readers proceed while a write transaction is open
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        schema::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(MEMORY_PATH),
            source,
        })?;

        schema::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(MEMORY_PATH),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Begin a storage session.
    ///
    /// The session holds the connection until it is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if a previous holder panicked while using the connection.
    pub fn session(&self) -> Result<Session<'_>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::internal("storage connection lock poisoned"))?;
        Ok(Session { conn })
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let session = self.session()?;
        let total_clients = session.count_clients()?;
        let total_records = session.count_records()?;

        let oldest: Option<String> = session
            .conn
            .query_row(
                "SELECT created_at FROM records ORDER BY created_at ASC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let newest: Option<String> = session
            .conn
            .query_row(
                "SELECT created_at FROM records ORDER BY created_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let db_size_bytes = if self.path.as_os_str() == MEMORY_PATH {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_clients,
            total_records,
            oldest_record: oldest.as_deref().map(parse_timestamp),
            newest_record: newest.as_deref().map(parse_timestamp),
            db_size_bytes,
        })
    }
}

/// A per-request lease on the storage connection.
///
/// Reads run directly on the connection. Each write opens a transaction;
/// if the write returns early with an error the transaction is dropped and
/// rolled back.
#[derive(Debug)]
pub struct Session<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl Session<'_> {
    /// Look up a client by its caller-supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_client(&self, external_id: &str) -> Result<Option<Client>> {
        let client = self
            .conn
            .query_row(
                "SELECT id, external_id, created_at FROM clients WHERE external_id = ?1",
                [external_id],
                Self::row_to_client,
            )
            .optional()?;
        Ok(client)
    }

    /// Look up a client, creating and committing it if it doesn't exist.
    ///
    /// If the insert loses a race against another creator of the same
    /// identifier, the unique constraint rejects it and the winner's row is
    /// returned instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_or_create_client(&mut self, external_id: &str) -> Result<Client> {
        if let Some(client) = self.find_client(external_id)? {
            return Ok(client);
        }

        match self.insert_client(external_id) {
            Ok(client) => Ok(client),
            Err(err) if err.is_unique_violation() => {
                debug!("Client {} created concurrently, re-reading", external_id);
                self.find_client(external_id)?.ok_or_else(|| {
                    Error::internal(format!("client {external_id} vanished after conflict"))
                })
            }
            Err(err) => Err(err),
        }
    }

    fn insert_client(&mut self, external_id: &str) -> Result<Client> {
        let created_at = Utc::now().trunc_subsecs(6);
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO clients (external_id, created_at) VALUES (?1, ?2)",
            params![external_id, format_timestamp(created_at)],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!("Created client {} for {}", id, external_id);
        Ok(Client {
            id,
            external_id: external_id.to_string(),
            created_at,
        })
    }

    /// Insert a new record owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing is written.
    pub fn insert_record(&mut self, owner: &Client, content: &str) -> Result<Record> {
        let created_at = Utc::now().trunc_subsecs(6);
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO records (content, created_at, owner_id) VALUES (?1, ?2, ?3)",
            params![content, format_timestamp(created_at), owner.id],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!("Inserted record {} for client {}", id, owner.id);
        Ok(Record {
            id,
            content: content.to_string(),
            created_at,
            owner_id: owner.id,
        })
    }

    /// Get a record by id, only if it is owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_record(&self, owner: &Client, id: i64) -> Result<Option<Record>> {
        let record = self
            .conn
            .query_row(
                r"
                SELECT id, content, created_at, owner_id
                FROM records WHERE id = ?1 AND owner_id = ?2
                ",
                params![id, owner.id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Get every record owned by `owner`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_records(&self, owner: &Client) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, content, created_at, owner_id
            FROM records WHERE owner_id = ?1
            ORDER BY created_at DESC, id DESC
            ",
        )?;

        let records = stmt
            .query_map([owner.id], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Delete a record owned by `owner`.
    ///
    /// Returns `true` if a record was deleted, `false` if `owner` has no
    /// record with that id. Records of other clients are never touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing is deleted.
    pub fn delete_record(&mut self, owner: &Client, id: i64) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let affected = tx.execute(
            "DELETE FROM records WHERE id = ?1 AND owner_id = ?2",
            params![id, owner.id],
        )?;
        tx.commit()?;

        if affected > 0 {
            debug!("Deleted record {} of client {}", id, owner.id);
        }
        Ok(affected > 0)
    }

    /// Remove a client together with all of its records.
    ///
    /// Records are deleted before the client row in the same transaction, so
    /// either both go or neither does. Returns `None` if no such client exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing is deleted.
    pub fn purge_client(&mut self, external_id: &str) -> Result<Option<PurgeSummary>> {
        let tx = self.conn.transaction()?;

        let client_id: Option<i64> = tx
            .query_row(
                "SELECT id FROM clients WHERE external_id = ?1",
                [external_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(client_id) = client_id else {
            return Ok(None);
        };

        let records_deleted = tx.execute("DELETE FROM records WHERE owner_id = ?1", [client_id])?;
        tx.execute("DELETE FROM clients WHERE id = ?1", [client_id])?;
        tx.commit()?;

        info!("Purged client {external_id} and {records_deleted} records");
        Ok(Some(PurgeSummary {
            client_id,
            records_deleted,
        }))
    }

    /// Count all clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_clients(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Count all records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_records(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count)
    }

    fn row_to_client(row: &rusqlite::Row) -> rusqlite::Result<Client> {
        let created_at: String = row.get(2)?;
        Ok(Client {
            id: row.get(0)?,
            external_id: row.get(1)?,
            created_at: parse_timestamp(&created_at),
        })
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<Record> {
        let created_at: String = row.get(2)?;
        Ok(Record {
            id: row.get(0)?,
            content: row.get(1)?,
            created_at: parse_timestamp(&created_at),
            owner_id: row.get(3)?,
        })
    }
}

/// Outcome of [`Session::purge_client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Storage key of the removed client.
    pub client_id: i64,
    /// Number of records removed with it.
    pub records_deleted: usize,
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of clients.
    pub total_clients: i64,
    /// Total number of records.
    pub total_records: i64,
    /// Timestamp of the oldest record.
    pub oldest_record: Option<DateTime<Utc>>,
    /// Timestamp of the newest record.
    pub newest_record: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
