//! Document storage for dealerflow.
//!
//! Screens talk to storage through the [`DocumentStore`] trait: JSON
//! documents grouped into named collections and addressed by a generated
//! identifier. [`SqliteStore`] is the bundled implementation.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A stored document and its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Identifier within its collection.
    pub id: String,
    /// The JSON body.
    pub body: Value,
}

/// A collection-addressed JSON document store.
///
/// Writes are last-write-wins; there is no versioning or locking across
/// callers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, or `None` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Insert a document under a newly generated identifier.
    async fn add(&self, collection: &str, body: Value) -> Result<String>;

    /// Create or overwrite a document under the given identifier.
    async fn set(&self, collection: &str, id: &str, body: Value) -> Result<()>;

    /// Merge top-level fields into an existing document.
    ///
    /// Fails with [`Error::NotFound`] if the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<()>;

    /// All documents in a collection, ordered by identifier.
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;

    /// Delete a document. Returns `true` if one was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;
}

/// `SQLite`-backed document store.
#[derive(Debug)]
pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
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

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("database connection lock poisoned"))
    }

    /// Count documents per collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT collection, COUNT(*) FROM documents GROUP BY collection ORDER BY collection",
        )?;
        let collections = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<(String, i64)>, _>>()?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            collections,
            db_size_bytes,
        })
    }
}

fn parse_body(collection: &str, id: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| {
        Error::internal(format!("corrupt document {collection}/{id}: {e}"))
    })
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let conn = self.conn()?;
        let text: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        text.map(|t| parse_body(collection, id, &t)).transpose()
    }

    async fn add(&self, collection: &str, body: Value) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        let now = Utc::now().to_rfc3339();
        let text = serde_json::to_string(&body)?;
        self.conn()?.execute(
            r"
            INSERT INTO documents (collection, id, body, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ",
            params![collection, id, text, now],
        )?;
        debug!("Added {}/{}", collection, id);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, body: Value) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let text = serde_json::to_string(&body)?;
        self.conn()?.execute(
            r"
            INSERT INTO documents (collection, id, body, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT (collection, id) DO UPDATE SET body = ?3, updated_at = ?4
            ",
            params![collection, id, text, now],
        )?;
        debug!("Set {}/{}", collection, id);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let text: Option<String> = tx
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(text) = text else {
            return Err(Error::not_found(collection, id));
        };

        let mut body = parse_body(collection, id, &text)?;
        let Some(object) = body.as_object_mut() else {
            return Err(Error::remote_write(
                collection,
                id,
                "stored document is not an object",
            ));
        };
        let count = fields.len();
        object.extend(fields);

        tx.execute(
            "UPDATE documents SET body = ?3, updated_at = ?4 WHERE collection = ?1 AND id = ?2",
            params![
                collection,
                id,
                serde_json::to_string(&body)?,
                Utc::now().to_rfc3339()
            ],
        )?;
        tx.commit()?;

        debug!("Updated {} fields on {}/{}", count, collection, id);
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map([collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, text)| {
                let body = parse_body(collection, &id, &text)?;
                Ok(Document { id, body })
            })
            .collect()
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let affected = self.conn()?.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        if affected > 0 {
            info!("Deleted {}/{}", collection, id);
        }
        Ok(affected > 0)
    }
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Document count per collection, ordered by collection name.
    pub collections: Vec<(String, i64)>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

impl StoreStats {
    /// Number of documents in the named collection.
    #[must_use]
    pub fn count(&self, collection: &str) -> i64 {
        self.collections
            .iter()
            .find(|(name, _)| name == collection)
            .map_or(0, |(_, count)| *count)
    }
}
