//! Statement execution against the node's SQLite file.
//!
//! Every call opens its own connection on the blocking pool and drops it when
//! done, so a node never holds a connection between requests.

use std::path::Path;
use std::sync::Arc;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::Value;
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::relay::protocol::Row;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The database file could not be opened or is not a database.
    #[error("database connection failed: {0}")]
    Connection(#[source] rusqlite::Error),

    /// The statement failed to prepare or execute.
    #[error("{0}")]
    Statement(#[source] rusqlite::Error),

    #[error("database task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone)]
pub struct Database {
    config: Arc<DatabaseConfig>,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Runs a statement that yields rows.
    pub async fn read(&self, statement: String) -> Result<Vec<Row>, DatabaseError> {
        self.with_connection(move |conn| query_rows(conn, &statement).map_err(DatabaseError::Statement))
            .await
    }

    /// Runs a statement that changes data, returning the affected row count.
    pub async fn write(&self, statement: String) -> Result<u64, DatabaseError> {
        self.with_connection(move |conn| {
            conn.execute(&statement, [])
                .map(|changed| changed as u64)
                .map_err(DatabaseError::Statement)
        })
        .await
    }

    /// Opens a connection and reads the schema version, which fails on files
    /// that are not SQLite databases.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.with_connection(|conn| {
            conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
                .map(|_| ())
                .map_err(DatabaseError::Connection)
        })
        .await
    }

    async fn with_connection<T, F>(&self, work: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, DatabaseError> + Send + 'static,
    {
        let config = Arc::clone(&self.config);

        tokio::task::spawn_blocking(move || {
            let conn = connect(&config)?;
            work(&conn)
        })
        .await
        .map_err(|e| DatabaseError::Task(e.to_string()))?
    }
}

/// Read-write without create: a missing file is a connection failure.
fn connect(config: &DatabaseConfig) -> Result<Connection, DatabaseError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(&config.path, flags).map_err(|e| {
        tracing::error!("Failed to open {}: {}", config.path.display(), e);
        DatabaseError::Connection(e)
    })?;

    conn.busy_timeout(config.busy_timeout)
        .map_err(DatabaseError::Connection)?;

    Ok(conn)
}

fn query_rows(conn: &Connection, statement: &str) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(statement)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (idx, name) in columns.iter().enumerate() {
            record.insert(name.clone(), column_value(row.get_ref(idx)?));
        }
        records.push(record);
    }

    Ok(records)
}

pub(crate) fn column_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::from(n),
        // NaN and infinities have no JSON form
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}
