//! SQLite-backed record store.
//!
//! One row per record. `value` holds the caller's JSON verbatim and
//! `timestamp` holds microseconds since the Unix epoch so that the
//! newest-first sort runs on an integer index.
//!
//! Calls run on the blocking pool. When the awaiting future is dropped
//! (for example by an expired deadline) the call is cancelled: a call that
//! has not started yet never runs, a running statement is interrupted,
//! and an insert that has not committed is rolled back.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{params, params_from_iter, Connection, InterruptHandle, Row};
use tracing::debug;

use crate::core::query::{contains_case_insensitive, FilterSpec, PageWindow, SortOrder};
use crate::domain::{ClipValue, ClipboardRecord, NewRecord, RecordId};

use super::{ClipboardStore, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS clipboard (
    id        TEXT PRIMARY KEY,
    kind      TEXT NOT NULL,
    value     TEXT NOT NULL,
    subtype   TEXT,
    timestamp INTEGER NOT NULL,
    is_image  INTEGER NOT NULL,
    preview   TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS clipboard_timestamp_desc ON clipboard (timestamp DESC);
";

const COLUMNS: &str = "id, kind, value, subtype, timestamp, is_image, preview";

/// Store backed by a single SQLite database
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Running,
    Cancelled,
    Finished,
}

/// Shared progress of one blocking call
#[derive(Debug, Clone)]
struct CallState(Arc<Mutex<Phase>>);

impl CallState {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Phase::Pending)))
    }

    fn phase(&self) -> std::sync::MutexGuard<'_, Phase> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to running unless the caller already gave up
    fn begin(&self) -> Result<(), StoreError> {
        let mut phase = self.phase();
        if *phase == Phase::Cancelled {
            return Err(StoreError::Cancelled);
        }
        *phase = Phase::Running;
        Ok(())
    }

    /// Fail if the caller gave up since the call began
    fn ensure_live(&self) -> Result<(), StoreError> {
        if *self.phase() == Phase::Cancelled {
            return Err(StoreError::Cancelled);
        }
        Ok(())
    }

    fn finish(&self) {
        *self.phase() = Phase::Finished;
    }
}

/// Cancels its call when dropped before the call finished
struct CancelOnDrop {
    state: CallState,
    interrupt: Arc<InterruptHandle>,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        let mut phase = self.state.phase();
        match *phase {
            Phase::Pending => *phase = Phase::Cancelled,
            Phase::Running => {
                *phase = Phase::Cancelled;
                // The connection is still held by this call, so only its
                // own statement can be interrupted.
                self.interrupt.interrupt();
            }
            Phase::Cancelled | Phase::Finished => {}
        }
    }
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        debug!(path = %path.display(), "Opening clipboard database");
        Self::init(Connection::open(path)?)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.create_scalar_function(
            "contains_ci",
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let haystack = ctx.get::<Option<String>>(0)?;
                let needle = ctx.get::<String>(1)?;
                Ok(haystack.is_some_and(|h| contains_case_insensitive(&h, &needle)))
            },
        )?;
        conn.execute_batch(SCHEMA)?;
        let interrupt = Arc::new(conn.get_interrupt_handle());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            interrupt,
        })
    }

    /// Run a blocking closure against the connection off the async runtime.
    ///
    /// Dropping the returned future cancels the call.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection, &CallState) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let state = CallState::new();
        let _cancel = CancelOnDrop {
            state: state.clone(),
            interrupt: Arc::clone(&self.interrupt),
        };

        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Backend("connection lock poisoned".to_string()))?;
            state.begin()?;
            let result = f(&guard, &state);
            state.finish();
            result
        })
        .await
        .map_err(|e| StoreError::Backend(format!("blocking task failed: {}", e)))?
    }
}

/// Build a WHERE clause and its positional parameters
fn where_clause(filter: &FilterSpec) -> (String, Vec<SqlValue>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(is_image) = filter.is_image {
        clauses.push("is_image = ?");
        values.push(SqlValue::Integer(i64::from(is_image)));
    }

    if let Some(needle) = &filter.preview_contains {
        clauses.push("contains_ci(preview, ?)");
        values.push(SqlValue::Text(needle.clone()));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

fn sql_int(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn from_micros(micros: i64) -> Option<DateTime<Utc>> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ClipboardRecord> {
    let value_json: String = row.get(2)?;
    let value: ClipValue = serde_json::from_str(&value_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    let micros: i64 = row.get(4)?;
    let timestamp =
        from_micros(micros).ok_or(rusqlite::Error::IntegralValueOutOfRange(4, micros))?;

    Ok(ClipboardRecord {
        id: RecordId::from_stored(row.get(0)?),
        kind: row.get(1)?,
        value,
        subtype: row.get(3)?,
        timestamp,
        is_image: row.get(5)?,
        preview: row.get(6)?,
    })
}

#[async_trait]
impl ClipboardStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(&self, record: NewRecord) -> Result<RecordId, StoreError> {
        let id = RecordId::generate();
        let row_id = id.clone();
        let value_json = serde_json::to_string(&record.value)?;

        self.with_conn(move |conn, state| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                &format!("INSERT INTO clipboard ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)", COLUMNS),
                params![
                    row_id.as_str(),
                    record.kind,
                    value_json,
                    record.subtype,
                    record.timestamp.timestamp_micros(),
                    record.is_image,
                    record.preview,
                ],
            )?;

            // Dropping the transaction rolls the row back
            state.ensure_live()?;
            tx.commit()?;
            Ok(())
        })
        .await?;

        Ok(id)
    }

    async fn count(&self, filter: &FilterSpec) -> Result<u64, StoreError> {
        let (where_sql, values) = where_clause(filter);

        self.with_conn(move |conn, _| {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM clipboard{}", where_sql),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn find(
        &self,
        filter: &FilterSpec,
        window: &PageWindow,
    ) -> Result<Vec<ClipboardRecord>, StoreError> {
        let (where_sql, mut values) = where_clause(filter);
        let order_sql = match window.order {
            SortOrder::TimestampDescending => "timestamp DESC",
        };
        values.push(SqlValue::Integer(sql_int(window.limit)));
        values.push(SqlValue::Integer(sql_int(window.skip)));

        let sql = format!(
            "SELECT {} FROM clipboard{} ORDER BY {} LIMIT ? OFFSET ?",
            COLUMNS, where_sql, order_sql
        );

        self.with_conn(move |conn, _| {
            let mut stmt = conn.prepare(&sql)?;
            let records = stmt
                .query_map(params_from_iter(values.iter()), row_to_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, StoreError> {
        let id = id.clone();

        self.with_conn(move |conn, _| {
            let removed = conn.execute("DELETE FROM clipboard WHERE id = ?1", params![id.as_str()])?;
            Ok(removed > 0)
        })
        .await
    }
}
