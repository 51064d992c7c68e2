use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, params};

use crate::error::StoreError;
use crate::models::QueuedAction;

/// Envelope version written with every record. Bump when the payload shape
/// changes and teach `load` to migrate the old records.
pub const QUEUE_VERSION: i64 = 1;

/// A queued action together with its durable sequence number.
#[derive(Debug, Clone)]
pub struct StoredAction {
    pub seq: i64,
    pub action: QueuedAction,
}

/// Durable FIFO queue of pending actions.
///
/// Each action is an individually keyed record ordered by a monotonic
/// sequence number, so dropping one replayed action never rewrites the rest
/// of the queue. The persisted copy is the source of truth on process
/// start; pure local storage, usable before any network connectivity
/// exists.
pub struct SqliteQueueStore {
    conn: Mutex<Connection>,
}

impl SqliteQueueStore {
    /// Opens (or creates) the queue database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS offline_queue (
                 seq INTEGER PRIMARY KEY AUTOINCREMENT,
                 version INTEGER NOT NULL,
                 body TEXT NOT NULL
             )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Appends an action to the tail, returning its sequence number.
    pub fn append(&self, action: &QueuedAction) -> Result<i64, StoreError> {
        let body = serde_json::to_string(action)?;
        let conn = self.lock();
        conn.execute(
            "INSERT INTO offline_queue (version, body) VALUES (?1, ?2)",
            params![QUEUE_VERSION, body],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Removes one record; called after its action replayed successfully.
    pub fn remove(&self, seq: i64) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute("DELETE FROM offline_queue WHERE seq = ?1", params![seq])?;
        Ok(())
    }

    /// All pending actions in enqueue order.
    ///
    /// Storage problems degrade to an empty queue, and records that fail to
    /// parse or carry an unknown envelope version are skipped, so one
    /// corrupt entry can never wedge the queue.
    pub fn load(&self) -> Vec<StoredAction> {
        let conn = self.lock();
        let mut stmt =
            match conn.prepare("SELECT seq, version, body FROM offline_queue ORDER BY seq") {
                Ok(stmt) => stmt,
                Err(e) => {
                    tracing::warn!("Failed to read offline queue: {e}");
                    return Vec::new();
                }
            };

        let rows = match stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        }) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Failed to read offline queue: {e}");
                return Vec::new();
            }
        };

        let mut actions = Vec::new();
        for row in rows {
            let (seq, version, body) = match row {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!("Skipping unreadable queue record: {e}");
                    continue;
                }
            };
            if version != QUEUE_VERSION {
                tracing::warn!("Skipping queue record {seq} with unknown version {version}");
                continue;
            }
            match serde_json::from_str::<QueuedAction>(&body) {
                Ok(action) => actions.push(StoredAction { seq, action }),
                Err(e) => tracing::warn!("Skipping corrupt queue record {seq}: {e}"),
            }
        }
        actions
    }

    /// Number of pending records.
    pub fn len(&self) -> usize {
        let conn = self.lock();
        conn.query_row("SELECT COUNT(*) FROM offline_queue", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as usize)
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to count offline queue: {e}");
            0
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
