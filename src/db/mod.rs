//! Database layer for songforge
//!
//! Handles SQLite persistence for the task store: one durable record per
//! provider-issued task id, surviving process restarts so a poll after a
//! restart still finds an in-flight task's eventual callback.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`tasks`] — Task record CRUD and the atomic callback merge

use crate::types::TaskId;
use sqlx::{FromRow, sqlite::SqlitePool};

mod migrations;
mod tasks;

/// New task to be inserted into the task store at submission time
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Provider-issued task identifier
    pub task_id: TaskId,
    /// Song title from the request
    pub title: String,
    /// Song lyrics from the request
    pub lyrics: String,
    /// Song style from the request
    pub style: String,
}

/// Task record from the task store
///
/// `title`/`lyrics`/`style` are nullable because a callback can in principle
/// race ahead of the submission's own write; the ingestor then stores what it
/// has rather than failing.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    /// Provider-issued task identifier (primary key)
    pub task_id: TaskId,
    /// Current state (0=processing, 1=success); monotonic, never reverts
    pub status: i32,
    /// Song title, written once at submission
    pub title: Option<String>,
    /// Song lyrics, written once at submission
    pub lyrics: Option<String>,
    /// Song style, written once at submission
    pub style: Option<String>,
    /// Extracted media URL, absent until a callback delivered one
    pub audio_url: Option<String>,
    /// Whether the creation hook has fired for this task (exactly-once gate)
    pub recorded: i32,
    /// Unix timestamp when the record was created
    pub created_at: i64,
    /// Unix timestamp of the last write
    pub updated_at: i64,
}

/// Task store handle backed by a SQLite connection pool
#[derive(Debug, Clone)]
pub struct Database {
    /// Connection pool, shared across submission, callback, and status paths
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
