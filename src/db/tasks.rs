//! Task record CRUD and the atomic callback merge.

use crate::error::DatabaseError;
use crate::types::TaskId;
use crate::{Error, Result};

use super::{Database, NewTask, TaskRow};

/// Integer state codes stored in the `status` column
pub(crate) mod status {
    /// Generation in flight
    pub const PROCESSING: i32 = 0;
    /// Final media artifact delivered
    pub const SUCCESS: i32 = 1;
}

impl Database {
    /// Insert the task record written by a successful submission
    ///
    /// The request parameters are written once here and never mutated
    /// afterward. If a callback raced ahead and already created the row, the
    /// upsert fills in the request parameters without touching `status` or
    /// `audio_url`, so a SUCCESS already merged by the callback is preserved.
    pub async fn insert_task(&self, task: &NewTask) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO tasks (task_id, status, title, lyrics, style, recorded, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 0, ?, ?)
            ON CONFLICT(task_id) DO UPDATE SET
                title = excluded.title,
                lyrics = excluded.lyrics,
                style = excluded.style,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&task.task_id)
        .bind(status::PROCESSING)
        .bind(&task.title)
        .bind(&task.lyrics)
        .bind(&task.style)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert task: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Get a task record by id
    pub async fn get_task(&self, task_id: &TaskId) -> Result<Option<TaskRow>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT task_id, status, title, lyrics, style, audio_url, recorded,
                   created_at, updated_at
            FROM tasks
            WHERE task_id = ?
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get task: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Merge a callback result into the task record
    ///
    /// Single-statement upsert: overlays SUCCESS and the media URL while
    /// leaving `title`/`lyrics`/`style` untouched, so a callback never
    /// clobbers fields written by submission. SQLite statement atomicity makes
    /// redelivered callbacks idempotent and guarantees a concurrent poll
    /// observes the pre- or post-merge row, never a partial write. Creates the
    /// row if the callback raced ahead of the submission's own write.
    pub async fn merge_callback_result(&self, task_id: &TaskId, audio_url: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO tasks (task_id, status, audio_url, recorded, created_at, updated_at)
            VALUES (?, ?, ?, 0, ?, ?)
            ON CONFLICT(task_id) DO UPDATE SET
                status = excluded.status,
                audio_url = excluded.audio_url,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(task_id)
        .bind(status::SUCCESS)
        .bind(audio_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to merge callback result: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Flip the creation-hook gate for a task
    ///
    /// Returns `true` only for the call that actually made the transition, so
    /// the creation hook fires exactly once per task no matter how many polls
    /// observe the final record concurrently.
    pub async fn mark_recorded(&self, task_id: &TaskId) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET recorded = 1, updated_at = ?
            WHERE task_id = ? AND recorded = 0
            "#,
        )
        .bind(now)
        .bind(task_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark task recorded: {}",
                e
            )))
        })?;

        Ok(result.rows_affected() == 1)
    }
}
