//! Collaborator hooks invoked when a creation becomes final
//!
//! The surrounding application (user accounts, achievements, leaderboards) is
//! an external collaborator; songforge only defines the seam. The orchestrator
//! guarantees the hook fires at most once per task regardless of how many
//! times the client polls after success, so implementations do not need their
//! own task-level deduplication.

use async_trait::async_trait;

use crate::types::TaskId;

/// A finalized creation being recorded against a user identity
#[derive(Debug, Clone)]
pub struct RecordedCreation {
    /// Task the creation originated from
    pub task_id: TaskId,
    /// User identity attached to the polling request
    pub user: String,
    /// Song title
    pub title: Option<String>,
    /// Song lyrics
    pub lyrics: Option<String>,
    /// Song style
    pub style: Option<String>,
    /// Final media URL
    pub audio_url: String,
}

/// Trait for recording a finalized creation against a user
///
/// Implementations typically persist the song to the user's library and
/// evaluate achievement/gamification rules, returning the names of any newly
/// unlocked achievements.
///
/// Hook failures are logged and swallowed by the orchestrator: a broken
/// collaborator must not turn a successful generation into a failed poll.
#[async_trait]
pub trait CreationHook: Send + Sync {
    /// Record the creation; returns newly unlocked achievement names
    async fn record_creation(
        &self,
        creation: &RecordedCreation,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>>;
}

/// No-op hook for embeddings without a user/achievement system
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCreationHook;

#[async_trait]
impl CreationHook for NoOpCreationHook {
    async fn record_creation(
        &self,
        _creation: &RecordedCreation,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Vec::new())
    }
}
