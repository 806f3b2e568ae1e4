//! Core orchestrator for song-generation tasks
//!
//! [`SongForge`] reconciles the three loosely-synchronized actors of a
//! generation task over the persisted task store: the submitting request, the
//! provider's asynchronous callback, and the polling client. Each inbound
//! request is handled independently and may run concurrently with the others
//! for the same task id; the store's atomic merges are the only
//! synchronization.

use std::sync::Arc;

use crate::config::Config;
use crate::db::{Database, NewTask};
use crate::finality::is_final_media_url;
use crate::hooks::{CreationHook, NoOpCreationHook, RecordedCreation};
use crate::provider::ProviderClient;
use crate::types::{
    CallbackEnvelope, Event, GenerationRequest, TaskId, TaskState, TaskStatus,
};
use crate::Result;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The song-generation task orchestrator
pub struct SongForge {
    /// Task store (public for integration tests to inspect task state)
    pub db: Arc<Database>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Submission client for the generation provider
    provider: ProviderClient,
    /// Event broadcast channel sender (multiple subscribers supported)
    event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Collaborator invoked once per task when a creation becomes final
    hook: Arc<dyn CreationHook>,
}

impl SongForge {
    /// Create a new SongForge instance with no creation hook
    ///
    /// Opens/creates the SQLite task store, runs migrations, and builds the
    /// provider client.
    pub async fn new(config: Config) -> Result<Self> {
        Self::with_hook(config, Arc::new(NoOpCreationHook)).await
    }

    /// Create a new SongForge instance with a creation hook collaborator
    pub async fn with_hook(config: Config, hook: Arc<dyn CreationHook>) -> Result<Self> {
        let db = Arc::new(Database::new(&config.database.path).await?);
        let provider = ProviderClient::new(config.provider.clone())?;
        let (event_tx, _) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            db,
            config: Arc::new(config),
            provider,
            event_tx,
            hook,
        })
    }

    /// Subscribe to task lifecycle events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Close the task store
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down orchestrator");
        self.db.close().await;
    }

    /// Submit a generation request
    ///
    /// On provider acceptance, writes exactly one PROCESSING task record with
    /// the original request parameters and only then returns the task id, so
    /// a client polling immediately afterwards observes at least the
    /// PROCESSING record, never "no such task". No record is created on any
    /// failure path.
    pub async fn submit(&self, request: GenerationRequest) -> Result<TaskId> {
        let task_id = self.provider.submit(&request).await?;

        self.db
            .insert_task(&NewTask {
                task_id: task_id.clone(),
                title: request.title.clone(),
                lyrics: request.lyrics.clone(),
                style: request.style.clone(),
            })
            .await?;

        tracing::info!(task_id = %task_id, title = %request.title, "generation task submitted");

        self.event_tx
            .send(Event::TaskSubmitted {
                task_id: task_id.clone(),
                title: request.title,
            })
            .ok();

        Ok(task_id)
    }

    /// Ingest a provider-pushed callback
    ///
    /// A payload without a task identifier or without a usable media
    /// reference is a benign no-op: the provider may send incremental/partial
    /// notifications before the real one. A usable payload is merged
    /// atomically into the task record without clobbering the submission's
    /// fields; redelivery of the same callback is idempotent.
    pub async fn ingest_callback(&self, envelope: CallbackEnvelope) -> Result<()> {
        let Some((task_id, audio_url)) = envelope.task_and_media() else {
            tracing::debug!("callback without task id or media reference, ignoring");
            return Ok(());
        };
        let audio_url = audio_url.to_string();

        self.db.merge_callback_result(&task_id, &audio_url).await?;

        tracing::info!(task_id = %task_id, audio_url = %audio_url, "callback result merged");

        self.event_tx
            .send(Event::CallbackReceived {
                task_id: task_id.clone(),
                audio_url: audio_url.clone(),
            })
            .ok();

        if is_final_media_url(&audio_url) {
            self.event_tx
                .send(Event::TaskCompleted { task_id, audio_url })
                .ok();
        }

        Ok(())
    }

    /// Resolve the observable status of a task for a polling client
    ///
    /// Returns PROCESSING for an unknown id (indistinguishable from a task
    /// still in flight, by design), for a record the callback has not reached
    /// yet, and for a SUCCESS record whose media URL is still a non-final
    /// preview. Only a SUCCESS record with a final URL is served as SUCCESS.
    ///
    /// When a user identity is attached, the first poll that observes the
    /// final record invokes the creation hook; the store's `recorded` gate
    /// guarantees at most one invocation per task across repeated polls.
    pub async fn resolve_status(
        &self,
        task_id: &TaskId,
        user: Option<&str>,
    ) -> Result<TaskStatus> {
        let Some(row) = self.db.get_task(task_id).await? else {
            return Ok(TaskStatus::processing());
        };

        let echoed = TaskStatus {
            status: TaskState::Processing,
            title: row.title.clone(),
            lyrics: row.lyrics.clone(),
            style: row.style.clone(),
            audio_url: None,
            newly_unlocked: None,
        };

        if TaskState::from_i32(row.status) != TaskState::Success {
            return Ok(echoed);
        }

        let Some(audio_url) = row.audio_url.clone() else {
            return Ok(echoed);
        };

        // Suppress a premature preview URL: the answer stays PROCESSING until
        // the merged URL is a stable final artifact
        if !is_final_media_url(&audio_url) {
            tracing::debug!(task_id = %task_id, audio_url = %audio_url, "suppressing non-final media URL");
            return Ok(echoed);
        }

        let mut status = TaskStatus {
            status: TaskState::Success,
            title: row.title.clone(),
            lyrics: row.lyrics.clone(),
            style: row.style.clone(),
            audio_url: Some(audio_url.clone()),
            newly_unlocked: None,
        };

        if let Some(user) = user {
            if self.db.mark_recorded(task_id).await? {
                let creation = RecordedCreation {
                    task_id: task_id.clone(),
                    user: user.to_string(),
                    title: row.title,
                    lyrics: row.lyrics,
                    style: row.style,
                    audio_url,
                };

                // A broken collaborator must not turn a successful generation
                // into a failed poll
                match self.hook.record_creation(&creation).await {
                    Ok(unlocked) => {
                        tracing::info!(task_id = %task_id, user = %user, "creation recorded");
                        self.event_tx
                            .send(Event::CreationRecorded {
                                task_id: task_id.clone(),
                                user: user.to_string(),
                            })
                            .ok();
                        if !unlocked.is_empty() {
                            status.newly_unlocked = Some(unlocked);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(task_id = %task_id, error = %e, "creation hook failed");
                    }
                }
            }
        }

        Ok(status)
    }
}
