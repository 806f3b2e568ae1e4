//! Core types for songforge

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Provider-issued task identifier
///
/// Assigned by the provider at submission time and used as the primary key of
/// the task store and as the polling handle handed back to clients.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for TaskId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for TaskId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for TaskId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Observable task state
///
/// Monotonic: once a task reaches `Success` it never reverts to `Processing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    /// Generation in flight (also covers an unknown task id)
    Processing,
    /// A final media artifact is available
    Success,
}

impl TaskState {
    /// Convert integer state code to TaskState enum
    pub fn from_i32(state: i32) -> Self {
        match state {
            1 => TaskState::Success,
            // Unknown codes degrade to Processing; never fabricate a Success
            _ => TaskState::Processing,
        }
    }

    /// Convert TaskState enum to integer state code
    pub fn to_i32(&self) -> i32 {
        match self {
            TaskState::Processing => 0,
            TaskState::Success => 1,
        }
    }
}

/// A song-generation request: the caller supplies both lyrics and style
/// (custom mode) rather than a single free-text prompt.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerationRequest {
    /// Song title
    pub title: String,
    /// Full lyrics
    pub lyrics: String,
    /// Musical style (e.g. "Classical", "March")
    pub style: String,
}

/// Provider-pushed callback envelope
///
/// The provider may call back multiple times with partial data; only a
/// payload carrying a usable media reference triggers a state change.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CallbackEnvelope {
    /// Provider result code, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// Provider message, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// Callback payload
    #[serde(default)]
    pub data: Option<CallbackData>,
}

/// Inner callback payload: the task this notification concerns and the
/// generated media descriptors
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CallbackData {
    /// Task identifier the notification concerns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Generated media descriptors, possibly empty on partial notifications
    #[serde(default)]
    pub data: Vec<MediaDescriptor>,
}

/// One generated-media descriptor within a callback
///
/// Different provider versions populate different URL fields; extraction
/// prefers the source/CDN streaming URL, then the generic streaming URL, then
/// the plain audio URL.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct MediaDescriptor {
    /// Source/CDN streaming URL (highest priority)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_stream_audio_url: Option<String>,
    /// Generic streaming URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_audio_url: Option<String>,
    /// Plain audio URL (lowest priority)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl MediaDescriptor {
    /// Extract the usable media reference, first present non-empty field wins
    pub fn media_url(&self) -> Option<&str> {
        [
            self.source_stream_audio_url.as_deref(),
            self.stream_audio_url.as_deref(),
            self.audio_url.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|url| !url.is_empty())
    }
}

impl CallbackEnvelope {
    /// Extract the task identifier and media URL this callback carries, if
    /// the payload is complete enough to act on
    pub fn task_and_media(&self) -> Option<(TaskId, &str)> {
        let data = self.data.as_ref()?;
        let task_id = data.task_id.as_deref().filter(|id| !id.is_empty())?;
        let url = data.data.iter().find_map(|d| d.media_url())?;
        Some((TaskId::from(task_id), url))
    }
}

/// Observable task status, as returned to a polling client
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskStatus {
    /// Current state; `Success` implies `audio_url` passed the finality check
    pub status: TaskState,
    /// Echoed request title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Echoed request lyrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    /// Echoed request style
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Final media URL, present only on `Success`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Achievements newly unlocked by recording this creation, if a user
    /// identity was attached and the creation hook reported any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newly_unlocked: Option<Vec<String>>,
}

impl TaskStatus {
    /// A bare PROCESSING answer with no echoed parameters
    pub fn processing() -> Self {
        Self {
            status: TaskState::Processing,
            title: None,
            lyrics: None,
            style: None,
            audio_url: None,
            newly_unlocked: None,
        }
    }
}

/// Task lifecycle events broadcast to subscribers
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A submission succeeded and a PROCESSING record was written
    TaskSubmitted {
        /// Provider-issued task identifier
        task_id: TaskId,
        /// Song title from the request
        title: String,
    },

    /// A callback carrying a usable media reference was merged
    CallbackReceived {
        /// Task the callback concerned
        task_id: TaskId,
        /// Extracted media URL (may still be a non-final preview)
        audio_url: String,
    },

    /// A merged media URL passed the finality check
    TaskCompleted {
        /// Task that completed
        task_id: TaskId,
        /// Final media URL
        audio_url: String,
    },

    /// The creation was durably recorded against a user identity
    CreationRecorded {
        /// Task whose creation was recorded
        task_id: TaskId,
        /// User the creation was recorded against
        user: String,
    },
}
