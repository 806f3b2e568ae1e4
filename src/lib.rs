//! # songforge
//!
//! Backend library for asynchronous song-generation task orchestration.
//!
//! songforge reconciles three loosely-synchronized actors over a persisted
//! task store: the submitting request, the generation provider's asynchronous
//! webhook callback, and the polling client. It guarantees a monotonically
//! improving view of task state and never serves a media URL that is not a
//! stable final artifact.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Durable** - Task state survives process restarts; a poll after a crash
//!   still observes an in-flight task's eventual callback
//! - **Monotonic** - Once a task is SUCCESS it never reverts, and a premature
//!   preview URL is suppressed until the final artifact arrives
//! - **Event-driven** - Consumers may subscribe to task lifecycle events
//!
//! ## Quick Start
//!
//! ```no_run
//! use songforge::{Config, GenerationRequest, SongForge};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         provider: songforge::config::ProviderConfig {
//!             api_key: Some("key".to_string()),
//!             ..Default::default()
//!         },
//!         ..Default::default()
//!     };
//!
//!     let forge = SongForge::new(config).await?;
//!
//!     let task_id = forge
//!         .submit(GenerationRequest {
//!             title: "Homeland".to_string(),
//!             lyrics: "...".to_string(),
//!             style: "March".to_string(),
//!         })
//!         .await?;
//!
//!     println!("submitted task {task_id}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer (the task store)
pub mod db;
/// Error types and the provider error classifier
pub mod error;
/// Finality heuristic for provider media URLs
pub mod finality;
/// Collaborator hooks (creation recording, achievements)
pub mod hooks;
/// Core orchestrator: submission, callback ingestion, status resolution
pub mod orchestrator;
/// Provider submission client
pub mod provider;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, DatabaseConfig, ProviderConfig, ServerConfig};
pub use db::Database;
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, ProviderError, Result, ToHttpStatus};
pub use hooks::{CreationHook, NoOpCreationHook, RecordedCreation};
pub use orchestrator::SongForge;
pub use provider::ProviderClient;
pub use types::{CallbackEnvelope, Event, GenerationRequest, TaskId, TaskState, TaskStatus};

/// Helper function to run an embedded orchestrator with graceful signal
/// handling.
///
/// Waits for a termination signal and then closes the task store.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with a Ctrl+C fallback if
///   signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(forge: std::sync::Arc<SongForge>) -> Result<()> {
    wait_for_signal().await;
    forge.shutdown().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        _ => {
            tracing::warn!("Could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
