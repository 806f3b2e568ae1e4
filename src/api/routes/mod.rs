//! API route handlers, organized by domain.

mod songs;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use songs::*;
pub use system::*;
