//! Core traits for Warden.
//!
//! Traits are organized by the seam they describe:
//! - `llm`: model backends (ModelBackend)
//! - `skills`: tool handlers and code execution (ToolHandler, CodeExecutor)
//! - `services`: external collaborators reached by tools

pub mod llm;
pub mod services;
pub mod skills;

pub use llm::*;
pub use services::*;
pub use skills::*;
