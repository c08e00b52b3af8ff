#![deny(unused)]
//! Conversation engine for Warden.
//!
//! This crate provides the turn loop that alternates between the model
//! backend and code execution, plus truncation of tool results and the
//! built-in prompt text.

pub mod engine;
pub mod prompt;
pub mod truncate;

pub use engine::{ConversationEngine, ConversationEngineBuilder, EngineConfig, EXECUTE_CODE_TOOL};
pub use truncate::{truncate_chars, TRUNCATION_MARKER};
