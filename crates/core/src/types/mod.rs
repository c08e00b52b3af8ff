//! Core type definitions for Warden.
//!
//! Broken down into submodules by the component that owns them.

pub mod context;
pub mod execution;
pub mod message;
pub mod tool;

pub use context::*;
pub use execution::*;
pub use message::*;
pub use tool::*;
