#![deny(unused)]
//! Tool registry for Warden.
//!
//! This crate provides:
//! - The tool registry with schema-checked dispatch
//! - Model-facing documentation and worker bindings generated from it
//! - Closure-backed handlers
//! - Built-in tools (util.echo, datastore.query)

pub mod bindings;
pub mod builtin;
pub mod handler;
pub mod registry;

pub use bindings::RUNTIME_MODULE;
pub use builtin::{register_builtin_tools, DataStoreQueryTool, EchoTool};
pub use handler::{handler_fn, FnHandler};
pub use registry::{ToolDefinition, ToolRegistry};
