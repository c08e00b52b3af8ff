#![deny(unused)]
//! Execution bridge for Warden.
//!
//! This crate runs model-written programs in a worker process and lets the
//! worker call registered tools over a line protocol on its standard streams.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │  Conversation Engine                   │
//! │    ↓ execute(source)                   │
//! ├────────────────────────────────────────┤
//! │  ExecutionBridge                       │
//! │    quotas, deadline, frame dispatch    │
//! │    ↓ stdin/stdout lines  ↑ tool calls  │
//! ├────────────────────────────────────────┤
//! │  Worker (DenoRuntime)                  │
//! │    no net, no write, no env, no run    │
//! │    reads only the bindings directory   │
//! └────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use warden_sandbox::{BridgeConfig, DenoRuntime, ExecutionBridge};
//!
//! let bridge = ExecutionBridge::new(
//!     registry.clone(),
//!     ToolContext::new(),
//!     Arc::new(DenoRuntime::default()),
//!     BridgeConfig::from(&config.sandbox),
//! );
//! let result = bridge.execute("output(await tools.util.echo(\"hi\"));").await;
//! ```

pub mod bridge;
pub mod protocol;
pub mod runtime;

pub use bridge::{BridgeConfig, ExecutionBridge};
pub use protocol::{BridgeFrame, WorkerFrame};
pub use runtime::{DenoRuntime, ShellRuntime, WorkerRuntime};
