#![deny(unused)]
//! Core types, traits, and error definitions for Warden.
//!
//! This crate provides the building blocks shared by the tool registry, the
//! execution bridge, the conversation engine and the model backends.

pub mod config;
pub mod error;
pub mod mocks;
pub mod traits;
pub mod types;

pub use error::{Error, Quota, Result};
pub use traits::*;
pub use types::*;
