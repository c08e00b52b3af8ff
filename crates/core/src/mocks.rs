//! Mock implementations of core traits for testing.
//!
//! These mocks are used across the workspace for unit and integration tests
//! that must not reach a real model provider, worker runtime, or service.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::{
    traits::{CodeExecutor, DataStore, ModelBackend},
    types::{CanonicalResponse, ExecutionOutcome, ExecutionResult, Message, ToolCapabilityDescriptor},
    Error, Result,
};

// =============================================================================
// Mock Model Backend
// =============================================================================

/// Scripted backend that replays a queue of canonical responses.
///
/// Every call records the history it was given so tests can assert on what
/// the engine sent.
pub struct MockBackend {
    responses: Mutex<VecDeque<Result<CanonicalResponse>>>,
    calls: Mutex<Vec<Vec<Message>>>,
    tools_seen: Mutex<Vec<Vec<ToolCapabilityDescriptor>>>,
}

impl MockBackend {
    /// Create a backend that returns `responses` in order.
    pub fn new(responses: Vec<CanonicalResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            calls: Mutex::new(Vec::new()),
            tools_seen: Mutex::new(Vec::new()),
        }
    }

    /// Create a backend whose first call fails.
    pub fn failing(message: &str) -> Self {
        let backend = Self::new(Vec::new());
        backend
            .responses
            .lock()
            .unwrap()
            .push_back(Err(Error::backend(message)));
        backend
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// History passed to the n-th call.
    pub fn history_at(&self, call: usize) -> Option<Vec<Message>> {
        self.calls.lock().unwrap().get(call).cloned()
    }

    /// Tool payload passed to the n-th call.
    pub fn tools_at(&self, call: usize) -> Option<Vec<ToolCapabilityDescriptor>> {
        self.tools_seen.lock().unwrap().get(call).cloned()
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        history: &[Message],
        _system: Option<&str>,
        tools: &[ToolCapabilityDescriptor],
    ) -> Result<CanonicalResponse> {
        self.calls.lock().unwrap().push(history.to_vec());
        self.tools_seen.lock().unwrap().push(tools.to_vec());

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::backend("mock backend has no scripted response left")))
    }
}

// =============================================================================
// Mock Code Executor
// =============================================================================

/// Executor that echoes the program back as output after an optional delay.
///
/// Delays are consumed in call order, which lets tests make earlier calls
/// finish later than subsequent ones would.
#[derive(Default)]
pub struct MockExecutor {
    delays: Mutex<VecDeque<Duration>>,
    sources: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for the given durations on successive calls.
    pub fn with_delays(delays: Vec<Duration>) -> Self {
        Self {
            delays: Mutex::new(delays.into()),
            sources: Mutex::new(Vec::new()),
        }
    }

    /// Programs received, in call order.
    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodeExecutor for MockExecutor {
    async fn execute(&self, source: &str) -> ExecutionResult {
        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.sources.lock().unwrap().push(source.to_string());

        ExecutionResult {
            success: true,
            output: Some(Value::String(source.to_string())),
            debug: Vec::new(),
            error: None,
            outcome: ExecutionOutcome::Completed,
            tool_calls: 0,
            elapsed: delay.unwrap_or_default(),
        }
    }
}

// =============================================================================
// Mock Data Store
// =============================================================================

/// In-memory data store returning fixed rows and recording queries.
#[derive(Default)]
pub struct MockDataStore {
    rows: Vec<Value>,
    queries: Mutex<Vec<String>>,
}

impl MockDataStore {
    /// Seed the store with rows returned for every query.
    pub fn with_rows(rows: Vec<Value>) -> Self {
        Self {
            rows,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataStore for MockDataStore {
    async fn query(&self, sql: &str) -> Result<Vec<Value>> {
        self.queries.lock().unwrap().push(sql.to_string());
        Ok(self.rows.clone())
    }
}
