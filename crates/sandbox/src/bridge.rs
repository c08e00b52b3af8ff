//! Execution bridge.
//!
//! Runs one program per request in a fresh worker process and serves the
//! worker's tool calls from the registry until the worker exits or a quota
//! is breached.
//!
//! ```text
//! execute(source)
//!   ├─ source size check            (no process on breach)
//!   ├─ write script, spawn worker
//!   └─ loop: read line ─┬─ output / debug      -> collect
//!                       └─ tool_call           -> registry -> reply line
//!        until EOF | tool call quota | output quota | read timeout | deadline
//! ```

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::sync::OnceCell;

use warden_core::{
    config::SandboxSettings,
    traits::CodeExecutor,
    types::{ExecutionOutcome, ExecutionResult, ToolContext},
    Error, Quota, Result,
};
use warden_skills::ToolRegistry;

use crate::protocol::{BridgeFrame, WorkerFrame};
use crate::runtime::WorkerRuntime;

// =============================================================================
// Configuration
// =============================================================================

/// Limits applied to every execution.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Largest accepted source, in bytes.
    pub max_source_bytes: usize,
    /// Tool calls allowed per execution.
    pub max_tool_calls: usize,
    /// Bytes the worker may write to stdout over the whole execution.
    pub max_output_bytes: usize,
    /// Longest wait for a single line.
    pub read_timeout: Duration,
    /// Wall-clock budget for the whole execution.
    pub deadline: Duration,
    /// Where bindings and temporary scripts live. The worker may read only this.
    pub bindings_dir: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::from(&SandboxSettings::default())
    }
}

impl From<&SandboxSettings> for BridgeConfig {
    fn from(settings: &SandboxSettings) -> Self {
        Self {
            max_source_bytes: settings.max_source_bytes,
            max_tool_calls: settings.max_tool_calls,
            max_output_bytes: settings.max_output_bytes,
            read_timeout: Duration::from_secs(settings.read_timeout_secs),
            deadline: Duration::from_secs(settings.deadline_secs),
            bindings_dir: PathBuf::from(&settings.bindings_dir),
        }
    }
}

// =============================================================================
// Bridge
// =============================================================================

/// Spawns workers and serves their tool calls.
pub struct ExecutionBridge {
    registry: Arc<ToolRegistry>,
    context: ToolContext,
    runtime: Arc<dyn WorkerRuntime>,
    config: BridgeConfig,
    installed: OnceCell<PathBuf>,
}

impl ExecutionBridge {
    pub fn new(
        registry: Arc<ToolRegistry>,
        context: ToolContext,
        runtime: Arc<dyn WorkerRuntime>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            registry,
            context,
            runtime,
            config,
            installed: OnceCell::new(),
        }
    }

    /// Run `source` in a fresh worker.
    ///
    /// Always returns a result; failures are described by `success`,
    /// `error` and `outcome`.
    pub async fn execute(&self, source: &str) -> ExecutionResult {
        let started = Instant::now();

        let mut result = if source.len() > self.config.max_source_bytes {
            let err = Error::QuotaExceeded {
                quota: Quota::SourceSize,
                limit: self.config.max_source_bytes as u64,
            };
            tracing::warn!(bytes = source.len(), "Rejected source before spawning worker");
            ExecutionResult::rejected(ExecutionOutcome::QuotaExceeded, err.to_string())
        } else {
            match self.run(source, started).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, runtime = self.runtime.name(), "Worker could not be started");
                    ExecutionResult::rejected(ExecutionOutcome::Failed, e.to_string())
                }
            }
        };
        result.elapsed = started.elapsed();

        tracing::info!(
            runtime = self.runtime.name(),
            outcome = result.outcome.as_str(),
            tool_calls = result.tool_calls,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "Execution finished"
        );
        warden_governance::track_execution(self.runtime.name(), result.outcome, result.elapsed);

        result
    }

    /// Bindings directory, installing support files on first use.
    async fn bindings_dir(&self) -> Result<&Path> {
        let dir = self
            .installed
            .get_or_try_init(|| async {
                tokio::fs::create_dir_all(&self.config.bindings_dir).await?;
                let dir = tokio::fs::canonicalize(&self.config.bindings_dir).await?;
                self.runtime.install(&dir, &self.registry).await?;
                Ok::<_, Error>(dir)
            })
            .await?;
        Ok(dir.as_path())
    }

    async fn run(&self, source: &str, started: Instant) -> Result<ExecutionResult> {
        let dir = self.bindings_dir().await?;

        // Removed when dropped, on every path out of this function.
        let mut script = tempfile::Builder::new()
            .prefix("exec-")
            .suffix(&format!(".{}", self.runtime.extension()))
            .tempfile_in(dir)?;
        script.write_all(self.runtime.wrap_source(source).as_bytes())?;
        script.flush()?;

        let mut child = self
            .runtime
            .command(script.path(), dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::worker_fault(format!("failed to spawn {}: {}", self.runtime.name(), e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::internal("worker stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::internal("worker stdout unavailable"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::internal("worker stderr unavailable"))?;

        let stderr_task = tokio::spawn(drain(stderr, self.config.max_output_bytes as u64));

        let mut session = Session::new(stdin, stdout);
        let deadline = started + self.config.deadline;
        self.serve(&mut session, deadline).await;

        // Closing stdin lets a worker blocked on a reply exit on its own.
        session.stdin = None;

        let exit = if session.failure.is_some() {
            let _ = child.start_kill();
            child.wait().await.ok()
        } else {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, child.wait()).await {
                Ok(status) => status.ok(),
                Err(_) => {
                    session.fail(ExecutionOutcome::TimedOut, self.deadline_error());
                    let _ = child.start_kill();
                    child.wait().await.ok()
                }
            }
        };

        let stderr = match tokio::time::timeout(Duration::from_secs(1), stderr_task).await {
            Ok(Ok(text)) => text,
            _ => String::new(),
        };

        Ok(session.finish(exit, stderr))
    }

    /// Read frames until the worker closes stdout or something is breached.
    async fn serve(&self, session: &mut Session, deadline: Instant) {
        loop {
            let now = Instant::now();
            if now >= deadline {
                session.fail(ExecutionOutcome::TimedOut, self.deadline_error());
                return;
            }
            let slice = self.config.read_timeout.min(deadline - now);

            let remaining = self.config.max_output_bytes.saturating_sub(session.output_bytes);
            let mut line = Vec::new();
            let read = tokio::time::timeout(
                slice,
                (&mut session.stdout)
                    .take(remaining as u64 + 1)
                    .read_until(b'\n', &mut line),
            )
            .await;

            let n = match read {
                Err(_) if Instant::now() >= deadline => {
                    session.fail(ExecutionOutcome::TimedOut, self.deadline_error());
                    return;
                }
                Err(_) => {
                    session.fail(
                        ExecutionOutcome::TimedOut,
                        Error::Timeout(format!(
                            "no output from worker for {}s",
                            slice.as_secs_f64()
                        )),
                    );
                    return;
                }
                Ok(Err(e)) => {
                    session.fail(
                        ExecutionOutcome::Failed,
                        Error::worker_fault(format!("failed to read worker output: {}", e)),
                    );
                    return;
                }
                Ok(Ok(0)) => return,
                Ok(Ok(n)) => n,
            };

            session.output_bytes += n;
            if session.output_bytes > self.config.max_output_bytes {
                session.fail(
                    ExecutionOutcome::QuotaExceeded,
                    Error::QuotaExceeded {
                        quota: Quota::OutputBytes,
                        limit: self.config.max_output_bytes as u64,
                    },
                );
                return;
            }

            let text = String::from_utf8_lossy(&line);
            let reply = match WorkerFrame::parse(&text) {
                None => continue,
                Some(WorkerFrame::Output(value)) => {
                    session.outputs.push(value);
                    continue;
                }
                Some(WorkerFrame::Debug(text)) => {
                    session.debug.push(text);
                    continue;
                }
                Some(WorkerFrame::MalformedCall { line, reason }) => {
                    tracing::warn!(reason = %reason, "Malformed tool call from worker");
                    session.debug.push(line);
                    BridgeFrame::ToolError(Error::protocol(reason).to_string())
                }
                Some(WorkerFrame::ToolCall { tool, params }) => {
                    session.tool_calls += 1;
                    if session.tool_calls > self.config.max_tool_calls {
                        session.fail(
                            ExecutionOutcome::QuotaExceeded,
                            Error::QuotaExceeded {
                                quota: Quota::ToolCalls,
                                limit: self.config.max_tool_calls as u64,
                            },
                        );
                        return;
                    }
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match tokio::time::timeout(remaining, self.dispatch(&tool, params)).await {
                        Ok(reply) => reply,
                        Err(_) => {
                            tracing::warn!(tool = %tool, "Tool call still running at deadline");
                            warden_governance::track_tool_call(&tool, false);
                            session.fail(ExecutionOutcome::TimedOut, self.deadline_error());
                            return;
                        }
                    }
                }
            };

            if let Err(e) = session.reply(&reply, deadline).await {
                let outcome = match &e {
                    Error::Timeout(_) => ExecutionOutcome::TimedOut,
                    _ => ExecutionOutcome::Failed,
                };
                session.fail(outcome, e);
                return;
            }
        }
    }

    /// Run one tool call. Handler errors and panics become `tool_error` replies.
    async fn dispatch(&self, tool: &str, params: Value) -> BridgeFrame {
        tracing::debug!(tool = %tool, "Dispatching tool call from worker");

        let call = AssertUnwindSafe(self.registry.execute(&self.context, tool, params))
            .catch_unwind()
            .await;

        match call {
            Ok(Ok(value)) => {
                warden_governance::track_tool_call(tool, true);
                BridgeFrame::ToolResult(value)
            }
            Ok(Err(e)) if e.is_validation() => {
                tracing::warn!(tool = %tool, error = %e, "Tool call rejected before dispatch");
                warden_governance::track_tool_call(tool, false);
                BridgeFrame::ToolError(e.to_string())
            }
            Ok(Err(e)) => {
                tracing::warn!(tool = %tool, error = %e, "Tool call failed");
                warden_governance::track_tool_call(tool, false);
                BridgeFrame::ToolError(e.to_string())
            }
            Err(_) => {
                tracing::error!(tool = %tool, "Tool handler panicked");
                warden_governance::track_tool_call(tool, false);
                BridgeFrame::ToolError(Error::tool_execution(format!("{} panicked", tool)).to_string())
            }
        }
    }

    fn deadline_error(&self) -> Error {
        Error::Timeout(format!(
            "execution exceeded deadline of {}s",
            self.config.deadline.as_secs_f64()
        ))
    }
}

#[async_trait]
impl CodeExecutor for ExecutionBridge {
    async fn execute(&self, source: &str) -> ExecutionResult {
        ExecutionBridge::execute(self, source).await
    }
}

// =============================================================================
// Session
// =============================================================================

/// State of one running worker.
struct Session {
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    outputs: Vec<Value>,
    debug: Vec<String>,
    tool_calls: usize,
    output_bytes: usize,
    failure: Option<(ExecutionOutcome, String)>,
}

impl Session {
    fn new(stdin: ChildStdin, stdout: ChildStdout) -> Self {
        Self {
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            outputs: Vec::new(),
            debug: Vec::new(),
            tool_calls: 0,
            output_bytes: 0,
            failure: None,
        }
    }

    /// Record the first failure; later ones are logged only.
    fn fail(&mut self, outcome: ExecutionOutcome, error: Error) {
        tracing::warn!(outcome = outcome.as_str(), error = %error, "Execution failed");
        if self.failure.is_none() {
            self.failure = Some((outcome, error.to_string()));
        }
    }

    /// Write a reply line, bounded by the deadline.
    async fn reply(&mut self, frame: &BridgeFrame, deadline: Instant) -> Result<()> {
        let line = frame.encode()?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| Error::worker_fault("worker stdin closed"))?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        let write = async {
            stdin.write_all(&line).await?;
            stdin.flush().await
        };
        match tokio::time::timeout(remaining, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Error::worker_fault(format!("failed to answer tool call: {}", e))),
            Err(_) => Err(Error::Timeout("deadline reached while answering tool call".into())),
        }
    }

    fn finish(self, exit: Option<std::process::ExitStatus>, stderr: String) -> ExecutionResult {
        let (outcome, mut error) = match self.failure {
            Some((outcome, error)) => (outcome, Some(error)),
            None => match exit {
                Some(status) if status.success() => (ExecutionOutcome::Completed, None),
                Some(status) => (
                    ExecutionOutcome::Failed,
                    Some(Error::worker_fault(format!("worker exited with {}", status)).to_string()),
                ),
                None => (
                    ExecutionOutcome::Failed,
                    Some(Error::worker_fault("worker exit status unavailable").to_string()),
                ),
            },
        };

        let stderr = stderr.trim();
        if !stderr.is_empty() {
            error = Some(match error {
                Some(error) => format!("{}\n\nStderr:\n{}", error, stderr),
                None => stderr.to_string(),
            });
        }
        let outcome = match outcome {
            ExecutionOutcome::Completed if error.is_some() => ExecutionOutcome::Failed,
            other => other,
        };

        ExecutionResult {
            success: outcome == ExecutionOutcome::Completed,
            output: ExecutionResult::fold_outputs(self.outputs),
            debug: self.debug,
            error,
            outcome,
            tool_calls: self.tool_calls,
            elapsed: Duration::ZERO,
        }
    }
}

/// Read up to `limit` bytes of a stream, then discard the rest.
async fn drain<R>(mut stream: R, limit: u64) -> String
where
    R: AsyncRead + Unpin,
{
    let mut kept = Vec::new();
    let _ = (&mut stream).take(limit).read_to_end(&mut kept).await;
    let _ = tokio::io::copy(&mut stream, &mut tokio::io::sink()).await;
    String::from_utf8_lossy(&kept).into_owned()
}
