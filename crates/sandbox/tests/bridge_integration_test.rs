//! Execution bridge integration tests.
//!
//! Drives real worker processes through `ShellRuntime`: each script speaks
//! the line protocol directly with `echo`, `printf` and `read`.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use warden_core::{
    types::{ExecutionOutcome, ParamKind, ToolContext, ToolParameter},
    Error,
};
use warden_sandbox::{BridgeConfig, ExecutionBridge, ShellRuntime};
use warden_skills::{handler_fn, register_builtin_tools, ToolDefinition, ToolRegistry};

// =============================================================================
// Helpers
// =============================================================================

fn registry() -> Arc<ToolRegistry> {
    let registry = ToolRegistry::new();
    register_builtin_tools(&registry).unwrap();
    registry
        .register(
            ToolDefinition::new(
                "util.fail",
                "Always fails",
                handler_fn(|_ctx, _params| async move { Err(Error::tool_execution("boom")) }),
            )
            .with_parameter(ToolParameter::optional("why", ParamKind::String, "Ignored")),
        )
        .unwrap();
    registry
        .register(ToolDefinition::new(
            "util.panic",
            "Always panics",
            handler_fn(|_ctx, _params| async move {
                if true {
                    panic!("handler bug");
                }
                Ok(Value::Null)
            }),
        ))
        .unwrap();
    registry
        .register(ToolDefinition::new(
            "util.stall",
            "Takes far longer than any execution budget",
            handler_fn(|_ctx, _params| async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Value::Null)
            }),
        ))
        .unwrap();
    Arc::new(registry)
}

fn bridge_with(dir: &tempfile::TempDir, config: BridgeConfig) -> ExecutionBridge {
    ExecutionBridge::new(
        registry(),
        ToolContext::new(),
        Arc::new(ShellRuntime),
        BridgeConfig {
            bindings_dir: dir.path().to_path_buf(),
            ..config
        },
    )
}

fn bridge(dir: &tempfile::TempDir) -> ExecutionBridge {
    bridge_with(
        dir,
        BridgeConfig {
            read_timeout: Duration::from_secs(5),
            deadline: Duration::from_secs(10),
            ..Default::default()
        },
    )
}

// =============================================================================
// 1. Result assembly
// =============================================================================

#[tokio::test]
async fn test_single_output_and_debug_lines() {
    let dir = tempfile::tempdir().unwrap();
    let script = r#"
echo 'starting'
echo '{"debug": "step 1"}'
echo 'not json {'
echo '{"output": {"answer": 42}}'
"#;

    let result = bridge(&dir).execute(script).await;

    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.outcome, ExecutionOutcome::Completed);
    assert_eq!(result.output, Some(json!({"answer": 42})));
    assert_eq!(result.debug, vec!["starting", "step 1", "not json {"]);
    assert_eq!(result.error, None);
}

#[tokio::test]
async fn test_multiple_outputs_are_collected_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let script = r#"
echo '{"output": 1}'
echo '{"output": "two"}'
echo '{"output": [3]}'
"#;

    let result = bridge(&dir).execute(script).await;

    assert!(result.success);
    assert_eq!(result.output, Some(json!([1, "two", [3]])));
}

#[tokio::test]
async fn test_no_output_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let result = bridge(&dir).execute("true").await;

    assert!(result.success);
    assert_eq!(result.output, None);
    assert!(result.debug.is_empty());
}

// =============================================================================
// 2. Tool calls
// =============================================================================

#[tokio::test]
async fn test_tool_call_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let script = r#"
echo '{"tool_call": true, "tool": "util.echo", "params": {"value": "hi"}}'
read reply
printf '{"output": %s}\n' "$reply"
"#;

    let result = bridge(&dir).execute(script).await;

    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.tool_calls, 1);
    assert_eq!(result.output, Some(json!({"tool_result": "hi"})));
}

#[tokio::test]
async fn test_wrapped_params_are_unwrapped() {
    let dir = tempfile::tempdir().unwrap();
    let script = r#"
echo '{"tool_call": true, "tool": "util.echo", "params": {"params": {"value": "wrapped"}}}'
read reply
printf '{"output": %s}\n' "$reply"
"#;

    let result = bridge(&dir).execute(script).await;

    assert_eq!(result.output, Some(json!({"tool_result": "wrapped"})));
}

#[tokio::test]
async fn test_tool_failures_are_replied_and_execution_continues() {
    let dir = tempfile::tempdir().unwrap();
    let script = r#"
echo '{"tool_call": true, "tool": "nope.missing", "params": {}}'
read reply
echo "$reply"
echo '{"tool_call": true, "tool": "util.fail", "params": {}}'
read reply
echo "$reply"
echo '{"tool_call": true, "tool": "util.panic"}'
read reply
echo "$reply"
echo '{"tool_call": true}'
read reply
echo '{"output": "still running"}'
"#;

    let result = bridge(&dir).execute(script).await;

    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.output, Some(json!("still running")));
    assert_eq!(result.debug[0], r#"{"tool_error":"Unknown tool: nope.missing"}"#);
    assert_eq!(result.debug[1], r#"{"tool_error":"Tool execution failed: boom"}"#);
    assert!(result.debug[2].contains("util.panic panicked"));
    assert_eq!(result.debug[3], r#"{"tool_call": true}"#);
    assert_eq!(result.tool_calls, 3);
}

// =============================================================================
// 3. Quotas
// =============================================================================

#[tokio::test]
async fn test_tool_call_quota_kills_worker() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = bridge_with(
        &dir,
        BridgeConfig {
            max_tool_calls: 2,
            read_timeout: Duration::from_secs(5),
            deadline: Duration::from_secs(10),
            ..Default::default()
        },
    );
    let script = r#"
for i in 1 2 3; do
  echo '{"tool_call": true, "tool": "util.echo", "params": {"value": "x"}}'
  read reply
  printf '{"output": %s}\n' "$reply"
done
echo '{"output": "survived"}'
"#;

    let result = bridge.execute(script).await;

    assert!(!result.success);
    assert_eq!(result.outcome, ExecutionOutcome::QuotaExceeded);
    assert_eq!(result.tool_calls, 3);
    assert!(result.error.unwrap().contains("tool call count limit of 2"));
    assert_eq!(
        result.output,
        Some(json!([{"tool_result": "x"}, {"tool_result": "x"}]))
    );
}

#[tokio::test]
async fn test_output_byte_quota() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = bridge_with(
        &dir,
        BridgeConfig {
            max_output_bytes: 64,
            ..Default::default()
        },
    );
    let script = r#"
i=0
while [ $i -lt 100 ]; do
  echo "this line is repeated until the output ceiling is reached"
  i=$((i + 1))
done
"#;

    let result = bridge.execute(script).await;

    assert!(!result.success);
    assert_eq!(result.outcome, ExecutionOutcome::QuotaExceeded);
    assert!(result.error.unwrap().contains("output bytes limit of 64"));
    assert!(result.debug.len() <= 1);
}

#[tokio::test]
async fn test_oversized_source_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = bridge_with(
        &dir,
        BridgeConfig {
            max_source_bytes: 16,
            ..Default::default()
        },
    );

    let result = bridge.execute(&"echo x\n".repeat(10)).await;

    assert!(!result.success);
    assert_eq!(result.outcome, ExecutionOutcome::QuotaExceeded);
    assert_eq!(result.tool_calls, 0);
    assert!(result.debug.is_empty());
}

// =============================================================================
// 4. Timeouts
// =============================================================================

#[tokio::test]
async fn test_deadline_breached_while_every_read_is_fast() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = bridge_with(
        &dir,
        BridgeConfig {
            read_timeout: Duration::from_secs(1),
            deadline: Duration::from_millis(1500),
            ..Default::default()
        },
    );
    let script = r#"
for i in 1 2 3 4 5 6 7 8; do
  echo "tick $i"
  sleep 0.4
done
echo '{"output": "finished"}'
"#;

    let result = bridge.execute(script).await;

    assert!(!result.success);
    assert_eq!(result.outcome, ExecutionOutcome::TimedOut);
    assert!(result.error.unwrap().contains("deadline"));
    assert!(!result.debug.is_empty());
    assert_eq!(result.output, None);
    assert!(result.elapsed < Duration::from_secs(3));
}

#[tokio::test]
async fn test_deadline_interrupts_a_running_tool_call() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = bridge_with(
        &dir,
        BridgeConfig {
            read_timeout: Duration::from_secs(1),
            deadline: Duration::from_secs(1),
            ..Default::default()
        },
    );
    let script = r#"
echo '{"tool_call": true, "tool": "util.stall"}'
read reply
echo '{"output": "unreachable"}'
"#;

    let result = bridge.execute(script).await;

    assert!(!result.success);
    assert_eq!(result.outcome, ExecutionOutcome::TimedOut);
    assert!(result.error.unwrap().contains("deadline"));
    assert_eq!(result.tool_calls, 1);
    assert_eq!(result.output, None);
    assert!(result.elapsed < Duration::from_secs(3));
}

#[tokio::test]
async fn test_silent_worker_hits_read_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = bridge_with(
        &dir,
        BridgeConfig {
            read_timeout: Duration::from_millis(500),
            deadline: Duration::from_secs(30),
            ..Default::default()
        },
    );

    let result = bridge.execute("sleep 5").await;

    assert!(!result.success);
    assert_eq!(result.outcome, ExecutionOutcome::TimedOut);
    assert!(result.error.unwrap().contains("no output from worker"));
    assert!(result.elapsed < Duration::from_secs(4));
}

// =============================================================================
// 5. Worker faults
// =============================================================================

#[tokio::test]
async fn test_non_zero_exit_with_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let script = r#"
echo '{"output": "partial"}'
echo 'oops' >&2
exit 3
"#;

    let result = bridge(&dir).execute(script).await;

    assert!(!result.success);
    assert_eq!(result.outcome, ExecutionOutcome::Failed);
    assert_eq!(result.output, Some(json!("partial")));
    let error = result.error.unwrap();
    assert!(error.contains("exited with"));
    assert!(error.ends_with("\n\nStderr:\noops"));
}

#[tokio::test]
async fn test_stderr_alone_fails_the_execution() {
    let dir = tempfile::tempdir().unwrap();
    let result = bridge(&dir).execute("echo 'warning: something' >&2").await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("warning: something"));
}

#[tokio::test]
async fn test_temporary_scripts_are_removed() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = bridge(&dir);

    bridge.execute("echo '{\"output\": 1}'").await;
    bridge.execute("exit 1").await;

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("exec-"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_concurrent_executions_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = Arc::new(bridge(&dir));

    let a = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.execute("sleep 0.2; echo '{\"output\": \"a\"}'").await })
    };
    let b = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.execute("echo '{\"output\": \"b\"}'").await })
    };

    assert_eq!(a.await.unwrap().output, Some(json!("a")));
    assert_eq!(b.await.unwrap().output, Some(json!("b")));
}
