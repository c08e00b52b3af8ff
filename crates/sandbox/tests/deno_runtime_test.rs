//! Deno worker tests.
//!
//! Runs the installed `runtime.ts` and generated `tools.ts` under a real Deno
//! binary. Skipped when `deno` is not on PATH.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use warden_core::types::{ExecutionOutcome, ToolContext};
use warden_sandbox::{BridgeConfig, DenoRuntime, ExecutionBridge};
use warden_skills::{register_builtin_tools, ToolRegistry};

fn deno_available() -> bool {
    std::process::Command::new("deno")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn deno_bridge(dir: &tempfile::TempDir) -> ExecutionBridge {
    let registry = ToolRegistry::new();
    register_builtin_tools(&registry).unwrap();
    ExecutionBridge::new(
        Arc::new(registry),
        ToolContext::new(),
        Arc::new(DenoRuntime::default()),
        BridgeConfig {
            bindings_dir: dir.path().to_path_buf(),
            read_timeout: Duration::from_secs(30),
            deadline: Duration::from_secs(60),
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_generated_bindings_round_trip() {
    if !deno_available() {
        eprintln!("deno not found on PATH, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let bridge = deno_bridge(&dir);

    let source = r#"
import { callTool } from "./runtime.ts";

const [a, b] = await Promise.all([tools.util.echo("a"), tools.util.echo("b")]);
debug("echoed", a, b);

let rejected = "";
try {
  await callTool("nope.missing", {});
} catch (e) {
  rejected = (e as Error).message;
}

output([a, b]);
output(rejected);
"#;

    let result = bridge.execute(source).await;

    assert!(result.success, "error: {:?}, debug: {:?}", result.error, result.debug);
    assert_eq!(result.outcome, ExecutionOutcome::Completed);
    assert_eq!(result.tool_calls, 3);
    assert_eq!(result.debug, vec!["echoed a b".to_string()]);
    assert_eq!(
        result.output,
        Some(json!([["a", "b"], "Unknown tool: nope.missing"]))
    );
}

#[tokio::test]
async fn test_failed_tool_rejects_only_its_own_promise() {
    if !deno_available() {
        eprintln!("deno not found on PATH, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let bridge = deno_bridge(&dir);

    // No data store is configured, so the query fails while the echo after it
    // still goes through the queue.
    let source = r#"
const query = tools.datastore.query("SELECT 1");
const echo = tools.util.echo("after");
const results = await Promise.allSettled([query, echo]);
output(results.map((r) => r.status));
output(await echo);
"#;

    let result = bridge.execute(source).await;

    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.tool_calls, 2);
    assert_eq!(result.output, Some(json!([["rejected", "fulfilled"], "after"])));
}

#[tokio::test]
async fn test_worker_cannot_write_files() {
    if !deno_available() {
        eprintln!("deno not found on PATH, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let bridge = deno_bridge(&dir);
    let target = dir.path().join("escape.txt");

    let source = format!(
        "Deno.writeTextFileSync({}, \"x\");\noutput(\"wrote\");\n",
        json!(target.to_string_lossy())
    );

    let result = bridge.execute(&source).await;

    assert!(!result.success);
    assert_eq!(result.output, None);
    assert!(!target.exists());
}
