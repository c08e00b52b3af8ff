//! Worker runtimes.
//!
//! A runtime decides how a program is written to disk and launched. Process
//! isolation is delegated to the runtime's own permission model; the bridge
//! only speaks the line protocol with whatever it starts.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use warden_core::Result;
use warden_skills::ToolRegistry;

/// Worker side of the line protocol, installed next to the generated bindings.
pub const DENO_RUNTIME_SOURCE: &str = include_str!("../assets/runtime.ts");

/// File name of the generated tool bindings module.
pub const BINDINGS_FILE: &str = "tools.ts";

/// How programs are prepared and launched.
#[async_trait]
pub trait WorkerRuntime: Send + Sync {
    /// Runtime name for logs.
    fn name(&self) -> &str;

    /// Extension of the temporary script file, without the dot.
    fn extension(&self) -> &str;

    /// Turn model-written source into a complete script.
    fn wrap_source(&self, source: &str) -> String;

    /// Write support files into the bindings directory.
    async fn install(&self, dir: &Path, registry: &ToolRegistry) -> Result<()>;

    /// Command that runs `script`. Stdio is configured by the caller.
    fn command(&self, script: &Path, dir: &Path) -> Command;
}

// =============================================================================
// Deno
// =============================================================================

/// Runs TypeScript under Deno with every permission denied except reading
/// the bindings directory.
#[derive(Debug, Clone)]
pub struct DenoRuntime {
    program: String,
}

impl DenoRuntime {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for DenoRuntime {
    fn default() -> Self {
        Self::new("deno")
    }
}

#[async_trait]
impl WorkerRuntime for DenoRuntime {
    fn name(&self) -> &str {
        "deno"
    }

    fn extension(&self) -> &str {
        "ts"
    }

    fn wrap_source(&self, source: &str) -> String {
        format!(
            "import {{ output, debug }} from \"{}\";\nimport * as tools from \"./{}\";\n\n{}\n",
            warden_skills::RUNTIME_MODULE,
            BINDINGS_FILE,
            source
        )
    }

    async fn install(&self, dir: &Path, registry: &ToolRegistry) -> Result<()> {
        tokio::fs::write(dir.join("runtime.ts"), DENO_RUNTIME_SOURCE).await?;
        tokio::fs::write(dir.join(BINDINGS_FILE), registry.generate_worker_bindings()).await?;
        tracing::debug!(dir = %dir.display(), tools = registry.len(), "Installed Deno bindings");
        Ok(())
    }

    fn command(&self, script: &Path, dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("run")
            .arg("--quiet")
            .arg("--no-prompt")
            .arg("--no-remote")
            .arg(format!("--allow-read={}", dir.display()))
            .arg(script);
        cmd
    }
}

// =============================================================================
// Shell
// =============================================================================

/// Runs the source as a POSIX shell script.
///
/// There is no isolation and no generated bindings: the script speaks the
/// line protocol itself. Meant for tests and local smoke runs.
#[derive(Debug, Clone, Default)]
pub struct ShellRuntime;

#[async_trait]
impl WorkerRuntime for ShellRuntime {
    fn name(&self) -> &str {
        "sh"
    }

    fn extension(&self) -> &str {
        "sh"
    }

    fn wrap_source(&self, source: &str) -> String {
        source.to_string()
    }

    async fn install(&self, _dir: &Path, _registry: &ToolRegistry) -> Result<()> {
        Ok(())
    }

    fn command(&self, script: &Path, _dir: &Path) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg(script);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_deno_prelude_imports_bindings() {
        let script = DenoRuntime::default().wrap_source("output(1);");
        assert!(script.starts_with("import { output, debug } from \"./runtime.ts\";\n"));
        assert!(script.contains("import * as tools from \"./tools.ts\";"));
        assert!(script.ends_with("output(1);\n"));
    }

    #[test]
    fn test_deno_command_restricts_reads() {
        let cmd = DenoRuntime::new("/opt/deno").command(
            &PathBuf::from("/srv/bindings/job.ts"),
            &PathBuf::from("/srv/bindings"),
        );
        let std_cmd = cmd.as_std();
        assert_eq!(std_cmd.get_program(), "/opt/deno");
        let args: Vec<_> = std_cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "run",
                "--quiet",
                "--no-prompt",
                "--no-remote",
                "--allow-read=/srv/bindings",
                "/srv/bindings/job.ts",
            ]
        );
    }

    #[tokio::test]
    async fn test_deno_install_writes_support_files() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ToolRegistry::new();
        warden_skills::register_builtin_tools(&registry).unwrap();

        DenoRuntime::default()
            .install(dir.path(), &registry)
            .await
            .unwrap();

        let runtime = std::fs::read_to_string(dir.path().join("runtime.ts")).unwrap();
        assert!(runtime.contains("export function callTool"));
        let bindings = std::fs::read_to_string(dir.path().join(BINDINGS_FILE)).unwrap();
        assert!(bindings.contains("export const util = {"));
    }

    #[test]
    fn test_shell_runtime_passes_source_through() {
        assert_eq!(ShellRuntime.wrap_source("echo hi"), "echo hi");
        assert_eq!(ShellRuntime.extension(), "sh");
    }
}
