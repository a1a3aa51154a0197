use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use trajlab_types::{ExecutionResult, Result};

/// A program plus its argument vector and optional working directory.
///
/// Stages and application entrypoints are both described this way; the
/// orchestrator never invokes anything that is not a `CommandSpec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Handle returned for a detached launch.
///
/// Lifecycle management is out of scope, but the spawn is not anonymous:
/// the OS pid and the file the child's output was redirected to are
/// reported so operators (and tests) can find the process later.
#[derive(Debug, Clone)]
pub struct LaunchHandle {
    pub pid: Option<u32>,
    pub log_path: Option<PathBuf>,
}

/// Abstraction over child-process execution.
///
/// The orchestrator's control flow depends only on this trait, so tests can
/// substitute [`ScriptedRunner`](crate::ScriptedRunner) and drive the state
/// machine without creating real processes.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `spec` to completion with a hard wall-clock bound.
    ///
    /// Never returns `Err` for the child's own misbehavior: a non-zero
    /// exit, a timeout, or a failure to start all come back as an
    /// [`ExecutionResult`]. `Err` is reserved for the runner's own faults.
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> Result<ExecutionResult>;

    /// Spawn `spec` as a detached background process and return immediately.
    async fn spawn_detached(&self, name: &str, spec: &CommandSpec) -> Result<LaunchHandle>;

    /// Resolve `program` the way the operating system would, without
    /// running it. Used for capability checks.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}
