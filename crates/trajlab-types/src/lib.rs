//! Shared types, errors, and execution results for the trajlab pipeline.
//!
//! This crate provides the foundational types used across all other trajlab
//! crates:
//! - `TrajlabError` — unified error taxonomy
//! - `ExecStatus` / `ExecutionResult` — the observable outcome of one child
//!   process, the only thing the orchestrator ever learns about a stage

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Exit code reported when a child process could not even be started
/// (missing executable, permission error). Mirrors the shell convention
/// for "command not found" so it is distinct from any real stage failure.
pub const SPAWN_FAILURE_CODE: i32 = 127;

/// Unified error type for all trajlab subsystems.
#[derive(Debug, thiserror::Error)]
pub enum TrajlabError {
    // === Precondition errors ===
    #[error("missing required capabilities: {}", names.join(", "))]
    MissingCapabilities { names: Vec<String> },

    // === Stage errors ===
    #[error("stage '{stage}' failed with exit code {exit_code}: {stderr}")]
    StageFailure {
        stage: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("stage '{stage}' timed out after {timeout_secs}s")]
    StageTimeout { stage: String, timeout_secs: u64 },

    // === Process boundary errors ===
    #[error("could not spawn '{program}': {message}")]
    SpawnFailure { program: String, message: String },

    #[error("failed to launch application '{app}': {message}")]
    LaunchFailure { app: String, message: String },

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl TrajlabError {
    /// Returns `true` if the error came out of a processing stage rather
    /// than the orchestrator's own machinery.
    pub fn is_stage_fault(&self) -> bool {
        matches!(
            self,
            TrajlabError::StageFailure { .. } | TrajlabError::StageTimeout { .. }
        )
    }
}

/// A convenience alias for `Result<T, TrajlabError>`.
pub type Result<T> = std::result::Result<T, TrajlabError>;

// ---------------------------------------------------------------------------
// ExecStatus / ExecutionResult — what a child process told us
// ---------------------------------------------------------------------------

/// Terminal status of one child process execution.
///
/// `TimedOut` is deliberately distinct from `Failure`: a timed-out process
/// was killed before it produced an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecStatus {
    Success,
    Failure { exit_code: i32 },
    TimedOut,
}

/// Captured outcome of one child process: status, both text streams, and
/// wall-clock duration. Produced exactly once per stage invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ExecutionResult {
    /// A clean exit (code 0) with the given captured streams.
    pub fn success(
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            status: ExecStatus::Success,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration,
        }
    }

    /// A non-zero exit with the given code and captured streams.
    pub fn failure(
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            status: ExecStatus::Failure { exit_code },
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration,
        }
    }

    /// A forcibly terminated process. No exit code exists; the streams are
    /// whatever diagnostic text the caller wants to surface.
    pub fn timed_out(stderr: impl Into<String>, duration: Duration) -> Self {
        Self {
            status: ExecStatus::TimedOut,
            stdout: String::new(),
            stderr: stderr.into(),
            duration,
        }
    }

    /// A `Failure`-shaped result for a process that never started.
    pub fn spawn_failed(message: impl Into<String>) -> Self {
        Self {
            status: ExecStatus::Failure {
                exit_code: SPAWN_FAILURE_CODE,
            },
            stdout: String::new(),
            stderr: message.into(),
            duration: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecStatus::Success
    }
}
