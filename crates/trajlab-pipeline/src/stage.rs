//! Processing stage model and the runner that executes one stage.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use trajlab_proc::{CommandSpec, ProcessRunner};
use trajlab_types::{ExecStatus, ExecutionResult, Result, TrajlabError};

/// What a non-success result from this stage means for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the pipeline; later stages depend on this stage's output.
    Hard,
    /// Warn and continue; the result is advisory.
    Soft,
}

/// One fixed, timed external processing step. Immutable configuration,
/// constructed once at orchestrator start.
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: String,
    pub command: CommandSpec,
    pub timeout: Duration,
    pub policy: FailurePolicy,
}

impl Stage {
    pub fn hard(name: impl Into<String>, command: CommandSpec, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            command,
            timeout,
            policy: FailurePolicy::Hard,
        }
    }

    pub fn soft(name: impl Into<String>, command: CommandSpec, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            command,
            timeout,
            policy: FailurePolicy::Soft,
        }
    }

    /// Maps a non-success result to the error it represents for this stage,
    /// or `None` on success. The policy decision stays with the caller.
    pub fn fault(&self, result: &ExecutionResult) -> Option<TrajlabError> {
        match result.status {
            ExecStatus::Success => None,
            ExecStatus::Failure { exit_code } => Some(TrajlabError::StageFailure {
                stage: self.name.clone(),
                exit_code,
                stderr: result.stderr.clone(),
            }),
            ExecStatus::TimedOut => Some(TrajlabError::StageTimeout {
                stage: self.name.clone(),
                timeout_secs: self.timeout.as_secs(),
            }),
        }
    }
}

/// Executes one stage through the process boundary. No retries; retry
/// policy, if any, belongs to the orchestrator (and none is applied).
pub struct StageRunner {
    runner: Arc<dyn ProcessRunner>,
}

impl StageRunner {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    pub async fn run(&self, stage: &Stage) -> Result<ExecutionResult> {
        info!(
            stage = %stage.name,
            command = %stage.command,
            timeout_secs = stage.timeout.as_secs(),
            "running stage"
        );
        let result = self.runner.run(&stage.command, stage.timeout).await?;

        match result.status {
            ExecStatus::Success => info!(
                stage = %stage.name,
                duration_ms = result.duration.as_millis() as u64,
                "stage completed"
            ),
            ExecStatus::Failure { exit_code } => warn!(
                stage = %stage.name,
                exit_code,
                stderr = %result.stderr,
                "stage failed"
            ),
            ExecStatus::TimedOut => warn!(
                stage = %stage.name,
                timeout_secs = stage.timeout.as_secs(),
                "stage timed out"
            ),
        }
        Ok(result)
    }
}
