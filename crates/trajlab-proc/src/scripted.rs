//! Scripted process runner for driving the pipeline deterministically in
//! tests: plays back preset results and records every call it receives.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use trajlab_types::{ExecutionResult, Result, TrajlabError};

use crate::runner::{CommandSpec, LaunchHandle, ProcessRunner};

/// One call observed by a [`ScriptedRunner`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Launch name for detached spawns, `None` for timed runs.
    pub name: Option<String>,
    pub program: String,
    pub args: Vec<String>,
    pub detached: bool,
    pub timeout: Option<Duration>,
    /// Instant of the call on the tokio clock, so paused-clock tests can
    /// assert on inter-launch staggering.
    pub at: tokio::time::Instant,
}

pub struct ScriptedRunner {
    results: Mutex<Vec<ExecutionResult>>,
    calls: Mutex<Vec<RecordedCall>>,
    programs: Vec<String>,
    failing_spawns: Vec<String>,
    next_pid: Mutex<u32>,
}

impl ScriptedRunner {
    /// `results` are played back in order, one per `run` call. When the
    /// script runs dry, further runs succeed with empty output.
    pub fn new(results: Vec<ExecutionResult>) -> Self {
        let mut reversed = results;
        reversed.reverse();
        Self {
            results: Mutex::new(reversed),
            calls: Mutex::new(Vec::new()),
            programs: Vec::new(),
            failing_spawns: Vec::new(),
            next_pid: Mutex::new(40_000),
        }
    }

    /// Programs that `locate` should resolve.
    pub fn with_programs(mut self, programs: &[&str]) -> Self {
        self.programs = programs.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Detached spawns of `program` will fail with a spawn error.
    pub fn with_failing_spawn(mut self, program: &str) -> Self {
        self.failing_spawns.push(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the timed (stage-style) runs.
    pub fn run_calls(&self) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| !c.detached).collect()
    }

    /// Only the detached (launch-style) spawns.
    pub fn detached_calls(&self) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.detached).collect()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> Result<ExecutionResult> {
        self.calls.lock().unwrap().push(RecordedCall {
            name: None,
            program: spec.program.clone(),
            args: spec.args.clone(),
            detached: false,
            timeout: Some(timeout),
            at: tokio::time::Instant::now(),
        });
        let result = self
            .results
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| ExecutionResult::success("", "", Duration::from_millis(1)));
        Ok(result)
    }

    async fn spawn_detached(&self, name: &str, spec: &CommandSpec) -> Result<LaunchHandle> {
        self.calls.lock().unwrap().push(RecordedCall {
            name: Some(name.to_string()),
            program: spec.program.clone(),
            args: spec.args.clone(),
            detached: true,
            timeout: None,
            at: tokio::time::Instant::now(),
        });

        if self.failing_spawns.iter().any(|p| p == &spec.program) {
            return Err(TrajlabError::SpawnFailure {
                program: spec.program.clone(),
                message: "scripted spawn failure".into(),
            });
        }

        let mut pid = self.next_pid.lock().unwrap();
        *pid += 1;
        Ok(LaunchHandle {
            pid: Some(*pid),
            log_path: Some(PathBuf::from(format!("/tmp/trajlab-test/{}.log", name))),
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.programs
            .iter()
            .find(|p| p.as_str() == program)
            .map(|p| PathBuf::from(format!("/usr/bin/{}", p)))
    }
}
