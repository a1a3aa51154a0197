use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use trajlab_types::{ExecutionResult, Result, TrajlabError};

use crate::runner::{CommandSpec, LaunchHandle, ProcessRunner};

/// Grace period between SIGTERM and SIGKILL when a timed-out child is
/// being torn down.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// Concrete [`ProcessRunner`] backed by real operating-system processes.
pub struct LocalProcessRunner {
    working_dir: PathBuf,
    log_dir: PathBuf,
}

impl LocalProcessRunner {
    /// `working_dir` is the default cwd for children; detached launches
    /// redirect their output into files under `log_dir`.
    pub fn new(working_dir: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            log_dir: log_dir.into(),
        }
    }

    fn resolve_cwd(&self, spec: &CommandSpec) -> PathBuf {
        spec.cwd
            .clone()
            .unwrap_or_else(|| self.working_dir.clone())
    }
}

#[async_trait]
impl ProcessRunner for LocalProcessRunner {
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> Result<ExecutionResult> {
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(self.resolve_cwd(spec))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        // On Unix, give the child its own process group for a clean kill.
        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        let start = tokio::time::Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!(program = %spec.program, error = %err, "process failed to start");
                return Ok(ExecutionResult::spawn_failed(format!(
                    "could not spawn '{}': {}",
                    spec.program, err
                )));
            }
        };

        // Drain both pipes concurrently so the child cannot block on a
        // full pipe buffer while we wait for it to exit.
        let mut stdout = child.stdout.take().expect("stdout piped");
        let mut stderr = child.stderr.take().expect("stderr piped");
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf).await;
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                let stdout_buf = stdout_task.await.unwrap_or_default();
                let stderr_buf = stderr_task.await.unwrap_or_default();
                let duration = start.elapsed();
                let stdout_text = String::from_utf8_lossy(&stdout_buf).to_string();
                let stderr_text = String::from_utf8_lossy(&stderr_buf).to_string();

                match status.code() {
                    Some(0) => Ok(ExecutionResult::success(stdout_text, stderr_text, duration)),
                    Some(code) => Ok(ExecutionResult::failure(code, stdout_text, stderr_text, duration)),
                    // Killed by a signal outside our timeout path: no exit
                    // code exists, report a failure with a sentinel code.
                    None => Ok(ExecutionResult::failure(
                        -1,
                        stdout_text,
                        format!("terminated by signal; {}", stderr_text),
                        duration,
                    )),
                }
            }
            _ = tokio::time::sleep(timeout) => {
                debug!(program = %spec.program, ?timeout, "timeout elapsed, terminating child");

                // SIGTERM the whole group first, then force-kill after a
                // short grace period.
                #[cfg(unix)]
                {
                    if let Some(pid) = child.id() {
                        unsafe { libc::kill(-(pid as i32), libc::SIGTERM); }
                    }
                    tokio::select! {
                        _ = child.wait() => {}
                        _ = tokio::time::sleep(KILL_GRACE) => {
                            let _ = child.kill().await;
                        }
                    }
                }
                #[cfg(not(unix))]
                {
                    let _ = child.kill().await;
                }

                stdout_task.abort();
                stderr_task.abort();

                let duration = start.elapsed();
                Ok(ExecutionResult::timed_out(
                    format!("timed out after {}s", timeout.as_secs()),
                    duration,
                ))
            }
        }
    }

    async fn spawn_detached(&self, name: &str, spec: &CommandSpec) -> Result<LaunchHandle> {
        std::fs::create_dir_all(&self.log_dir)?;
        let log_path = self.log_dir.join(format!("{}.log", name));
        let log_file = std::fs::File::create(&log_path)?;
        let err_file = log_file.try_clone()?;

        // std, not tokio: the child must outlive this process without ever
        // being awaited, and a dropped std Child keeps running.
        let mut cmd = std::process::Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(self.resolve_cwd(spec))
            .stdin(std::process::Stdio::null())
            .stdout(log_file)
            .stderr(err_file);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        match cmd.spawn() {
            Ok(child) => {
                debug!(name, pid = child.id(), log = %log_path.display(), "detached launch");
                Ok(LaunchHandle {
                    pid: Some(child.id()),
                    log_path: Some(log_path),
                })
            }
            Err(err) => Err(TrajlabError::SpawnFailure {
                program: spec.program.clone(),
                message: err.to_string(),
            }),
        }
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        let candidate = Path::new(program);
        if candidate.components().count() > 1 {
            let resolved = if candidate.is_absolute() {
                candidate.to_path_buf()
            } else {
                self.working_dir.join(candidate)
            };
            return is_executable(&resolved).then_some(resolved);
        }

        let path_var = std::env::var_os("PATH")?;
        std::env::split_paths(&path_var)
            .map(|dir| dir.join(program))
            .find(|full| is_executable(full))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
