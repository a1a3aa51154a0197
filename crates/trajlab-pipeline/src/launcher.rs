//! Detached application launches with fan-out and per-app failure isolation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use trajlab_proc::{LaunchHandle, ProcessRunner};

use crate::menu::{Application, ApplicationId};

/// What happened to one launch attempt. Fire-and-forget: nothing about the
/// process is tracked after spawn beyond the handle.
#[derive(Debug, Clone)]
pub struct LaunchOutcome {
    pub app: ApplicationId,
    pub spawn_succeeded: bool,
    pub handle: Option<LaunchHandle>,
    pub error: Option<String>,
}

/// Spawns applications as detached background processes.
pub struct AppLauncher {
    runner: Arc<dyn ProcessRunner>,
    stagger: Duration,
}

impl AppLauncher {
    /// `stagger` is the delay inserted between consecutive spawns in
    /// [`launch_all`](Self::launch_all), to avoid startup port/resource
    /// contention.
    pub fn new(runner: Arc<dyn ProcessRunner>, stagger: Duration) -> Self {
        Self { runner, stagger }
    }

    /// Spawn one application. A spawn failure is captured in the outcome,
    /// never propagated.
    pub async fn launch_one(&self, app: &Application) -> LaunchOutcome {
        info!(app = %app.id, command = %app.entrypoint, mode = ?app.mode, "launching application");
        match self.runner.spawn_detached(app.id.as_str(), &app.entrypoint).await {
            Ok(handle) => {
                match app.port {
                    Some(port) => info!(
                        app = %app.id,
                        pid = handle.pid,
                        "started at http://localhost:{}", port
                    ),
                    None => info!(app = %app.id, pid = handle.pid, "started"),
                }
                LaunchOutcome {
                    app: app.id,
                    spawn_succeeded: true,
                    handle: Some(handle),
                    error: None,
                }
            }
            Err(err) => {
                warn!(app = %app.id, error = %err, "failed to launch application");
                LaunchOutcome {
                    app: app.id,
                    spawn_succeeded: false,
                    handle: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    /// Launch every application in declared order with the configured
    /// inter-launch delay. One failed spawn does not stop the siblings.
    pub async fn launch_all(&self, apps: &[Application]) -> Vec<LaunchOutcome> {
        let mut outcomes = Vec::with_capacity(apps.len());
        for (i, app) in apps.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.stagger).await;
            }
            outcomes.push(self.launch_one(app).await);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::LaunchMode;
    use trajlab_proc::{CommandSpec, ScriptedRunner};

    fn apps() -> Vec<Application> {
        vec![
            Application {
                id: ApplicationId::WebSimulator,
                display_name: "Interactive Web Simulator".into(),
                entrypoint: CommandSpec::new("python3").arg("app/run_simulator.py"),
                mode: LaunchMode::Detached,
                port: Some(8501),
            },
            Application {
                id: ApplicationId::Dashboard,
                display_name: "Advanced Analytics Dashboard".into(),
                entrypoint: CommandSpec::new("python3").arg("dashboard/run_dashboard.py"),
                mode: LaunchMode::Detached,
                port: Some(8502),
            },
            Application {
                id: ApplicationId::DesktopGui,
                display_name: "Desktop GUI Application".into(),
                entrypoint: CommandSpec::new("python3").arg("app/simple_gui.py"),
                mode: LaunchMode::Detached,
                port: None,
            },
        ]
    }

    #[tokio::test]
    async fn launch_one_returns_handle_on_success() {
        let runner = Arc::new(ScriptedRunner::new(vec![]));
        let launcher = AppLauncher::new(runner.clone(), Duration::from_secs(2));

        let outcome = launcher.launch_one(&apps()[0]).await;
        assert!(outcome.spawn_succeeded);
        assert_eq!(outcome.app, ApplicationId::WebSimulator);
        assert!(outcome.handle.unwrap().pid.is_some());
        assert!(outcome.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn launch_all_runs_in_declared_order_with_stagger() {
        let runner = Arc::new(ScriptedRunner::new(vec![]));
        let launcher = AppLauncher::new(runner.clone(), Duration::from_secs(2));

        let outcomes = launcher.launch_all(&apps()).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.spawn_succeeded));

        let calls = runner.detached_calls();
        let names: Vec<_> = calls.iter().filter_map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["web-simulator", "dashboard", "desktop-gui"]);

        // At least the configured delay between consecutive spawns.
        assert!(calls[1].at - calls[0].at >= Duration::from_secs(2));
        assert!(calls[2].at - calls[1].at >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn one_failed_spawn_does_not_stop_the_rest() {
        let apps = apps();
        // The dashboard entrypoint refuses to spawn.
        let runner = Arc::new(
            ScriptedRunner::new(vec![]).with_failing_spawn("python3-broken"),
        );
        let mut broken = apps.clone();
        broken[1].entrypoint = CommandSpec::new("python3-broken").arg("dashboard/run_dashboard.py");

        let launcher = AppLauncher::new(runner.clone(), Duration::from_secs(2));
        let outcomes = launcher.launch_all(&broken).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].spawn_succeeded);
        assert!(!outcomes[1].spawn_succeeded);
        assert!(outcomes[1].error.as_deref().unwrap().contains("could not spawn"));
        assert!(outcomes[2].spawn_succeeded);
    }
}
