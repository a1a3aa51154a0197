//! The pipeline orchestrator: a strictly sequential state machine driving
//! capability checks, directory setup, the skip gate, the three processing
//! stages, and the launch fan-out.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use trajlab_proc::ProcessRunner;
use trajlab_types::{ExecutionResult, Result, TrajlabError};

use crate::artifact::ArtifactProbe;
use crate::capability::CapabilityChecker;
use crate::config::PipelineConfig;
use crate::launcher::{AppLauncher, LaunchOutcome};
use crate::menu::{LaunchMenu, MenuSelection};
use crate::prompt::{Prompter, Question};
use crate::stage::{FailurePolicy, StageRunner};

/// Phases of a pipeline run, in the order they can be entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    CheckingCapabilities,
    DirectorySetup,
    SkipGate,
    Running(String),
    SkippedProcessing,
    LaunchPhase,
    Done,
    Aborted,
}

/// Terminal outcome of a run.
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed { processing_skipped: bool },
    Aborted { reason: TrajlabError },
}

/// One stage's recorded result. Exactly one per stage per run.
#[derive(Debug)]
pub struct StageRecord {
    pub stage: String,
    pub result: ExecutionResult,
}

/// Everything a run produced: the outcome, the phase trail, per-stage
/// results, and per-application launch outcomes.
#[derive(Debug)]
pub struct PipelineReport {
    pub outcome: PipelineOutcome,
    pub phases: Vec<Phase>,
    pub stage_results: Vec<StageRecord>,
    pub launches: Vec<LaunchOutcome>,
}

impl PipelineReport {
    pub fn aborted(&self) -> bool {
        matches!(self.outcome, PipelineOutcome::Aborted { .. })
    }

    /// Process exit status for this run: 0 on completion, 2 when aborted on
    /// missing capabilities, 1 when aborted on a stage failure or timeout.
    pub fn exit_code(&self) -> i32 {
        match &self.outcome {
            PipelineOutcome::Completed { .. } => 0,
            PipelineOutcome::Aborted {
                reason: TrajlabError::MissingCapabilities { .. },
            } => 2,
            PipelineOutcome::Aborted { .. } => 1,
        }
    }
}

/// Drives one pipeline run. `run` consumes the orchestrator, so a stage can
/// never execute twice within a run and a report can never be reused.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    runner: Arc<dyn ProcessRunner>,
    prompter: Arc<dyn Prompter>,
    phases: Vec<Phase>,
}

impl PipelineOrchestrator {
    pub fn new(
        config: PipelineConfig,
        runner: Arc<dyn ProcessRunner>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            config,
            runner,
            prompter,
            phases: vec![Phase::Idle],
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!(?phase, "entering phase");
        self.phases.push(phase);
    }

    fn report(
        self,
        outcome: PipelineOutcome,
        stage_results: Vec<StageRecord>,
        launches: Vec<LaunchOutcome>,
    ) -> PipelineReport {
        PipelineReport {
            outcome,
            phases: self.phases,
            stage_results,
            launches,
        }
    }

    pub async fn run(mut self) -> Result<PipelineReport> {
        let mut stage_results: Vec<StageRecord> = Vec::new();

        // Precondition: every required capability must be available before
        // anything touches the filesystem.
        self.enter(Phase::CheckingCapabilities);
        let checker = CapabilityChecker::new(self.runner.clone());
        let missing = checker.missing(&self.config.capabilities).await;
        if !missing.is_empty() {
            for name in &missing {
                error!(capability = %name, "required capability is not available");
            }
            info!("install missing packages with: pip install {}", missing.join(" "));
            self.enter(Phase::Aborted);
            return Ok(self.report(
                PipelineOutcome::Aborted {
                    reason: TrajlabError::MissingCapabilities { names: missing },
                },
                stage_results,
                Vec::new(),
            ));
        }

        // Idempotent directory setup; an IO error here is fatal.
        self.enter(Phase::DirectorySetup);
        for dir in &self.config.work_dirs {
            std::fs::create_dir_all(self.config.root.join(dir))?;
        }
        debug!(root = %self.config.root.display(), "directory structure verified");

        // Skip gate: offered only when both canonical artifacts exist.
        let probe = ArtifactProbe::new(&self.config.root);
        let mut skip_processing = false;
        if probe.all_present(&[&self.config.model_marker, &self.config.dataset]) {
            self.enter(Phase::SkipGate);
            info!("existing models and data found");
            let question = Question {
                prompt: "Skip data generation and training? (y/n)".into(),
                choices: Vec::new(),
            };
            let answer = self.prompter.ask(&question).await.unwrap_or_default();
            skip_processing = matches!(answer.trim().to_lowercase().as_str(), "y" | "yes");
        }

        if skip_processing {
            // Skipping is atomic: all three stages or none.
            info!("skipping data generation, training, and validation");
            self.enter(Phase::SkippedProcessing);
        } else {
            let stage_runner = StageRunner::new(self.runner.clone());
            let stages = self.config.stages.clone();
            for (i, stage) in stages.iter().enumerate() {
                info!(step = i + 1, of = stages.len(), stage = %stage.name, "starting stage");
                self.enter(Phase::Running(stage.name.clone()));
                let result = stage_runner.run(stage).await?;
                let fault = stage.fault(&result);
                stage_results.push(StageRecord {
                    stage: stage.name.clone(),
                    result,
                });

                if let Some(fault) = fault {
                    match stage.policy {
                        FailurePolicy::Hard => {
                            error!(stage = %stage.name, error = %fault, "aborting pipeline");
                            self.enter(Phase::Aborted);
                            return Ok(self.report(
                                PipelineOutcome::Aborted { reason: fault },
                                stage_results,
                                Vec::new(),
                            ));
                        }
                        FailurePolicy::Soft => {
                            warn!(stage = %stage.name, error = %fault, "continuing despite failure");
                        }
                    }
                }
            }
        }

        // Launch fan-out. Failures here never abort the run.
        self.enter(Phase::LaunchPhase);
        let menu = LaunchMenu::new(self.prompter.clone());
        let applications = self.config.applications.clone();
        let selection = menu.present(&applications).await;
        let launcher = AppLauncher::new(self.runner.clone(), self.config.launch_stagger);

        let launches = match selection {
            MenuSelection::One(id) => match applications.iter().find(|a| a.id == id) {
                Some(app) => vec![launcher.launch_one(app).await],
                None => Vec::new(),
            },
            MenuSelection::All => launcher.launch_all(&applications).await,
            MenuSelection::Skip => Vec::new(),
        };

        self.enter(Phase::Done);
        Ok(self.report(
            PipelineOutcome::Completed {
                processing_skipped: skip_processing,
            },
            stage_results,
            launches,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;
    use trajlab_proc::ScriptedRunner;
    use trajlab_types::ExecStatus;

    use crate::capability::Capability;
    use crate::menu::ApplicationId;
    use crate::prompt::ScriptedPrompter;

    /// Standard config with the capability set reduced to a PATH probe so
    /// scripted run results are consumed by stages only.
    fn test_config(root: &Path) -> PipelineConfig {
        let mut config = PipelineConfig::standard(root);
        config.capabilities = vec![Capability::executable("python3")];
        config
    }

    fn scripted(results: Vec<ExecutionResult>) -> Arc<ScriptedRunner> {
        Arc::new(ScriptedRunner::new(results).with_programs(&["python3"]))
    }

    fn ok() -> ExecutionResult {
        ExecutionResult::success("", "", Duration::from_millis(10))
    }

    fn seed_artifacts(root: &Path) {
        std::fs::create_dir_all(root.join("models")).unwrap();
        std::fs::create_dir_all(root.join("data")).unwrap();
        std::fs::write(root.join("models/model_metadata.joblib"), b"meta").unwrap();
        std::fs::write(root.join("data/trajectory_dataset.csv"), b"t,x,y\n").unwrap();
    }

    #[tokio::test]
    async fn missing_capabilities_abort_before_any_side_effect() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new(vec![])); // python3 not known
        let prompter = Arc::new(ScriptedPrompter::new(&[]));

        let report = PipelineOrchestrator::new(test_config(dir.path()), runner.clone(), prompter)
            .run()
            .await
            .unwrap();

        assert!(report.aborted());
        assert_eq!(report.exit_code(), 2);
        match &report.outcome {
            PipelineOutcome::Aborted {
                reason: TrajlabError::MissingCapabilities { names },
            } => assert_eq!(names, &vec!["python3".to_string()]),
            other => panic!("expected missing-capability abort, got {:?}", other),
        }

        // No directories created, no stage invoked.
        assert!(!dir.path().join("data").exists());
        assert!(!dir.path().join("models").exists());
        assert!(runner.calls().is_empty());
        assert!(!report.phases.contains(&Phase::DirectorySetup));
        assert!(report.phases.contains(&Phase::Aborted));
    }

    #[tokio::test]
    async fn full_run_executes_stages_then_selected_app() {
        let dir = TempDir::new().unwrap();
        let runner = scripted(vec![ok(), ok(), ok()]);
        let prompter = Arc::new(ScriptedPrompter::new(&["1"]));

        let report = PipelineOrchestrator::new(
            test_config(dir.path()),
            runner.clone(),
            prompter.clone(),
        )
        .run()
        .await
        .unwrap();

        assert!(!report.aborted());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.stage_results.len(), 3);

        // Stages ran in order with their configured commands.
        let run_args: Vec<_> = runner
            .run_calls()
            .iter()
            .map(|c| c.args[0].clone())
            .collect();
        assert_eq!(
            run_args,
            vec![
                "scripts/generate_dataset.py",
                "scripts/train_models.py",
                "scripts/model_validation.py",
            ]
        );

        // Only the web simulator launched.
        let detached = runner.detached_calls();
        assert_eq!(detached.len(), 1);
        assert_eq!(detached[0].name.as_deref(), Some("web-simulator"));
        assert_eq!(report.launches.len(), 1);
        assert_eq!(report.launches[0].app, ApplicationId::WebSimulator);

        // Artifacts were absent, so the skip gate was never presented:
        // the only question was the launch menu.
        assert_eq!(prompter.questions().len(), 1);
        assert!(!report.phases.contains(&Phase::SkipGate));
        assert!(report.phases.contains(&Phase::Done));

        // Directories were created.
        for d in ["data", "models", "scripts", "src", "app", "dashboard"] {
            assert!(dir.path().join(d).is_dir());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn skip_gate_yes_bypasses_all_stages_atomically() {
        let dir = TempDir::new().unwrap();
        seed_artifacts(dir.path());
        let runner = scripted(vec![]);
        let prompter = Arc::new(ScriptedPrompter::new(&["y", "4"]));

        let report = PipelineOrchestrator::new(
            test_config(dir.path()),
            runner.clone(),
            prompter,
        )
        .run()
        .await
        .unwrap();

        assert!(matches!(
            report.outcome,
            PipelineOutcome::Completed {
                processing_skipped: true
            }
        ));
        assert!(report.stage_results.is_empty());
        assert!(runner.run_calls().is_empty());
        assert!(report.phases.contains(&Phase::SkippedProcessing));
        assert!(!report
            .phases
            .iter()
            .any(|p| matches!(p, Phase::Running(_))));

        // "Launch all": three apps, fixed order.
        let names: Vec<_> = runner
            .detached_calls()
            .iter()
            .filter_map(|c| c.name.clone())
            .collect();
        assert_eq!(names, vec!["web-simulator", "dashboard", "desktop-gui"]);
        assert_eq!(report.launches.len(), 3);
    }

    #[tokio::test]
    async fn skip_gate_declined_runs_everything() {
        let dir = TempDir::new().unwrap();
        seed_artifacts(dir.path());
        let runner = scripted(vec![ok(), ok(), ok()]);
        let prompter = Arc::new(ScriptedPrompter::new(&["n", "5"]));

        let report = PipelineOrchestrator::new(
            test_config(dir.path()),
            runner.clone(),
            prompter,
        )
        .run()
        .await
        .unwrap();

        assert!(matches!(
            report.outcome,
            PipelineOutcome::Completed {
                processing_skipped: false
            }
        ));
        assert_eq!(runner.run_calls().len(), 3);
        assert!(report.phases.contains(&Phase::SkipGate));
    }

    #[tokio::test]
    async fn partial_artifacts_never_present_the_skip_gate() {
        let dir = TempDir::new().unwrap();
        // Only the dataset exists.
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/trajectory_dataset.csv"), b"t\n").unwrap();

        let runner = scripted(vec![ok(), ok(), ok()]);
        let prompter = Arc::new(ScriptedPrompter::new(&["5"]));

        let report = PipelineOrchestrator::new(
            test_config(dir.path()),
            runner.clone(),
            prompter.clone(),
        )
        .run()
        .await
        .unwrap();

        assert!(!report.phases.contains(&Phase::SkipGate));
        assert_eq!(runner.run_calls().len(), 3);
        // Only the menu question was asked.
        assert_eq!(prompter.questions().len(), 1);
    }

    #[tokio::test]
    async fn hard_stage_failure_stops_the_pipeline() {
        let dir = TempDir::new().unwrap();
        let runner = scripted(vec![
            ok(),
            ExecutionResult::failure(2, "", "train blew up", Duration::from_millis(10)),
        ]);
        let prompter = Arc::new(ScriptedPrompter::new(&[]));

        let report = PipelineOrchestrator::new(
            test_config(dir.path()),
            runner.clone(),
            prompter.clone(),
        )
        .run()
        .await
        .unwrap();

        assert!(report.aborted());
        assert_eq!(report.exit_code(), 1);
        match &report.outcome {
            PipelineOutcome::Aborted {
                reason:
                    TrajlabError::StageFailure {
                        stage,
                        exit_code,
                        stderr,
                    },
            } => {
                assert_eq!(stage, "train");
                assert_eq!(*exit_code, 2);
                assert!(stderr.contains("train blew up"));
            }
            other => panic!("expected train failure, got {:?}", other),
        }

        // Validate and the launch phase never ran.
        assert_eq!(runner.run_calls().len(), 2);
        assert!(runner.detached_calls().is_empty());
        assert!(!report.phases.contains(&Phase::LaunchPhase));
        assert!(!report.phases.contains(&Phase::Running("validate".into())));
        // No prompt was ever shown.
        assert!(prompter.questions().is_empty());
    }

    #[tokio::test]
    async fn hard_stage_timeout_stops_the_pipeline() {
        let dir = TempDir::new().unwrap();
        let runner = scripted(vec![ExecutionResult::timed_out(
            "timed out after 300s",
            Duration::from_secs(300),
        )]);
        let prompter = Arc::new(ScriptedPrompter::new(&[]));

        let report = PipelineOrchestrator::new(test_config(dir.path()), runner.clone(), prompter)
            .run()
            .await
            .unwrap();

        assert!(report.aborted());
        match &report.outcome {
            PipelineOutcome::Aborted {
                reason: TrajlabError::StageTimeout { stage, timeout_secs },
            } => {
                assert_eq!(stage, "data-gen");
                assert_eq!(*timeout_secs, 300);
            }
            other => panic!("expected data-gen timeout, got {:?}", other),
        }
        assert_eq!(runner.run_calls().len(), 1);
    }

    #[tokio::test]
    async fn soft_validate_failure_still_reaches_launch_phase() {
        let dir = TempDir::new().unwrap();
        let runner = scripted(vec![
            ok(),
            ok(),
            ExecutionResult::timed_out("timed out after 180s", Duration::from_secs(180)),
        ]);
        let prompter = Arc::new(ScriptedPrompter::new(&["3"]));

        let report = PipelineOrchestrator::new(
            test_config(dir.path()),
            runner.clone(),
            prompter,
        )
        .run()
        .await
        .unwrap();

        assert!(!report.aborted());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.stage_results.len(), 3);
        assert_eq!(
            report.stage_results[2].result.status,
            ExecStatus::TimedOut
        );
        assert!(report.phases.contains(&Phase::LaunchPhase));
        assert_eq!(report.launches.len(), 1);
        assert_eq!(report.launches[0].app, ApplicationId::DesktopGui);
    }

    #[tokio::test]
    async fn invalid_menu_input_still_completes_with_zero_launches() {
        let dir = TempDir::new().unwrap();
        let runner = scripted(vec![ok(), ok(), ok()]);
        let prompter = Arc::new(ScriptedPrompter::new(&["not-a-number"]));

        let report = PipelineOrchestrator::new(test_config(dir.path()), runner.clone(), prompter)
            .run()
            .await
            .unwrap();

        assert!(!report.aborted());
        assert_eq!(report.exit_code(), 0);
        assert!(report.launches.is_empty());
        assert!(runner.detached_calls().is_empty());
        assert!(report.phases.contains(&Phase::Done));
    }
}
