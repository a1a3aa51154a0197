//! Pipeline configuration.
//!
//! Everything the orchestrator needs — directories, artifact paths, the
//! capability set, the stage table, the application table, timing — is
//! explicit configuration built once at startup. There are no module-level
//! path constants; [`PipelineConfig::standard`] is the single place the
//! filesystem contract with the external stage scripts is written down.

use std::path::PathBuf;
use std::time::Duration;

use trajlab_proc::CommandSpec;

use crate::artifact::Artifact;
use crate::capability::Capability;
use crate::menu::{Application, ApplicationId, LaunchMode};
use crate::stage::Stage;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Project root. All relative paths below resolve against it.
    pub root: PathBuf,
    /// Working directories created (idempotently) before any stage runs.
    pub work_dirs: Vec<String>,
    /// Marker written by the training stage.
    pub model_marker: Artifact,
    /// Dataset written by the data generation stage.
    pub dataset: Artifact,
    pub capabilities: Vec<Capability>,
    /// Processing stages, in execution order.
    pub stages: Vec<Stage>,
    /// Launchable applications, in declared launch order.
    pub applications: Vec<Application>,
    /// Delay between consecutive spawns in a launch-all.
    pub launch_stagger: Duration,
    /// Where detached launches redirect their output.
    pub log_dir: PathBuf,
}

impl PipelineConfig {
    /// The standard trajectory-toolkit pipeline rooted at `root`: three
    /// Python stages, two canonical artifacts, three applications.
    pub fn standard(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let log_dir = root.join(".trajlab/logs");

        let capabilities = {
            let mut caps = vec![Capability::executable("python3")];
            for module in [
                "numpy",
                "pandas",
                "matplotlib",
                "plotly",
                "seaborn",
                "sklearn",
                "streamlit",
                "joblib",
                "scipy",
            ] {
                caps.push(Capability::python_module(module));
            }
            caps
        };

        let stages = vec![
            Stage::hard(
                "data-gen",
                CommandSpec::new("python3").arg("scripts/generate_dataset.py"),
                Duration::from_secs(300),
            ),
            Stage::hard(
                "train",
                CommandSpec::new("python3").arg("scripts/train_models.py"),
                Duration::from_secs(600),
            ),
            Stage::soft(
                "validate",
                CommandSpec::new("python3").arg("scripts/model_validation.py"),
                Duration::from_secs(180),
            ),
        ];

        let applications = vec![
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
        ];

        Self {
            root,
            work_dirs: ["data", "models", "scripts", "src", "app", "dashboard"]
                .into_iter()
                .map(String::from)
                .collect(),
            model_marker: Artifact::new("model metadata", "models/model_metadata.joblib"),
            dataset: Artifact::new("trajectory dataset", "data/trajectory_dataset.csv"),
            capabilities,
            stages,
            applications,
            launch_stagger: Duration::from_secs(2),
            log_dir,
        }
    }
}
