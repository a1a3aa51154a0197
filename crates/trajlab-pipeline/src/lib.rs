//! Staged pipeline orchestrator for the trajectory prediction toolkit.
//!
//! This crate implements the core trajlab run: capability checking,
//! workspace setup, the artifact-gated skip decision, sequential execution
//! of the three processing stages with hard/soft failure policy, and the
//! detached application launch fan-out.

pub mod artifact;
pub mod capability;
pub mod config;
pub mod launcher;
pub mod menu;
pub mod orchestrator;
pub mod prompt;
pub mod stage;

pub use artifact::{Artifact, ArtifactProbe};
pub use capability::{Capability, CapabilityChecker, CapabilityProbe};
pub use config::PipelineConfig;
pub use launcher::{AppLauncher, LaunchOutcome};
pub use menu::{Application, ApplicationId, LaunchMenu, LaunchMode, MenuSelection};
pub use orchestrator::{
    Phase, PipelineOrchestrator, PipelineOutcome, PipelineReport, StageRecord,
};
pub use prompt::{ConsolePrompter, Prompter, Question, ScriptedPrompter};
pub use stage::{FailurePolicy, Stage, StageRunner};
