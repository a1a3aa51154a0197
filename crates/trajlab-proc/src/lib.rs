//! Process execution boundary for trajlab.
//!
//! Everything the pipeline does to the outside world goes through the
//! [`ProcessRunner`] trait: timeout-bounded stage runs, detached application
//! launches, and PATH lookups for capability checks. [`LocalProcessRunner`]
//! is the real implementation; [`ScriptedRunner`] is the test double.

pub mod local;
pub mod runner;
pub mod scripted;

pub use local::LocalProcessRunner;
pub use runner::{CommandSpec, LaunchHandle, ProcessRunner};
pub use scripted::{RecordedCall, ScriptedRunner};
