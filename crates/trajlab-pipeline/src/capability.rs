//! Runtime capability checks.
//!
//! Later stages depend on an interpreter and a set of Python packages being
//! installed. The checker probes every required capability and reports the
//! complete missing set in one pass, so the operator sees the whole
//! remediation list at once instead of fixing one dependency per run.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use trajlab_proc::{CommandSpec, ProcessRunner};

/// Module import probes are expected to return almost instantly; the bound
/// only guards against a wedged interpreter.
const MODULE_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// How a capability's availability is established.
#[derive(Debug, Clone)]
pub enum CapabilityProbe {
    /// The named program resolves on PATH.
    Executable(String),
    /// `python3 -c "import <module>"` exits cleanly.
    PythonModule(String),
}

/// A named runtime dependency required before any stage runs.
#[derive(Debug, Clone)]
pub struct Capability {
    pub name: String,
    pub probe: CapabilityProbe,
}

impl Capability {
    pub fn executable(program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            name: program.clone(),
            probe: CapabilityProbe::Executable(program),
        }
    }

    pub fn python_module(module: impl Into<String>) -> Self {
        let module = module.into();
        Self {
            name: module.clone(),
            probe: CapabilityProbe::PythonModule(module),
        }
    }
}

/// Probes capabilities through the process boundary. No side effects.
pub struct CapabilityChecker {
    runner: Arc<dyn ProcessRunner>,
}

impl CapabilityChecker {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Returns the names of every capability in `required` that is not
    /// available. An empty vector means all preconditions hold.
    pub async fn missing(&self, required: &[Capability]) -> Vec<String> {
        let mut missing = Vec::new();
        for capability in required {
            if !self.available(capability).await {
                missing.push(capability.name.clone());
            }
        }
        missing
    }

    async fn available(&self, capability: &Capability) -> bool {
        match &capability.probe {
            CapabilityProbe::Executable(program) => {
                let found = self.runner.locate(program).is_some();
                debug!(capability = %capability.name, found, "executable probe");
                found
            }
            CapabilityProbe::PythonModule(module) => {
                let spec = CommandSpec::new("python3")
                    .arg("-c")
                    .arg(format!("import {}", module));
                match self.runner.run(&spec, MODULE_PROBE_TIMEOUT).await {
                    Ok(result) => {
                        debug!(capability = %capability.name, ok = result.is_success(), "module probe");
                        result.is_success()
                    }
                    Err(err) => {
                        debug!(capability = %capability.name, error = %err, "module probe errored");
                        false
                    }
                }
            }
        }
    }
}
