//! Canonical output artifacts and the existence probe that gates skipping.

use std::path::{Path, PathBuf};

/// A filesystem artifact written by an external stage. The orchestrator
/// never reads its content, only whether it exists.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Pure existence checks against a project root. No content validation.
pub struct ArtifactProbe {
    root: PathBuf,
}

impl ArtifactProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, artifact: &Artifact) -> PathBuf {
        if artifact.path.is_absolute() {
            artifact.path.clone()
        } else {
            self.root.join(&artifact.path)
        }
    }

    pub fn exists(&self, artifact: &Artifact) -> bool {
        self.resolve(artifact).exists()
    }

    /// `true` only when every artifact is present. The skip gate requires
    /// all of them; there is no partial-skip mode.
    pub fn all_present(&self, artifacts: &[&Artifact]) -> bool {
        artifacts.iter().all(|a| self.exists(a))
    }
}
