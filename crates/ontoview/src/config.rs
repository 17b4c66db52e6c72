//! Session configuration loaded from JSON

use anyhow::{Context, Result};
use ontoview_hierarchy::HierarchyConfig;
use ontoview_index::{FinderConfig, IndexConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Flush the oracle after every applied change batch
    pub auto_classify: bool,
    /// Logical axiom limit for the structural reasoner
    pub max_axioms: Option<usize>,
}

/// Everything an [`EditorSession`](crate::EditorSession) is configured with.
///
/// Every section is optional in JSON; missing sections take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub index: IndexConfig,
    pub finder: FinderConfig,
    pub hierarchy: HierarchyConfig,
    pub reasoner: ReasonerConfig,
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid session configuration")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session configuration {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("Failed to load {}", path.display()))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize session configuration")
    }
}
