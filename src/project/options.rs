use super::definition::ProjectKind;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;

/// Per-build configuration.
///
/// Everything here is optional; `BuildOptions::default()` builds the project as authored.
/// Options can be loaded from a JSON file:
///
/// ```json
/// { "kind": "firmware-with-flow", "assetBundle": true, "breakpoints": ["log1"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildOptions {
    /// Overrides `ProjectDefinition::kind`.
    pub kind: Option<ProjectKind>,
    /// Building a pure asset bundle: native global variables are left out of the blob.
    pub asset_bundle: bool,
    /// Ids of components whose breakpoint flag is set.
    pub breakpoints: Vec<String>,
}

impl BuildOptions {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn with_kind(mut self, kind: ProjectKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_asset_bundle(mut self, asset_bundle: bool) -> Self {
        self.asset_bundle = asset_bundle;
        self
    }

    pub fn with_breakpoint(mut self, component_id: &str) -> Self {
        self.breakpoints.push(component_id.to_string());
        self
    }

    pub fn is_breakpoint(&self, component_id: &str) -> bool {
        self.breakpoints.iter().any(|id| id == component_id)
    }
}
