use std::path::Path;

use serde::{Deserialize, Serialize};

/// Switches read by the resolution passes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Resolve the statements and expressions inside executable bodies
    #[serde(default = "enabled")]
    pub analyze_function_bodies: bool,
    /// Record flow-narrowed types and elements next to the static ones
    #[serde(default = "enabled")]
    pub enable_type_propagation: bool,
    /// Report member lookups that fail on a non-dynamic target
    #[serde(default = "enabled")]
    pub report_undefined_members: bool,
}

const fn enabled() -> bool {
    true
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            analyze_function_bodies: true,
            enable_type_propagation: true,
            report_undefined_members: true,
        }
    }
}

impl AnalysisOptions {
    /// Load options from a TOML file
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_file_content(&content)
    }

    pub fn from_file_content(content: &str) -> anyhow::Result<Self> {
        let options: Self = toml::from_str(content).map_err(|e| {
            tracing::error!("Failed to parse analysis options: {}", e);
            e
        })?;
        Ok(options)
    }
}
