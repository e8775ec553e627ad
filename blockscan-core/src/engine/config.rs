// Analysis configuration
use crate::engine::error::AnalysisError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Feature switches for the abstract interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterOptions {
    /// Fold loads from registered read-only regions into constants
    pub load_from_ro_regions: bool,
    /// Record data references
    pub collect_data_refs: bool,
    /// Record constant values of temporaries
    pub const_prop: bool,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            load_from_ro_regions: true,
            collect_data_refs: true,
            const_prop: true,
        }
    }
}

/// Which passes `BlockAnalyzer` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassSelection {
    pub remove_noops: bool,
    pub exits_and_instructions: bool,
    pub default_exit: bool,
    pub noop_block: bool,
    pub interpreter: bool,
}

impl Default for PassSelection {
    fn default() -> Self {
        Self {
            remove_noops: true,
            exits_and_instructions: true,
            default_exit: true,
            noop_block: true,
            interpreter: true,
        }
    }
}

/// Capacities and switches for an analysis session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub max_exits: usize,
    pub max_inst_addrs: usize,
    pub max_data_refs: usize,
    pub max_const_vals: usize,
    pub max_regions: usize,
    pub max_initial_registers: usize,
    pub interpreter: InterpreterOptions,
    pub passes: PassSelection,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_exits: 400,
            max_inst_addrs: 200,
            max_data_refs: 2000,
            max_const_vals: 1000,
            max_regions: crate::runtime::regions::MAX_REGION_COUNT,
            max_initial_registers: crate::runtime::context::MAX_INITIAL_REGISTERS,
            interpreter: InterpreterOptions::default(),
            passes: PassSelection::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration file, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            let config: AnalysisConfig =
                serde_json::from_str(&content).context("Failed to parse config file")?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Reject capacities that would make every result empty.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let capacities: [(&str, usize); 6] = [
            ("max_exits", self.max_exits),
            ("max_inst_addrs", self.max_inst_addrs),
            ("max_data_refs", self.max_data_refs),
            ("max_const_vals", self.max_const_vals),
            ("max_regions", self.max_regions),
            ("max_initial_registers", self.max_initial_registers),
        ];
        for (name, value) in capacities {
            if value == 0usize {
                return Err(AnalysisError::invalid_config(format!("{} must be non-zero", name)));
            }
        }
        Ok(())
    }
}
