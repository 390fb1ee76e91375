//! Generator configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::writer::DEFAULT_CONFIG_DIR;

/// Settings for one study generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Directory receiving `ExperimentConfig_<id>.ini` files
    pub config_dir: PathBuf,
    /// Random seed for traffic orders (None for non-reproducible output)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            seed: None,
        }
    }
}
