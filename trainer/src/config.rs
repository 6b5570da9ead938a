//! Training run configuration.
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change. Lookup order: `--config <path>`, then `config.json` in the data
//! directory, then built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use gridpeak::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::TrainError;
use crate::paths::AppPaths;

/// Custom maze: one string per row, `#` for walls and `.` for open cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub rows: Vec<String>,
    pub goal: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub episodes: u32,
    pub max_steps: usize,
    /// Emit a progress line every N episodes (0 disables).
    pub log_every: u32,
    pub agent_seed: u64,
    pub env: EnvConfig,
    pub agent: QConfig,
    pub exploration: ExplorationSchedule,
    pub density: DensityConfig,
    pub layout: Option<LayoutConfig>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            episodes: 10_000,
            max_steps: 1_000,
            log_every: 100,
            agent_seed: 2,
            env: EnvConfig::default(),
            agent: QConfig::default(),
            exploration: ExplorationSchedule::default(),
            density: DensityConfig::default(),
            layout: None,
        }
    }
}

impl TrainConfig {
    pub fn load(path: &Path) -> Result<Self, TrainError> {
        let text = fs::read_to_string(path).map_err(|source| TrainError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| TrainError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Explicit path wins; otherwise the data-dir config if it exists.
    pub fn resolve(explicit: Option<&Path>, paths: Option<&AppPaths>) -> Result<Self, TrainError> {
        let candidate: Option<PathBuf> = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => paths.map(AppPaths::config_file).filter(|p| p.is_file()),
        };
        match candidate {
            Some(path) => {
                info!("Loading config {:?}", path);
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn grid(&self) -> Result<Grid, TrainError> {
        match &self.layout {
            Some(layout) => Ok(Grid::from_layout(&layout.rows.join("\n"), layout.goal)?),
            None => Ok(Grid::two_rooms()),
        }
    }

    pub fn build_trainer(&self) -> Result<Trainer, TrainError> {
        Ok(Trainer::from_configs(
            self.grid()?,
            &self.env,
            self.agent,
            self.agent_seed,
            self.exploration,
            self.density,
        )?)
    }
}
