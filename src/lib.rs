//! # gridpeak
//!
//! Tabular Q-learning on a small stochastic grid maze, with an online
//! kernel-density accumulator that turns completed trajectories into a map of
//! success-associated "concept peaks".
//!
//! ## Quick Start
//!
//! ```
//! use gridpeak::prelude::*;
//!
//! let env = Environment::new(Grid::two_rooms(), 0.1, 1).unwrap();
//! let table = ValueTable::new(QConfig::default(), 2);
//! let density = DensityAccumulator::new(DensityConfig::default()).unwrap();
//! let mut trainer =
//!     Trainer::new(env, table, density, ExplorationSchedule::default()).unwrap();
//!
//! let report = trainer.run_episode(1000);
//! if let Some(peak) = report.peak {
//!     println!("peak at {}", peak.position);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Serialization of configs and snapshots
//! - `parallel`: Evaluate kernel surfaces across rows with rayon
//!
//! ## Modules
//!
//! - [`grid`]: Maze geometry, positions, actions
//! - [`env`]: Episodic environment with action noise
//! - [`qlearning`]: Value table and exploration schedule
//! - [`density`]: Evidence surfaces and peak detection
//! - [`episode`]: One-episode driver and run statistics
//! - [`observer`]: Read-only snapshots for renderers

#[path = "core/error.rs"]
pub mod error;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/grid.rs"]
pub mod grid;

#[path = "core/env.rs"]
pub mod env;

#[path = "core/qlearning.rs"]
pub mod qlearning;

#[path = "core/density.rs"]
pub mod density;

#[path = "core/episode.rs"]
pub mod episode;

pub mod observer;

/// Prelude module for convenient imports.
///
/// ```
/// use gridpeak::prelude::*;
/// ```
pub mod prelude {
    pub use crate::density::{DensityAccumulator, DensityConfig, PeakEvent, Surface, Trajectory};
    pub use crate::env::{EnvConfig, Environment, StartRegion, StepInfo, Transition};
    pub use crate::episode::{EpisodeReport, RunStats, Trainer};
    pub use crate::error::GridError;
    pub use crate::grid::{Action, Grid, Position, HEIGHT, WIDTH};
    pub use crate::observer::{EvidenceSnapshot, PolicySnapshot, TrainerAdapter};
    pub use crate::qlearning::{ExplorationSchedule, QConfig, ValueTable};
}
