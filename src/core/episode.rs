//! Episode loop glue: environment -> learner -> density accumulator.

use tracing::trace;

use crate::density::{DensityAccumulator, DensityConfig, PeakEvent, Trajectory};
use crate::env::{EnvConfig, Environment};
use crate::error::Result;
use crate::grid::Grid;
use crate::qlearning::{ExplorationSchedule, QConfig, ValueTable};

const RECENT_WINDOW: usize = 200;

/// Outcome counters across a run.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub episodes: u32,
    pub successes: u32,
    pub failures: u32,
    pub peaks: u32,
    pub recent: Vec<bool>,
    success_steps: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            episodes: 0,
            successes: 0,
            failures: 0,
            peaks: 0,
            recent: Vec::with_capacity(RECENT_WINDOW),
            success_steps: 0,
        }
    }

    pub fn record(&mut self, report: &EpisodeReport) {
        self.episodes += 1;
        if report.reached_goal {
            self.successes += 1;
            self.success_steps += report.steps as u64;
        } else {
            self.failures += 1;
        }
        if report.peak.is_some() {
            self.peaks += 1;
        }

        self.recent.push(report.reached_goal);
        if self.recent.len() > RECENT_WINDOW {
            self.recent.remove(0);
        }
    }

    pub fn success_rate(&self) -> f32 {
        if self.episodes == 0 {
            0.0
        } else {
            self.successes as f32 / self.episodes as f32
        }
    }

    pub fn last_100_rate(&self) -> f32 {
        if self.recent.is_empty() {
            return 0.0;
        }
        let start = self.recent.len().saturating_sub(100);
        let slice = &self.recent[start..];
        slice.iter().filter(|&&x| x).count() as f32 / slice.len() as f32
    }

    /// Mean episode length among episodes that reached the goal.
    pub fn mean_success_steps(&self) -> Option<f64> {
        if self.successes == 0 {
            None
        } else {
            Some(self.success_steps as f64 / self.successes as f64)
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    pub episode: u32,
    pub steps: usize,
    pub reached_goal: bool,
    /// Exploration rate used during this episode.
    pub epsilon: f64,
    pub peak: Option<PeakEvent>,
}

/// Owns every piece of per-run state and drives one episode at a time.
#[derive(Debug, Clone)]
pub struct Trainer {
    env: Environment,
    table: ValueTable,
    density: DensityAccumulator,
    schedule: ExplorationSchedule,
    stats: RunStats,
}

impl Trainer {
    pub fn new(
        env: Environment,
        table: ValueTable,
        density: DensityAccumulator,
        schedule: ExplorationSchedule,
    ) -> Result<Self> {
        schedule.validate()?;
        Ok(Self {
            env,
            table,
            density,
            schedule,
            stats: RunStats::new(),
        })
    }

    pub fn from_configs(
        grid: Grid,
        env: &EnvConfig,
        agent: QConfig,
        agent_seed: u64,
        schedule: ExplorationSchedule,
        density: DensityConfig,
    ) -> Result<Self> {
        Self::new(
            Environment::from_config(grid, env)?,
            ValueTable::new(agent, agent_seed),
            DensityAccumulator::new(density)?,
            schedule,
        )
    }

    /// Runs one episode of at most `max_steps` transitions, feeds the
    /// trajectory to the density accumulator and anneals exploration.
    ///
    /// An episode that exhausts the budget is simply abandoned with
    /// `reached_goal = false`.
    pub fn run_episode(&mut self, max_steps: usize) -> EpisodeReport {
        let epsilon = self.schedule.epsilon();
        let mut trajectory: Trajectory = Vec::with_capacity(max_steps.min(1024));
        let mut position = self.env.reset();
        let mut done = false;

        for _ in 0..max_steps {
            trajectory.push(position);
            let action = self.table.select_action(position, epsilon);
            let t = self.env.step(action);
            self.table.update(position, action, t.position, t.reward);
            position = t.position;
            if t.done {
                done = true;
                break;
            }
        }

        self.schedule.decay();
        let steps = trajectory.len();
        let peak = self.density.update(trajectory, done);

        let report = EpisodeReport {
            episode: self.stats.episodes,
            steps,
            reached_goal: done,
            epsilon,
            peak,
        };
        trace!(episode = report.episode, steps, done, "episode finished");
        self.stats.record(&report);
        report
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn density(&self) -> &DensityAccumulator {
        &self.density
    }

    pub fn schedule(&self) -> &ExplorationSchedule {
        &self.schedule
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }
}
