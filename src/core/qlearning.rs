//! Tabular action-value learner with an annealed exploration rate.
//!
//! The state space is small (`HEIGHT x WIDTH x 4`), so the table is a dense
//! array and updates are exact one-step bootstrapped corrections.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{check_probability, Result};
use crate::grid::{Action, Position, CELLS, HEIGHT, WIDTH};
use crate::prng::Prng;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QConfig {
    pub learning_rate: f64,
    pub discount: f64,
}

impl Default for QConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            discount: 0.9,
        }
    }
}

/// Linear per-episode annealing of the exploration rate.
///
/// `epsilon` is the probability of a uniformly random action. It starts high
/// and is lowered by `decay` after each episode, never below `floor`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExplorationSchedule {
    pub epsilon: f64,
    pub floor: f64,
    pub decay: f64,
}

impl Default for ExplorationSchedule {
    fn default() -> Self {
        Self {
            epsilon: 0.9,
            floor: 0.1,
            decay: 0.001,
        }
    }
}

impl ExplorationSchedule {
    pub fn validate(&self) -> Result<()> {
        check_probability("epsilon", self.epsilon)?;
        check_probability("epsilon floor", self.floor)?;
        Ok(())
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Advances one episode and returns the new rate.
    pub fn decay(&mut self) -> f64 {
        self.epsilon = (self.epsilon - self.decay).max(self.floor);
        self.epsilon
    }
}

#[derive(Debug, Clone)]
pub struct ValueTable {
    cfg: QConfig,
    q: Vec<f64>,
    rng: Prng,
}

impl ValueTable {
    pub fn new(cfg: QConfig, seed: u64) -> Self {
        Self {
            cfg,
            q: vec![0.0; CELLS * Action::COUNT],
            rng: Prng::new(seed),
        }
    }

    pub fn config(&self) -> &QConfig {
        &self.cfg
    }

    #[inline]
    fn offset(pos: Position) -> usize {
        debug_assert!(pos.in_bounds(), "position {pos} outside the grid");
        pos.index() * Action::COUNT
    }

    #[inline]
    fn row(&self, pos: Position) -> &[f64] {
        let o = Self::offset(pos);
        &self.q[o..o + Action::COUNT]
    }

    /// Returns a uniformly random action with probability `epsilon`,
    /// otherwise the greedy action.
    pub fn select_action(&mut self, pos: Position, epsilon: f64) -> Action {
        if self.rng.gen_bool(epsilon) {
            Action::ALL[self.rng.gen_range_usize(0, Action::COUNT)]
        } else {
            self.best_action(pos)
        }
    }

    /// Greedy action at `pos`. Ties go to the lowest action index.
    pub fn best_action(&self, pos: Position) -> Action {
        let row = self.row(pos);
        let mut best = 0usize;
        for (i, &v) in row.iter().enumerate().skip(1) {
            if v > row[best] {
                best = i;
            }
        }
        Action::ALL[best]
    }

    pub fn max_value(&self, pos: Position) -> f64 {
        self.row(pos).iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn value(&self, pos: Position, action: Action) -> f64 {
        self.q[Self::offset(pos) + action.index()]
    }

    pub fn values(&self, pos: Position) -> [f64; Action::COUNT] {
        let row = self.row(pos);
        [row[0], row[1], row[2], row[3]]
    }

    /// One-step off-policy correction of `Q[pos, action]` toward
    /// `reward + discount * max_a Q[next, a]`.
    pub fn update(&mut self, pos: Position, action: Action, next: Position, reward: f64) {
        let target = reward + self.cfg.discount * self.max_value(next);
        let i = Self::offset(pos) + action.index();
        self.q[i] += self.cfg.learning_rate * (target - self.q[i]);
    }

    /// Greedy action for every cell, row-major.
    pub fn best_actions(&self) -> [[Action; WIDTH]; HEIGHT] {
        let mut out = [[Action::Left; WIDTH]; HEIGHT];
        for (row, cells) in out.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                *cell = self.best_action(Position::new(row, col));
            }
        }
        out
    }

    /// Mean absolute action value over the whole table.
    pub fn mean_abs(&self) -> f64 {
        self.q.iter().map(|v| v.abs()).sum::<f64>() / self.q.len() as f64
    }
}
