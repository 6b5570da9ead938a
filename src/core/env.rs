//! Episodic wrapper around [`Grid`] with stochastic actuation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{check_probability, GridError, Result};
use crate::grid::{Action, Grid, Position};
use crate::prng::Prng;

/// Inclusive rectangle of start cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StartRegion {
    pub rows: (usize, usize),
    pub cols: (usize, usize),
}

impl StartRegion {
    /// The left room of the two-room maze.
    pub const LEFT_ROOM: StartRegion = StartRegion {
        rows: (1, 5),
        cols: (1, 5),
    };

    fn cells(self) -> impl Iterator<Item = Position> {
        let (c0, c1) = self.cols;
        (self.rows.0..=self.rows.1)
            .flat_map(move |row| (c0..=c1).map(move |col| Position::new(row, col)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnvConfig {
    /// Probability that the requested action is replaced by a uniform draw.
    pub p_failure: f64,
    pub seed: u64,
    /// Restricts episode starts; `None` means every open non-goal cell.
    pub start_region: Option<StartRegion>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            p_failure: 0.1,
            seed: 1,
            start_region: None,
        }
    }
}

/// Reserved for per-step diagnostics; carries nothing today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepInfo;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub position: Position,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

#[derive(Debug, Clone)]
pub struct Environment {
    grid: Grid,
    p_failure: f64,
    rng: Prng,
    starts: Vec<Position>,
    position: Position,
    last_executed: Option<Action>,
}

impl Environment {
    pub fn new(grid: Grid, p_failure: f64, seed: u64) -> Result<Self> {
        let p_failure = check_probability("p_failure", p_failure)?;
        let goal = grid.goal();
        let starts: Vec<Position> = grid.open_cells().filter(|&p| p != goal).collect();
        if starts.is_empty() {
            return Err(GridError::InvalidGrid(
                "no open cell besides the goal to start from".to_string(),
            ));
        }
        let position = starts[0];
        Ok(Self {
            grid,
            p_failure,
            rng: Prng::new(seed),
            starts,
            position,
            last_executed: None,
        })
    }

    pub fn from_config(grid: Grid, cfg: &EnvConfig) -> Result<Self> {
        let env = Self::new(grid, cfg.p_failure, cfg.seed)?;
        match cfg.start_region {
            Some(region) => env.with_start_region(region),
            None => Ok(env),
        }
    }

    /// Restricts the start distribution to `region`. Every cell in it must be
    /// open and none may be the goal.
    pub fn with_start_region(mut self, region: StartRegion) -> Result<Self> {
        let mut starts = Vec::new();
        for p in region.cells() {
            if self.grid.is_wall(p) || p == self.grid.goal() {
                return Err(GridError::InvalidPosition {
                    row: p.row,
                    col: p.col,
                });
            }
            starts.push(p);
        }
        if starts.is_empty() {
            return Err(GridError::InvalidGrid("empty start region".to_string()));
        }
        self.position = starts[0];
        self.starts = starts;
        Ok(self)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn p_failure(&self) -> f64 {
        self.p_failure
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// The action actually resolved by the last `step`, after noise.
    pub fn last_executed_action(&self) -> Option<Action> {
        self.last_executed
    }

    /// Starts a new episode from a uniformly drawn start cell.
    pub fn reset(&mut self) -> Position {
        let i = self.rng.gen_range_usize(0, self.starts.len());
        self.position = self.starts[i];
        self.last_executed = None;
        self.position
    }

    pub fn step(&mut self, action: Action) -> Transition {
        let executed = if self.rng.gen_bool(self.p_failure) {
            Action::ALL[self.rng.gen_range_usize(0, Action::COUNT)]
        } else {
            action
        };
        self.last_executed = Some(executed);
        self.position = self.grid.attempt_move(self.position, executed);

        let done = self.position == self.grid.goal();
        Transition {
            position: self.position,
            reward: if done { 1.0 } else { 0.0 },
            done,
            info: StepInfo,
        }
    }

    /// Index-based entry point for callers holding raw action indices.
    pub fn step_index(&mut self, action: usize) -> Result<Transition> {
        Ok(self.step(Action::from_index(action)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(p_failure: f64, seed: u64) -> Environment {
        Environment::new(Grid::two_rooms(), p_failure, seed).unwrap()
    }

    #[test]
    fn rejects_bad_failure_probability() {
        assert!(matches!(
            Environment::new(Grid::two_rooms(), 1.2, 1),
            Err(GridError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn reset_draws_open_non_goal_cells_and_covers_them() {
        let mut e = env(0.1, 5);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..5_000 {
            let p = e.reset();
            assert!(e.grid().is_open(p));
            assert_ne!(p, e.grid().goal());
            assert_eq!(e.position(), p);
            seen.insert(p);
        }
        assert_eq!(seen.len(), 50);
    }

    #[test]
    fn start_region_restricts_resets() {
        let mut e = env(0.1, 5).with_start_region(StartRegion::LEFT_ROOM).unwrap();
        for _ in 0..1_000 {
            let p = e.reset();
            assert!((1..=5).contains(&p.row) && (1..=5).contains(&p.col));
        }

        let bad = StartRegion {
            rows: (1, 2),
            cols: (5, 6),
        };
        assert_eq!(
            env(0.1, 5).with_start_region(bad).unwrap_err(),
            GridError::InvalidPosition { row: 1, col: 6 }
        );
    }

    #[test]
    fn noiseless_steps_are_deterministic() {
        let mut a = env(0.0, 1);
        let mut b = env(0.0, 999);
        let start = a.reset();
        while b.reset() != start {}

        for action in [Action::Right, Action::Right, Action::Down, Action::Left, Action::Up] {
            let ta = a.step(action);
            let tb = b.step(action);
            assert_eq!(ta, tb);
            assert_eq!(a.last_executed_action(), Some(action));
        }
    }

    #[test]
    fn reaching_the_goal_pays_one_and_terminates() {
        let mut e = env(0.0, 3);
        e.position = Position::new(5, 10);
        let t = e.step(Action::Right);
        assert_eq!(t.position, Position::new(5, 11));
        assert_eq!(t.reward, 1.0);
        assert!(t.done);

        e.position = Position::new(4, 10);
        let t = e.step(Action::Left);
        assert_eq!(t.reward, 0.0);
        assert!(!t.done);
    }

    #[test]
    fn full_noise_executes_uniform_actions() {
        let trials = 40_000;
        for requested in Action::ALL {
            let mut e = env(1.0, 17);
            let mut counts = [0usize; Action::COUNT];
            for _ in 0..trials {
                e.reset();
                e.step(requested);
                counts[e.last_executed_action().unwrap().index()] += 1;
            }
            for (i, c) in counts.iter().enumerate() {
                let freq = *c as f64 / trials as f64;
                assert!(
                    (freq - 0.25).abs() < 0.02,
                    "requested {requested:?}, executed {:?}: frequency {freq}",
                    Action::ALL[i]
                );
            }
            // The requested action only survives by coincidence.
            let kept = counts[requested.index()] as f64 / trials as f64;
            assert!((kept - 0.25).abs() < 0.02);
        }
    }

    #[test]
    fn step_index_rejects_unknown_actions() {
        let mut e = env(0.0, 1);
        e.reset();
        assert!(matches!(
            e.step_index(7),
            Err(GridError::InvalidAction(_))
        ));
        assert!(e.step_index(3).is_ok());
    }
}
