//! Online kernel-density evidence over completed trajectories.
//!
//! Every visited cell contributes a Gaussian "non-membership" log-likelihood
//! to the whole grid. Summed over one trajectory this gives a surface `S`.
//! Trajectories that reached the goal add the complement `ln(1 - exp(S))` to
//! the success surface; the rest add `S` to the failure surface. The argmax of
//! the combined surface is reinforced in a peak-strength map, and crossing the
//! threshold emits a peak event for that cell.
//!
//! Everything is kept in log space so evidence compounds by addition and no
//! trajectory history has to be re-scanned.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tracing::{debug, warn};

use crate::error::{check_probability, GridError, Result};
use crate::grid::{Position, CELLS, HEIGHT, WIDTH};

/// `1 / sqrt(2 * pi)`
const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

pub type Trajectory = Vec<Position>;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DensityConfig {
    /// Decay/reinforcement factor: `P = lambda * (P + 1)`.
    pub lambda: f64,
    /// Peak strength at or above which an event is emitted.
    pub threshold: f64,
    /// Stand-in probability when a success trajectory leaves no complement
    /// mass at a cell (only the empty trajectory does).
    pub eps: f64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            lambda: 0.5,
            threshold: 1.0,
            eps: 1e-6,
        }
    }
}

impl DensityConfig {
    pub fn validate(&self) -> Result<()> {
        check_probability("lambda", self.lambda)?;
        check_probability("eps", self.eps)?;
        if self.eps == 0.0 {
            return Err(GridError::InvalidProbability {
                name: "eps",
                value: self.eps,
            });
        }
        if !self.threshold.is_finite() {
            return Err(GridError::InvalidProbability {
                name: "threshold",
                value: self.threshold,
            });
        }
        Ok(())
    }
}

/// Dense `HEIGHT x WIDTH` array of reals, row-major.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Surface {
    cells: Vec<f64>,
}

impl Surface {
    pub fn zeros() -> Self {
        Self {
            cells: vec![0.0; CELLS],
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row * WIDTH + col]
    }

    #[inline]
    pub fn at(&self, pos: Position) -> f64 {
        self.get(pos.row, pos.col)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.cells.chunks_exact(WIDTH)
    }

    pub fn min(&self) -> f64 {
        self.cells.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.cells.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    fn add_assign(&mut self, other: &Surface) {
        for (a, b) in self.cells.iter_mut().zip(&other.cells) {
            *a += b;
        }
    }

    fn sum(a: &Surface, b: &Surface) -> Surface {
        let mut out = a.clone();
        out.add_assign(b);
        out
    }

    /// Two-stage argmax: the best row of every column, then the best of those
    /// columns. First index wins on ties at both stages.
    pub fn argmax(&self) -> Position {
        let mut best_rows = [0usize; WIDTH];
        for (col, best) in best_rows.iter_mut().enumerate() {
            for row in 1..HEIGHT {
                if self.get(row, col) > self.get(*best, col) {
                    *best = row;
                }
            }
        }
        let mut col = 0usize;
        for c in 1..WIDTH {
            if self.get(best_rows[c], c) > self.get(best_rows[col], col) {
                col = c;
            }
        }
        Position::new(best_rows[col], col)
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::zeros()
    }
}

/// Standard normal density at distance `d` where `d2 = d * d`.
#[inline]
fn kernel(d2: f64) -> f64 {
    (-0.5 * d2).exp() * INV_SQRT_2PI
}

// ln(1 - phi) via ln_1p stays strictly negative even when phi is far below
// f64 epsilon, so distant cells keep their (tiny) evidence.
fn accumulate_row(row: usize, out: &mut [f64], trajectory: &[Position]) {
    for p in trajectory {
        let dr = p.row as f64 - row as f64;
        for (col, cell) in out.iter_mut().enumerate() {
            let dc = p.col as f64 - col as f64;
            *cell += (-kernel(dr * dr + dc * dc)).ln_1p();
        }
    }
}

/// Summed non-membership log-likelihood of `trajectory` at every cell.
///
/// An empty trajectory yields the zero surface.
pub fn kernel_surface(trajectory: &[Position]) -> Surface {
    let mut s = Surface::zeros();

    #[cfg(feature = "parallel")]
    s.cells
        .par_chunks_mut(WIDTH)
        .enumerate()
        .for_each(|(row, out)| accumulate_row(row, out, trajectory));

    #[cfg(not(feature = "parallel"))]
    for (row, out) in s.cells.chunks_mut(WIDTH).enumerate() {
        accumulate_row(row, out, trajectory);
    }

    s
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakEvent {
    pub position: Position,
    pub strength: f64,
}

#[derive(Debug, Clone)]
pub struct DensityAccumulator {
    cfg: DensityConfig,
    success: Surface,
    failure: Surface,
    peak: Surface,
    successes: Vec<Trajectory>,
    failures: Vec<Trajectory>,
}

impl DensityAccumulator {
    pub fn new(cfg: DensityConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            success: Surface::zeros(),
            failure: Surface::zeros(),
            peak: Surface::zeros(),
            successes: Vec::new(),
            failures: Vec::new(),
        })
    }

    pub fn config(&self) -> &DensityConfig {
        &self.cfg
    }

    /// Folds one completed trajectory into the evidence surfaces and
    /// reinforces the current argmax cell. Returns a peak event when that
    /// cell's strength reaches the threshold.
    pub fn update(&mut self, trajectory: Trajectory, reached_goal: bool) -> Option<PeakEvent> {
        let s = kernel_surface(&trajectory);

        if reached_goal {
            let floor = self.cfg.eps.ln();
            let mut floored = 0usize;
            for (acc, &v) in self.success.cells.iter_mut().zip(&s.cells) {
                // 1 - exp(S), exact for S near zero.
                let complement = -v.exp_m1();
                *acc += if complement > 0.0 {
                    complement.ln()
                } else {
                    floored += 1;
                    floor
                };
            }
            if floored > 0 {
                warn!(
                    floored,
                    len = trajectory.len(),
                    "success evidence floored at eps"
                );
            }
            self.successes.push(trajectory);
        } else {
            self.failure.add_assign(&s);
            self.failures.push(trajectory);
        }

        let pos = self.combined_surface().argmax();
        let i = pos.index();
        self.peak.cells[i] = self.cfg.lambda * (self.peak.cells[i] + 1.0);
        let strength = self.peak.cells[i];

        if strength >= self.cfg.threshold {
            debug!(row = pos.row, col = pos.col, strength, "concept peak");
            Some(PeakEvent {
                position: pos,
                strength,
            })
        } else {
            None
        }
    }

    pub fn success_surface(&self) -> &Surface {
        &self.success
    }

    pub fn failure_surface(&self) -> &Surface {
        &self.failure
    }

    /// `E_success + E_failure`.
    pub fn combined_surface(&self) -> Surface {
        Surface::sum(&self.success, &self.failure)
    }

    pub fn peak_strength(&self) -> &Surface {
        &self.peak
    }

    pub fn successes(&self) -> &[Trajectory] {
        &self.successes
    }

    pub fn failures(&self) -> &[Trajectory] {
        &self.failures
    }

    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}
