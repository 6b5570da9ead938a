use crate::density::{DensityAccumulator, Surface};
use crate::episode::Trainer;
use crate::grid::{Action, Grid, Position, HEIGHT, WIDTH};
use crate::qlearning::ValueTable;

#[cfg(feature = "serde")]
use serde::Serialize;

/// A read-only snapshot of the greedy policy.
///
/// Design intent:
/// - Observers cannot mutate or steer the learner.
/// - Snapshotting is *on-demand* and copies; the episode loop stays unchanged.
/// - Wall cells carry `None` so renderers do not need the grid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PolicySnapshot {
    pub goal: Position,
    pub actions: Vec<Vec<Option<Action>>>,
}

impl PolicySnapshot {
    pub fn capture(grid: &Grid, table: &ValueTable) -> Self {
        let best = table.best_actions();
        let actions = (0..HEIGHT)
            .map(|row| {
                (0..WIDTH)
                    .map(|col| {
                        let p = Position::new(row, col);
                        grid.is_open(p).then_some(best[row][col])
                    })
                    .collect()
            })
            .collect();
        Self {
            goal: grid.goal(),
            actions,
        }
    }

    pub fn action_at(&self, pos: Position) -> Option<Action> {
        self.actions.get(pos.row)?.get(pos.col).copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EvidenceSnapshot {
    pub combined: Surface,
    pub peak_strength: Surface,
    pub argmax: Position,
    pub successes: usize,
    pub failures: usize,
}

impl EvidenceSnapshot {
    pub fn capture(density: &DensityAccumulator) -> Self {
        let combined = density.combined_surface();
        let argmax = combined.argmax();
        Self {
            combined,
            peak_strength: density.peak_strength().clone(),
            argmax,
            successes: density.success_count(),
            failures: density.failure_count(),
        }
    }
}

pub struct TrainerAdapter<'a> {
    trainer: &'a Trainer,
}

impl<'a> TrainerAdapter<'a> {
    pub fn new(trainer: &'a Trainer) -> Self {
        Self { trainer }
    }

    pub fn policy(&self) -> PolicySnapshot {
        PolicySnapshot::capture(self.trainer.env().grid(), self.trainer.table())
    }

    pub fn evidence(&self) -> EvidenceSnapshot {
        EvidenceSnapshot::capture(self.trainer.density())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::DensityConfig;
    use crate::env::EnvConfig;
    use crate::qlearning::{ExplorationSchedule, QConfig};

    fn trained() -> Trainer {
        let mut t = Trainer::from_configs(
            Grid::two_rooms(),
            &EnvConfig::default(),
            QConfig::default(),
            3,
            ExplorationSchedule::default(),
            DensityConfig::default(),
        )
        .unwrap();
        for _ in 0..30 {
            t.run_episode(300);
        }
        t
    }

    #[test]
    fn policy_snapshot_blanks_walls() {
        let t = trained();
        let snap = TrainerAdapter::new(&t).policy();
        assert_eq!(snap.actions.len(), HEIGHT);
        assert!(snap.actions.iter().all(|r| r.len() == WIDTH));
        assert_eq!(snap.action_at(Position::new(0, 0)), None);
        assert_eq!(snap.action_at(Position::new(2, 6)), None);
        let open = Position::new(3, 6);
        assert_eq!(snap.action_at(open), Some(t.table().best_action(open)));
        assert_eq!(snap.goal, Position::new(5, 11));
    }

    #[test]
    fn evidence_snapshot_matches_accumulator() {
        let t = trained();
        let snap = TrainerAdapter::new(&t).evidence();
        assert_eq!(snap.combined, t.density().combined_surface());
        assert_eq!(snap.argmax, snap.combined.argmax());
        assert_eq!(snap.successes + snap.failures, 30);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn snapshots_serialize() {
        let t = trained();
        let adapter = TrainerAdapter::new(&t);
        let json = serde_json::to_value(adapter.policy()).unwrap();
        assert_eq!(json["actions"][0][0], serde_json::Value::Null);
        assert_eq!(json["goal"]["row"], 5);
        let json = serde_json::to_value(adapter.evidence()).unwrap();
        assert_eq!(
            json["combined"]["cells"].as_array().map(|a| a.len()),
            Some(HEIGHT * WIDTH)
        );
    }
}
