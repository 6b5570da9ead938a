use thiserror::Error;

/// Errors raised by the grid world, learner and density accumulator.
///
/// All of these indicate a caller or configuration bug; none are retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("position ({row}, {col}) is not an open interior cell")]
    InvalidPosition { row: usize, col: usize },
}

pub type Result<T> = core::result::Result<T, GridError>;

pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(GridError::InvalidProbability { name, value })
    }
}
