use std::path::PathBuf;

use gridpeak::error::GridError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("{0}")]
    Usage(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write summary: {0}")]
    Summary(#[source] serde_json::Error),

    #[error(transparent)]
    Grid(#[from] GridError),
}
