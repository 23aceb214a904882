//! Error type for the handle layer

use chime_engine::EngineError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the `try_*` factory methods
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
}
