//! Error types raised by the loader.
//!
//! Almost everything in this crate fails soft: bad documents, missing
//! assets, and duplicate keys are logged and skipped so one package cannot
//! stop the rest from loading. The variants here are the hard failures —
//! protocol misuse that callers must handle.

use thiserror::Error;

use crate::phase::LoadPhase;

/// Hard failures surfaced by the loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("phase transition to {requested} attempted while a {current} broadcast is in progress")]
    ReentrantPhase {
        current: LoadPhase,
        requested: LoadPhase,
    },

    #[error("phase transition to {requested} would go backward (current: {current:?})")]
    PhaseOrder {
        current: Option<LoadPhase>,
        requested: LoadPhase,
    },

    #[error("package not found: {0}")]
    PackageNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LoaderError>;
