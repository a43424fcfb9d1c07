//! Error types shared by the Steklov crates.

use thiserror::Error;

use crate::block::BlockId;

/// Errors raised while assembling, transferring or solving sub-physics systems.
#[derive(Debug, Error)]
pub enum Error {
    /// A sub-system factorization or solve produced no usable solution.
    #[error("singular {block} system")]
    SingularMatrix { block: BlockId },

    /// Vector or matrix dimensions do not line up.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A solve was requested before the block was factorized.
    #[error("no factorization available for the {0} block")]
    FactorizationMissing(BlockId),

    /// The requested combination of options is not implemented.
    #[error("not implemented: {0}")]
    Unsupported(String),

    /// A parameter is out of range or inconsistent with another one.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The parameter file could not be parsed.
    #[error("failed to parse parameters: {0}")]
    Parse(#[from] serde_json::Error),

    /// The parameter file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The coupling loop of a timestep ran out of iterations.
    #[error("interface coupling did not converge in timestep {timestep} (jump {jump:.3e})")]
    CouplingNotConverged { timestep: usize, jump: f64 },
}

/// Result type for Steklov operations.
pub type Result<T> = std::result::Result<T, Error>;
