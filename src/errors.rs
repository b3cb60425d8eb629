use nalgebra::DMatrix;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RandSvdError {
    #[error("Matrix must have positive dimensions, found {rows} rows and {cols} columns")]
    InvalidShape { rows: usize, cols: usize },

    #[error("Target rank must satisfy 1 <= rank <= {max}, found {rank}")]
    InvalidRank { rank: usize, max: usize },

    #[error("Matrix contains a non-finite entry at ({row}, {col})")]
    NonFiniteInput { row: usize, col: usize },

    #[error("Aspect ratio must lie in (0, 1], found {0}")]
    InvalidAspectRatio(f64),

    #[error("Invalid noise level: {0}")]
    InvalidNoiseLevel(String),

    #[error("{0}")]
    InvalidDimensions(String),

    #[error("Decomposition failed: {0}")]
    Decomposition(String),
}

pub type Result<T> = std::result::Result<T, RandSvdError>;

/// Fails with `InvalidShape` when either dimension is zero.
pub fn check_shape(rows: usize, cols: usize) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(RandSvdError::InvalidShape { rows, cols });
    }
    Ok(())
}

/// Fails with `NonFiniteInput` at the first NaN or infinite entry, in column-major order.
pub fn check_finite(a: &DMatrix<f64>) -> Result<()> {
    match a.iter().position(|x| !x.is_finite()) {
        Some(idx) => Err(RandSvdError::NonFiniteInput { row: idx % a.nrows(), col: idx / a.nrows() }),
        None => Ok(()),
    }
}
