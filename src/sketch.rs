use nalgebra::DMatrix;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};
use crate::errors::{check_shape, RandSvdError, Result};

/// Entry distribution of a random test matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionType {
    Gaussian,
    Uniform,
    Rademacher,
}

pub enum MatrixAttribute {
    Row,
    Column,
}

/// Draws a Haar-distributed matrix with orthonormal rows or columns.
///
/// The sign of each column of Q is fixed by the diagonal of R so the result is
/// uniformly distributed rather than biased by the QR convention.
pub fn haar_sample<R: Rng + ?Sized>(
    rows: usize,
    columns: usize,
    attr: MatrixAttribute,
    rng: &mut R,
) -> Result<DMatrix<f64>> {
    check_shape(rows, columns)?;
    // An orthonormal matrix cannot have more vectors than their length
    let (m, n) = match attr {
        MatrixAttribute::Row => {
            if rows > columns {
                return Err(RandSvdError::InvalidDimensions(format!(
                    "Cannot have more rows ({}) than columns ({}) for row-orthonormal matrix",
                    rows, columns
                )));
            }
            (columns, rows)
        }
        MatrixAttribute::Column => {
            if columns > rows {
                return Err(RandSvdError::InvalidDimensions(format!(
                    "Cannot have more columns ({}) than rows ({}) for column-orthonormal matrix",
                    columns, rows
                )));
            }
            (rows, columns)
        }
    };

    let matrix: DMatrix<f64> = DMatrix::from_fn(m, n, |_i, _j| StandardNormal.sample(&mut *rng));
    let (mut q, r) = matrix.qr().unpack();
    for i in 0..q.ncols() {
        let sign = if r[(i, i)] < 0.0 { -1.0 } else { 1.0 };
        q.column_mut(i).scale_mut(sign);
    }
    match attr {
        MatrixAttribute::Row => Ok(q.transpose()),
        MatrixAttribute::Column => Ok(q),
    }
}

/// Random test matrix of shape `(rows, cols)` with i.i.d. entries.
///
/// Gaussian entries are standard normal, uniform entries lie in `[-1, 1)` and
/// Rademacher entries are `±1` with equal probability.
pub fn sketching_operator<R: Rng + ?Sized>(
    dist_type: DistributionType,
    rows: usize,
    cols: usize,
    rng: &mut R,
) -> Result<DMatrix<f64>> {
    if rows == 0 || cols == 0 {
        return Err(RandSvdError::InvalidDimensions(
            "Rows and columns must be greater than 0".to_string(),
        ));
    }
    let matrix: DMatrix<f64> = match dist_type {
        DistributionType::Gaussian => {
            DMatrix::from_fn(rows, cols, |_i, _j| StandardNormal.sample(&mut *rng))
        }
        DistributionType::Uniform => {
            let uniform = Uniform::new(-1.0, 1.0);
            DMatrix::from_fn(rows, cols, |_i, _j| uniform.sample(&mut *rng))
        }
        DistributionType::Rademacher => {
            DMatrix::from_fn(rows, cols, |_i, _j| if rng.gen_bool(0.5) { 1.0 } else { -1.0 })
        }
    };

    Ok(matrix)
}
