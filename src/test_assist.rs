use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};
use crate::errors::{RandSvdError, Result};
use crate::sketch::{haar_sample, MatrixAttribute};


/// Generates a random matrix of size (rows, cols) with normally distributed elems
pub fn generate_random_matrix<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> DMatrix<f64> {
    DMatrix::from_fn(rows, cols, |_i, _j| StandardNormal.sample(&mut *rng))
}

/// Generates a random matrix with i.i.d. `N(0, sigma^2)` entries
pub fn generate_noise_matrix<R: Rng + ?Sized>(rows: usize, cols: usize, sigma: f64, rng: &mut R) -> Result<DMatrix<f64>> {
    let normal = Normal::new(0.0, sigma)
        .map_err(|e| RandSvdError::InvalidNoiseLevel(e.to_string()))?;
    Ok(DMatrix::from_fn(rows, cols, |_i, _j| normal.sample(&mut *rng)))
}

/// Builds `U diag(spectrum) V^T` with Haar-distributed `U` (rows × r) and `V` (cols × r), so
/// the singular values of the result are exactly `spectrum`.
pub fn planted_rank_matrix<R: Rng + ?Sized>(rows: usize, cols: usize, spectrum: &[f64], rng: &mut R) -> Result<DMatrix<f64>> {
    let r = spectrum.len();
    let u = haar_sample(rows, r, MatrixAttribute::Column, rng)?;
    let v = haar_sample(cols, r, MatrixAttribute::Column, rng)?;
    let sigma = DMatrix::from_diagonal(&DVector::from_column_slice(spectrum));
    Ok(u * sigma * v.transpose())
}

pub fn check_approx_equal(a: &DMatrix<f64>, b: &DMatrix<f64>, tolerance: f64) -> bool {
    if a.shape() != b.shape() {
        return false;
    }

    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tolerance)
}

/// `||Q^T Q - I||_F` for a matrix with (supposedly) orthonormal columns
pub fn orthonormality_defect(q: &DMatrix<f64>) -> f64 {
    (q.tr_mul(q) - DMatrix::identity(q.ncols(), q.ncols())).norm()
}

/// Matches each column of `a` to the column of `b` with the same index up to a sign flip.
pub fn columns_match_up_to_sign(a: &DMatrix<f64>, b: &DMatrix<f64>, tolerance: f64) -> bool {
    if a.shape() != b.shape() {
        return false;
    }
    (0..a.ncols()).all(|j| {
        let sign = if a.column(j).dot(&b.column(j)) < 0.0 { -1.0 } else { 1.0 };
        (a.column(j) - b.column(j) * sign).amax() <= tolerance
    })
}
