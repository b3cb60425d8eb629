use log::{info, trace};
use nalgebra::DMatrix;
use rand::Rng;
use crate::config::{RsvdConfig, Stabilizer};
use crate::errors::{check_shape, Result};
use crate::sketch;

/// Which side of the input the random projection is applied to.
///
/// The range finder always works on an operator `op(A)` with at least as many rows as
/// columns. For a tall-and-skinny input `op(A) = A`; for a short-and-fat input
/// `op(A) = A^T`, applied through transposed products so the transpose is never formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    TallSkinny,
    ShortFat,
}

impl Orientation {
    pub fn select(rows: usize, cols: usize) -> Self {
        if rows >= cols {
            Orientation::TallSkinny
        } else {
            Orientation::ShortFat
        }
    }

    /// Shape of `op(A)`.
    pub fn shape(&self, a: &DMatrix<f64>) -> (usize, usize) {
        match self {
            Orientation::TallSkinny => (a.nrows(), a.ncols()),
            Orientation::ShortFat => (a.ncols(), a.nrows()),
        }
    }

    /// `op(A) * x`
    pub fn apply(&self, a: &DMatrix<f64>, x: &DMatrix<f64>) -> DMatrix<f64> {
        match self {
            Orientation::TallSkinny => a * x,
            Orientation::ShortFat => a.tr_mul(x),
        }
    }

    /// `op(A)^T * x`
    pub fn apply_transpose(&self, a: &DMatrix<f64>, x: &DMatrix<f64>) -> DMatrix<f64> {
        match self {
            Orientation::TallSkinny => a.tr_mul(x),
            Orientation::ShortFat => a * x,
        }
    }
}

/**
Takes an `m × n` matrix and a sketch width `k` and returns `Q` an `r × d` matrix returned by the
underlying range finder and `B = Q^T op(A)` a `d × c` matrix, where `op(A)` is `r × c`.

* Inputs:
`a` is an `m × n` matrix, `orientation` picks `op(A)`, `k` is the number of sketch columns.

* Output:
`Q` has orthonormal columns, `B = Q^T op(A)`, and `QB` is a low-rank approximation of `op(A)`.
(<https://arxiv.org/pdf/2302.11474>)
 */
pub fn qb_decomposition<R: Rng + ?Sized>(
    a: &DMatrix<f64>,
    orientation: Orientation,
    k: usize,
    config: &RsvdConfig,
    rng: &mut R,
) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
    let q = range_finder(a, orientation, k, config, rng)?;
    let b = orientation.apply_transpose(a, &q).transpose();
    Ok((q, b))
}

/**
Returns `Q` a column orthonormal matrix with `d = min{k, r, c}` columns whose range approximates
the span of the top `d` left singular vectors of `op(A)` (`r × c`).

Follows Algorithm 4.4 of Halko, Martinsson and Tropp: a random test matrix is pushed through
`op(A)`, optionally refined by power iteration, then orthonormalized.
 */
pub fn range_finder<R: Rng + ?Sized>(
    a: &DMatrix<f64>,
    orientation: Orientation,
    k: usize,
    config: &RsvdConfig,
    rng: &mut R,
) -> Result<DMatrix<f64>> {
    let (rows, cols) = orientation.shape(a);
    check_shape(rows, cols)?;
    let width = k.min(rows.min(cols));
    if width < k {
        info!("reducing sketch width in range_finder from {} to {}", k, width);
    }

    let omega = sketch::sketching_operator(config.distribution, cols, width, rng)?;
    let y = orientation.apply(a, &omega);
    let y = power_iteration(a, orientation, y, config.power_iterations, config.stabilizer);
    let q = orth(&y);
    Ok(q.columns(0, width).into_owned())
}

/**
Sharpens a sketch `Y = op(A) S` by alternating products with `op(A)^T` and `op(A)`.

* Input:
`y` is the `r × k` sketch, `iterations` is the number of `op(A)^T`/`op(A)` rounds and
`kind` picks the stabilizer applied after every product.

* Output:
`op(A) (op(A)^T op(A))^iterations S` up to the stabilizing changes of basis.
 */
pub fn power_iteration(
    a: &DMatrix<f64>,
    orientation: Orientation,
    y: DMatrix<f64>,
    iterations: usize,
    kind: Stabilizer,
) -> DMatrix<f64> {
    let mut y = y;
    for i in 0..iterations {
        y = stabilizer(&y, kind);
        let z = stabilizer(&orientation.apply_transpose(a, &y), kind);
        y = orientation.apply(a, &z);
        trace!("power iteration {} done, sketch norm {:.3e}", i + 1, y.norm());
    }
    y
}

/**
 Returns orthonormal basis for the range of X

 * Input:
`X` is `m × n` matrix

 * Output:
`Y` is an orthonormal basis for the range of X

The number of columns in Y is `min(m, n)`. This is the orthogonal factor of a thin QR
decomposition of X.
 */
pub fn orth(x: &DMatrix<f64>) -> DMatrix<f64> {
    x.clone().qr().q()
}

/// Better-conditioned matrix with the same range as `x`.
///
/// `Stabilizer::Lu` returns the unit lower factor of a fully pivoted LU decomposition with the
/// row permutation undone, which is enough to keep repeated products from collapsing onto the
/// dominant direction.
pub fn stabilizer(x: &DMatrix<f64>, kind: Stabilizer) -> DMatrix<f64> {
    match kind {
        Stabilizer::Qr => orth(x),
        Stabilizer::Lu => {
            let lu = x.clone().full_piv_lu();
            let mut l = lu.l();
            lu.p().inv_permute_rows(&mut l);
            l
        }
    }
}
