use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use crate::config::RsvdConfig;
use crate::errors::{check_finite, check_shape, RandSvdError, Result};
use crate::lora_helpers::{self, Orientation};
use crate::threshold::{self, NoiseLevel};

/// Singular values at or below `DEFAULT_RANK_RTOL * s_max` count as numerically zero.
pub const DEFAULT_RANK_RTOL: f64 = 1e-10;

/// Truncated SVD `A ≈ U diag(singular_values) V^T`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionResult {
    /// Left singular vectors (m × t), orthonormal columns
    pub u: DMatrix<f64>,
    /// Singular values (t), non-negative and non-increasing
    pub singular_values: DVector<f64>,
    /// Right singular vectors (t × n), orthonormal rows
    pub v_t: DMatrix<f64>,
}

impl DecompositionResult {
    /// Diagonal `t × t` matrix of singular values.
    pub fn s(&self) -> DMatrix<f64> {
        DMatrix::from_diagonal(&self.singular_values)
    }

    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }

    /// Shape of the approximated matrix.
    pub fn shape(&self) -> (usize, usize) {
        (self.u.nrows(), self.v_t.ncols())
    }

    pub fn reconstruct(&self) -> DMatrix<f64> {
        &self.u * self.s() * &self.v_t
    }

    /// Number of singular values above `rtol` times the largest one.
    pub fn numerical_rank_with(&self, rtol: f64) -> usize {
        let s_max = self.singular_values.iter().cloned().fold(0.0, f64::max);
        if s_max == 0.0 {
            return 0;
        }
        self.singular_values.iter().filter(|&&s| s > rtol * s_max).count()
    }

    pub fn numerical_rank(&self) -> usize {
        self.numerical_rank_with(DEFAULT_RANK_RTOL)
    }

    /// The input had fewer than `rank()` numerically nonzero singular values. The trailing
    /// triplets are then noise around zero; this is a valid outcome, not a failure.
    pub fn is_rank_deficient(&self) -> bool {
        self.numerical_rank() < self.rank()
    }

    /// Keeps the leading `rank` triplets.
    pub fn truncate(&self, rank: usize) -> Result<DecompositionResult> {
        if rank > self.rank() {
            return Err(RandSvdError::InvalidRank { rank, max: self.rank() });
        }
        Ok(DecompositionResult {
            u: self.u.columns(0, rank).into_owned(),
            singular_values: self.singular_values.rows(0, rank).into_owned(),
            v_t: self.v_t.rows(0, rank).into_owned(),
        })
    }

    /// Drops the triplets below the Gavish–Donoho cutoff for a known noise level `sigma`.
    pub fn denoise(&self, sigma: f64) -> Result<DecompositionResult> {
        let (m, n) = self.shape();
        let values: Vec<f64> = self.singular_values.iter().copied().collect();
        let rank = threshold::optimal_rank(&values, m, n, NoiseLevel::Known(sigma))?;
        debug!("denoising keeps {} of {} singular triplets", rank, self.rank());
        self.truncate(rank)
    }
}

/**
Computes the exact SVD of the projected matrix `B = Q^T op(A)` and maps it back.

* Inputs:
`q` is the `r × l` orthonormal basis, `b` is `l × c`, `target_rank <= l`, `orientation` is the
one used to build `q`.

* Output:
The rank `target_rank` decomposition of `A` itself: for `Orientation::ShortFat` the factors of
`op(A) = A^T` are swapped and transposed.
 */
pub fn projected_svd(
    q: &DMatrix<f64>,
    b: DMatrix<f64>,
    target_rank: usize,
    orientation: Orientation,
) -> Result<DecompositionResult> {
    let svd = b.svd(true, true);
    let u_small = svd.u.ok_or_else(|| {
        RandSvdError::Decomposition("left singular vectors of the projection were not computed".to_string())
    })?;
    let v_t_small = svd.v_t.ok_or_else(|| {
        RandSvdError::Decomposition("right singular vectors of the projection were not computed".to_string())
    })?;
    let r = target_rank.min(svd.singular_values.len());

    let u = q * u_small.columns(0, r);
    let singular_values = svd.singular_values.rows(0, r).into_owned();
    let v_t = v_t_small.rows(0, r).into_owned();

    Ok(match orientation {
        Orientation::TallSkinny => DecompositionResult { u, singular_values, v_t },
        Orientation::ShortFat => DecompositionResult {
            u: v_t.transpose(),
            singular_values,
            v_t: u.transpose(),
        },
    })
}

/// Randomized SVD (Halko, Martinsson and Tropp, <https://arxiv.org/abs/0909.4061>).
///
/// Returns `U` (m × t), the `t` leading singular values and `V^T` (t × n). The random test
/// matrix is drawn from `rng`, so a seeded generator makes the result reproducible.
///
/// The projection runs along the smaller dimension: `A` itself when `m >= n`, `A^T` otherwise,
/// keeping every intermediate at `max(m, n) × (t + p)` or smaller.
pub fn rand_svd<R: Rng + ?Sized>(
    a: &DMatrix<f64>,
    target_rank: usize,
    config: &RsvdConfig,
    rng: &mut R,
) -> Result<DecompositionResult> {
    let (m, n) = a.shape();
    check_shape(m, n)?;
    let max_rank = m.min(n);
    if target_rank == 0 || target_rank > max_rank {
        return Err(RandSvdError::InvalidRank { rank: target_rank, max: max_rank });
    }
    // nalgebra's SVD does not terminate on NaN input
    check_finite(a)?;

    let orientation = Orientation::select(m, n);
    let width = config.sketch_width(target_rank, max_rank);
    if width < target_rank + config.oversampling {
        info!("reducing oversampled sketch width from {} to {}", target_rank + config.oversampling, width);
    }
    debug!(
        "rand_svd on {}x{} matrix: {:?}, rank {}, sketch width {}, power iterations {}",
        m, n, orientation, target_rank, width, config.power_iterations
    );

    let (q, b) = lora_helpers::qb_decomposition(a, orientation, width, config, rng)?;
    let result = projected_svd(&q, b, target_rank, orientation)?;

    if result.is_rank_deficient() {
        warn!(
            "matrix is numerically rank deficient: {} of {} requested singular values are nonzero",
            result.numerical_rank(),
            target_rank
        );
    }
    Ok(result)
}
