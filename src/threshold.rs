//! Optimal hard thresholding of singular values.
//!
//! Gavish and Donoho, "The Optimal Hard Threshold for Singular Values is 4/sqrt(3)"
//! (<https://arxiv.org/abs/1305.5870>). For an `m × n` matrix observed with i.i.d. noise of
//! level `sigma`, singular values below `lambda*(beta) * sqrt(max(m, n)) * sigma` are treated
//! as noise, where `beta = min(m, n) / max(m, n)`. When `sigma` is unknown the cutoff is
//! `omega(beta) * median(singular values)`.

use std::f64::consts::PI;
use log::debug;
use crate::errors::{check_shape, RandSvdError, Result};

/// Noise information available to the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseLevel<'a> {
    /// Known noise standard deviation.
    Known(f64),
    /// Unknown noise; estimated from the median of all observed singular values.
    Unknown(&'a [f64]),
}

/// How the Marchenko–Pastur median behind `omega(beta)` is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MedianEstimator {
    /// Numerical integration of the Marchenko–Pastur density.
    Exact,
    /// Cubic fit `0.56 beta^3 - 0.95 beta^2 + 1.82 beta + 1.43` published with the threshold.
    Approximate,
}

const QUADRATURE_NODES: usize = 20_000;

/// `min(m, n) / max(m, n)`
pub fn aspect_ratio(m: usize, n: usize) -> Result<f64> {
    check_shape(m, n)?;
    Ok(m.min(n) as f64 / m.max(n) as f64)
}

fn check_ratio(beta: f64) -> Result<()> {
    if !(beta > 0.0 && beta <= 1.0) {
        return Err(RandSvdError::InvalidAspectRatio(beta));
    }
    Ok(())
}

fn check_sigma(sigma: f64) -> Result<()> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(RandSvdError::InvalidNoiseLevel(format!(
            "noise level must be finite and non-negative, found {}",
            sigma
        )));
    }
    Ok(())
}

/// `lambda*(beta)`, the threshold coefficient for a known noise level.
///
/// Equals `4 / sqrt(3)` for square matrices.
pub fn optimal_sv_coefficient(beta: f64) -> Result<f64> {
    check_ratio(beta)?;
    let w = 8.0 * beta / ((beta + 1.0) + (beta * beta + 14.0 * beta + 1.0).sqrt());
    Ok((2.0 * (beta + 1.0) + w).sqrt())
}

/// Median of the Marchenko–Pastur distribution with ratio `beta`.
///
/// The density `sqrt((b - x)(x - a)) / (2 pi beta x)` on `[a, b]` is integrated after the
/// substitution `x = (a + b)/2 - (b - a)/2 cos(phi)`, which removes the square-root endpoints.
pub fn marchenko_pastur_median(beta: f64) -> Result<f64> {
    check_ratio(beta)?;
    let lower = (1.0 - beta.sqrt()).powi(2);
    let upper = (1.0 + beta.sqrt()).powi(2);
    let center = 0.5 * (lower + upper);
    let half_width = 0.5 * (upper - lower);
    let step = PI / QUADRATURE_NODES as f64;

    let x_at = |phi: f64| center - half_width * phi.cos();
    let weights: Vec<f64> = (0..QUADRATURE_NODES)
        .map(|i| {
            let phi = (i as f64 + 0.5) * step;
            let s = half_width * phi.sin();
            s * s / (2.0 * PI * beta * x_at(phi)) * step
        })
        .collect();

    // Normalizing by the computed mass cancels most of the quadrature error
    let target = 0.5 * weights.iter().sum::<f64>();
    let mut mass = 0.0;
    for (i, w) in weights.iter().enumerate() {
        if mass + w >= target {
            let fraction = (target - mass) / w;
            return Ok(x_at((i as f64 + fraction) * step));
        }
        mass += w;
    }
    Ok(center)
}

/// `omega(beta)`, the threshold coefficient applied to the median singular value.
pub fn optimal_median_coefficient(beta: f64, estimator: MedianEstimator) -> Result<f64> {
    check_ratio(beta)?;
    match estimator {
        MedianEstimator::Exact => {
            Ok(optimal_sv_coefficient(beta)? / marchenko_pastur_median(beta)?.sqrt())
        }
        MedianEstimator::Approximate => {
            Ok(0.56 * beta.powi(3) - 0.95 * beta.powi(2) + 1.82 * beta + 1.43)
        }
    }
}

fn median(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(RandSvdError::InvalidNoiseLevel(
            "median estimator needs at least one singular value".to_string(),
        ));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(RandSvdError::InvalidNoiseLevel(format!(
            "singular values must be finite and non-negative, found {}",
            bad
        )));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok(0.5 * (sorted[mid - 1] + sorted[mid]))
    } else {
        Ok(sorted[mid])
    }
}

/// Estimates the noise standard deviation of an `m × n` matrix from all of its singular values,
/// assuming most of them come from noise.
pub fn estimate_noise_sigma(singular_values: &[f64], m: usize, n: usize) -> Result<f64> {
    let beta = aspect_ratio(m, n)?;
    let y_med = median(singular_values)?;
    let sigma = y_med / (m.max(n) as f64 * marchenko_pastur_median(beta)?).sqrt();
    debug!("estimated noise level {:.3e} from median singular value {:.3e}", sigma, y_med);
    Ok(sigma)
}

/// Cutoff for an explicit aspect ratio `gamma` and larger dimension `n_max`.
pub fn optimal_threshold_for_ratio(gamma: f64, n_max: usize, noise: NoiseLevel<'_>) -> Result<f64> {
    check_ratio(gamma)?;
    if n_max == 0 {
        return Err(RandSvdError::InvalidShape { rows: n_max, cols: n_max });
    }
    match noise {
        NoiseLevel::Known(sigma) => {
            check_sigma(sigma)?;
            Ok(optimal_sv_coefficient(gamma)? * (n_max as f64).sqrt() * sigma)
        }
        NoiseLevel::Unknown(singular_values) => {
            let y_med = median(singular_values)?;
            Ok(optimal_median_coefficient(gamma, MedianEstimator::Exact)? * y_med)
        }
    }
}

/// Gavish–Donoho singular value cutoff for an `m × n` matrix.
pub fn optimal_threshold(m: usize, n: usize, noise: NoiseLevel<'_>) -> Result<f64> {
    let gamma = aspect_ratio(m, n)?;
    let cutoff = optimal_threshold_for_ratio(gamma, m.max(n), noise)?;
    debug!("optimal threshold for {}x{} (gamma {:.3}): {:.6e}", m, n, gamma, cutoff);
    Ok(cutoff)
}

/// Number of singular values strictly above the optimal cutoff.
pub fn optimal_rank(singular_values: &[f64], m: usize, n: usize, noise: NoiseLevel<'_>) -> Result<usize> {
    let cutoff = optimal_threshold(m, n, noise)?;
    Ok(singular_values.iter().filter(|&&s| s > cutoff).count())
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::test_assist::{generate_noise_matrix, planted_rank_matrix};
    use rand::rngs::StdRng;
    use rand_core::SeedableRng;

    fn all_singular_values(a: nalgebra::DMatrix<f64>) -> Vec<f64> {
        a.svd(false, false).singular_values.iter().copied().collect()
    }

    #[test]
    fn test_aspect_ratio() {
        assert_relative_eq!(aspect_ratio(1000, 500).unwrap(), 0.5);
        assert_relative_eq!(aspect_ratio(500, 1000).unwrap(), 0.5);
        assert_relative_eq!(aspect_ratio(7, 7).unwrap(), 1.0);
        assert!(aspect_ratio(0, 7).is_err());
    }

    #[test]
    fn test_square_coefficient() {
        assert_relative_eq!(optimal_sv_coefficient(1.0).unwrap(), 4.0 / 3.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_half_ratio_threshold() {
        let lambda = optimal_sv_coefficient(0.5).unwrap();
        assert_relative_eq!(lambda, 1.9785990537531035, epsilon = 1e-12);

        let cutoff = optimal_threshold(1000, 500, NoiseLevel::Known(1.0)).unwrap();
        assert!(cutoff > 0.0);
        assert_relative_eq!(cutoff, lambda * 1000.0_f64.sqrt(), epsilon = 1e-9);

        let by_ratio = optimal_threshold_for_ratio(0.5, 1000, NoiseLevel::Known(1.0)).unwrap();
        assert_relative_eq!(cutoff, by_ratio, epsilon = 1e-12);
    }

    #[test]
    fn test_threshold_monotone_in_sigma() {
        let sigmas = [0.0, 1e-3, 0.1, 0.5, 1.0, 2.0, 10.0];
        let cutoffs: Vec<f64> = sigmas
            .iter()
            .map(|&s| optimal_threshold(300, 120, NoiseLevel::Known(s)).unwrap())
            .collect();
        assert_eq!(cutoffs[0], 0.0);
        assert!(cutoffs.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_marchenko_pastur_median() {
        assert_relative_eq!(marchenko_pastur_median(1.0).unwrap(), 0.6527759, epsilon = 1e-5);
        assert_relative_eq!(marchenko_pastur_median(0.5).unwrap(), 0.8304659, epsilon = 1e-5);
        let tiny = marchenko_pastur_median(1e-3).unwrap();
        assert!((tiny - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_median_coefficient() {
        assert_relative_eq!(
            optimal_median_coefficient(1.0, MedianEstimator::Exact).unwrap(),
            2.858,
            epsilon = 1e-3
        );
        for beta in [0.1, 0.25, 0.5, 0.75, 1.0] {
            let exact = optimal_median_coefficient(beta, MedianEstimator::Exact).unwrap();
            let approx = optimal_median_coefficient(beta, MedianEstimator::Approximate).unwrap();
            assert!((exact - approx).abs() < 0.01, "beta {}: {} vs {}", beta, exact, approx);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(optimal_sv_coefficient(0.0), Err(RandSvdError::InvalidAspectRatio(0.0)));
        assert_eq!(optimal_sv_coefficient(1.5), Err(RandSvdError::InvalidAspectRatio(1.5)));
        assert!(optimal_sv_coefficient(f64::NAN).is_err());
        assert!(optimal_threshold(0, 10, NoiseLevel::Known(1.0)).is_err());
        assert!(matches!(
            optimal_threshold(10, 10, NoiseLevel::Known(-1.0)),
            Err(RandSvdError::InvalidNoiseLevel(_))
        ));
        assert!(matches!(
            optimal_threshold(10, 10, NoiseLevel::Unknown(&[])),
            Err(RandSvdError::InvalidNoiseLevel(_))
        ));
        assert!(optimal_threshold_for_ratio(0.5, 0, NoiseLevel::Known(1.0)).is_err());
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert!(median(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_estimate_noise_sigma() {
        let mut rng = StdRng::seed_from_u64(0);
        let noise = generate_noise_matrix(400, 200, 0.5, &mut rng).unwrap();
        let singular_values = all_singular_values(noise);
        let sigma = estimate_noise_sigma(&singular_values, 400, 200).unwrap();
        assert!((sigma - 0.5).abs() < 0.025, "estimated {}", sigma);
    }

    #[test]
    fn test_optimal_rank_recovers_planted_signal() {
        let mut rng = StdRng::seed_from_u64(1);
        let (m, n, sigma) = (200, 100, 0.01);
        let signal = planted_rank_matrix(m, n, &[50.0, 40.0, 30.0, 20.0, 10.0], &mut rng).unwrap();
        let noisy = signal + generate_noise_matrix(m, n, sigma, &mut rng).unwrap();
        let singular_values = all_singular_values(noisy);

        assert_eq!(optimal_rank(&singular_values, m, n, NoiseLevel::Known(sigma)).unwrap(), 5);
        assert_eq!(optimal_rank(&singular_values, m, n, NoiseLevel::Unknown(&singular_values)).unwrap(), 5);
    }
}
