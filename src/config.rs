use crate::sketch::DistributionType;

/// Re-conditioning applied between power iteration passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stabilizer {
    /// Orthonormal factor of a thin QR decomposition.
    Qr,
    /// Row-permuted lower factor of a pivoted LU decomposition. Cheaper than QR,
    /// only improves conditioning.
    Lu,
}

/// Knobs for the randomized SVD.
///
/// Defaults follow Halko, Martinsson and Tropp (<https://arxiv.org/abs/0909.4061>):
/// ten extra sketch columns and two rounds of power iteration with QR stabilization.
#[derive(Debug, Clone, PartialEq)]
pub struct RsvdConfig {
    /// Sketch columns drawn beyond the target rank.
    pub oversampling: usize,
    /// Rounds of `A^T`/`A` multiplication applied to the sketch.
    pub power_iterations: usize,
    /// Distribution of the random test matrix.
    pub distribution: DistributionType,
    pub stabilizer: Stabilizer,
}

pub const DEFAULT_OVERSAMPLING: usize = 10;
pub const DEFAULT_POWER_ITERATIONS: usize = 2;

impl Default for RsvdConfig {
    fn default() -> Self {
        Self {
            oversampling: DEFAULT_OVERSAMPLING,
            power_iterations: DEFAULT_POWER_ITERATIONS,
            distribution: DistributionType::Gaussian,
            stabilizer: Stabilizer::Qr,
        }
    }
}

impl RsvdConfig {
    pub fn new(oversampling: usize, power_iterations: usize) -> Self {
        Self {
            oversampling,
            power_iterations,
            ..Self::default()
        }
    }

    pub fn with_oversampling(mut self, oversampling: usize) -> Self {
        self.oversampling = oversampling;
        self
    }

    pub fn with_power_iterations(mut self, power_iterations: usize) -> Self {
        self.power_iterations = power_iterations;
        self
    }

    pub fn with_distribution(mut self, distribution: DistributionType) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_stabilizer(mut self, stabilizer: Stabilizer) -> Self {
        self.stabilizer = stabilizer;
        self
    }

    /// Number of sketch columns for `target_rank`, clamped to `max_width`.
    pub fn sketch_width(&self, target_rank: usize, max_width: usize) -> usize {
        (target_rank + self.oversampling).min(max_width)
    }
}
