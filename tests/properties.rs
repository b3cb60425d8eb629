use nalgebra::DMatrix;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand_core::SeedableRng;
use randsvd::test_assist::{generate_random_matrix, orthonormality_defect, planted_rank_matrix};
use randsvd::{optimal_threshold, rand_svd, NoiseLevel, RandSvdError, RsvdConfig};

fn dims_and_rank() -> impl Strategy<Value = (usize, usize, usize)> {
    (1usize..40, 1usize..40).prop_flat_map(|(m, n)| (Just(m), Just(n), 1..=m.min(n)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn decomposition_shapes_and_invariants(
        (m, n, t) in dims_and_rank(),
        oversampling in 0usize..8,
        power_iterations in 0usize..3,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let a = generate_random_matrix(m, n, &mut rng);
        let config = RsvdConfig::new(oversampling, power_iterations);
        let result = rand_svd(&a, t, &config, &mut rng).unwrap();

        prop_assert_eq!(result.u.shape(), (m, t));
        prop_assert_eq!(result.s().shape(), (t, t));
        prop_assert_eq!(result.v_t.shape(), (t, n));
        prop_assert!(orthonormality_defect(&result.u) < 1e-6);
        prop_assert!(orthonormality_defect(&result.v_t.transpose()) < 1e-6);
        prop_assert!(result.singular_values.iter().all(|&s| s >= 0.0));
        prop_assert!(result.singular_values.as_slice().windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn exact_rank_inputs_are_reconstructed(
        (m, n, t) in (4usize..30, 4usize..30).prop_flat_map(|(m, n)| (Just(m), Just(n), 1..=3usize)),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let spectrum: Vec<f64> = (0..t).map(|i| 4.0 - i as f64).collect();
        let a = planted_rank_matrix(m, n, &spectrum, &mut rng).unwrap();
        let result = rand_svd(&a, t, &RsvdConfig::default(), &mut rng).unwrap();
        prop_assert!((&a - result.reconstruct()).norm() < 1e-8 * a.norm());
    }

    #[test]
    fn threshold_non_decreasing_in_sigma(
        m in 1usize..2000,
        n in 1usize..2000,
        low in 0.0f64..10.0,
        delta in 0.0f64..10.0,
    ) {
        let smaller = optimal_threshold(m, n, NoiseLevel::Known(low)).unwrap();
        let larger = optimal_threshold(m, n, NoiseLevel::Known(low + delta)).unwrap();
        prop_assert!(smaller >= 0.0);
        prop_assert!(smaller <= larger);
    }

    #[test]
    fn rank_above_min_dimension_is_rejected(m in 1usize..20, n in 1usize..20, extra in 1usize..5) {
        let a = DMatrix::<f64>::zeros(m, n);
        let mut rng = StdRng::seed_from_u64(0);
        let rank = m.min(n) + extra;
        prop_assert_eq!(
            rand_svd(&a, rank, &RsvdConfig::default(), &mut rng),
            Err(RandSvdError::InvalidRank { rank, max: m.min(n) })
        );
    }
}
