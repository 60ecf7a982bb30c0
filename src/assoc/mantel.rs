//! Mantel test: correlation between two dissimilarity matrices.

use crate::assoc::{TestMethod, TestResult};
use crate::data::DissimilarityMatrix;
use crate::error::{OrdistatError, Result};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

/// Run a Mantel test between two distance matrices over the same samples.
///
/// The statistic is the Pearson correlation between the two matrices'
/// condensed (off-diagonal) entries; it does not depend on the generator.
/// Significance is two-sided: the fraction of sample-order permutations of
/// the first matrix whose |correlation| is at least the observed
/// |correlation|, out of the requested permutation count. The caller
/// supplies the generator, so reproducibility is entirely in its hands.
pub fn mantel<R: Rng>(
    dx: &DissimilarityMatrix,
    dy: &DissimilarityMatrix,
    permutations: usize,
    rng: &mut R,
) -> Result<TestResult> {
    if dx.sample_ids() != dy.sample_ids() {
        return Err(OrdistatError::SampleMismatch(
            "Mantel matrices must carry identical sample orderings".to_string(),
        ));
    }
    let n = dx.n_samples();
    if n < 3 {
        return Err(OrdistatError::InvalidParameter(
            "Mantel test requires at least 3 samples".to_string(),
        ));
    }
    if permutations == 0 {
        return Err(OrdistatError::InvalidParameter(
            "Permutation count must be positive".to_string(),
        ));
    }

    let x = dx.condensed();
    let y = dy.condensed();
    let observed = pearson(&x, &y).ok_or_else(|| {
        OrdistatError::Numerical(
            "Mantel correlation is undefined for a zero-variance distance matrix".to_string(),
        )
    })?;
    debug!("Observed Mantel r = {:.4}", observed);

    let mut at_least = 0usize;
    let mut order: Vec<usize> = (0..n).collect();
    let mut xp = vec![0.0; x.len()];
    for _ in 0..permutations {
        order.shuffle(rng);
        let mut pair = 0usize;
        for i in 0..n {
            for j in (i + 1)..n {
                xp[pair] = dx.get(order[i], order[j]);
                pair += 1;
            }
        }
        let r = pearson(&xp, &y).ok_or_else(|| {
            OrdistatError::Numerical("Permuted Mantel correlation is undefined".to_string())
        })?;
        if r.abs() >= observed.abs() {
            at_least += 1;
        }
    }

    Ok(TestResult {
        method: TestMethod::Mantel,
        statistic: observed,
        p_value: at_least as f64 / permutations as f64,
        permutations,
    })
}

/// Pearson correlation; `None` when either vector has zero variance.
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        let da = a - mx;
        let db = b - my;
        sxy += da * db;
        sxx += da * da;
        syy += db * db;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        None
    } else {
        Some(sxy / (sxx * syy).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn matrix_from_1d(values: &[f64]) -> DissimilarityMatrix {
        let ids: Vec<String> = (0..values.len()).map(|i| format!("S{}", i)).collect();
        let points: Vec<Vec<f64>> = values.iter().map(|&v| vec![v]).collect();
        DissimilarityMatrix::euclidean(ids, &points).unwrap()
    }

    #[test]
    fn test_identical_matrices_correlate_perfectly() {
        let dx = matrix_from_1d(&[0.0, 1.0, 3.0, 6.0, 10.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = mantel(&dx, &dx.clone(), 99, &mut rng).unwrap();

        assert_eq!(result.method, TestMethod::Mantel);
        assert_relative_eq!(result.statistic, 1.0, epsilon = 1e-12);
        assert!(result.p_value >= 0.0 && result.p_value <= 1.0);
    }

    #[test]
    fn test_statistic_in_unit_interval() {
        let dx = matrix_from_1d(&[0.0, 2.0, 5.0, 9.0]);
        let dy = matrix_from_1d(&[4.0, 4.5, 1.0, 8.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = mantel(&dx, &dy, 99, &mut rng).unwrap();

        assert!(result.statistic >= -1.0 && result.statistic <= 1.0);
        assert!(result.p_value >= 0.0 && result.p_value <= 1.0);
    }

    #[test]
    fn test_seed_determinism() {
        let dx = matrix_from_1d(&[0.0, 1.0, 4.0, 9.0, 2.0, 7.0]);
        let dy = matrix_from_1d(&[1.0, 0.5, 3.0, 8.0, 2.5, 6.0]);

        let mut rng1 = ChaCha8Rng::seed_from_u64(42);
        let r1 = mantel(&dx, &dy, 199, &mut rng1).unwrap();
        let mut rng2 = ChaCha8Rng::seed_from_u64(42);
        let r2 = mantel(&dx, &dy, 199, &mut rng2).unwrap();

        assert_eq!(r1.statistic, r2.statistic);
        assert_eq!(r1.p_value, r2.p_value);

        // A different seed may move the p-value but never the statistic.
        let mut rng3 = ChaCha8Rng::seed_from_u64(99);
        let r3 = mantel(&dx, &dy, 199, &mut rng3).unwrap();
        assert_eq!(r1.statistic, r3.statistic);
    }

    #[test]
    fn test_mismatched_ids_rejected() {
        let dx = matrix_from_1d(&[0.0, 1.0, 2.0]);
        let ids: Vec<String> = vec!["A".into(), "B".into(), "C".into()];
        let points = vec![vec![0.0], vec![1.0], vec![2.0]];
        let dy = DissimilarityMatrix::euclidean(ids, &points).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = mantel(&dx, &dy, 99, &mut rng);
        assert!(matches!(result, Err(OrdistatError::SampleMismatch(_))));
    }

    #[test]
    fn test_too_few_samples_rejected() {
        let dx = matrix_from_1d(&[0.0, 1.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = mantel(&dx, &dx.clone(), 99, &mut rng);
        assert!(matches!(result, Err(OrdistatError::InvalidParameter(_))));
    }

    #[test]
    fn test_zero_variance_rejected() {
        // All points identical: every distance is zero.
        let dx = matrix_from_1d(&[5.0, 5.0, 5.0, 5.0]);
        let dy = matrix_from_1d(&[0.0, 1.0, 2.0, 3.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = mantel(&dx, &dy, 99, &mut rng);
        assert!(matches!(result, Err(OrdistatError::Numerical(_))));
    }
}
