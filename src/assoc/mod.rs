//! Permutation tests for association between ordination structure and a
//! metadata variable.

pub mod anosim;
pub mod distance;
pub mod mantel;

pub use anosim::{anosim, anosim_with_rng};
pub use distance::{ordination_distances, variable_distances};
pub use mantel::mantel;

use crate::classify::{ClassifiedVariable, VariableKind};
use crate::data::DissimilarityMatrix;
use crate::error::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Which permutation test produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestMethod {
    Anosim,
    Mantel,
}

impl TestMethod {
    /// Conventional display name.
    pub fn name(&self) -> &'static str {
        match self {
            TestMethod::Anosim => "ANOSIM",
            TestMethod::Mantel => "Mantel",
        }
    }
}

/// A single test statistic with its empirical p-value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    /// The test that ran.
    pub method: TestMethod,
    /// ANOSIM R or Mantel r.
    pub statistic: f64,
    /// Empirical permutation p-value, in [0, 1].
    pub p_value: f64,
    /// Number of permutations drawn.
    pub permutations: usize,
}

/// Dispatch on a classified variable: ANOSIM for categorical groups,
/// Mantel for a continuous variable.
///
/// `distances` is the fixed ordination-space structure under test, labeled
/// by the classified variable's retained samples. Only the Mantel path
/// consumes `seed`; ANOSIM permutations are drawn from an unseeded thread
/// RNG, so only the continuous path is reproducible.
pub fn run_association(
    distances: &DissimilarityMatrix,
    variable: &ClassifiedVariable,
    permutations: usize,
    seed: u64,
) -> Result<TestResult> {
    match &variable.kind {
        VariableKind::Categorical(labels) => anosim(distances, labels, permutations),
        VariableKind::Continuous(values) => {
            let meta_distances = variable_distances(&variable.sample_ids, values)?;
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            mantel(distances, &meta_distances, permutations, &mut rng)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clustered_distances() -> (DissimilarityMatrix, Vec<String>) {
        let ids: Vec<String> = (0..6).map(|i| format!("S{}", i)).collect();
        let points = vec![
            vec![0.0, 0.0],
            vec![0.2, 0.1],
            vec![0.1, 0.2],
            vec![5.0, 5.0],
            vec![5.2, 5.1],
            vec![5.1, 5.2],
        ];
        let dist = DissimilarityMatrix::euclidean(ids.clone(), &points).unwrap();
        (dist, ids)
    }

    #[test]
    fn test_dispatch_categorical_runs_anosim() {
        let (dist, ids) = clustered_distances();
        let variable = ClassifiedVariable {
            name: "group".to_string(),
            sample_ids: ids,
            kind: VariableKind::Categorical(
                ["x", "x", "x", "y", "y", "y"].iter().map(|s| s.to_string()).collect(),
            ),
        };

        let result = run_association(&dist, &variable, 99, 42).unwrap();
        assert_eq!(result.method, TestMethod::Anosim);
        assert_eq!(result.permutations, 99);
    }

    #[test]
    fn test_dispatch_continuous_runs_mantel_seeded() {
        let (dist, ids) = clustered_distances();
        let variable = ClassifiedVariable {
            name: "depth".to_string(),
            sample_ids: ids,
            kind: VariableKind::Continuous(vec![0.1, 0.2, 0.15, 9.0, 9.1, 9.2]),
        };

        let r1 = run_association(&dist, &variable, 199, 42).unwrap();
        let r2 = run_association(&dist, &variable, 199, 42).unwrap();
        assert_eq!(r1.method, TestMethod::Mantel);
        assert_eq!(r1.statistic, r2.statistic);
        assert_eq!(r1.p_value, r2.p_value);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(TestMethod::Anosim.name(), "ANOSIM");
        assert_eq!(TestMethod::Mantel.name(), "Mantel");
    }
}
