//! ANOSIM: analysis of similarities for categorical group structure.

use crate::assoc::{TestMethod, TestResult};
use crate::data::DissimilarityMatrix;
use crate::error::{OrdistatError, Result};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Run ANOSIM with group labels shuffled by an unseeded thread RNG.
///
/// Permutation draws on this path are intentionally not reproducible; see
/// [`crate::pipeline::AnalysisConfig::seed`].
pub fn anosim(
    distances: &DissimilarityMatrix,
    groups: &[String],
    permutations: usize,
) -> Result<TestResult> {
    anosim_with_rng(distances, groups, permutations, &mut rand::thread_rng())
}

/// Run ANOSIM drawing permutations from the given generator.
///
/// The statistic is ANOSIM R: all pairwise dissimilarities are ranked
/// (average ranks on ties), and R = (mean between-group rank − mean
/// within-group rank) / (n(n−1)/4). Significance is the fraction of
/// label permutations whose R is at least the observed R, out of the
/// requested permutation count.
pub fn anosim_with_rng<R: Rng>(
    distances: &DissimilarityMatrix,
    groups: &[String],
    permutations: usize,
    rng: &mut R,
) -> Result<TestResult> {
    let n = distances.n_samples();
    if groups.len() != n {
        return Err(OrdistatError::SampleMismatch(format!(
            "{} group labels for {} samples",
            groups.len(),
            n
        )));
    }
    let distinct: HashSet<&str> = groups.iter().map(String::as_str).collect();
    if distinct.len() < 2 {
        return Err(OrdistatError::InvalidParameter(
            "ANOSIM requires at least 2 groups".to_string(),
        ));
    }
    if permutations == 0 {
        return Err(OrdistatError::InvalidParameter(
            "Permutation count must be positive".to_string(),
        ));
    }

    // Ranks of the condensed distances are fixed across permutations; only
    // the within/between split changes with the labels.
    let ranks = average_ranks(&distances.condensed());
    let mut labels: Vec<usize> = Vec::with_capacity(n);
    {
        let mut level_ids: Vec<&str> = Vec::new();
        for g in groups {
            let id = match level_ids.iter().position(|l| *l == g.as_str()) {
                Some(i) => i,
                None => {
                    level_ids.push(g.as_str());
                    level_ids.len() - 1
                }
            };
            labels.push(id);
        }
    }

    let observed = anosim_r(&ranks, &labels, n)?;
    debug!("Observed ANOSIM R = {:.4}", observed);

    let mut at_least = 0usize;
    let mut permuted = labels.clone();
    for _ in 0..permutations {
        permuted.shuffle(rng);
        let r = anosim_r(&ranks, &permuted, n)?;
        if r >= observed {
            at_least += 1;
        }
    }

    Ok(TestResult {
        method: TestMethod::Anosim,
        statistic: observed,
        p_value: at_least as f64 / permutations as f64,
        permutations,
    })
}

/// ANOSIM R for one label assignment, over precomputed condensed ranks.
fn anosim_r(ranks: &[f64], labels: &[usize], n: usize) -> Result<f64> {
    let mut within_sum = 0.0;
    let mut within_count = 0usize;
    let mut between_sum = 0.0;
    let mut between_count = 0usize;

    let mut pair = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            if labels[i] == labels[j] {
                within_sum += ranks[pair];
                within_count += 1;
            } else {
                between_sum += ranks[pair];
                between_count += 1;
            }
            pair += 1;
        }
    }

    if within_count == 0 || between_count == 0 {
        return Err(OrdistatError::Numerical(
            "ANOSIM needs both within-group and between-group sample pairs".to_string(),
        ));
    }

    let mean_within = within_sum / within_count as f64;
    let mean_between = between_sum / between_count as f64;
    let denom = (n * (n - 1)) as f64 / 4.0;
    Ok((mean_between - mean_within) / denom)
}

/// Ranks (1-based) with ties receiving the average of their positions.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let len = values.len();
    let mut order: Vec<usize> = (0..len).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; len];
    let mut i = 0;
    while i < len {
        let mut j = i;
        while j + 1 < len && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            ranks[k] = avg;
        }
        i = j + 1;
    }
    ranks
}
