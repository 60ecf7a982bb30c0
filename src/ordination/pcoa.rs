//! Principal Coordinates Analysis (classical multidimensional scaling).

use crate::data::DissimilarityMatrix;
use crate::error::{OrdistatError, Result};
use log::{debug, info};
use nalgebra::{DMatrix, SymmetricEigen};
use serde::Serialize;

/// Convergence tolerance for the symmetric eigendecomposition.
const EIGEN_EPS: f64 = 1.0e-12;
/// Iteration cap for the symmetric eigendecomposition.
const EIGEN_MAX_ITER: usize = 1024;

/// Per-sample coordinates on a sequence of orthogonal axes, with the
/// fraction of total variance each axis explains.
///
/// Axes are named `PC1`, `PC2`, … and ordered by descending explained
/// variance; for `n` samples there are exactly `n - 1` axes. The result is
/// computed once from an aligned matrix and read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct OrdinationResult {
    /// Sample identifiers, in the input matrix's order.
    sample_ids: Vec<String>,
    /// Axis names, `PC1..`.
    axis_names: Vec<String>,
    /// Coordinates (samples × axes).
    #[serde(skip)]
    coordinates: DMatrix<f64>,
    /// Proportion of variance explained per axis.
    proportion_explained: Vec<f64>,
}

impl OrdinationResult {
    /// Sample identifiers.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Axis names in order of descending explained variance.
    pub fn axis_names(&self) -> &[String] {
        &self.axis_names
    }

    /// Number of axes.
    pub fn n_axes(&self) -> usize {
        self.axis_names.len()
    }

    /// Coordinate of one sample on one axis.
    pub fn coordinate(&self, sample: usize, axis: usize) -> f64 {
        self.coordinates[(sample, axis)]
    }

    /// All coordinates for one sample, in axis order.
    pub fn sample_coordinates(&self, sample: usize) -> Vec<f64> {
        self.coordinates.row(sample).iter().cloned().collect()
    }

    /// Proportion of variance explained, addressable by axis name.
    pub fn proportion_for(&self, axis_name: &str) -> Option<f64> {
        self.axis_names
            .iter()
            .position(|n| n == axis_name)
            .map(|i| self.proportion_explained[i])
    }

    /// Proportions of variance explained, in axis order.
    pub fn proportion_explained(&self) -> &[f64] {
        &self.proportion_explained
    }
}

/// Run classical (Gower) PCoA on a dissimilarity matrix of `n` samples.
///
/// The squared dissimilarities are double-centered into a Gram-like matrix,
/// which is then eigendecomposed. Coordinates are the eigenvectors scaled by
/// the square root of their eigenvalues (clipped to non-negative), ordered
/// by descending eigenvalue; the proportion explained by an axis is its
/// clipped eigenvalue over the sum of all clipped eigenvalues, so axes from
/// negative eigenvalues are retained with a zero share rather than dropped.
pub fn pcoa(distances: &DissimilarityMatrix) -> Result<OrdinationResult> {
    let n = distances.n_samples();
    if n < 2 {
        return Err(OrdistatError::EmptyData(
            "PCoA requires at least 2 samples".to_string(),
        ));
    }

    // Gower centering: B = -0.5 * J (D ∘ D) J with J = I - 11'/n.
    let mut a = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            let d = distances.get(i, j);
            a[(i, j)] = -0.5 * d * d;
        }
    }
    let row_means: Vec<f64> = (0..n).map(|i| a.row(i).sum() / n as f64).collect();
    let col_means: Vec<f64> = (0..n).map(|j| a.column(j).sum() / n as f64).collect();
    let grand_mean = row_means.iter().sum::<f64>() / n as f64;
    let mut b = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            b[(i, j)] = a[(i, j)] - row_means[i] - col_means[j] + grand_mean;
        }
    }

    let eigen = SymmetricEigen::try_new(b, EIGEN_EPS, EIGEN_MAX_ITER).ok_or_else(|| {
        OrdistatError::Numerical("Eigendecomposition of centered matrix did not converge".to_string())
    })?;

    // Order eigenpairs by descending eigenvalue and keep n - 1 axes.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        eigen.eigenvalues[j]
            .partial_cmp(&eigen.eigenvalues[i])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let n_axes = n - 1;

    let clipped: Vec<f64> = order
        .iter()
        .map(|&k| eigen.eigenvalues[k].max(0.0))
        .collect();
    let total: f64 = clipped.iter().sum();
    debug!(
        "PCoA eigenvalues (descending, clipped): {:?}",
        &clipped[..n_axes.min(5)]
    );

    let mut coordinates = DMatrix::zeros(n, n_axes);
    let mut proportion_explained = Vec::with_capacity(n_axes);
    for (axis, &k) in order.iter().take(n_axes).enumerate() {
        let scale = clipped[axis].sqrt();
        for sample in 0..n {
            coordinates[(sample, axis)] = eigen.eigenvectors[(sample, k)] * scale;
        }
        let proportion = if total > 0.0 { clipped[axis] / total } else { 0.0 };
        proportion_explained.push(proportion);
    }

    let axis_names: Vec<String> = (1..=n_axes).map(|i| format!("PC{}", i)).collect();
    info!(
        "PCoA produced {} axes for {} samples; PC1 explains {:.1}%",
        n_axes,
        n,
        proportion_explained.first().copied().unwrap_or(0.0) * 100.0
    );

    Ok(OrdinationResult {
        sample_ids: distances.sample_ids().to_vec(),
        axis_names,
        coordinates,
        proportion_explained,
    })
}
