//! Analysis configuration and staged pipeline execution.

use crate::assoc::{ordination_distances, run_association, TestResult};
use crate::classify::{classify, ClassifiedVariable, ClassifyMode};
use crate::data::{align, DissimilarityMatrix, MergedTable, Metadata};
use crate::error::{OrdistatError, Result};
use crate::ordination::pcoa;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lower bound on the permutation count.
pub const MIN_PERMUTATIONS: usize = 10;

fn default_x_axis() -> String {
    "PC1".to_string()
}

fn default_y_axis() -> String {
    "PC2".to_string()
}

fn default_permutations() -> usize {
    999
}

fn default_seed() -> u64 {
    42
}

/// Configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Metadata column under test.
    pub variable: String,
    /// Variable-type decision mode.
    #[serde(default)]
    pub mode: ClassifyMode,
    /// First of the two axes feeding the 2-D test distance matrix.
    #[serde(default = "default_x_axis")]
    pub x_axis: String,
    /// Second of the two axes feeding the 2-D test distance matrix.
    #[serde(default = "default_y_axis")]
    pub y_axis: String,
    /// Negate the x axis in the output table. Orientation only; never
    /// touches the statistics.
    #[serde(default)]
    pub flip_x: bool,
    /// Negate the y axis in the output table. Orientation only.
    #[serde(default)]
    pub flip_y: bool,
    /// Number of permutations for the association test.
    #[serde(default = "default_permutations")]
    pub permutations: usize,
    /// Random seed. Only the Mantel (continuous) path consumes it; ANOSIM
    /// permutations are always drawn from an unseeded generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl AnalysisConfig {
    /// Minimal configuration for one variable, defaults everywhere else.
    pub fn for_variable(variable: &str) -> Self {
        Self {
            variable: variable.to_string(),
            mode: ClassifyMode::Auto,
            x_axis: default_x_axis(),
            y_axis: default_y_axis(),
            flip_x: false,
            flip_y: false,
            permutations: default_permutations(),
            seed: default_seed(),
        }
    }

    /// Load from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(OrdistatError::from)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(OrdistatError::from)
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.variable.trim().is_empty() {
            return Err(OrdistatError::InvalidParameter(
                "No variable selected".to_string(),
            ));
        }
        if self.permutations < MIN_PERMUTATIONS {
            return Err(OrdistatError::InvalidParameter(format!(
                "Permutation count must be at least {}, got {}",
                MIN_PERMUTATIONS, self.permutations
            )));
        }
        if self.x_axis == self.y_axis {
            return Err(OrdistatError::InvalidParameter(format!(
                "Axis pair must name two different axes, got '{}' twice",
                self.x_axis
            )));
        }
        Ok(())
    }
}

/// One axis name with its share of explained variance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisVariance {
    /// Axis name (`PC1..`).
    pub axis: String,
    /// Proportion of total variance explained.
    pub proportion_explained: f64,
}

/// Everything one analysis run produces.
///
/// The association test is the only fallible stage whose failure does not
/// abort the run: `test` is `None` and `test_warning` carries the message,
/// while the table, axes and classification stay valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// Merged, variable-filtered table with any axis flips applied.
    pub table: MergedTable,
    /// Per-axis proportion of variance explained, in axis order.
    pub axes: Vec<AxisVariance>,
    /// The tested variable's classification and filtered values.
    pub classification: ClassifiedVariable,
    /// Association test result, if the test ran to completion.
    pub test: Option<TestResult>,
    /// Why the association test did not produce a result.
    pub test_warning: Option<String>,
}

impl AnalysisOutput {
    /// Proportion of variance explained, addressable by axis name.
    pub fn proportion_for(&self, axis_name: &str) -> Option<f64> {
        self.axes
            .iter()
            .find(|a| a.axis == axis_name)
            .map(|a| a.proportion_explained)
    }
}

/// Run the full pipeline on already-parsed inputs.
///
/// Stages run synchronously in order: align, ordinate, merge, filter,
/// classify, test. Aligner, ordination and classification errors are fatal;
/// an association-test failure is downgraded to a warning on the output.
pub fn run_analysis(
    distances: &DissimilarityMatrix,
    metadata: &Metadata,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput> {
    config.validate()?;

    let aligned = align(distances, metadata)?;
    let ordination = pcoa(aligned.distances())?;
    let merged = MergedTable::merge(&ordination, aligned.metadata())?;

    let filtered = merged.filter_variable(&config.variable)?;
    let classification = classify(&filtered, &config.variable, config.mode)?;

    // Rows dropped by continuous coercion leave the table as well, so the
    // output rows, the classification and the test all cover one sample set.
    let mut table = filtered.subset(&classification.sample_ids)?;

    let (test, test_warning) = match test_association(&table, &classification, config) {
        Ok(result) => {
            info!(
                "{}: statistic = {:.4}, p = {:.4}",
                result.method.name(),
                result.statistic,
                result.p_value
            );
            (Some(result), None)
        }
        Err(e) => {
            warn!("Association test failed: {}", e);
            (None, Some(e.to_string()))
        }
    };

    apply_flips(&mut table, config)?;
    Ok(AnalysisOutput {
        axes: axis_variances(&ordination),
        table,
        classification,
        test,
        test_warning,
    })
}

/// Parse both inputs from disk and run the pipeline.
pub fn run_analysis_from_paths<P: AsRef<Path>, Q: AsRef<Path>>(
    distance_path: P,
    metadata_path: Q,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput> {
    let distances = DissimilarityMatrix::from_path(distance_path)?;
    let metadata = Metadata::from_path(metadata_path)?;
    run_analysis(&distances, &metadata, config)
}

/// Build the 2-D ordination distance matrix and dispatch the test.
fn test_association(
    table: &MergedTable,
    classification: &ClassifiedVariable,
    config: &AnalysisConfig,
) -> Result<TestResult> {
    let distances = ordination_distances(
        table,
        &classification.sample_ids,
        &config.x_axis,
        &config.y_axis,
    )?;
    run_association(&distances, classification, config.permutations, config.seed)
}

/// Apply configured axis flips to the presentation copy of the table.
fn apply_flips(table: &mut MergedTable, config: &AnalysisConfig) -> Result<()> {
    if config.flip_x {
        table.flip_axis(&config.x_axis)?;
    }
    if config.flip_y {
        table.flip_axis(&config.y_axis)?;
    }
    Ok(())
}

fn axis_variances(ordination: &crate::ordination::OrdinationResult) -> Vec<AxisVariance> {
    ordination
        .axis_names()
        .iter()
        .zip(ordination.proportion_explained().iter())
        .map(|(axis, &proportion_explained)| AxisVariance {
            axis: axis.clone(),
            proportion_explained,
        })
        .collect()
}
