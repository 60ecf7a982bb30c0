//! Ordination and Association Statistics Library
//!
//! This library aligns a sample-by-sample dissimilarity matrix with
//! per-sample metadata, ordinates the dissimilarities with Principal
//! Coordinates Analysis (PCoA), classifies a chosen metadata variable as
//! categorical or continuous, and tests that variable's association with
//! the ordination structure by permutation (ANOSIM for categorical
//! variables, Mantel for continuous ones).
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Input structures (DissimilarityMatrix, Metadata), sample
//!   alignment, and the merged coordinate/metadata output table
//! - **ordination**: Classical (Gower) PCoA
//! - **classify**: Categorical/continuous variable classification
//! - **assoc**: Distance-matrix construction and the ANOSIM and Mantel
//!   permutation tests
//! - **pipeline**: Configuration and the end-to-end analysis runner
//!
//! # Example
//!
//! ```no_run
//! use ordistat::prelude::*;
//!
//! // Load data
//! let distances = DissimilarityMatrix::from_path("bray_curtis.tsv").unwrap();
//! let metadata = Metadata::from_path("metadata.csv").unwrap();
//!
//! // Run the pipeline for one variable
//! let config = AnalysisConfig::for_variable("treatment");
//! let output = run_analysis(&distances, &metadata, &config).unwrap();
//!
//! match &output.test {
//!     Some(t) => println!("{}: {:.4} (p = {:.4})", t.method.name(), t.statistic, t.p_value),
//!     None => println!("test skipped: {:?}", output.test_warning),
//! }
//! ```

pub mod assoc;
pub mod classify;
pub mod data;
pub mod error;
pub mod ordination;
pub mod pipeline;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::assoc::{
        anosim, anosim_with_rng, mantel, ordination_distances, run_association,
        variable_distances, TestMethod, TestResult,
    };
    pub use crate::classify::{
        classify, ClassifiedVariable, ClassifyMode, VariableKind, MAX_CATEGORICAL_LEVELS,
    };
    pub use crate::data::{align, AlignedData, DissimilarityMatrix, MergedTable, MetaValue, Metadata};
    pub use crate::error::{OrdistatError, Result};
    pub use crate::ordination::{pcoa, OrdinationResult};
    pub use crate::pipeline::{
        run_analysis, run_analysis_from_paths, AnalysisConfig, AnalysisOutput, AxisVariance,
        MIN_PERMUTATIONS,
    };
}
