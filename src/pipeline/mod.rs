//! End-to-end analysis pipeline: align, ordinate, classify, test.

mod runner;

pub use runner::{
    run_analysis, run_analysis_from_paths, AnalysisConfig, AnalysisOutput, AxisVariance,
    MIN_PERMUTATIONS,
};
