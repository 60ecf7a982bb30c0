//! Classification of metadata variables as categorical or continuous.

use crate::data::MergedTable;
use crate::error::{OrdistatError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// In auto mode, a variable with at most this many distinct non-missing
/// values is treated as categorical. Fixed design constant, not
/// configurable.
pub const MAX_CATEGORICAL_LEVELS: usize = 10;

/// How to decide a variable's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifyMode {
    /// Cardinality heuristic: ≤ `MAX_CATEGORICAL_LEVELS` distinct values is
    /// categorical, more is continuous.
    #[default]
    Auto,
    /// Treat as discrete string-labeled groups regardless of content.
    Categorical,
    /// Treat as ordered numeric regardless of cardinality.
    Continuous,
}

/// The values of a classified variable. Each branch carries only the data
/// its downstream test needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VariableKind {
    /// Opaque string group labels, one per retained sample. Never coerced.
    Categorical(Vec<String>),
    /// Numeric values, one per retained sample.
    Continuous(Vec<f64>),
}

/// A variable name bound to its type verdict, the retained sample IDs, and
/// the filtered values used downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedVariable {
    /// The metadata column this classification refers to.
    pub name: String,
    /// Samples that survived missing-value (and, on the continuous path,
    /// coercion) filtering, in table order.
    pub sample_ids: Vec<String>,
    /// Filtered values, parallel to `sample_ids`.
    pub kind: VariableKind,
}

impl ClassifiedVariable {
    /// Short tag for the verdict.
    pub fn tag(&self) -> &'static str {
        match self.kind {
            VariableKind::Categorical(_) => "categorical",
            VariableKind::Continuous(_) => "continuous",
        }
    }

    /// Number of retained samples.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }
}

/// Classify one metadata variable of a merged table.
///
/// Rows with a missing value for the variable are dropped first; zero
/// remaining rows is a fatal error. An explicit forced mode always wins; in
/// auto mode the distinct-value heuristic decides. On the continuous path
/// values are coerced to numeric and rows whose value fails coercion are
/// dropped by the same filtering rule; the categorical path never coerces.
pub fn classify(
    table: &MergedTable,
    variable: &str,
    mode: ClassifyMode,
) -> Result<ClassifiedVariable> {
    let values = table.variable_values(variable)?;

    let mut sample_ids: Vec<String> = Vec::new();
    let mut raw: Vec<String> = Vec::new();
    for (row, value) in table.rows.iter().zip(values.iter()) {
        if let Some(text) = value.as_text() {
            sample_ids.push(row.sample_id.clone());
            raw.push(text.to_string());
        }
    }
    if raw.is_empty() {
        return Err(OrdistatError::EmptyData(format!(
            "Variable '{}' has no valid data",
            variable
        )));
    }

    let categorical = match mode {
        ClassifyMode::Categorical => true,
        ClassifyMode::Continuous => false,
        ClassifyMode::Auto => {
            let distinct: HashSet<&str> = raw.iter().map(String::as_str).collect();
            debug!(
                "Variable '{}': {} distinct values among {} samples",
                variable,
                distinct.len(),
                raw.len()
            );
            distinct.len() <= MAX_CATEGORICAL_LEVELS
        }
    };

    let classified = if categorical {
        ClassifiedVariable {
            name: variable.to_string(),
            sample_ids,
            kind: VariableKind::Categorical(raw),
        }
    } else {
        let mut kept_ids = Vec::with_capacity(sample_ids.len());
        let mut numeric = Vec::with_capacity(raw.len());
        for (sid, text) in sample_ids.into_iter().zip(raw.into_iter()) {
            if let Ok(v) = text.parse::<f64>() {
                kept_ids.push(sid);
                numeric.push(v);
            }
        }
        if numeric.is_empty() {
            return Err(OrdistatError::EmptyData(format!(
                "Variable '{}' has no numeric data",
                variable
            )));
        }
        ClassifiedVariable {
            name: variable.to_string(),
            sample_ids: kept_ids,
            kind: VariableKind::Continuous(numeric),
        }
    };

    info!(
        "Variable '{}' classified as {} over {} samples",
        variable,
        classified.tag(),
        classified.n_samples()
    );
    Ok(classified)
}
