//! Euclidean distance matrices for association testing.

use crate::data::{DissimilarityMatrix, MergedTable};
use crate::error::{OrdistatError, Result};

/// Build the ordination-space distance matrix from exactly two selected
/// axes of a merged table, restricted to the given samples.
///
/// Only the two named axes contribute; the remaining ordination axes are
/// deliberately ignored so the tested structure matches the 2-D view the
/// caller selected.
pub fn ordination_distances(
    table: &MergedTable,
    sample_ids: &[String],
    x_axis: &str,
    y_axis: &str,
) -> Result<DissimilarityMatrix> {
    let xi = table.axis_index(x_axis).ok_or_else(|| {
        OrdistatError::InvalidParameter(format!("Unknown ordination axis '{}'", x_axis))
    })?;
    let yi = table.axis_index(y_axis).ok_or_else(|| {
        OrdistatError::InvalidParameter(format!("Unknown ordination axis '{}'", y_axis))
    })?;

    let mut points = Vec::with_capacity(sample_ids.len());
    for sid in sample_ids {
        let row = table.row_by_id(sid).ok_or_else(|| {
            OrdistatError::SampleMismatch(format!("Sample '{}' not found in merged table", sid))
        })?;
        points.push(vec![row.coordinates[xi], row.coordinates[yi]]);
    }

    DissimilarityMatrix::euclidean(sample_ids.to_vec(), &points)
}

/// Build a distance matrix from a single numeric variable (one-dimensional
/// Euclidean distance, i.e. absolute differences).
pub fn variable_distances(sample_ids: &[String], values: &[f64]) -> Result<DissimilarityMatrix> {
    let points: Vec<Vec<f64>> = values.iter().map(|&v| vec![v]).collect();
    DissimilarityMatrix::euclidean(sample_ids.to_vec(), &points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Metadata;
    use crate::ordination::pcoa;
    use approx::assert_relative_eq;

    fn build_table() -> MergedTable {
        let ids: Vec<String> = (0..4).map(|i| format!("S{}", i)).collect();
        let points = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 2.0],
            vec![3.0, 2.0],
        ];
        let dist = DissimilarityMatrix::euclidean(ids, &points).unwrap();
        let meta = Metadata::from_delimited_str("id,g\nS0,a\nS1,a\nS2,b\nS3,b\n").unwrap();
        MergedTable::merge(&pcoa(&dist).unwrap(), &meta).unwrap()
    }

    #[test]
    fn test_ordination_distances_use_selected_axes_only() {
        let table = build_table();
        let ids: Vec<String> = table.rows.iter().map(|r| r.sample_id.clone()).collect();
        let dist = ordination_distances(&table, &ids, "PC1", "PC2").unwrap();

        assert_eq!(dist.n_samples(), 4);
        // PC1/PC2 span the full 2-D geometry here, so distances match the
        // original point distances.
        assert_relative_eq!(dist.get(0, 1), 1.0, epsilon = 1e-9);
        assert_relative_eq!(dist.get(0, 2), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_axis_is_an_error() {
        let table = build_table();
        let ids: Vec<String> = table.rows.iter().map(|r| r.sample_id.clone()).collect();
        let result = ordination_distances(&table, &ids, "PC1", "PC9");
        assert!(matches!(result, Err(OrdistatError::InvalidParameter(_))));
    }

    #[test]
    fn test_variable_distances() {
        let ids: Vec<String> = vec!["A".into(), "B".into(), "C".into()];
        let dist = variable_distances(&ids, &[1.0, 4.0, 2.5]).unwrap();

        assert_relative_eq!(dist.get(0, 1), 3.0);
        assert_relative_eq!(dist.get(1, 2), 1.5);
        assert_relative_eq!(dist.get(2, 0), 1.5);
    }
}
