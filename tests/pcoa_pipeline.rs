//! Integration tests for the full alignment → PCoA → classification →
//! association pipeline.

use ordistat::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// A symmetric 5×5 dissimilarity matrix with zero diagonal: two tight
/// clusters ({S1,S2,S3} and {S4,S5}) far apart.
fn write_distance_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id\tS1\tS2\tS3\tS4\tS5").unwrap();
    writeln!(file, "S1\t0\t0.1\t0.2\t5.0\t5.1").unwrap();
    writeln!(file, "S2\t0.1\t0\t0.15\t5.2\t5.0").unwrap();
    writeln!(file, "S3\t0.2\t0.15\t0\t5.1\t5.3").unwrap();
    writeln!(file, "S4\t5.0\t5.2\t5.1\t0\t0.1").unwrap();
    writeln!(file, "S5\t5.1\t5.0\t5.3\t0.1\t0").unwrap();
    file.flush().unwrap();
    file
}

fn write_metadata_file(rows: &[(&str, &str)]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "sample,condition").unwrap();
    for (id, value) in rows {
        writeln!(file, "{},{}", id, value).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn categorical_two_group_scenario() {
    let dist = write_distance_file();
    let meta = write_metadata_file(&[
        ("S1", "left"),
        ("S2", "left"),
        ("S3", "left"),
        ("S4", "right"),
        ("S5", "right"),
    ]);

    let mut config = AnalysisConfig::for_variable("condition");
    config.permutations = 199;
    let output = run_analysis_from_paths(dist.path(), meta.path(), &config).unwrap();

    // 5 samples yield 4 ordination axes, variance shares non-increasing.
    assert_eq!(output.axes.len(), 4);
    let props: Vec<f64> = output.axes.iter().map(|a| a.proportion_explained).collect();
    for w in props.windows(2) {
        assert!(w[0] >= w[1]);
    }

    assert_eq!(output.classification.tag(), "categorical");
    let test = output.test.expect("ANOSIM should run");
    assert_eq!(test.method, TestMethod::Anosim);
    assert!(test.p_value >= 0.0 && test.p_value <= 1.0);
    // Two well-separated clusters: maximal rank separation.
    assert!(test.statistic > 0.9);
}

#[test]
fn continuous_variable_scenario() {
    let dist = write_distance_file();
    let meta = write_metadata_file(&[
        ("S1", "0.5"),
        ("S2", "0.7"),
        ("S3", "0.9"),
        ("S4", "9.1"),
        ("S5", "9.3"),
    ]);

    let mut config = AnalysisConfig::for_variable("condition");
    config.permutations = 199;
    let output = run_analysis_from_paths(dist.path(), meta.path(), &config).unwrap();

    // 5 distinct numeric strings exceed nothing: still ≤ 10 distinct values,
    // so auto mode must be overridden to reach the Mantel path.
    assert_eq!(output.classification.tag(), "categorical");

    config.mode = ClassifyMode::Continuous;
    let output = run_analysis_from_paths(dist.path(), meta.path(), &config).unwrap();
    assert_eq!(output.classification.tag(), "continuous");

    let test = output.test.expect("Mantel should run");
    assert_eq!(test.method, TestMethod::Mantel);
    assert!(test.statistic >= -1.0 && test.statistic <= 1.0);
    assert!(test.p_value >= 0.0 && test.p_value <= 1.0);
    // The variable tracks the cluster structure closely.
    assert!(test.statistic > 0.8);
}

#[test]
fn empty_intersection_is_fatal() {
    let dist = write_distance_file();
    let meta = write_metadata_file(&[("X1", "a"), ("X2", "b"), ("X3", "a")]);

    let config = AnalysisConfig::for_variable("condition");
    let result = run_analysis_from_paths(dist.path(), meta.path(), &config);
    assert!(matches!(result, Err(OrdistatError::EmptyData(_))));
}

#[test]
fn alignment_ignores_metadata_row_order() {
    let dist = write_distance_file();
    // Metadata shuffled and with an extra unmatched sample.
    let meta = write_metadata_file(&[
        ("S5", "right"),
        ("S3", "left"),
        ("ZZ", "left"),
        ("S1", "left"),
        ("S4", "right"),
        ("S2", "left"),
    ]);

    let mut config = AnalysisConfig::for_variable("condition");
    config.permutations = 49;
    let output = run_analysis_from_paths(dist.path(), meta.path(), &config).unwrap();

    let ids: Vec<&str> = output
        .table
        .rows
        .iter()
        .map(|r| r.sample_id.as_str())
        .collect();
    assert_eq!(ids, vec!["S1", "S2", "S3", "S4", "S5"]);
}

#[test]
fn missing_variable_rows_are_excluded_everywhere() {
    let dist = write_distance_file();
    let meta = write_metadata_file(&[
        ("S1", "left"),
        ("S2", ""),
        ("S3", "left"),
        ("S4", "right"),
        ("S5", "right"),
    ]);

    let mut config = AnalysisConfig::for_variable("condition");
    config.permutations = 49;
    let output = run_analysis_from_paths(dist.path(), meta.path(), &config).unwrap();

    assert_eq!(output.table.n_samples(), 4);
    assert!(output.table.row_by_id("S2").is_none());
    assert_eq!(output.classification.n_samples(), 4);
    assert!(!output.classification.sample_ids.contains(&"S2".to_string()));
}

#[test]
fn mantel_runs_are_seed_deterministic() {
    let dist = write_distance_file();
    let meta = write_metadata_file(&[
        ("S1", "1.0"),
        ("S2", "2.0"),
        ("S3", "3.0"),
        ("S4", "8.0"),
        ("S5", "9.0"),
    ]);

    let mut config = AnalysisConfig::for_variable("condition");
    config.mode = ClassifyMode::Continuous;
    config.permutations = 199;

    let a = run_analysis_from_paths(dist.path(), meta.path(), &config).unwrap();
    let b = run_analysis_from_paths(dist.path(), meta.path(), &config).unwrap();
    let ta = a.test.unwrap();
    let tb = b.test.unwrap();
    assert_eq!(ta.statistic, tb.statistic);
    assert_eq!(ta.p_value, tb.p_value);

    config.seed = 7;
    let c = run_analysis_from_paths(dist.path(), meta.path(), &config).unwrap();
    // The statistic never depends on the permutation order.
    assert_eq!(ta.statistic, c.test.unwrap().statistic);
}

#[test]
fn comma_delimited_distance_matrix_is_sniffed() {
    let mut dist = NamedTempFile::new().unwrap();
    writeln!(dist, "id,S1,S2,S3").unwrap();
    writeln!(dist, "S1,0,1.0,2.0").unwrap();
    writeln!(dist, "S2,1.0,0,1.5").unwrap();
    writeln!(dist, "S3,2.0,1.5,0").unwrap();
    dist.flush().unwrap();
    let meta = write_metadata_file(&[("S1", "a"), ("S2", "a"), ("S3", "b")]);

    let mut config = AnalysisConfig::for_variable("condition");
    config.permutations = 49;
    let output = run_analysis_from_paths(dist.path(), meta.path(), &config).unwrap();
    assert_eq!(output.axes.len(), 2);
}

#[test]
fn merged_table_carries_all_axes_and_variables() {
    let dist = write_distance_file();
    let meta = write_metadata_file(&[
        ("S1", "left"),
        ("S2", "left"),
        ("S3", "left"),
        ("S4", "right"),
        ("S5", "right"),
    ]);

    let mut config = AnalysisConfig::for_variable("condition");
    config.permutations = 49;
    let output = run_analysis_from_paths(dist.path(), meta.path(), &config).unwrap();

    assert_eq!(output.table.axis_names, vec!["PC1", "PC2", "PC3", "PC4"]);
    assert_eq!(output.table.column_names, vec!["condition"]);
    for row in &output.table.rows {
        assert_eq!(row.coordinates.len(), 4);
        assert_eq!(row.values.len(), 1);
    }
}
