//! Square sample-by-sample dissimilarity matrix with labeled axes.

use crate::error::{OrdistatError, Result};
use csv::ReaderBuilder;
use log::info;
use nalgebra::DMatrix;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// A square matrix of pairwise dissimilarities indexed by sample ID.
///
/// Rows and columns carry the identical ID sequence. Symmetry is assumed
/// from the input and not re-validated; the diagonal is conventionally zero.
#[derive(Debug, Clone)]
pub struct DissimilarityMatrix {
    /// Dense matrix (samples × samples).
    data: DMatrix<f64>,
    /// Sample identifiers, shared by rows and columns.
    sample_ids: Vec<String>,
}

impl DissimilarityMatrix {
    /// Create from a dense matrix and sample identifiers.
    pub fn new(data: DMatrix<f64>, sample_ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != ncols {
            return Err(OrdistatError::NotSquare {
                rows: nrows,
                cols: ncols,
            });
        }
        if nrows != sample_ids.len() {
            return Err(OrdistatError::LabelMismatch(format!(
                "{} labels for a {}x{} matrix",
                sample_ids.len(),
                nrows,
                ncols
            )));
        }
        check_unique(&sample_ids)?;
        Ok(Self { data, sample_ids })
    }

    /// Load a dissimilarity matrix from a delimited text file.
    ///
    /// The delimiter is sniffed from the header line (tab if present,
    /// otherwise comma). The first column holds row labels and the header
    /// row holds column labels; both are whitespace-trimmed. Columns are
    /// reordered to match the row-label order, so rows and columns of the
    /// returned matrix carry the same ID sequence.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading dissimilarity matrix from {}", path.display());
        let raw = fs::read_to_string(path)?;
        Self::from_delimited_str(&raw)
    }

    /// Parse a dissimilarity matrix from delimited text held in memory.
    pub fn from_delimited_str(raw: &str) -> Result<Self> {
        let header_line = raw
            .lines()
            .next()
            .ok_or_else(|| OrdistatError::EmptyData("Empty dissimilarity file".to_string()))?;
        let delimiter = sniff_delimiter(header_line);

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(raw.as_bytes());
        let mut records = reader.records();

        let header = records
            .next()
            .ok_or_else(|| OrdistatError::EmptyData("Empty dissimilarity file".to_string()))??;
        if header.len() < 2 {
            return Err(OrdistatError::EmptyData(
                "Dissimilarity matrix must have at least one sample column".to_string(),
            ));
        }
        let col_labels: Vec<String> = header
            .iter()
            .skip(1)
            .map(|s| s.trim().to_string())
            .collect();
        let n = col_labels.len();

        let mut row_labels: Vec<String> = Vec::with_capacity(n);
        let mut values: Vec<Vec<f64>> = Vec::with_capacity(n);

        for (row_idx, record) in records.enumerate() {
            let record = record?;
            if record.len() == 1 && record.get(0).map(str::trim) == Some("") {
                continue;
            }
            let label = record
                .get(0)
                .map(|s| s.trim().to_string())
                .unwrap_or_default();
            if record.len() != n + 1 {
                return Err(OrdistatError::NotSquare {
                    rows: record.len().saturating_sub(1),
                    cols: n,
                });
            }
            let mut row = Vec::with_capacity(n);
            for (col_idx, field) in record.iter().skip(1).enumerate() {
                let value: f64 =
                    field
                        .trim()
                        .parse()
                        .map_err(|_| OrdistatError::InvalidValue {
                            value: field.to_string(),
                            row: row_idx,
                            col: col_idx,
                        })?;
                row.push(value);
            }
            row_labels.push(label);
            values.push(row);
        }

        if row_labels.len() != n {
            return Err(OrdistatError::NotSquare {
                rows: row_labels.len(),
                cols: n,
            });
        }
        check_unique(&row_labels)?;
        check_unique(&col_labels)?;

        // Row and column label sets must coincide; columns are then brought
        // into the row order so both axes match exactly.
        let col_index: HashMap<&str, usize> = col_labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        for label in &row_labels {
            if !col_index.contains_key(label.as_str()) {
                return Err(OrdistatError::LabelMismatch(format!(
                    "row label '{}' is absent from the header",
                    label
                )));
            }
        }

        let mut data = DMatrix::zeros(n, n);
        for (i, row) in values.iter().enumerate() {
            for (j, label) in row_labels.iter().enumerate() {
                data[(i, j)] = row[col_index[label.as_str()]];
            }
        }

        Self::new(data, row_labels)
    }

    /// Build a Euclidean distance matrix from per-sample points.
    ///
    /// Each entry of `points` is one sample's coordinate vector; all vectors
    /// must have the same length.
    pub fn euclidean(sample_ids: Vec<String>, points: &[Vec<f64>]) -> Result<Self> {
        if points.len() != sample_ids.len() {
            return Err(OrdistatError::LabelMismatch(format!(
                "{} labels for {} points",
                sample_ids.len(),
                points.len()
            )));
        }
        let n = points.len();
        let mut data = DMatrix::zeros(n, n);
        for i in 0..n {
            for j in (i + 1)..n {
                let d: f64 = points[i]
                    .iter()
                    .zip(points[j].iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>()
                    .sqrt();
                data[(i, j)] = d;
                data[(j, i)] = d;
            }
        }
        Self::new(data, sample_ids)
    }

    /// Reindex to an ordered subset of sample IDs, slicing rows and columns
    /// identically.
    pub fn subset(&self, sample_ids: &[String]) -> Result<Self> {
        let index: HashMap<&str, usize> = self
            .sample_ids
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let mut positions = Vec::with_capacity(sample_ids.len());
        for id in sample_ids {
            let pos = index.get(id.as_str()).ok_or_else(|| {
                OrdistatError::SampleMismatch(format!(
                    "Sample '{}' not found in dissimilarity matrix",
                    id
                ))
            })?;
            positions.push(*pos);
        }

        let n = positions.len();
        let mut data = DMatrix::zeros(n, n);
        for (i, &pi) in positions.iter().enumerate() {
            for (j, &pj) in positions.iter().enumerate() {
                data[(i, j)] = self.data[(pi, pj)];
            }
        }

        Self::new(data, sample_ids.to_vec())
    }

    /// Dissimilarity between samples `i` and `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[(i, j)]
    }

    /// Number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// The underlying dense matrix.
    #[inline]
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Upper-triangle entries (i < j) in row-major pair order.
    pub fn condensed(&self) -> Vec<f64> {
        let n = self.n_samples();
        if n < 2 {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                out.push(self.data[(i, j)]);
            }
        }
        out
    }
}

/// Choose tab when the header contains one, comma otherwise.
fn sniff_delimiter(header_line: &str) -> u8 {
    if header_line.contains('\t') {
        b'\t'
    } else {
        b','
    }
}

fn check_unique(labels: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(OrdistatError::DuplicateSample(label.clone()));
        }
    }
    Ok(())
}
