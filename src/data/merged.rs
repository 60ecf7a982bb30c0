//! Merged ordination-coordinate + metadata table.

use crate::data::{MetaValue, Metadata};
use crate::error::{OrdistatError, Result};
use crate::ordination::OrdinationResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One merged row: a sample's ordination coordinates plus its metadata
/// record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedRow {
    /// Sample identifier.
    pub sample_id: String,
    /// Coordinates, parallel to the table's axis names.
    pub coordinates: Vec<f64>,
    /// Metadata values, parallel to the table's column names.
    pub values: Vec<MetaValue>,
}

/// One row per aligned sample: SampleID, every ordination axis, every
/// metadata variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedTable {
    /// Ordination axis names (`PC1..`).
    pub axis_names: Vec<String>,
    /// Metadata variable names.
    pub column_names: Vec<String>,
    /// Rows in the aligned sample order.
    pub rows: Vec<MergedRow>,
}

impl MergedTable {
    /// Join ordination coordinates with aligned metadata on their shared
    /// sample ordering.
    pub fn merge(ordination: &OrdinationResult, metadata: &Metadata) -> Result<Self> {
        if ordination.sample_ids() != metadata.sample_ids() {
            return Err(OrdistatError::SampleMismatch(
                "Ordination and metadata sample orders differ".to_string(),
            ));
        }

        let column_names = metadata.column_names().to_vec();
        let rows = ordination
            .sample_ids()
            .iter()
            .enumerate()
            .map(|(i, sid)| MergedRow {
                sample_id: sid.clone(),
                coordinates: ordination.sample_coordinates(i),
                values: column_names
                    .iter()
                    .map(|col| {
                        metadata
                            .get(sid, col)
                            .cloned()
                            .unwrap_or(MetaValue::Missing)
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            axis_names: ordination.axis_names().to_vec(),
            column_names,
            rows,
        })
    }

    /// Number of rows.
    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    /// Position of an axis by name.
    pub fn axis_index(&self, axis_name: &str) -> Option<usize> {
        self.axis_names.iter().position(|n| n == axis_name)
    }

    /// Position of a metadata variable by name.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.column_names.iter().position(|n| n == column)
    }

    /// The row for a sample ID, if present.
    pub fn row_by_id(&self, sample_id: &str) -> Option<&MergedRow> {
        self.rows.iter().find(|r| r.sample_id == sample_id)
    }

    /// Values of one metadata variable across all rows.
    pub fn variable_values(&self, column: &str) -> Result<Vec<&MetaValue>> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| OrdistatError::MissingColumn(column.to_string()))?;
        Ok(self.rows.iter().map(|r| &r.values[idx]).collect())
    }

    /// Drop rows whose value for the named variable is missing.
    pub fn filter_variable(&self, column: &str) -> Result<Self> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| OrdistatError::MissingColumn(column.to_string()))?;
        Ok(Self {
            axis_names: self.axis_names.clone(),
            column_names: self.column_names.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| !r.values[idx].is_missing())
                .cloned()
                .collect(),
        })
    }

    /// Restrict to the given sample IDs, in the given order.
    pub fn subset(&self, sample_ids: &[String]) -> Result<Self> {
        let rows = sample_ids
            .iter()
            .map(|sid| {
                self.row_by_id(sid).cloned().ok_or_else(|| {
                    OrdistatError::SampleMismatch(format!(
                        "Sample '{}' not found in merged table",
                        sid
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            axis_names: self.axis_names.clone(),
            column_names: self.column_names.clone(),
            rows,
        })
    }

    /// Negate one axis column, for display orientation only. Statistics are
    /// computed before flips and never consume flipped values.
    pub fn flip_axis(&mut self, axis_name: &str) -> Result<()> {
        let idx = self
            .axis_index(axis_name)
            .ok_or_else(|| OrdistatError::InvalidParameter(format!(
                "Unknown ordination axis '{}'",
                axis_name
            )))?;
        for row in &mut self.rows {
            row.coordinates[idx] = -row.coordinates[idx];
        }
        Ok(())
    }

    /// Write the table as TSV.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "SampleID")?;
        for axis in &self.axis_names {
            write!(writer, "\t{}", axis)?;
        }
        for col in &self.column_names {
            write!(writer, "\t{}", col)?;
        }
        writeln!(writer)?;

        for row in &self.rows {
            write!(writer, "{}", row.sample_id)?;
            for value in &row.coordinates {
                write!(writer, "\t{}", value)?;
            }
            for value in &row.values {
                write!(writer, "\t{}", value.as_text().unwrap_or(""))?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }
}
