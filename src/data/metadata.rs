//! Sample metadata handling.

use crate::error::{OrdistatError, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use csv::ReaderBuilder;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// A raw metadata cell.
///
/// Values stay as trimmed strings until a downstream step explicitly asks
/// for a numeric reinterpretation; blank cells are `Missing` from the start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaValue {
    /// Non-blank raw value.
    Text(String),
    /// Absent or blank cell.
    Missing,
}

impl MetaValue {
    /// Build from a raw cell, mapping blank-after-trim to `Missing`.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            MetaValue::Missing
        } else {
            MetaValue::Text(trimmed.to_string())
        }
    }

    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, MetaValue::Missing)
    }

    /// The raw text, if present.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            MetaValue::Missing => None,
        }
    }

    /// Explicit numeric coercion; `None` marks a non-numeric value.
    pub fn to_numeric(&self) -> Option<f64> {
        self.as_text().and_then(|s| s.parse::<f64>().ok())
    }
}

/// Sample metadata: one record of named string variables per sample.
///
/// The first column of the input file, whatever its header, is treated as
/// the sample ID and trimmed the same way as dissimilarity labels.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Sample IDs in file order.
    sample_ids: Vec<String>,
    /// Variable column names.
    column_names: Vec<String>,
    /// Data stored as sample_id -> column_name -> value.
    data: HashMap<String, HashMap<String, MetaValue>>,
}

impl Metadata {
    /// Load metadata, dispatching on the file extension: `.xlsx` is read as
    /// a spreadsheet (first worksheet), anything else as delimited text with
    /// a sniffed tab/comma delimiter.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading metadata from {}", path.display());
        let is_xlsx = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("xlsx"))
            .unwrap_or(false);
        if is_xlsx {
            Self::from_xlsx(path)
        } else {
            let raw = fs::read_to_string(path)?;
            Self::from_delimited_str(&raw)
        }
    }

    /// Parse delimited metadata text held in memory.
    pub fn from_delimited_str(raw: &str) -> Result<Self> {
        let header_line = raw
            .lines()
            .next()
            .ok_or_else(|| OrdistatError::EmptyData("Empty metadata file".to_string()))?;
        let delimiter = if header_line.contains('\t') { b'\t' } else { b',' };

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(raw.as_bytes());

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            let fields: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            if fields.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            rows.push(fields);
        }

        Self::from_rows(rows)
    }

    /// Read the first worksheet of an xlsx workbook.
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| OrdistatError::EmptyData("Workbook has no worksheets".to_string()))??;

        let mut rows: Vec<Vec<String>> = Vec::new();
        for row in range.rows() {
            let fields: Vec<String> = row.iter().map(cell_text).collect();
            if fields.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            rows.push(fields);
        }

        Self::from_rows(rows)
    }

    /// Build from header + data rows of raw strings.
    fn from_rows(rows: Vec<Vec<String>>) -> Result<Self> {
        let mut iter = rows.into_iter();
        let header = iter
            .next()
            .ok_or_else(|| OrdistatError::EmptyData("Empty metadata file".to_string()))?;
        if header.len() < 2 {
            return Err(OrdistatError::EmptyData(
                "Metadata must have at least one variable column".to_string(),
            ));
        }
        // The first header cell is ignored: that column is the sample ID.
        let column_names: Vec<String> =
            header[1..].iter().map(|s| s.trim().to_string()).collect();

        let mut sample_ids: Vec<String> = Vec::new();
        let mut data: HashMap<String, HashMap<String, MetaValue>> = HashMap::new();
        let mut seen: HashSet<String> = HashSet::new();

        for fields in iter {
            let sample_id = fields
                .first()
                .map(|s| s.trim().to_string())
                .unwrap_or_default();
            if !seen.insert(sample_id.clone()) {
                return Err(OrdistatError::DuplicateSample(sample_id));
            }

            let mut record = HashMap::new();
            for (idx, name) in column_names.iter().enumerate() {
                let value = fields
                    .get(idx + 1)
                    .map(|raw| MetaValue::from_raw(raw))
                    .unwrap_or(MetaValue::Missing);
                record.insert(name.clone(), value);
            }
            sample_ids.push(sample_id.clone());
            data.insert(sample_id, record);
        }

        if sample_ids.is_empty() {
            return Err(OrdistatError::EmptyData(
                "No samples in metadata".to_string(),
            ));
        }

        Ok(Self {
            sample_ids,
            column_names,
            data,
        })
    }

    /// Sample IDs in order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Variable column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Get a value for a specific sample and column.
    pub fn get(&self, sample_id: &str, column: &str) -> Option<&MetaValue> {
        self.data.get(sample_id).and_then(|m| m.get(column))
    }

    /// Check if a sample exists.
    pub fn has_sample(&self, sample_id: &str) -> bool {
        self.data.contains_key(sample_id)
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Subset metadata to the given samples, in the given order.
    pub fn subset_samples(&self, sample_ids: &[String]) -> Result<Self> {
        let mut new_data = HashMap::new();
        let mut new_sample_ids = Vec::with_capacity(sample_ids.len());

        for sid in sample_ids {
            match self.data.get(sid) {
                Some(record) => {
                    new_data.insert(sid.clone(), record.clone());
                    new_sample_ids.push(sid.clone());
                }
                None => {
                    return Err(OrdistatError::SampleMismatch(format!(
                        "Sample '{}' not found in metadata",
                        sid
                    )))
                }
            }
        }

        Ok(Self {
            sample_ids: new_sample_ids,
            column_names: self.column_names.clone(),
            data: new_data,
        })
    }
}

/// Render a spreadsheet cell as the raw string pandas-style readers expose.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
