//! Alignment of a dissimilarity matrix with sample metadata.

use crate::data::{DissimilarityMatrix, Metadata};
use crate::error::{OrdistatError, Result};
use log::info;

/// A dissimilarity matrix and metadata table sharing one ordered sample
/// sequence.
#[derive(Debug, Clone)]
pub struct AlignedData {
    distances: DissimilarityMatrix,
    metadata: Metadata,
}

impl AlignedData {
    /// The aligned dissimilarity matrix.
    pub fn distances(&self) -> &DissimilarityMatrix {
        &self.distances
    }

    /// The aligned metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The shared sample ordering.
    pub fn sample_ids(&self) -> &[String] {
        self.distances.sample_ids()
    }

    /// Number of aligned samples.
    pub fn n_samples(&self) -> usize {
        self.distances.n_samples()
    }
}

/// Align a dissimilarity matrix with a metadata table on their common
/// samples.
///
/// The common sequence is the intersection of the two ID sets in the
/// dissimilarity matrix's original label order; the metadata's row order
/// never influences it. Both structures are reindexed to exactly that
/// sequence. An empty intersection is a fatal error.
pub fn align(distances: &DissimilarityMatrix, metadata: &Metadata) -> Result<AlignedData> {
    let common: Vec<String> = distances
        .sample_ids()
        .iter()
        .filter(|id| metadata.has_sample(id))
        .cloned()
        .collect();

    if common.is_empty() {
        return Err(OrdistatError::EmptyData(
            "No samples shared between dissimilarity matrix and metadata".to_string(),
        ));
    }
    info!(
        "Aligned {} of {} dissimilarity samples with metadata",
        common.len(),
        distances.n_samples()
    );

    Ok(AlignedData {
        distances: distances.subset(&common)?,
        metadata: metadata.subset_samples(&common)?,
    })
}
