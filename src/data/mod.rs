//! Data structures for ordination and association analysis.

mod align;
mod dissimilarity;
mod merged;
mod metadata;

pub use align::{align, AlignedData};
pub use dissimilarity::DissimilarityMatrix;
pub use merged::{MergedRow, MergedTable};
pub use metadata::{MetaValue, Metadata};
