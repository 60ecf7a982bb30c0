//! Ordination of dissimilarity matrices.

mod pcoa;

pub use pcoa::{pcoa, OrdinationResult};
