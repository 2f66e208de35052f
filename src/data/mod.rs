//! Count data containers.
//!
//! A [`CountMatrix`] holds the count vectors of one region, one column per
//! sample. Columns are looked up by sample ID; their order is the order the
//! samples were declared in.

use indexmap::IndexMap;

use crate::error::MobamplotError;
use crate::ranges::Roi;

pub mod binning;
pub mod operations;

/// The per-region table of count vectors, keyed by sample ID.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CountMatrix {
    columns: IndexMap<String, Vec<u32>>,
    nrows: usize,
}

impl CountMatrix {
    /// Bind the count vectors of `roi` to their sample IDs.
    ///
    /// # Errors
    /// Fails if the number of IDs and vectors differ, if an ID occurs
    /// twice, or if a vector's length is not [`Roi::spliced_length()`].
    pub fn from_vectors(
        roi: &Roi,
        sample_ids: &[String],
        vectors: Vec<Vec<u32>>,
    ) -> Result<Self, MobamplotError> {
        if sample_ids.len() != vectors.len() {
            return Err(MobamplotError::SampleCountMismatch {
                ids: sample_ids.len(),
                bams: vectors.len(),
            });
        }
        let nrows = roi.spliced_length();
        let mut columns = IndexMap::with_capacity(vectors.len());
        for (id, vector) in sample_ids.iter().zip(vectors) {
            if vector.len() != nrows {
                return Err(MobamplotError::RaggedCountMatrix {
                    roi: roi.name.clone(),
                    sample: id.clone(),
                    expected: nrows,
                    found: vector.len(),
                });
            }
            if columns.insert(id.clone(), vector).is_some() {
                return Err(MobamplotError::DuplicateSampleId(id.clone()));
            }
        }
        Ok(Self { columns, nrows })
    }

    /// Build a matrix from named columns that are already known to have `nrows` rows.
    pub(crate) fn from_columns(columns: IndexMap<String, Vec<u32>>, nrows: usize) -> Self {
        Self { columns, nrows }
    }

    pub fn column(&self, sample_id: &str) -> Option<&[u32]> {
        self.columns.get(sample_id).map(|v| v.as_slice())
    }

    pub fn sample_ids(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    /// Number of positions (rows).
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of samples (columns).
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Iterate over `(sample ID, count vector)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// The largest count in any column, `0` for an empty matrix.
    pub fn max_count(&self) -> u32 {
        self.columns
            .values()
            .flat_map(|v| v.iter().copied())
            .max()
            .unwrap_or(0)
    }
}
