//! Flat index space over an ordered list of sub-datasets
//!
//! Sub-dataset `k` owns the half-open range `[end(k-1), end(k))` of the flat
//! index space. Resolution binary-searches the precomputed range ends; for
//! empty sub-datasets `end(k-1) == end(k)`, so they never match and the first
//! range containing an index wins, exactly as a linear scan would.

use crate::error::{DatasetError, Result};

/// Position of a flat index inside the sub-dataset list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedIndex {
    pub ordinal: usize,
    pub local: usize,
}

#[derive(Debug, Clone)]
pub struct IndexResolver {
    lengths: Vec<usize>,
    ends: Vec<usize>,
}

impl IndexResolver {
    /// Precompute cumulative range ends. Fails if there is nothing to index.
    pub fn build(lengths: Vec<usize>) -> Result<Self> {
        let ends: Vec<usize> = lengths
            .iter()
            .scan(0usize, |total, &len| {
                *total += len;
                Some(*total)
            })
            .collect();

        if ends.last().copied().unwrap_or(0) == 0 {
            return Err(DatasetError::EmptyDataset(format!(
                "{} sub-dataset(s) provide no windows",
                lengths.len()
            )));
        }

        Ok(Self { lengths, ends })
    }

    pub fn total(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// First index of sub-dataset `ordinal`
    pub fn start_of(&self, ordinal: usize) -> usize {
        if ordinal == 0 {
            0
        } else {
            self.ends[ordinal - 1]
        }
    }

    /// Map `0 <= index < total()` to (sub-dataset, local index)
    pub fn resolve(&self, index: usize) -> Result<ResolvedIndex> {
        let ordinal = self.ends.partition_point(|&end| end <= index);
        if ordinal >= self.ends.len() {
            return Err(DatasetError::InvariantViolation(format!(
                "index {} matches no sub-dataset range (total {})",
                index,
                self.total()
            )));
        }
        Ok(ResolvedIndex {
            ordinal,
            local: index - self.start_of(ordinal),
        })
    }
}
