//! Chunk partitioning of the feature set.
//!
//! A run over thousands of features is split into `total_chunks` ordered,
//! disjoint chunks identified by a 1-based chunk number; each worker
//! invocation processes exactly one chunk. The union of all chunks under a
//! fixed chunk count covers every feature exactly once.

use crate::data::CountMatrix;
use crate::error::{DaaError, Result};

/// One feature's fit inputs within a chunk.
///
/// `index` is the feature's ordinal position in the full feature set, used
/// for deterministic artifact naming; it is not the position within the
/// chunk.
#[derive(Debug, Clone)]
pub struct FeatureEntry {
    pub feature_id: String,
    pub index: usize,
    pub counts: Vec<u64>,
}

/// An ordered subset of the feature set assigned to one worker invocation.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 1-based chunk number.
    pub number: usize,
    /// Total number of chunks in the run.
    pub total: usize,
    pub entries: Vec<FeatureEntry>,
}

impl Chunk {
    /// Feature ids in chunk order.
    pub fn feature_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.feature_id.as_str())
    }

    /// Number of features in this chunk.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the chunk is empty (possible when chunks outnumber features).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Half-open feature index range `[start, end)` for one chunk.
///
/// Chunks are contiguous and balanced: the first `n % total` chunks get one
/// extra feature. For any fixed `total_chunks` the ranges tile `[0, n)`
/// exactly once.
pub fn chunk_bounds(
    n_features: usize,
    total_chunks: usize,
    chunk_num: usize,
) -> Result<(usize, usize)> {
    if total_chunks == 0 {
        return Err(DaaError::InvalidParameter(
            "total_chunks must be at least 1".to_string(),
        ));
    }
    if chunk_num < 1 || chunk_num > total_chunks {
        return Err(DaaError::InvalidChunk {
            chunk: chunk_num,
            total: total_chunks,
        });
    }

    let base = n_features / total_chunks;
    let rem = n_features % total_chunks;
    let i = chunk_num - 1;
    let start = i * base + i.min(rem);
    let end = start + base + usize::from(i < rem);
    Ok((start, end))
}

/// Build one chunk's fit inputs from the count matrix.
pub fn partition_chunk(
    counts: &CountMatrix,
    total_chunks: usize,
    chunk_num: usize,
) -> Result<Chunk> {
    let (start, end) = chunk_bounds(counts.n_features(), total_chunks, chunk_num)?;

    let entries = (start..end)
        .map(|index| FeatureEntry {
            feature_id: counts.feature_ids()[index].clone(),
            index,
            counts: counts.feature_counts(index),
        })
        .collect();

    Ok(Chunk {
        number: chunk_num,
        total: total_chunks,
        entries,
    })
}
