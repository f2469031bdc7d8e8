//! Sparse feature-by-sample count matrix.

use crate::error::{DaaError, Result};
use sprs::{CsMat, TriMat};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A sparse count matrix of feature abundances across samples.
///
/// Rows are features (taxa/genes), columns are samples. Stored as CSR for
/// cheap per-feature row extraction, which is the access pattern of the
/// per-feature fit loop.
#[derive(Debug, Clone)]
pub struct CountMatrix {
    data: CsMat<u64>,
    feature_ids: Vec<String>,
    sample_ids: Vec<String>,
}

impl CountMatrix {
    /// Create a new CountMatrix from a sparse matrix and identifiers.
    pub fn new(
        data: CsMat<u64>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != feature_ids.len() {
            return Err(DaaError::DimensionMismatch {
                expected: nrows,
                actual: feature_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(DaaError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        Ok(Self {
            data,
            feature_ids,
            sample_ids,
        })
    }

    /// Load a count matrix from a TSV file.
    ///
    /// First row is a header with sample IDs (first column is the feature ID
    /// header); subsequent rows are feature ID followed by counts.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| DaaError::EmptyData("Empty TSV file".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.len() < 2 {
            return Err(DaaError::EmptyData(
                "TSV must have at least one sample".to_string(),
            ));
        }
        let sample_ids: Vec<String> = header[1..].iter().map(|s| s.to_string()).collect();
        let n_samples = sample_ids.len();

        let mut triplets: Vec<(usize, usize, u64)> = Vec::new();
        let mut feature_ids: Vec<String> = Vec::new();

        for line_result in lines {
            let line = line_result?;
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            // Row index follows accepted features, not file lines, so blank
            // lines never shift counts onto the wrong feature.
            let row_idx = feature_ids.len();
            feature_ids.push(fields[0].to_string());

            for (col_idx, value_str) in fields[1..].iter().enumerate().take(n_samples) {
                let value: u64 = value_str.trim().parse().map_err(|_| DaaError::InvalidCount {
                    value: value_str.to_string(),
                    row: row_idx,
                    col: col_idx,
                })?;
                if value > 0 {
                    triplets.push((row_idx, col_idx, value));
                }
            }
        }

        if feature_ids.is_empty() {
            return Err(DaaError::EmptyData("No features in TSV".to_string()));
        }

        let mut tri_mat = TriMat::new((feature_ids.len(), n_samples));
        for (row, col, val) in triplets {
            tri_mat.add_triplet(row, col, val);
        }

        Self::new(tri_mat.to_csr(), feature_ids, sample_ids)
    }

    /// Get the value at (row, col), returning 0 for missing entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.data.get(row, col).copied().unwrap_or(0)
    }

    /// Number of features (rows).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.rows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.cols()
    }

    /// Feature identifiers.
    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Dense counts for one feature across all samples.
    pub fn feature_counts(&self, row: usize) -> Vec<u64> {
        let mut dense = vec![0u64; self.n_samples()];
        if let Some(row_vec) = self.data.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                dense[col] = val;
            }
        }
        dense
    }

    /// Library sizes (total counts per sample).
    pub fn library_sizes(&self) -> Vec<u64> {
        let mut sums = vec![0u64; self.n_samples()];
        for row_vec in self.data.outer_iterator() {
            for (col, &val) in row_vec.iter() {
                sums[col] += val;
            }
        }
        sums
    }

    /// Log sequencing depth per sample, the per-feature model offset.
    ///
    /// Matches `log(table.sum(axis="sample"))`; a zero-depth sample yields
    /// `-inf`, which is left to the sampler to reject.
    pub fn log_depths(&self) -> Vec<f64> {
        self.library_sizes()
            .into_iter()
            .map(|s| (s as f64).ln())
            .collect()
    }
}
