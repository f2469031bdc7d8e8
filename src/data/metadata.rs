//! Sample metadata handling.

use crate::error::{DaaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A metadata value: categorical string level, continuous number, or missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    Categorical(String),
    Continuous(f64),
    Missing,
}

impl Variable {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    /// Try to get as categorical string.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as continuous f64.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            _ => None,
        }
    }
}

/// Per-sample metadata loaded from a TSV file.
///
/// Column types are inferred at load: a column where every non-missing value
/// parses as a number is continuous, anything else categorical. Empty cells
/// and "NA"/"NaN" are missing.
#[derive(Debug, Clone)]
pub struct Metadata {
    sample_ids: Vec<String>,
    column_names: Vec<String>,
    /// column name -> values in sample order.
    columns: HashMap<String, Vec<Variable>>,
}

impl Metadata {
    /// Load metadata from a TSV file.
    ///
    /// First row is a header (first column is the sample ID header);
    /// subsequent rows are sample ID followed by values.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| DaaError::EmptyData("Empty metadata file".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.len() < 2 {
            return Err(DaaError::EmptyData(
                "Metadata must have at least one variable column".to_string(),
            ));
        }
        let column_names: Vec<String> = header[1..].iter().map(|s| s.to_string()).collect();

        let mut sample_ids = Vec::new();
        let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); column_names.len()];

        for line_result in lines {
            let line = line_result?;
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            sample_ids.push(fields[0].to_string());
            for (i, raw) in raw_columns.iter_mut().enumerate() {
                raw.push(fields.get(i + 1).unwrap_or(&"").to_string());
            }
        }

        if sample_ids.is_empty() {
            return Err(DaaError::EmptyData("No samples in metadata".to_string()));
        }

        let mut columns = HashMap::new();
        for (name, raw) in column_names.iter().zip(raw_columns) {
            columns.insert(name.clone(), infer_column(&raw));
        }

        Ok(Self {
            sample_ids,
            column_names,
            columns,
        })
    }

    /// Sample IDs in file order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Column names in file order.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Values for a column, in sample order.
    pub fn column(&self, name: &str) -> Result<&[Variable]> {
        self.columns
            .get(name)
            .map(|v| v.as_slice())
            .ok_or_else(|| DaaError::MissingColumn(name.to_string()))
    }

    /// Whether a column is continuous (inferred at load).
    pub fn is_continuous(&self, name: &str) -> Result<bool> {
        let values = self.column(name)?;
        Ok(values
            .iter()
            .all(|v| !matches!(v, Variable::Categorical(_))))
    }

    /// Sorted distinct levels of a categorical column.
    pub fn levels(&self, name: &str) -> Result<Vec<String>> {
        let values = self.column(name)?;
        let set: BTreeSet<String> = values
            .iter()
            .filter_map(|v| v.as_categorical().map(|s| s.to_string()))
            .collect();
        Ok(set.into_iter().collect())
    }

    /// Reorder samples to match the given ID order.
    ///
    /// Metadata rows must line up with count matrix columns before design
    /// matrix construction; an unknown ID is an error.
    pub fn align_to(&self, sample_ids: &[String]) -> Result<Self> {
        let index: HashMap<&str, usize> = self
            .sample_ids
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();

        let mut order = Vec::with_capacity(sample_ids.len());
        for id in sample_ids {
            let &i = index.get(id.as_str()).ok_or_else(|| {
                DaaError::InvalidParameter(format!("Sample '{}' not in metadata", id))
            })?;
            order.push(i);
        }

        let mut columns = HashMap::new();
        for (name, values) in &self.columns {
            columns.insert(
                name.clone(),
                order.iter().map(|&i| values[i].clone()).collect(),
            );
        }

        Ok(Self {
            sample_ids: sample_ids.to_vec(),
            column_names: self.column_names.clone(),
            columns,
        })
    }
}

fn infer_column(raw: &[String]) -> Vec<Variable> {
    let numeric = raw
        .iter()
        .filter(|s| !is_missing(s))
        .all(|s| s.trim().parse::<f64>().is_ok());

    raw.iter()
        .map(|s| {
            if is_missing(s) {
                Variable::Missing
            } else if numeric {
                Variable::Continuous(s.trim().parse().unwrap_or(f64::NAN))
            } else {
                Variable::Categorical(s.trim().to_string())
            }
        })
        .collect()
}

fn is_missing(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t.eq_ignore_ascii_case("na") || t.eq_ignore_ascii_case("nan")
}
