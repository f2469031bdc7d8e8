//! Design matrix construction from metadata and a formula.

use crate::data::{Formula, Metadata, Term, Variable};
use crate::error::{DaaError, Result};
use nalgebra::DMatrix;
use std::collections::HashMap;

/// A design matrix for per-feature regression.
///
/// Rows are samples, columns are covariates. Categorical variables are
/// dummy-coded against a reference level (the alphabetically first), with
/// patsy-style column names like `group[T.treatment]`, which downstream
/// summary tables and selections carry through unchanged.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    matrix: DMatrix<f64>,
    covariate_names: Vec<String>,
    sample_ids: Vec<String>,
    reference_levels: HashMap<String, String>,
}

impl DesignMatrix {
    /// Build a design matrix from metadata and a parsed formula.
    pub fn from_formula(metadata: &Metadata, formula: &Formula) -> Result<Self> {
        for var in formula.variables() {
            if !metadata.has_column(var) {
                return Err(DaaError::MissingColumn(var.to_string()));
            }
        }

        let sample_ids = metadata.sample_ids().to_vec();
        let n_samples = sample_ids.len();

        let mut reference_levels = HashMap::new();
        for var in formula.variables() {
            if !metadata.is_continuous(var)? {
                let levels = metadata.levels(var)?;
                if let Some(first) = levels.first() {
                    reference_levels.insert(var.to_string(), first.clone());
                }
            }
        }

        let mut covariate_names = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();

        if formula.intercept {
            covariate_names.push("Intercept".to_string());
            columns.push(vec![1.0; n_samples]);
        }

        for term in &formula.terms {
            let (names, cols) = match term {
                Term::Main(var) => expand_main(metadata, var, formula.intercept)?,
                Term::Interaction(a, b) => {
                    let (a_names, a_cols) = expand_main(metadata, a, formula.intercept)?;
                    let (b_names, b_cols) = expand_main(metadata, b, formula.intercept)?;
                    let mut names = Vec::new();
                    let mut cols = Vec::new();
                    for (an, ac) in a_names.iter().zip(&a_cols) {
                        for (bn, bc) in b_names.iter().zip(&b_cols) {
                            names.push(format!("{}:{}", an, bn));
                            cols.push(ac.iter().zip(bc).map(|(x, y)| x * y).collect());
                        }
                    }
                    (names, cols)
                }
            };
            covariate_names.extend(names);
            columns.extend(cols);
        }

        let matrix = DMatrix::from_fn(n_samples, columns.len(), |r, c| columns[c][r]);

        Ok(Self {
            matrix,
            covariate_names,
            sample_ids,
            reference_levels,
        })
    }

    /// The design matrix (samples x covariates).
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Covariate (column) names.
    pub fn covariate_names(&self) -> &[String] {
        &self.covariate_names
    }

    /// Sample IDs (row order).
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Reference level used for a categorical variable, if any.
    pub fn reference_level(&self, var: &str) -> Option<&str> {
        self.reference_levels.get(var).map(|s| s.as_str())
    }

    /// Number of covariates.
    pub fn n_covariates(&self) -> usize {
        self.matrix.ncols()
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.matrix.nrows()
    }
}

/// Columns for one main effect.
///
/// Continuous: a single column of values. Categorical: one dummy column per
/// level, skipping the reference level when the model has an intercept.
fn expand_main(
    metadata: &Metadata,
    var: &str,
    intercept: bool,
) -> Result<(Vec<String>, Vec<Vec<f64>>)> {
    let values = metadata.column(var)?;

    if metadata.is_continuous(var)? {
        let mut col = Vec::with_capacity(values.len());
        for v in values {
            match v {
                Variable::Continuous(x) => col.push(*x),
                _ => {
                    return Err(DaaError::InvalidParameter(format!(
                        "Missing value in continuous variable '{}'",
                        var
                    )))
                }
            }
        }
        return Ok((vec![var.to_string()], vec![col]));
    }

    let levels = metadata.levels(var)?;
    let mut names = Vec::new();
    let mut cols = Vec::new();
    for (i, level) in levels.iter().enumerate() {
        // First (reference) level is absorbed by the intercept.
        if intercept && i == 0 {
            continue;
        }
        names.push(format!("{}[T.{}]", var, level));
        cols.push(
            values
                .iter()
                .map(|v| match v.as_categorical() {
                    Some(s) if s == level => 1.0,
                    _ => 0.0,
                })
                .collect(),
        );
    }
    Ok((names, cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_metadata() -> Metadata {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sample_id\tgroup\tage").unwrap();
        writeln!(file, "S1\tcontrol\t25").unwrap();
        writeln!(file, "S2\ttreatment\t31").unwrap();
        writeln!(file, "S3\tcontrol\t28").unwrap();
        writeln!(file, "S4\ttreatment\t22").unwrap();
        file.flush().unwrap();
        Metadata::from_tsv(file.path()).unwrap()
    }

    #[test]
    fn test_intercept_and_dummy_coding() {
        let md = create_test_metadata();
        let f = Formula::parse("~ group").unwrap();
        let design = DesignMatrix::from_formula(&md, &f).unwrap();

        assert_eq!(
            design.covariate_names(),
            &["Intercept", "group[T.treatment]"]
        );
        assert_eq!(design.reference_level("group"), Some("control"));
        let m = design.matrix();
        assert_eq!(m.nrows(), 4);
        assert_eq!(m[(0, 0)], 1.0);
        assert_eq!(m[(0, 1)], 0.0);
        assert_eq!(m[(1, 1)], 1.0);
    }

    #[test]
    fn test_continuous_column() {
        let md = create_test_metadata();
        let f = Formula::parse("~ age").unwrap();
        let design = DesignMatrix::from_formula(&md, &f).unwrap();

        assert_eq!(design.covariate_names(), &["Intercept", "age"]);
        assert_eq!(design.matrix()[(1, 1)], 31.0);
    }

    #[test]
    fn test_no_intercept_keeps_all_levels() {
        let md = create_test_metadata();
        let f = Formula::parse("~ 0 + group").unwrap();
        let design = DesignMatrix::from_formula(&md, &f).unwrap();

        assert_eq!(
            design.covariate_names(),
            &["group[T.control]", "group[T.treatment]"]
        );
        // Each sample is in exactly one level.
        for r in 0..4 {
            let row_sum: f64 = (0..2).map(|c| design.matrix()[(r, c)]).sum();
            assert_eq!(row_sum, 1.0);
        }
    }

    #[test]
    fn test_interaction_columns() {
        let md = create_test_metadata();
        let f = Formula::parse("~ group:age").unwrap();
        let design = DesignMatrix::from_formula(&md, &f).unwrap();

        assert_eq!(
            design.covariate_names(),
            &["Intercept", "group[T.treatment]:age"]
        );
        assert_eq!(design.matrix()[(1, 1)], 31.0);
        assert_eq!(design.matrix()[(0, 1)], 0.0);
    }

    #[test]
    fn test_missing_variable_rejected() {
        let md = create_test_metadata();
        let f = Formula::parse("~ nope").unwrap();
        assert!(matches!(
            DesignMatrix::from_formula(&md, &f),
            Err(DaaError::MissingColumn(_))
        ));
    }
}
