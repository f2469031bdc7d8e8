//! R-style formula parsing for model specification.

use crate::error::{DaaError, Result};
use serde::{Deserialize, Serialize};

/// A term in a formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    /// Main effect of a variable.
    Main(String),
    /// Interaction between two variables.
    Interaction(String, String),
}

impl Term {
    /// Variable names involved in this term.
    pub fn variables(&self) -> Vec<&str> {
        match self {
            Term::Main(v) => vec![v.as_str()],
            Term::Interaction(v1, v2) => vec![v1.as_str(), v2.as_str()],
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Main(v) => write!(f, "{}", v),
            Term::Interaction(v1, v2) => write!(f, "{}:{}", v1, v2),
        }
    }
}

/// A parsed model formula.
///
/// Supports R-style syntax:
/// - `~ group` - intercept + group
/// - `~ group + age` - intercept + group + age
/// - `~ group * age` - intercept + group + age + group:age
/// - `~ 0 + group` - no intercept, group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    /// Whether to include an intercept.
    pub intercept: bool,
    /// Terms in the formula (excluding intercept).
    pub terms: Vec<Term>,
    /// Original formula string.
    pub formula_str: String,
}

impl Formula {
    /// Parse a formula string.
    pub fn parse(formula: &str) -> Result<Self> {
        let formula_str = formula.to_string();
        let formula = formula.trim();

        let rhs = formula
            .strip_prefix('~')
            .ok_or_else(|| DaaError::FormulaParse("Formula must start with '~'".to_string()))?
            .trim();
        if rhs.is_empty() {
            return Err(DaaError::FormulaParse(
                "Formula right-hand side is empty".to_string(),
            ));
        }

        let mut intercept = true;
        let mut terms = Vec::new();

        for part in rhs.split('+').map(str::trim) {
            if part.is_empty() {
                return Err(DaaError::FormulaParse(format!(
                    "Empty term in formula '{}'",
                    formula_str
                )));
            }
            match part {
                "0" | "-1" => intercept = false,
                "1" => {}
                _ if part.contains('*') => {
                    let (a, b) = split_pair(part, '*', &formula_str)?;
                    terms.push(Term::Main(a.clone()));
                    terms.push(Term::Main(b.clone()));
                    terms.push(Term::Interaction(a, b));
                }
                _ if part.contains(':') => {
                    let (a, b) = split_pair(part, ':', &formula_str)?;
                    terms.push(Term::Interaction(a, b));
                }
                _ => terms.push(Term::Main(part.to_string())),
            }
        }

        if terms.is_empty() {
            return Err(DaaError::FormulaParse(
                "Formula must have at least one term".to_string(),
            ));
        }

        Ok(Self {
            intercept,
            terms,
            formula_str,
        })
    }

    /// Distinct variable names referenced by the formula, in first-use order.
    pub fn variables(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = Vec::new();
        for term in &self.terms {
            for v in term.variables() {
                if !vars.contains(&v) {
                    vars.push(v);
                }
            }
        }
        vars
    }
}

fn split_pair(part: &str, sep: char, formula: &str) -> Result<(String, String)> {
    let pieces: Vec<&str> = part.split(sep).map(str::trim).collect();
    if pieces.len() != 2 || pieces.iter().any(|p| p.is_empty()) {
        return Err(DaaError::FormulaParse(format!(
            "Cannot parse term '{}' in formula '{}'",
            part, formula
        )));
    }
    Ok((pieces[0].to_string(), pieces[1].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_formula() {
        let f = Formula::parse("~ group").unwrap();
        assert!(f.intercept);
        assert_eq!(f.terms, vec![Term::Main("group".to_string())]);
    }

    #[test]
    fn test_additive_formula() {
        let f = Formula::parse("~ group + age").unwrap();
        assert_eq!(f.terms.len(), 2);
        assert_eq!(f.variables(), vec!["group", "age"]);
    }

    #[test]
    fn test_no_intercept() {
        let f = Formula::parse("~ 0 + group").unwrap();
        assert!(!f.intercept);
        assert_eq!(f.terms.len(), 1);
    }

    #[test]
    fn test_interaction_expansion() {
        let f = Formula::parse("~ group * age").unwrap();
        assert_eq!(
            f.terms,
            vec![
                Term::Main("group".to_string()),
                Term::Main("age".to_string()),
                Term::Interaction("group".to_string(), "age".to_string()),
            ]
        );
    }

    #[test]
    fn test_bare_interaction() {
        let f = Formula::parse("~ group:age").unwrap();
        assert_eq!(f.terms.len(), 1);
        assert!(f.intercept);
    }

    #[test]
    fn test_invalid_formulas() {
        assert!(Formula::parse("group").is_err());
        assert!(Formula::parse("~").is_err());
        assert!(Formula::parse("~ 0").is_err());
        assert!(Formula::parse("~ a + + b").is_err());
    }
}
