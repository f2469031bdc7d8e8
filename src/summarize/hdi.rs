//! Highest-density interval computation and its wire format.
//!
//! HDI cells in the summary table are serialized as `"(lower, upper)"` with
//! a comma-space separator; the display stage's parser depends on exactly
//! this format.

use crate::error::{DaaError, Result};

/// Default credible mass for summary HDIs.
pub const DEFAULT_HDI_PROB: f64 = 0.94;

/// Narrowest interval containing `prob` mass of the draws.
///
/// Sample-based: the draws are sorted and the shortest window spanning the
/// required count of draws is returned. Invariant to input ordering.
pub fn hdi(draws: &[f64], prob: f64) -> Result<(f64, f64)> {
    if draws.is_empty() {
        return Err(DaaError::EmptyData("No draws for HDI".to_string()));
    }
    if !(prob > 0.0 && prob <= 1.0) {
        return Err(DaaError::InvalidParameter(format!(
            "HDI probability {} not in (0, 1]",
            prob
        )));
    }

    let mut sorted = draws.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let window = ((prob * n as f64).ceil() as usize).clamp(1, n);

    let mut best_start = 0;
    let mut best_width = f64::INFINITY;
    for start in 0..=(n - window) {
        let width = sorted[start + window - 1] - sorted[start];
        if width < best_width {
            best_width = width;
            best_start = start;
        }
    }
    Ok((sorted[best_start], sorted[best_start + window - 1]))
}

/// Serialize an interval as `"(lower, upper)"`.
pub fn format_hdi(interval: (f64, f64)) -> String {
    format!("({}, {})", interval.0, interval.1)
}

/// Parse an interval cell produced by [`format_hdi`].
pub fn parse_hdi(cell: &str) -> Result<(f64, f64)> {
    let bad = || DaaError::MalformedHdi(cell.to_string());

    let inner = cell
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(bad)?;
    let mut parts = inner.split(',');
    let lower: f64 = parts
        .next()
        .ok_or_else(bad)?
        .trim()
        .parse()
        .map_err(|_| bad())?;
    let upper: f64 = parts
        .next()
        .ok_or_else(bad)?
        .trim()
        .parse()
        .map_err(|_| bad())?;
    if parts.next().is_some() {
        return Err(bad());
    }
    Ok((lower, upper))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hdi_full_mass_is_range() {
        let draws = vec![3.0, 1.0, 2.0, 5.0, 4.0];
        assert_eq!(hdi(&draws, 1.0).unwrap(), (1.0, 5.0));
    }

    #[test]
    fn test_hdi_prefers_dense_region() {
        // Dense cluster near 0 plus one far outlier.
        let mut draws: Vec<f64> = (0..99).map(|i| i as f64 * 0.01).collect();
        draws.push(1000.0);
        let (lower, upper) = hdi(&draws, 0.9).unwrap();
        assert!(lower >= 0.0);
        assert!(upper < 1.0, "upper was {}", upper);
    }

    #[test]
    fn test_hdi_order_invariant() {
        let draws = vec![0.3, -1.2, 0.9, 0.0, 2.4, -0.7, 1.1];
        let mut reversed = draws.clone();
        reversed.reverse();
        assert_eq!(
            hdi(&draws, 0.94).unwrap(),
            hdi(&reversed, 0.94).unwrap()
        );
    }

    #[test]
    fn test_hdi_rejects_bad_inputs() {
        assert!(hdi(&[], 0.94).is_err());
        assert!(hdi(&[1.0], 0.0).is_err());
        assert!(hdi(&[1.0], 1.5).is_err());
    }

    #[test]
    fn test_format_parse_roundtrip() {
        for interval in [(-3.0, -1.0), (0.123456789, 2.5), (-0.5, 2.5)] {
            let cell = format_hdi(interval);
            let parsed = parse_hdi(&cell).unwrap();
            assert!((parsed.0 - interval.0).abs() < 1e-12);
            assert!((parsed.1 - interval.1).abs() < 1e-12);
        }
    }

    #[test]
    fn test_parse_known_format() {
        assert_eq!(parse_hdi("(-22.9163, -8.53679)").unwrap(), (-22.9163, -8.53679));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "1.0, 2.0", "(1.0)", "(a, b)", "(1, 2, 3)"] {
            assert!(parse_hdi(bad).is_err(), "accepted {:?}", bad);
        }
    }
}
