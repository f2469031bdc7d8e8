//! Convergence and predictive-fit diagnostics for a completed posterior.
//!
//! Both signals are advisory: callers log them and move on. A poorly mixed
//! or poorly predicting fit still produces an artifact; triage happens
//! downstream.

use crate::model::Posterior;

/// Split-R̂ above this is reported as a convergence warning.
pub const RHAT_THRESHOLD: f64 = 1.05;

/// Predictive-fit estimate in the elpd (expected log pointwise predictive
/// density) family, with its standard error and effective parameter count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElpdEstimate {
    pub elpd: f64,
    pub se: f64,
    pub p_eff: f64,
}

impl ElpdEstimate {
    /// Whether any summary component is undefined.
    pub fn has_nan(&self) -> bool {
        self.elpd.is_nan() || self.se.is_nan() || self.p_eff.is_nan()
    }
}

/// Diagnostics over one feature's posterior. Computed, logged, discarded;
/// never persisted.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    /// Split-R̂ per monitored parameter, named `beta_var[<covariate>]` for
    /// coefficients and by parameter name for scalars.
    pub rhat: Vec<(String, f64)>,
    /// Predictive-fit estimate, when log-likelihood draws were monitored.
    pub elpd: Option<ElpdEstimate>,
}

impl Diagnostics {
    /// Evaluate all diagnostics. Pure function of the posterior.
    pub fn evaluate(posterior: &Posterior) -> Self {
        let mut rhat = Vec::new();
        for (i, cov) in posterior.covariates.iter().enumerate() {
            rhat.push((
                format!("beta_var[{}]", cov),
                split_rhat(&posterior.covariate_chains(i)),
            ));
        }
        for (name, chains) in &posterior.scalars {
            rhat.push((name.clone(), split_rhat(chains)));
        }

        let elpd = posterior.log_likelihood.as_deref().map(elpd_estimate);

        Self { rhat, elpd }
    }

    /// Names of parameters whose split-R̂ exceeds [`RHAT_THRESHOLD`].
    pub fn rhat_flags(&self) -> Vec<&str> {
        self.rhat
            .iter()
            .filter(|(_, r)| *r > RHAT_THRESHOLD)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Whether the predictive-fit estimate has an undefined component.
    pub fn elpd_is_nan(&self) -> bool {
        self.elpd.map(|e| e.has_nan()).unwrap_or(false)
    }
}

/// Split-R̂ convergence statistic for one parameter.
///
/// Each chain is split in half, then within-chain and between-chain
/// variances are compared (Gelman et al.). Values near 1.0 indicate good
/// mixing. Returns NaN when there are too few draws to split.
pub fn split_rhat(chains: &[Vec<f64>]) -> f64 {
    let half = chains.first().map(|c| c.len() / 2).unwrap_or(0);
    if half < 2 {
        return f64::NAN;
    }

    let mut splits: Vec<&[f64]> = Vec::with_capacity(chains.len() * 2);
    for chain in chains {
        splits.push(&chain[..half]);
        splits.push(&chain[chain.len() - half..]);
    }

    let means: Vec<f64> = splits.iter().map(|s| mean(s)).collect();
    let within: f64 = mean(&splits.iter().map(|s| variance(s)).collect::<Vec<_>>());
    let between = half as f64 * variance(&means);

    if within == 0.0 {
        return 1.0;
    }
    let n = half as f64;
    let var_plus = (n - 1.0) / n * within + between / n;
    (var_plus / within).sqrt()
}

/// WAIC-flavored elpd estimate from pointwise log-likelihood draws
/// (chains x draws x samples).
fn elpd_estimate(log_likelihood: &[Vec<Vec<f64>>]) -> ElpdEstimate {
    let n_samples = log_likelihood
        .first()
        .and_then(|c| c.first())
        .map(|d| d.len())
        .unwrap_or(0);
    if n_samples == 0 {
        return ElpdEstimate {
            elpd: f64::NAN,
            se: f64::NAN,
            p_eff: f64::NAN,
        };
    }

    let mut pointwise = Vec::with_capacity(n_samples);
    let mut p_eff = 0.0;
    for i in 0..n_samples {
        let vals: Vec<f64> = log_likelihood
            .iter()
            .flat_map(|chain| chain.iter().map(|draw| draw[i]))
            .collect();
        let lpd = log_mean_exp(&vals);
        let p_i = variance(&vals);
        pointwise.push(lpd - p_i);
        p_eff += p_i;
    }

    let elpd: f64 = pointwise.iter().sum();
    let se = (n_samples as f64 * variance(&pointwise)).sqrt();
    ElpdEstimate { elpd, se, p_eff }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (ddof = 1).
fn variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

fn log_mean_exp(values: &[f64]) -> f64 {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    max + (sum / values.len() as f64).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn posterior_with(beta_chains: Vec<Vec<f64>>) -> Posterior {
        Posterior {
            covariates: vec!["x".to_string()],
            beta_var: beta_chains
                .into_iter()
                .map(|chain| chain.into_iter().map(|v| vec![v]).collect())
                .collect(),
            scalars: BTreeMap::new(),
            log_likelihood: None,
        }
    }

    #[test]
    fn test_rhat_well_mixed_near_one() {
        // Interleaved values, identical across chains.
        let chain: Vec<f64> = (0..100).map(|i| (i % 7) as f64).collect();
        let r = split_rhat(&[chain.clone(), chain]);
        assert!((r - 1.0).abs() < 0.1, "rhat was {}", r);
    }

    #[test]
    fn test_rhat_divergent_chains_flagged() {
        let low: Vec<f64> = (0..100).map(|i| (i % 5) as f64 * 0.01).collect();
        let high: Vec<f64> = low.iter().map(|v| v + 50.0).collect();
        let r = split_rhat(&[low, high]);
        assert!(r > RHAT_THRESHOLD, "rhat was {}", r);
    }

    #[test]
    fn test_rhat_constant_chains() {
        assert_eq!(split_rhat(&[vec![2.0; 10], vec![2.0; 10]]), 1.0);
    }

    #[test]
    fn test_rhat_too_few_draws() {
        assert!(split_rhat(&[vec![1.0, 2.0]]).is_nan());
    }

    #[test]
    fn test_evaluate_flags_divergence() {
        let low: Vec<f64> = (0..50).map(|i| (i % 5) as f64 * 0.01).collect();
        let high: Vec<f64> = low.iter().map(|v| v + 50.0).collect();
        let diags = Diagnostics::evaluate(&posterior_with(vec![low, high]));
        assert_eq!(diags.rhat_flags(), vec!["beta_var[x]"]);
        assert!(diags.elpd.is_none());
        assert!(!diags.elpd_is_nan());
    }

    #[test]
    fn test_elpd_finite_for_clean_draws() {
        let mut posterior = posterior_with(vec![
            (0..50).map(|i| (i % 7) as f64 * 0.01).collect(),
            (0..50).map(|i| (i % 7) as f64 * 0.01).collect(),
        ]);
        posterior.log_likelihood = Some(vec![
            vec![vec![-1.4, -1.6, -1.5]; 50],
            vec![vec![-1.5, -1.5, -1.6]; 50],
        ]);
        let diags = Diagnostics::evaluate(&posterior);
        let elpd = diags.elpd.unwrap();
        assert!(elpd.elpd.is_finite());
        assert!(elpd.se >= 0.0);
        assert!(!diags.elpd_is_nan());
    }

    #[test]
    fn test_elpd_nan_flagged() {
        let mut posterior = posterior_with(vec![vec![0.0; 20], vec![0.0; 20]]);
        posterior.log_likelihood = Some(vec![
            vec![vec![f64::NAN, -1.5]; 20],
            vec![vec![-1.5, -1.5]; 20],
        ]);
        let diags = Diagnostics::evaluate(&posterior);
        assert!(diags.elpd_is_nan());
    }

    #[test]
    fn test_evaluate_is_pure() {
        let posterior = posterior_with(vec![
            (0..40).map(|i| i as f64 * 0.1).collect(),
            (0..40).map(|i| i as f64 * 0.1 + 0.5).collect(),
        ]);
        let a = Diagnostics::evaluate(&posterior);
        let b = Diagnostics::evaluate(&posterior);
        assert_eq!(a.rhat, b.rhat);
    }
}
