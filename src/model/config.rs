//! Model hyperparameter configuration.

use crate::error::{DaaError, Result};
use serde::{Deserialize, Serialize};

/// Hyperparameters passed through to the sampler for every feature.
///
/// Defaults match the chunked negative binomial runner this library grew out
/// of: four chains, 500 warmup and 500 sampling iterations, wide normal
/// prior on coefficients and wide half-normal on inverse dispersion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Standard deviation of the normal prior on regression coefficients.
    pub beta_prior: f64,
    /// Standard deviation of the prior on inverse dispersion.
    pub inv_disp_sd: f64,
    /// Number of MCMC chains.
    pub chains: usize,
    /// Sampling iterations per chain.
    pub num_iter: usize,
    /// Warmup iterations per chain.
    pub num_warmup: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            beta_prior: 5.0,
            inv_disp_sd: 5.0,
            chains: 4,
            num_iter: 500,
            num_warmup: 500,
        }
    }
}

impl FitConfig {
    /// Load from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(DaaError::from)
    }

    /// Check values are usable before handing them to a sampler.
    pub fn validate(&self) -> Result<()> {
        if self.chains == 0 {
            return Err(DaaError::InvalidParameter(
                "chains must be at least 1".to_string(),
            ));
        }
        if self.num_iter == 0 {
            return Err(DaaError::InvalidParameter(
                "num_iter must be at least 1".to_string(),
            ));
        }
        if !(self.beta_prior > 0.0) || !(self.inv_disp_sd > 0.0) {
            return Err(DaaError::InvalidParameter(
                "prior scales must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FitConfig::default();
        assert_eq!(config.chains, 4);
        assert_eq!(config.num_iter, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = FitConfig {
            beta_prior: 2.0,
            inv_disp_sd: 0.5,
            chains: 2,
            num_iter: 100,
            num_warmup: 50,
        };
        let yaml = config.to_yaml().unwrap();
        let parsed = FitConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = FitConfig::default();
        config.chains = 0;
        assert!(config.validate().is_err());

        let yaml = "beta_prior: -1.0\ninv_disp_sd: 5.0\nchains: 4\nnum_iter: 500\nnum_warmup: 500\n";
        assert!(FitConfig::from_yaml(yaml).is_err());
    }
}
