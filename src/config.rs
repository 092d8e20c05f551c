//! Engine configuration.
//!
//! Defaults match the dashboard; a JSON file may override any subset of
//! fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{self, VolMarkError};

/// Replacement values for skew/convexity inputs that round to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegenerateFloors {
    pub skew: f64,
    pub convexity: f64,
}

impl Default for DegenerateFloors {
    fn default() -> Self {
        Self {
            skew: -0.0001,
            convexity: 0.001,
        }
    }
}

/// Display and expansion settings shared by every session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub floors: DegenerateFloors,
    /// Moneyness columns of the displayed vol grid.
    pub vol_grid_moneyness: Vec<f64>,
    /// Moneyness points used when plotting smiles.
    pub curve_grid_moneyness: Vec<f64>,
    /// Listed maturities further out than this are ignored.
    pub listed_maturity_months: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            floors: DegenerateFloors::default(),
            vol_grid_moneyness: vec![
                0.1, 0.25, 0.5, 0.6, 0.7, 0.8, 0.9, 0.95, 1.0, 1.05, 1.1, 1.2, 1.3, 1.4, 1.5, 1.75,
                2.0,
            ],
            curve_grid_moneyness: (1..=200).map(|i| f64::from(i) / 100.0).collect(),
            listed_maturity_months: 96,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; absent fields keep their defaults.
    ///
    /// # Errors
    /// Returns [`VolMarkError::InvalidInput`] for malformed JSON or an
    /// invalid moneyness list.
    ///
    /// # Examples
    /// ```
    /// use volmark::config::EngineConfig;
    ///
    /// let cfg = EngineConfig::from_json_str(r#"{"listedMaturityMonths": 24}"#)?;
    /// assert_eq!(cfg.listed_maturity_months, 24);
    /// assert_eq!(cfg.vol_grid_moneyness.len(), 17);
    /// # Ok::<(), volmark::VolMarkError>(())
    /// ```
    pub fn from_json_str(json: &str) -> error::Result<Self> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| VolMarkError::InvalidInput {
            message: format!("engine config: {e}"),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> error::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| VolMarkError::InvalidInput {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        #[cfg(feature = "logging")]
        tracing::debug!(path = %path.display(), "engine config loaded");
        Self::from_json_str(&text)
    }

    fn validate(&self) -> error::Result<()> {
        check_moneyness_axis(&self.vol_grid_moneyness, "vol grid moneyness")?;
        check_moneyness_axis(&self.curve_grid_moneyness, "curve grid moneyness")?;
        if self.floors.convexity <= 0.0 || !self.floors.convexity.is_finite() {
            return Err(VolMarkError::InvalidInput {
                message: format!(
                    "convexity floor must be positive, got {}",
                    self.floors.convexity
                ),
            });
        }
        if !self.floors.skew.is_finite() {
            return Err(VolMarkError::InvalidInput {
                message: format!("skew floor must be finite, got {}", self.floors.skew),
            });
        }
        Ok(())
    }
}

fn check_moneyness_axis(axis: &[f64], name: &str) -> error::Result<()> {
    if axis.is_empty() {
        return Err(VolMarkError::InvalidInput {
            message: format!("{name} must not be empty"),
        });
    }
    if axis.iter().any(|k| !k.is_finite() || *k <= 0.0) {
        return Err(VolMarkError::InvalidInput {
            message: format!("{name} must be positive and finite"),
        });
    }
    if axis.windows(2).any(|w| w[1] <= w[0]) {
        return Err(VolMarkError::InvalidInput {
            message: format!("{name} must be strictly increasing"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.vol_grid_moneyness.len(), 17);
        assert_eq!(cfg.curve_grid_moneyness.len(), 200);
        assert_eq!(cfg.curve_grid_moneyness[0], 0.01);
        assert_eq!(cfg.curve_grid_moneyness[199], 2.0);
        assert_eq!(cfg.floors.skew, -0.0001);
        assert_eq!(cfg.floors.convexity, 0.001);
        assert_eq!(cfg.listed_maturity_months, 96);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{"floors": {"skew": -0.001}}"#).unwrap();
        assert_eq!(cfg.floors.skew, -0.001);
        assert_eq!(cfg.floors.convexity, 0.001);
        assert_eq!(cfg.vol_grid_moneyness, EngineConfig::default().vol_grid_moneyness);
    }

    #[test]
    fn rejects_bad_axis() {
        assert!(EngineConfig::from_json_str(r#"{"volGridMoneyness": []}"#).is_err());
        assert!(EngineConfig::from_json_str(r#"{"volGridMoneyness": [1.0, 0.9]}"#).is_err());
        assert!(EngineConfig::from_json_str(r#"{"floors": {"convexity": 0.0}}"#).is_err());
        assert!(EngineConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn missing_file_is_invalid_input() {
        let err = EngineConfig::from_path("/nonexistent/volmark.json").unwrap_err();
        assert!(matches!(err, VolMarkError::InvalidInput { .. }));
    }
}
