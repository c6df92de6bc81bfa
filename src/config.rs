//! Aggregation configuration.

use serde::{Deserialize, Serialize};

use crate::distance::DistanceMetric;
use crate::{AggregationError, Result};

/// Default iteration cap.
pub const DEFAULT_MAX_ITERS: usize = 10;

/// Tuning parameters shared by query-level and corpus-level aggregation.
///
/// Unknown keys are rejected when deserialising.
///
/// # Example
///
/// ```rust
/// use concord::{AggregationConfig, DistanceMetric};
///
/// let config = AggregationConfig::default()
///     .with_max_iters(20)
///     .with_metric(DistanceMetric::DiscountedKendallTau);
///
/// let parsed = AggregationConfig::from_toml_str("max_iters = 20\nmetric = \"dKT\"").unwrap();
/// assert_eq!(config, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationConfig {
    /// Maximum number of scoring rounds (default: 10, must be >= 1).
    pub max_iters: usize,
    /// Distance between each ranker and the consensus (default: `KT`).
    pub metric: DistanceMetric,
    /// Count "listed above unlisted" as an implicit preference (default: false).
    pub penalize_absent: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_iters: DEFAULT_MAX_ITERS,
            metric: DistanceMetric::KendallTau,
            penalize_absent: false,
        }
    }
}

impl AggregationConfig {
    /// Config with an explicit iteration cap and metric.
    #[must_use]
    pub const fn new(max_iters: usize, metric: DistanceMetric) -> Self {
        Self {
            max_iters,
            metric,
            penalize_absent: false,
        }
    }

    /// Set the iteration cap.
    #[must_use]
    pub const fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the distance metric.
    #[must_use]
    pub const fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Enable/disable the absence penalty.
    #[must_use]
    pub const fn with_absent_penalty(mut self, penalize_absent: bool) -> Self {
        self.penalize_absent = penalize_absent;
        self
    }

    /// Parse from TOML, rejecting unknown keys and invalid values.
    ///
    /// # Errors
    ///
    /// [`AggregationError::InvalidConfig`] for malformed TOML, unknown keys,
    /// an unrecognised metric, or a zero iteration cap.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| AggregationError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants.
    ///
    /// # Errors
    ///
    /// [`AggregationError::InvalidConfig`] if `max_iters == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.max_iters == 0 {
            return Err(AggregationError::InvalidConfig(
                "max_iters must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
