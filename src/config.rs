//! Engine configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::{Normalizer, DEFAULT_QUALIFIERS};

/// Default tolerance for treating a quantity as zero
pub const DEFAULT_EPSILON: f64 = 0.01;

/// Configuration of a [`Reconciler`](crate::Reconciler)
///
/// This structure is designed for deserializing [TOML](https://toml.io/en/):
///
/// ```toml
/// epsilon = 0.05
/// qualifiers = ["fresh", "organic"]
/// ```
///
/// Missing fields take the default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Quantities within this distance of zero are zero
    ///
    /// Shopping list entries with a shortfall at or below it are dropped and
    /// inventory items left with at most this much are archived.
    pub epsilon: f64,
    /// Words stripped from ingredient names when matching them
    ///
    /// When [`None`], [`DEFAULT_QUALIFIERS`] are used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifiers: Option<Vec<String>>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            qualifiers: None,
        }
    }
}

impl ReconcileConfig {
    /// Parse and validate a configuration from TOML
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Same configuration with another epsilon
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Check the values are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(ConfigError::InvalidEpsilon(self.epsilon));
        }
        Ok(())
    }

    /// Build the name [`Normalizer`] for this configuration
    pub fn normalizer(&self) -> Normalizer {
        match &self.qualifiers {
            Some(qualifiers) => Normalizer::new(qualifiers),
            None => Normalizer::new(DEFAULT_QUALIFIERS.iter().copied()),
        }
    }
}

/// Error in a [`ReconcileConfig`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Error parsing configuration: {0}")]
    Parse(String),

    #[error("Epsilon must be a finite number not below zero, found {0}")]
    InvalidEpsilon(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn defaults() {
        let config = ReconcileConfig::from_toml("").unwrap();
        assert_eq!(config, ReconcileConfig::default());
        assert_eq!(config.epsilon, 0.01);
        assert_eq!(config.normalizer().normalize("Fresh basil"), "basil");
    }

    #[test]
    fn custom() {
        let config = ReconcileConfig::from_toml(indoc! {r#"
            epsilon = 0.5
            qualifiers = ["organic"]
        "#})
        .unwrap();
        assert_eq!(config.epsilon, 0.5);
        let normalizer = config.normalizer();
        assert_eq!(normalizer.normalize("Organic basil"), "basil");
        assert_eq!(normalizer.normalize("Fresh basil"), "fresh basil");
    }

    #[test]
    fn invalid() {
        assert_eq!(
            ReconcileConfig::from_toml("epsilon = -1.0"),
            Err(ConfigError::InvalidEpsilon(-1.0))
        );
        assert!(matches!(
            ReconcileConfig::from_toml("rounding = 2"),
            Err(ConfigError::Parse(_))
        ));
    }
}
