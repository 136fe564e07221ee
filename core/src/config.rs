//! Labeller configuration
//!
//! The multipliers weight the neighbour sums of the refinement composite
//! and must be odd and distinct so that out- and in-neighbourhoods cannot
//! cancel each other. Two graphs can only be compared under the same
//! configuration: labels computed under different multipliers are
//! unrelated.

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{GraphError, GraphResult};

/// Tuning knobs of the colour refinement engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabellerConfig {
    /// Weight of the out-neighbour label sum
    pub out_multiplier: u64,
    /// Weight of the in-neighbour label sum
    pub in_multiplier: u64,
    /// Upper bound on refinement passes; `None` uses the node count
    pub max_rounds: Option<usize>,
}

impl Default for LabellerConfig {
    fn default() -> Self {
        Self {
            out_multiplier: 31,
            in_multiplier: 43,
            max_rounds: None,
        }
    }
}

impl LabellerConfig {
    /// Parses and validates a JSON configuration. Missing fields take
    /// their default values.
    pub fn from_json(json: &str) -> GraphResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| GraphError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GraphResult<()> {
        if self.out_multiplier % 2 == 0 || self.in_multiplier % 2 == 0 {
            return Err(GraphError::InvalidConfig(
                "refinement multipliers must be odd".to_string(),
            ));
        }
        if self.out_multiplier == self.in_multiplier {
            return Err(GraphError::InvalidConfig(
                "refinement multipliers must differ".to_string(),
            ));
        }
        if self.max_rounds == Some(0) {
            return Err(GraphError::InvalidConfig(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of refinement passes allowed on a graph of `node_count` nodes
    #[inline]
    pub fn round_bound(&self, node_count: usize) -> usize {
        self.max_rounds.unwrap_or(node_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LabellerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.round_bound(7), 7);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = LabellerConfig::from_json(r#"{ "max_rounds": 3 }"#).unwrap();
        assert_eq!(config.out_multiplier, 31);
        assert_eq!(config.in_multiplier, 43);
        assert_eq!(config.round_bound(100), 3);
    }

    #[test]
    fn test_rejects_bad_multipliers() {
        assert!(matches!(
            LabellerConfig::from_json(r#"{ "out_multiplier": 30 }"#),
            Err(GraphError::InvalidConfig(_))
        ));
        assert!(matches!(
            LabellerConfig::from_json(r#"{ "out_multiplier": 43 }"#),
            Err(GraphError::InvalidConfig(_))
        ));
        assert!(matches!(
            LabellerConfig::from_json(r#"{ "max_rounds": 0 }"#),
            Err(GraphError::InvalidConfig(_))
        ));
        assert!(matches!(
            LabellerConfig::from_json("not json"),
            Err(GraphError::InvalidConfig(_))
        ));
    }
}
