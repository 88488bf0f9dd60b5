//! Configuration for the batched navigation environment.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::EpisodeError;

/// Configuration for [`NavBatch`](super::NavBatch).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnvConfig {
    /// Number of agents stepped together.
    pub batch_size: usize,
    /// Alternative trajectories kept per agent.
    pub beam_size: usize,
    /// Seed of the task shuffling generator.
    pub seed: u64,
    /// Dataset splits the tasks were drawn from.
    pub splits: Vec<String>,
}

impl EnvConfig {
    pub fn validate(&self) -> Result<(), EpisodeError> {
        if self.batch_size == 0 {
            return Err(EpisodeError::InvalidConfig("batch_size must be positive".into()));
        }
        if self.beam_size == 0 {
            return Err(EpisodeError::InvalidConfig("beam_size must be positive".into()));
        }
        if self.splits.is_empty() {
            return Err(EpisodeError::InvalidConfig("at least one split is required".into()));
        }
        Ok(())
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            beam_size: 1,
            seed: 10,
            splits: vec!["train".into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = EnvConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.batch_size, 100);
        assert_eq!(cfg.beam_size, 1);
        assert_eq!(cfg.seed, 10);
        assert_eq!(cfg.splits, vec!["train".to_string()]);
    }

    #[test]
    fn zero_sizes_rejected() {
        let cfg = EnvConfig {
            batch_size: 0,
            ..EnvConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(EpisodeError::InvalidConfig(_))));
        let cfg = EnvConfig {
            beam_size: 0,
            ..EnvConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_fills_defaults() {
        let cfg: EnvConfig = serde_json::from_str(r#"{"batch_size": 8}"#).unwrap();
        assert_eq!(cfg.batch_size, 8);
        assert_eq!(cfg.seed, 10);
    }
}
