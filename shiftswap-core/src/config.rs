//! Configuration types

use crate::{ConfigError, ShiftSwapResult};
use serde::{Deserialize, Serialize};

/// Master configuration for the swap engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Maximum accepted slot title length, in characters
    pub max_title_len: usize,
    /// Minimum slot duration in minutes; 0 requires only starts_at < ends_at
    pub min_slot_minutes: i64,
    /// Maximum number of slots returned by the marketplace projection
    pub marketplace_limit: usize,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            max_title_len: 120,
            min_slot_minutes: 0,
            marketplace_limit: 200,
        }
    }
}

impl SwapConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `SHIFTSWAP_MAX_TITLE_LEN`: Maximum slot title length (default: 120)
    /// - `SHIFTSWAP_MIN_SLOT_MINUTES`: Minimum slot duration (default: 0)
    /// - `SHIFTSWAP_MARKETPLACE_LIMIT`: Marketplace listing cap (default: 200)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_title_len: std::env::var("SHIFTSWAP_MAX_TITLE_LEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_title_len),
            min_slot_minutes: std::env::var("SHIFTSWAP_MIN_SLOT_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_slot_minutes),
            marketplace_limit: std::env::var("SHIFTSWAP_MARKETPLACE_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.marketplace_limit),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ShiftSwapResult<()> {
        if self.max_title_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_title_len".to_string(),
                value: self.max_title_len.to_string(),
                reason: "max_title_len must be greater than 0".to_string(),
            }
            .into());
        }

        if self.min_slot_minutes < 0 {
            return Err(ConfigError::InvalidValue {
                field: "min_slot_minutes".to_string(),
                value: self.min_slot_minutes.to_string(),
                reason: "min_slot_minutes must be non-negative".to_string(),
            }
            .into());
        }

        if self.marketplace_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "marketplace_limit".to_string(),
                value: self.marketplace_limit.to_string(),
                reason: "marketplace_limit must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SwapConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_title_len() {
        let config = SwapConfig {
            max_title_len: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_title_len"));
    }

    #[test]
    fn test_validate_rejects_negative_min_duration() {
        let config = SwapConfig {
            min_slot_minutes: -5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_marketplace_limit() {
        let config = SwapConfig {
            marketplace_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_falls_back_on_unparsable_values() {
        std::env::set_var("SHIFTSWAP_MAX_TITLE_LEN", "not-a-number");
        std::env::set_var("SHIFTSWAP_MARKETPLACE_LIMIT", "50");

        let config = SwapConfig::from_env();
        assert_eq!(config.max_title_len, SwapConfig::default().max_title_len);
        assert_eq!(config.marketplace_limit, 50);

        std::env::remove_var("SHIFTSWAP_MAX_TITLE_LEN");
        std::env::remove_var("SHIFTSWAP_MARKETPLACE_LIMIT");
    }
}
