//! Config loading, validation, and utility operations.

use super::model::StoreConfig;
use crate::error::{LeaseKeeperError, Result};
use std::path::Path;
use std::time::Duration;

impl StoreConfig {
    /// Load config from a YAML file.
    ///
    /// # Returns
    ///
    /// * `Ok(StoreConfig)` - Successfully loaded and validated config
    /// * `Err(LeaseKeeperError::Config)` - Read error, parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LeaseKeeperError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: StoreConfig = serde_yaml::from_str(yaml)
            .map_err(|e| LeaseKeeperError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            LeaseKeeperError::Serialization(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `refresh_interval_ms` must be positive
    /// - `refresh_lead_secs` must be positive
    /// - the refresh interval must be shorter than the lead window
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_ms == 0 {
            return Err(LeaseKeeperError::Config(
                "refresh_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.refresh_lead_secs == 0 {
            return Err(LeaseKeeperError::Config(
                "refresh_lead_secs must be greater than 0".to_string(),
            ));
        }

        let lead_ms = u64::from(self.refresh_lead_secs) * 1000;
        if self.refresh_interval_ms >= lead_ms {
            return Err(LeaseKeeperError::Config(format!(
                "refresh_interval_ms ({}) must be shorter than the refresh lead window ({}ms), \
                 otherwise leases can expire between two refresh passes",
                self.refresh_interval_ms, lead_ms
            )));
        }

        Ok(())
    }

    /// Time between two refresh passes.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// How far ahead of its deadline a lease gets refreshed.
    pub fn refresh_lead(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.refresh_lead_secs))
    }
}
