// SPDX-License-Identifier: GPL-3.0-only

//! Bridge configuration
//!
//! Settings are read from a JSON file (an explicit `--config` path, or
//! `config.json` under the user's config directory) and fall back to
//! defaults for anything missing. Command-line flags are applied on top.

use crate::backends::depth::{CoordinateUnits, DepthMode, InitParameters, Resolution};
use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, CYCLE_DELAY, DEFAULT_ENDPOINT, DEFAULT_OUTPUT_RESOLUTION,
};
use crate::errors::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// What to do with a request whose grab failed
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrabFailurePolicy {
    /// Send nothing; the peer keeps waiting for a reply
    #[default]
    Drop,
    /// Send an error document naming the grab status code
    ErrorReply,
}

/// What to do with a request whose retrieval failed
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrieveFailurePolicy {
    /// Reply with the buffer as left by the previous successful retrieval
    #[default]
    SendStale,
    /// Send an error document instead of depth data
    ErrorReply,
}

#[derive(Debug, Clone, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// ZeroMQ endpoint the reply socket binds to
    pub endpoint: String,
    /// Resolution depth maps are resampled to
    pub output_resolution: Resolution,
    /// Pause after each cycle, in milliseconds
    pub cycle_delay_ms: u64,
    /// Depth computation mode requested at open
    pub depth_mode: DepthMode,
    /// Unit of the published measurements
    pub coordinate_units: CoordinateUnits,
    pub on_grab_failure: GrabFailurePolicy,
    pub on_retrieve_failure: RetrieveFailurePolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            output_resolution: DEFAULT_OUTPUT_RESOLUTION,
            cycle_delay_ms: CYCLE_DELAY.as_millis() as u64,
            depth_mode: DepthMode::default(),
            coordinate_units: CoordinateUnits::default(),
            on_grab_failure: GrabFailurePolicy::default(),
            on_retrieve_failure: RetrieveFailurePolicy::default(),
        }
    }
}

impl BridgeConfig {
    /// Default location of the config file, if a config dir exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration
    ///
    /// An explicit `path` must exist. Without one, the default path is used
    /// when the file is present, otherwise defaults are returned.
    pub fn load(path: Option<&Path>) -> BridgeResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> BridgeResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json(&contents)
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_json(contents: &str) -> BridgeResult<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.output_resolution.is_empty() {
            return Err(BridgeError::Config(format!(
                "output resolution must be positive, got {}",
                self.output_resolution
            )));
        }
        if self.endpoint.trim().is_empty() {
            return Err(BridgeError::Config("endpoint must not be empty".into()));
        }
        Ok(())
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }

    /// Open parameters before the source token is applied
    pub fn init_parameters(&self) -> InitParameters {
        InitParameters {
            depth_mode: self.depth_mode,
            coordinate_units: self.coordinate_units,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = BridgeConfig::from_json(r#"{ "cycle_delay_ms": 0 }"#).unwrap();
        assert_eq!(config.cycle_delay(), Duration::ZERO);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.output_resolution, DEFAULT_OUTPUT_RESOLUTION);
    }

    #[test]
    fn test_policies_use_snake_case() {
        let config = BridgeConfig::from_json(
            r#"{ "on_grab_failure": "error_reply", "on_retrieve_failure": "error_reply" }"#,
        )
        .unwrap();
        assert_eq!(config.on_grab_failure, GrabFailurePolicy::ErrorReply);
        assert_eq!(config.on_retrieve_failure, RetrieveFailurePolicy::ErrorReply);
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let err = BridgeConfig::from_json(r#"{ "output_resolution": { "width": 0, "height": 10 } }"#)
            .unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn test_init_parameters_carry_units() {
        let config = BridgeConfig {
            coordinate_units: CoordinateUnits::Millimeter,
            ..Default::default()
        };
        assert_eq!(
            config.init_parameters().coordinate_units,
            CoordinateUnits::Millimeter
        );
    }
}
