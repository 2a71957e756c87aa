//! Engine tuning knobs.
//!
//! Loaded from an optional JSON file; missing fields take their defaults. The
//! binary layers its command-line flags on top before calling [`EngineConfig::validate`].

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default delay before a pending chord prefix is discarded.
pub const DEFAULT_CHORD_TIMEOUT_MS: u64 = 1_000;

/// Smallest pane extent, in cells, a gutter drag may shrink a pane to.
pub const DEFAULT_MIN_PANE_CELLS: u16 = 4;

/// Floor for every split ratio when no container size is known.
pub const DEFAULT_MIN_RATIO: f64 = 0.05;

/// Width of each outer drop band as a fraction of the target's extent.
/// With 0.25 the inner 50% of the pane is the center zone.
pub const DEFAULT_DROP_EDGE_BAND: f64 = 0.25;

pub const DEFAULT_FOCUS_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub chord_timeout_ms: u64,
    pub min_pane_cells: u16,
    pub min_ratio: f64,
    pub drop_edge_band: f64,
    pub focus_history_limit: usize,
    pub default_split_ratio: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chord_timeout_ms: DEFAULT_CHORD_TIMEOUT_MS,
            min_pane_cells: DEFAULT_MIN_PANE_CELLS,
            min_ratio: DEFAULT_MIN_RATIO,
            drop_edge_band: DEFAULT_DROP_EDGE_BAND,
            focus_history_limit: DEFAULT_FOCUS_HISTORY_LIMIT,
            default_split_ratio: 0.5,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(10..=60_000).contains(&self.chord_timeout_ms) {
            return Err(ConfigError::Invalid(
                "chord timeout must be between 10 and 60000 ms".to_string(),
            ));
        }
        if self.min_pane_cells == 0 {
            return Err(ConfigError::Invalid(
                "minimum pane size must be at least one cell".to_string(),
            ));
        }
        if !(0.0..0.5).contains(&self.min_ratio) {
            return Err(ConfigError::Invalid(
                "minimum ratio must be in [0, 0.5)".to_string(),
            ));
        }
        if !(0.0..=0.5).contains(&self.drop_edge_band) {
            return Err(ConfigError::Invalid(
                "drop edge band must be in [0, 0.5]".to_string(),
            ));
        }
        if self.focus_history_limit == 0 {
            return Err(ConfigError::Invalid(
                "focus history must keep at least one entry".to_string(),
            ));
        }
        if self.default_split_ratio <= self.min_ratio
            || self.default_split_ratio >= 1.0 - self.min_ratio
        {
            return Err(ConfigError::Invalid(
                "default split ratio must leave both panes above the minimum ratio".to_string(),
            ));
        }
        Ok(())
    }

    pub fn chord_timeout(&self) -> Duration {
        Duration::from_millis(self.chord_timeout_ms)
    }

    /// Minimum fraction of a container of `container_cells` a child may take.
    pub fn min_fraction(&self, container_cells: u16) -> f64 {
        if container_cells == 0 {
            return self.min_ratio;
        }
        let by_cells = f64::from(self.min_pane_cells) / f64::from(container_cells);
        by_cells.max(self.min_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chord_timeout(), Duration::from_millis(1_000));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            indoc! {r#"
                {
                    "chord_timeout_ms": 250,
                    "min_pane_cells": 6
                }
            "#}
            .as_bytes(),
        )
        .unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.chord_timeout_ms, 250);
        assert_eq!(config.min_pane_cells, 6);
        assert_eq!(config.focus_history_limit, DEFAULT_FOCUS_HISTORY_LIMIT);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "drop_edge_band": 0.9 }"#).unwrap();
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn min_fraction_uses_the_larger_bound() {
        let config = EngineConfig::default();
        assert!((config.min_fraction(40) - 0.1).abs() < 1e-9);
        assert!((config.min_fraction(400) - config.min_ratio).abs() < 1e-9);
        assert!((config.min_fraction(0) - config.min_ratio).abs() < 1e-9);
    }
}
