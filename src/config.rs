use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::source::DEFAULT_URL;
use crate::tracker::{Projector, DEFAULT_CAPACITY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub sampling: SamplingConfig,
    pub raster: RasterConfig,
    pub projection: Projector,
    pub assets: AssetsConfig,
    pub panel: PanelConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    #[serde(deserialize_with = "human_duration")]
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    #[serde(deserialize_with = "human_duration")]
    pub interval: Duration,
    pub capacity: usize,
    /// Refresh the panel on every n-th successful fetch.
    pub display_refresh_divisor: u64,
    #[serde(deserialize_with = "human_duration")]
    pub marker_period: Duration,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            capacity: DEFAULT_CAPACITY,
            display_refresh_divisor: 2,
            marker_period: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    pub width: u32,
    pub height: u32,
    pub rotate_180: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            width: 264,
            height: 176,
            rotate_180: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub base_map: PathBuf,
    pub icon: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            base_map: PathBuf::from("world_map_m.bmp"),
            icon: PathBuf::from("iss.bmp"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub output_dir: PathBuf,
    /// Consecutive failed refreshes tolerated before giving up.
    pub max_consecutive_failures: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("frames"),
            max_consecutive_failures: 3,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        // an empty document means "all defaults"
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.into()));
        let sampling = &self.sampling;
        if sampling.capacity == 0 {
            return invalid("sampling.capacity must be at least 1");
        }
        if sampling.display_refresh_divisor == 0 {
            return invalid("sampling.display_refresh_divisor must be at least 1");
        }
        if sampling.interval.is_zero() {
            return invalid("sampling.interval must be positive");
        }
        if sampling.marker_period < sampling.interval {
            return invalid("sampling.marker_period must not be shorter than sampling.interval");
        }
        if self.raster.width == 0 || self.raster.height == 0 {
            return invalid("raster dimensions must be positive");
        }
        Ok(())
    }

    /// Number of samples between two interval markers.
    pub fn intervals_per_marker(&self) -> usize {
        let ratio = self.sampling.marker_period.as_secs_f64() / self.sampling.interval.as_secs_f64();
        (ratio.round() as usize).max(1)
    }
}

fn human_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.sampling.interval, Duration::from_secs(30));
        assert_eq!(config.sampling.capacity, 1440);
        assert_eq!(config.sampling.display_refresh_divisor, 2);
        assert_eq!(config.raster.width, 264);
        assert_eq!(config.raster.height, 176);
        assert_eq!(config.projection, Projector::default());
        assert_eq!(config.source.url, DEFAULT_URL);
        assert_eq!(config.intervals_per_marker(), 30);
    }

    #[test]
    fn parses_partial_sections() {
        let yaml = r#"
sampling:
  interval: 1m
  marker_period: 10m
  display_refresh_divisor: 1
raster:
  rotate_180: true
projection:
  x_offset: 100.0
panel:
  output_dir: /tmp/frames
"#;
        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.sampling.interval, Duration::from_secs(60));
        assert_eq!(config.sampling.capacity, 1440);
        assert_eq!(config.intervals_per_marker(), 10);
        assert!(config.raster.rotate_180);
        assert_eq!(config.projection.x_offset, 100.0);
        assert_eq!(config.projection.x_scale, 0.733);
        assert_eq!(config.panel.output_dir, PathBuf::from("/tmp/frames"));
        assert_eq!(config.panel.max_consecutive_failures, 3);
    }

    #[test]
    fn marker_interval_is_rounded() {
        let mut config = Config::default();
        config.sampling.interval = Duration::from_secs(40);
        assert_eq!(config.intervals_per_marker(), 23); // 900 / 40 = 22.5
        config.sampling.interval = Duration::from_secs(900);
        assert_eq!(config.intervals_per_marker(), 1);
    }

    #[test]
    fn rejects_bad_values() {
        for yaml in [
            "sampling: { capacity: 0 }",
            "sampling: { display_refresh_divisor: 0 }",
            "sampling: { interval: 0s }",
            "sampling: { interval: 20m, marker_period: 15m }",
            "raster: { width: 0 }",
        ] {
            assert!(
                matches!(Config::from_str(yaml), Err(ConfigError::Invalid(_))),
                "{yaml}"
            );
        }
    }

    #[test]
    fn rejects_unparsable_duration() {
        assert!(matches!(
            Config::from_str("sampling: { interval: soon }"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
