use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::color::{Palette, Rgb};
use crate::error::HeatmapError;

/// Top-level configuration for a heatmap run.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Title drawn above the calendar. Empty means no title.
    #[serde(default)]
    pub title: String,

    /// First year to draw, inclusive. Default: 2020.
    #[serde(default = "default_start_year")]
    pub start_year: i32,

    /// Last year to draw, inclusive. Default: 2025.
    #[serde(default = "default_end_year")]
    pub end_year: i32,

    /// Unit suffix used in cell tooltips. Default: "secs".
    #[serde(default = "default_units")]
    pub units: String,

    /// Output SVG path. Default: "heatmap.svg".
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Fail instead of drawing an all-empty calendar when there is no data.
    #[serde(default)]
    pub require_data: bool,

    /// Calendar colors.
    #[serde(default)]
    pub colors: ColorsConfig,

    /// Read-time source configuration.
    #[serde(default)]
    pub source: SourceConfig,
}

/// Calendar colors as `#RRGGBB` strings.
#[derive(Debug, Clone, Deserialize)]
pub struct ColorsConfig {
    /// Least active day. Default: "#4DD2FF".
    #[serde(default = "default_low_color")]
    pub low: String,

    /// Most active day. Default: "#FFE66D".
    #[serde(default = "default_high_color")]
    pub high: String,

    /// Day without activity. Default: "#F7F7F7".
    #[serde(default = "default_empty_color")]
    pub empty: String,

    /// Headers and month labels. Default: "#2D3436".
    #[serde(default = "default_text_color")]
    pub text: String,
}

/// Read-time source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Reading summary endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Session cookie sent with the request.
    #[serde(default)]
    pub cookie: String,

    /// Request timeout. Default: 10s.
    #[serde(default = "default_source_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

// --- Default value functions ---

fn default_start_year() -> i32 {
    2020
}

fn default_end_year() -> i32 {
    2025
}

fn default_units() -> String {
    "secs".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("heatmap.svg")
}

fn default_low_color() -> String {
    "#4DD2FF".to_string()
}

fn default_high_color() -> String {
    "#FFE66D".to_string()
}

fn default_empty_color() -> String {
    "#F7F7F7".to_string()
}

fn default_text_color() -> String {
    "#2D3436".to_string()
}

fn default_endpoint() -> String {
    "https://i.weread.qq.com/readdata/summary?synckey=0".to_string()
}

fn default_source_timeout() -> Duration {
    Duration::from_secs(10)
}

// --- Default trait impls ---

impl Default for Config {
    fn default() -> Self {
        Self {
            title: String::new(),
            start_year: default_start_year(),
            end_year: default_end_year(),
            units: default_units(),
            output: default_output(),
            require_data: false,
            colors: ColorsConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            low: default_low_color(),
            high: default_high_color(),
            empty: default_empty_color(),
            text: default_text_color(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            cookie: String::new(),
            timeout: default_source_timeout(),
        }
    }
}

// --- Loading, overrides and validation ---

impl SourceConfig {
    /// Checks what a live fetch needs. File input skips this.
    pub fn validate(&self) -> Result<(), HeatmapError> {
        if self.endpoint.trim().is_empty() {
            return Err(HeatmapError::Configuration("source.endpoint is required".into()));
        }
        if self.cookie.trim().is_empty() {
            return Err(HeatmapError::Configuration(
                "source.cookie (or WEREAD_COOKIE) is required to fetch read times".into(),
            ));
        }
        Ok(())
    }
}

/// Earliest and latest year the calendar accepts.
const YEAR_BOUNDS: RangeInclusive<i32> = 1..=9999;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        let cfg: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        Ok(cfg)
    }

    /// Builds the effective configuration: the YAML file (or defaults),
    /// then overrides from `lookup`, then validation.
    pub fn resolve<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        cfg.apply_overrides(lookup)?;
        cfg.validate()?;

        Ok(cfg)
    }

    /// Applies environment-style overrides. Unset or empty variables are
    /// ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), HeatmapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("TITLE") {
            self.title = v;
        }
        if let Some(v) = get("START_YEAR") {
            self.start_year = parse_year("START_YEAR", &v)?;
        }
        if let Some(v) = get("END_YEAR") {
            self.end_year = parse_year("END_YEAR", &v)?;
        }
        if let Some(v) = get("UNITS") {
            self.units = v;
        }
        if let Some(v) = get("OUTPUT") {
            self.output = PathBuf::from(v);
        }
        if let Some(v) = get("LOW_COLOR") {
            self.colors.low = v;
        }
        if let Some(v) = get("HIGH_COLOR") {
            self.colors.high = v;
        }
        if let Some(v) = get("EMPTY_COLOR") {
            self.colors.empty = v;
        }
        if let Some(v) = get("TEXT_COLOR") {
            self.colors.text = v;
        }
        if let Some(v) = get("WEREAD_COOKIE") {
            self.source.cookie = v;
        }

        Ok(())
    }

    /// Validate the configuration for required fields and consistency.
    pub fn validate(&self) -> Result<(), HeatmapError> {
        self.palette()?;

        for (name, year) in [("start_year", self.start_year), ("end_year", self.end_year)] {
            if !YEAR_BOUNDS.contains(&year) {
                return Err(HeatmapError::Configuration(format!(
                    "{name} {year} must be between {} and {}",
                    YEAR_BOUNDS.start(),
                    YEAR_BOUNDS.end()
                )));
            }
        }

        if self.end_year < self.start_year {
            return Err(HeatmapError::Configuration(format!(
                "end_year {} must not be before start_year {}",
                self.end_year, self.start_year
            )));
        }

        if self.units.trim().is_empty() {
            return Err(HeatmapError::Configuration("units is required".into()));
        }

        if self.output.as_os_str().is_empty() {
            return Err(HeatmapError::Configuration("output is required".into()));
        }

        Ok(())
    }

    /// Parses the configured colors.
    pub fn palette(&self) -> Result<Palette, HeatmapError> {
        Ok(Palette {
            low: parse_color("colors.low", &self.colors.low)?,
            high: parse_color("colors.high", &self.colors.high)?,
            empty: parse_color("colors.empty", &self.colors.empty)?,
            text: parse_color("colors.text", &self.colors.text)?,
        })
    }

    /// Years to draw, inclusive.
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    /// Number of years drawn.
    pub fn year_count(&self) -> usize {
        (self.end_year - self.start_year + 1).max(0) as usize
    }
}

fn parse_color(name: &str, value: &str) -> Result<Rgb, HeatmapError> {
    value
        .trim()
        .parse()
        .map_err(|e| HeatmapError::Configuration(format!("{name}: {e}")))
}

fn parse_year(name: &str, value: &str) -> Result<i32, HeatmapError> {
    value
        .trim()
        .parse()
        .map_err(|_| HeatmapError::Configuration(format!("{name} {value:?} is not a year")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.start_year, 2020);
        assert_eq!(cfg.end_year, 2025);
        assert_eq!(cfg.units, "secs");
        assert_eq!(cfg.output, PathBuf::from("heatmap.svg"));
        assert_eq!(cfg.source.timeout, Duration::from_secs(10));
        assert!(!cfg.require_data);
        assert_eq!(cfg.year_count(), 6);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_default_palette() {
        let palette = Config::default().palette().expect("defaults are valid");
        assert_eq!(palette.low, Rgb::new(0x4d, 0xd2, 0xff));
        assert_eq!(palette.high, Rgb::new(0xff, 0xe6, 0x6d));
        assert_eq!(palette.empty, Rgb::new(0xf7, 0xf7, 0xf7));
        assert_eq!(palette.text, Rgb::new(0x2d, 0x34, 0x36));
    }

    #[test]
    fn test_yaml_partial_config() {
        let yaml = r##"
title: My Reading
start_year: 2023
colors:
  high: "#FF6B6B"
source:
  timeout: 30s
"##;
        let cfg: Config = serde_yaml::from_str(yaml).expect("should parse");
        assert_eq!(cfg.title, "My Reading");
        assert_eq!(cfg.start_year, 2023);
        assert_eq!(cfg.end_year, 2025);
        assert_eq!(cfg.colors.high, "#FF6B6B");
        assert_eq!(cfg.colors.low, "#4DD2FF");
        assert_eq!(cfg.source.timeout, Duration::from_secs(30));
        assert!(cfg.source.endpoint.starts_with("https://i.weread.qq.com/"));
    }

    #[test]
    fn test_overrides() {
        let mut cfg = Config::default();
        cfg.apply_overrides(env(&[
            ("START_YEAR", "2023"),
            ("END_YEAR", " 2024 "),
            ("LOW_COLOR", "#000000"),
            ("WEREAD_COOKIE", "wr_skey=abc"),
            ("TITLE", ""),
        ]))
        .expect("should apply");

        assert_eq!(cfg.years(), 2023..=2024);
        assert_eq!(cfg.colors.low, "#000000");
        assert_eq!(cfg.source.cookie, "wr_skey=abc");
        assert_eq!(cfg.title, "");
    }

    #[test]
    fn test_override_rejects_bad_year() {
        let mut cfg = Config::default();
        let result = cfg.apply_overrides(env(&[("END_YEAR", "next year")]));
        assert!(matches!(result, Err(HeatmapError::Configuration(_))));
    }

    #[test]
    fn test_validation_malformed_color() {
        let mut cfg = Config::default();
        cfg.colors.empty = "f7f7f7".to_string();
        let err = cfg.validate().expect_err("should fail");
        assert!(matches!(err, HeatmapError::Configuration(_)));
        assert!(err.to_string().contains("colors.empty"));
    }

    #[test]
    fn test_validation_year_order() {
        let cfg = Config {
            start_year: 2025,
            end_year: 2024,
            ..Default::default()
        };
        let err = cfg.validate().expect_err("should fail");
        assert!(err.to_string().contains("must not be before"));
    }

    #[test]
    fn test_validation_single_year() {
        let cfg = Config {
            start_year: 2024,
            end_year: 2024,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.year_count(), 1);
    }

    #[test]
    fn test_validation_year_bounds() {
        let cfg = Config {
            start_year: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validation_empty_units() {
        let cfg = Config {
            units: "  ".to_string(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_resolve_without_file() {
        let cfg = Config::resolve(None, env(&[("START_YEAR", "2024")])).expect("should resolve");
        assert_eq!(cfg.years(), 2024..=2025);
    }

    #[test]
    fn test_resolve_reports_invalid_override() {
        let result = Config::resolve(None, env(&[("HIGH_COLOR", "#GGGGGG")]));
        let err = result.expect_err("should fail");
        assert!(matches!(
            err.downcast_ref::<HeatmapError>(),
            Some(HeatmapError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/heatmap.yaml")).expect_err("should fail");
        assert!(err.to_string().contains("reading config file"));
    }

    #[test]
    fn test_source_requires_cookie() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());

        let err = cfg.source.validate().expect_err("should fail");
        assert!(matches!(err, HeatmapError::Configuration(_)));
        assert!(err.to_string().contains("WEREAD_COOKIE"));

        let mut cfg = Config::default();
        cfg.apply_overrides(env(&[("WEREAD_COOKIE", "wr_skey=abc")]))
            .expect("should apply");
        assert!(cfg.source.validate().is_ok());
    }
}
