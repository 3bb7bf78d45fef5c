//! Configuration types for normalization and fetching

use crate::error::{NormalizeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default margin around cropped content, as a percentage of its larger side
pub const DEFAULT_MARGIN_PERCENT: f64 = 6.0;

/// Default output aspect ratio (width / height)
pub const DEFAULT_TARGET_RATIO: f64 = 1.0;

/// Default flattening color, `#aaaaaa`
pub const DEFAULT_BACKGROUND: BackgroundColor = BackgroundColor::new(170, 170, 170);

/// Opaque RGB color used to flatten transparency in the final output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BackgroundColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl BackgroundColor {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub fn to_rgb(self) -> image::Rgb<u8> {
        image::Rgb([self.r, self.g, self.b])
    }

    /// Lowercase `#rrggbb` form
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for BackgroundColor {
    fn default() -> Self {
        DEFAULT_BACKGROUND
    }
}

impl std::fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for BackgroundColor {
    type Err = NormalizeError;

    /// Accepts `#rrggbb`, `rrggbb`, `#rgb` and `r,g,b`
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || {
            NormalizeError::invalid_config(format!(
                "Invalid background color '{}': expected #rrggbb, #rgb or r,g,b",
                s
            ))
        };

        if trimmed.contains(',') {
            let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
            let [r, g, b] = parts.as_slice() else {
                return Err(invalid());
            };
            let channel = |v: &str| v.parse::<u8>().map_err(|_| invalid());
            return Ok(Self::new(channel(*r)?, channel(*g)?, channel(*b)?));
        }

        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !hex.is_ascii() {
            return Err(invalid());
        }
        let digit = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|v| u8::from_str_radix(v, 16).ok())
                .ok_or_else(invalid)
        };

        match hex.len() {
            6 => Ok(Self::new(digit(0..2)?, digit(2..4)?, digit(4..6)?)),
            3 => {
                let (r, g, b) = (digit(0..1)?, digit(1..2)?, digit(2..3)?);
                Ok(Self::new(r * 17, g * 17, b * 17))
            },
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for BackgroundColor {
    type Error = NormalizeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BackgroundColor> for String {
    fn from(color: BackgroundColor) -> Self {
        color.to_hex()
    }
}

/// Parameters shared by the batch and single-file drivers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Padding on all sides, as a percentage of the larger content dimension
    pub margin_percent: f64,

    /// Width / height ratio the final canvas must satisfy
    pub target_ratio: f64,

    /// Color behind transparent pixels in the saved output
    pub background_color: BackgroundColor,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            margin_percent: DEFAULT_MARGIN_PERCENT,
            target_ratio: DEFAULT_TARGET_RATIO,
            background_color: DEFAULT_BACKGROUND,
        }
    }
}

impl NormalizationConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bgnorm::{BackgroundColor, NormalizationConfig};
    ///
    /// let config = NormalizationConfig::builder()
    ///     .margin_percent(10.0)
    ///     .target_ratio(4.0 / 3.0)
    ///     .background_color(BackgroundColor::new(255, 255, 255))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.margin_percent, 10.0);
    /// ```
    #[must_use]
    pub fn builder() -> NormalizationConfigBuilder {
        NormalizationConfigBuilder::default()
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Margin percent negative or not finite
    /// - Target ratio zero, negative or not finite
    pub fn validate(&self) -> Result<()> {
        if !self.margin_percent.is_finite() || self.margin_percent < 0.0 {
            return Err(NormalizeError::config_value_error(
                "margin percent",
                self.margin_percent,
                ">= 0",
            ));
        }
        if !self.target_ratio.is_finite() || self.target_ratio <= 0.0 {
            return Err(NormalizeError::config_value_error(
                "target ratio",
                self.target_ratio,
                "> 0",
            ));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file; missing fields keep their defaults
    ///
    /// # Errors
    /// - File cannot be read
    /// - JSON is malformed or fails validation
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = std::fs::read_to_string(path_ref)
            .map_err(|e| NormalizeError::file_io_error("read config file", path_ref, &e))?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            NormalizeError::invalid_config(format!(
                "Failed to parse config file '{}': {}",
                path_ref.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Builder for `NormalizationConfig`
#[derive(Debug, Default)]
pub struct NormalizationConfigBuilder {
    config: NormalizationConfig,
}

impl NormalizationConfigBuilder {
    /// Start from an existing configuration instead of the defaults
    #[must_use]
    pub fn from_config(config: NormalizationConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn margin_percent(mut self, percent: f64) -> Self {
        self.config.margin_percent = percent;
        self
    }

    #[must_use]
    pub fn target_ratio(mut self, ratio: f64) -> Self {
        self.config.target_ratio = ratio;
        self
    }

    #[must_use]
    pub fn background_color(mut self, color: BackgroundColor) -> Self {
        self.config.background_color = color;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// - Any value rejected by [`NormalizationConfig::validate`]
    pub fn build(self) -> Result<NormalizationConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// HTTP fetch settings for the batch driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Upper bound on a single request, connect through body
    pub timeout: Duration,
    /// Largest response body accepted
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_bytes: 50 * 1024 * 1024,
            user_agent: format!("bgnorm/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
