//! Arguments shared by both binaries

use crate::config::BackgroundColor;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Normalization overrides; each flag wins over `--config`, which wins over defaults
#[derive(Args, Debug, Clone, Default)]
pub struct NormalizeArgs {
    /// Margin around the content, as a percentage of its larger side [default: 6]
    #[arg(long, value_name = "PERCENT")]
    pub margin_percent: Option<f64>,

    /// Output aspect ratio as W:H or a decimal width/height [default: 1:1]
    #[arg(long, value_name = "RATIO", value_parser = parse_ratio)]
    pub target_ratio: Option<f64>,

    /// Background color behind transparent areas (#rrggbb, #rgb or r,g,b) [default: #aaaaaa]
    #[arg(long, value_name = "COLOR")]
    pub background: Option<BackgroundColor>,

    /// JSON file with margin_percent, target_ratio and background_color
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Background-removal backend selection
#[derive(Args, Debug, Clone)]
pub struct MatteArgs {
    /// Background-removal backend
    #[arg(long, value_enum, default_value_t = CliMatteBackend::Local)]
    pub matte: CliMatteBackend,

    /// ONNX model file for the local backend [default: ~/.u2net/<model>.onnx]
    #[arg(long, value_name = "PATH", env = "BGNORM_MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Model family, selects input size and normalization
    #[arg(long, value_enum, default_value_t = CliModelKind::U2net)]
    pub model_kind: CliModelKind,

    /// Endpoint of the remote background-removal service
    #[arg(long, value_name = "URL", env = "BGNORM_MATTE_URL")]
    pub matte_endpoint: Option<String>,

    /// API key sent as x-api-key to the remote service
    #[arg(long, value_name = "KEY", env = "BGNORM_MATTE_API_KEY", hide_env_values = true)]
    pub matte_api_key: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliMatteBackend {
    /// Run a segmentation model in-process
    Local,
    /// Call an HTTP background-removal service
    Remote,
    /// Use the input's own alpha channel
    Passthrough,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliModelKind {
    U2net,
    Isnet,
}

/// Accepts `W:H` (e.g. `4:3`) or a positive decimal
fn parse_ratio(value: &str) -> Result<f64, String> {
    let ratio = match value.split_once(':') {
        Some((w, h)) => {
            let w: f64 = w.trim().parse().map_err(|_| format!("invalid width in '{value}'"))?;
            let h: f64 = h.trim().parse().map_err(|_| format!("invalid height in '{value}'"))?;
            if h == 0.0 {
                return Err(format!("height must be nonzero in '{value}'"));
            }
            w / h
        },
        None => value
            .trim()
            .parse()
            .map_err(|_| format!("expected W:H or a number, got '{value}'"))?,
    };

    if ratio.is_finite() && ratio > 0.0 {
        Ok(ratio)
    } else {
        Err(format!("ratio must be positive, got '{value}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ratio() {
        assert_eq!(parse_ratio("1:1").unwrap(), 1.0);
        assert_eq!(parse_ratio("4:3").unwrap(), 4.0 / 3.0);
        assert_eq!(parse_ratio("0.75").unwrap(), 0.75);
        assert!(parse_ratio("4:0").is_err());
        assert!(parse_ratio("-1").is_err());
        assert!(parse_ratio("wide").is_err());
    }
}
