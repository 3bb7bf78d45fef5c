//! Configuration conversion utilities for CLI arguments

use super::args::{CliMatteBackend, CliModelKind, MatteArgs, NormalizeArgs};
use crate::config::{NormalizationConfig, NormalizationConfigBuilder};
use crate::matte::{MatteBackend, MatteSettings, ModelKind};
use anyhow::{Context, Result};
use std::time::Duration;

/// Convert CLI arguments to library configuration
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Defaults, then `--config` file, then individual flags
    pub(crate) fn normalization(args: &NormalizeArgs) -> Result<NormalizationConfig> {
        let base = match &args.config {
            Some(path) => NormalizationConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => NormalizationConfig::default(),
        };

        let mut builder = NormalizationConfigBuilder::from_config(base);
        if let Some(margin) = args.margin_percent {
            builder = builder.margin_percent(margin);
        }
        if let Some(ratio) = args.target_ratio {
            builder = builder.target_ratio(ratio);
        }
        if let Some(color) = args.background {
            builder = builder.background_color(color);
        }

        builder.build().context("Invalid normalization settings")
    }

    pub(crate) fn matte_settings(args: &MatteArgs, timeout: Duration) -> MatteSettings {
        MatteSettings {
            backend: match args.matte {
                CliMatteBackend::Local => MatteBackend::Local,
                CliMatteBackend::Remote => MatteBackend::Remote,
                CliMatteBackend::Passthrough => MatteBackend::Passthrough,
            },
            model_kind: match args.model_kind {
                CliModelKind::U2net => ModelKind::U2net,
                CliModelKind::Isnet => ModelKind::Isnet,
            },
            model_path: args.model.clone(),
            endpoint: args.matte_endpoint.clone(),
            api_key: args.matte_api_key.clone(),
            timeout: Some(timeout),
        }
    }
}
