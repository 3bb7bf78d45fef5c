//! Log output for the command-line drivers
//!
//! The library only emits events and spans. Binaries install a subscriber
//! through [`TracingConfig`]; all output goes to stdout so progress and
//! per-row failures interleave in one stream.

/// Directives appended to every level filter; the HTTP stack is chatty at debug
const QUIET_DEPENDENCIES: &str =
    "hyper=warn,reqwest=warn,rustls=warn,tract_core=warn,tract_onnx=warn";

/// How log lines are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Colored single-line output for terminals
    #[default]
    Console,
    /// Uncolored single-line output for pipes, CI logs and `NO_COLOR`
    Compact,
    /// One JSON object per event, with the enclosing batch/row span fields
    #[cfg(feature = "tracing-json")]
    Json,
}

/// Subscriber settings assembled from CLI flags and the environment
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// `-v` count: 0 info, 1 debug, 2+ trace
    pub verbosity: u8,
    pub format: TracingFormat,
    /// Full `EnvFilter` directive string; replaces the verbosity level when set
    pub env_filter: Option<String>,
    /// Identifier logged once at startup to correlate a run's output
    pub run_id: Option<String>,
}

impl TracingConfig {
    #[must_use]
    pub fn new(verbosity: u8) -> Self {
        Self {
            verbosity,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Ignored when `filter` is blank
    #[must_use]
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        let filter = filter.into();
        if !filter.trim().is_empty() {
            self.env_filter = Some(filter);
        }
        self
    }

    #[must_use]
    pub fn with_run_id<S: Into<String>>(mut self, run_id: S) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Level implied by the `-v` count
    #[must_use]
    pub fn level(&self) -> &'static str {
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Directive string handed to `EnvFilter`
    #[must_use]
    pub fn directives(&self) -> String {
        match &self.env_filter {
            Some(filter) => filter.clone(),
            None => format!("{},{}", self.level(), QUIET_DEPENDENCIES),
        }
    }

    /// Install the global subscriber
    ///
    /// # Errors
    /// - Invalid filter directive
    /// - A global subscriber is already installed
    #[cfg(feature = "cli")]
    pub fn init(self) -> anyhow::Result<()> {
        use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let filter = EnvFilter::try_new(self.directives())?;
        let base = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false);

        let registry = tracing_subscriber::registry().with(filter);
        match self.format {
            TracingFormat::Console => registry.with(base.with_ansi(true).compact()).try_init()?,
            TracingFormat::Compact => registry.with(base.with_ansi(false).compact()).try_init()?,
            #[cfg(feature = "tracing-json")]
            TracingFormat::Json => registry
                .with(base.json().with_current_span(true).with_span_list(true))
                .try_init()?,
        }

        if let Some(run_id) = &self.run_id {
            tracing::info!(run_id = %run_id, "Run started");
        }
        Ok(())
    }
}

/// Subscriber setup shared by both binaries
///
/// `RUST_LOG` replaces the `-v` level when set and non-blank. `NO_COLOR`
/// switches to [`TracingFormat::Compact`]. Returns the run id.
///
/// # Errors
/// - Any error from [`TracingConfig::init`]
#[cfg(feature = "cli")]
pub fn init_cli_tracing(verbosity: u8) -> anyhow::Result<String> {
    let run_id = uuid::Uuid::new_v4().to_string();

    let format = if std::env::var_os("NO_COLOR").is_some() {
        TracingFormat::Compact
    } else {
        TracingFormat::Console
    };

    let mut config = TracingConfig::new(verbosity)
        .with_format(format)
        .with_run_id(run_id.clone());
    if let Ok(filter) = std::env::var("RUST_LOG") {
        config = config.with_env_filter(filter);
    }

    config.init()?;
    Ok(run_id)
}

/// Spans opened by the drivers
pub mod spans {
    use std::path::Path;
    use tracing::{info_span, Span};

    /// Whole CSV run
    pub fn batch(output_dir: &Path, rows: usize) -> Span {
        info_span!("batch", output_dir = %output_dir.display(), rows)
    }

    /// One CSV data row, by its 1-based index
    pub fn row(index: usize) -> Span {
        info_span!("row", index)
    }

    pub fn single(input: &Path, output: &Path) -> Span {
        info_span!("single", input = %input.display(), output = %output.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_verbosity() {
        assert_eq!(TracingConfig::new(0).level(), "info");
        assert_eq!(TracingConfig::new(1).level(), "debug");
        assert_eq!(TracingConfig::new(2).level(), "trace");
        assert_eq!(TracingConfig::new(9).level(), "trace");
    }

    #[test]
    fn test_directives_quiet_http_stack_unless_overridden() {
        let directives = TracingConfig::new(1).directives();
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("reqwest=warn"));

        let config = TracingConfig::new(1).with_env_filter("bgnorm=trace");
        assert_eq!(config.directives(), "bgnorm=trace");
    }

    #[test]
    fn test_blank_env_filter_is_ignored() {
        let config = TracingConfig::new(0).with_env_filter("  ");
        assert!(config.env_filter.is_none());
        assert!(config.directives().starts_with("info,"));
    }

    #[test]
    fn test_defaults() {
        let config = TracingConfig::default()
            .with_format(TracingFormat::Compact)
            .with_run_id("run-1");
        assert_eq!(config.verbosity, 0);
        assert_eq!(config.format, TracingFormat::Compact);
        assert_eq!(config.run_id.as_deref(), Some("run-1"));
        assert_eq!(TracingConfig::default().format, TracingFormat::Console);
    }
}
