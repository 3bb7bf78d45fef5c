//! Error types for normalization operations

use thiserror::Error;

/// Result type alias for normalization operations
pub type Result<T> = std::result::Result<T, NormalizeError>;

/// Error taxonomy for the fetch → matte → normalize → save pipeline
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Network failures while fetching source images or calling a matte service
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed or unusable CSV input
    #[error("CSV error: {0}")]
    Csv(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Degenerate geometry (zero-sized content, canvas overflow)
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Background-removal backend failures
    #[error("Matte error: {0}")]
    Matte(String),

    /// Processing errors at a named stage
    #[error("Processing error: {0}")]
    Processing(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NormalizeError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new geometry error
    pub fn invalid_geometry<S: Into<String>>(msg: S) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Create a new matte backend error
    pub fn matte<S: Into<String>>(msg: S) -> Self {
        Self::Matte(msg.into())
    }

    /// Create a new CSV error
    pub fn csv<S: Into<String>>(msg: S) -> Self {
        Self::Csv(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create network error with request context
    pub fn network_error<S: Into<String>, E: std::fmt::Display>(context: S, error: E) -> Self {
        Self::Network(format!("{}: {}", context.into(), error))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {})",
            parameter, value, valid_range
        ))
    }

    /// Create processing error with stage context
    pub fn processing_stage_error(stage: &str, details: &str, input_info: Option<&str>) -> Self {
        let input_context = match input_info {
            Some(info) => format!(" (input: {})", info),
            None => String::new(),
        };

        Self::Processing(format!(
            "Processing failed at stage '{}'{}: {}",
            stage, input_context, details
        ))
    }
}

impl From<csv::Error> for NormalizeError {
    fn from(error: csv::Error) -> Self {
        Self::Csv(error.to_string())
    }
}

impl From<reqwest::Error> for NormalizeError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Network(format!("request timed out: {}", error))
        } else {
            Self::Network(error.to_string())
        }
    }
}
