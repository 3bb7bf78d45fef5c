//! Background-removal backends
//!
//! A [`MatteProvider`] turns a decoded image into one whose alpha channel
//! marks the foreground. The normalization core only ever looks at that
//! alpha channel, so backends can be swapped freely.

#[cfg(feature = "tract")]
mod local;
mod passthrough;
mod remote;

#[cfg(feature = "tract")]
pub use local::LocalModelMatte;
pub use passthrough::PassthroughMatte;
pub use remote::RemoteMatte;

use crate::error::{NormalizeError, Result};
use async_trait::async_trait;
use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use std::path::PathBuf;
use std::time::Duration;

/// Opaque image → image-with-alpha capability
#[async_trait]
pub trait MatteProvider: Send {
    /// Produce an image whose alpha is nonzero exactly where foreground is present
    ///
    /// # Errors
    /// - Backend failures (model execution, remote service, decode of the result)
    async fn apply(&mut self, image: DynamicImage) -> Result<DynamicImage>;

    /// Short backend name for logs
    fn name(&self) -> &str;
}

/// Which backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatteBackend {
    /// Segmentation model run in-process
    #[default]
    Local,
    /// HTTP background-removal service
    Remote,
    /// Use the input's own alpha channel
    Passthrough,
}

impl std::fmt::Display for MatteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Passthrough => "passthrough",
        })
    }
}

/// Segmentation model family, selecting input size and normalization constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelKind {
    #[default]
    U2net,
    Isnet,
}

impl ModelKind {
    /// Square input edge the model expects
    #[must_use]
    pub const fn input_size(self) -> usize {
        match self {
            Self::U2net => 320,
            Self::Isnet => 1024,
        }
    }

    /// Per-channel RGB mean subtracted after scaling to [0, 1]
    ///
    /// Both families share the ImageNet mean; they differ only in the std.
    #[must_use]
    pub const fn mean(self) -> [f32; 3] {
        [0.485, 0.456, 0.406]
    }

    /// Per-channel RGB standard deviation
    #[must_use]
    pub const fn std(self) -> [f32; 3] {
        match self {
            Self::U2net => [0.229, 0.224, 0.225],
            Self::Isnet => [1.0, 1.0, 1.0],
        }
    }

    /// File name of the model under the default model directory
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::U2net => "u2net.onnx",
            Self::Isnet => "isnet-general-use.onnx",
        }
    }

    /// `~/.u2net/<file_name>`
    #[must_use]
    pub fn default_path(self) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".u2net").join(self.file_name()))
    }
}

/// Everything needed to construct a provider
#[derive(Debug, Clone, Default)]
pub struct MatteSettings {
    pub backend: MatteBackend,
    pub model_kind: ModelKind,
    /// Overrides [`ModelKind::default_path`]
    pub model_path: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Request timeout for the remote backend
    pub timeout: Option<Duration>,
}

impl MatteSettings {
    #[must_use]
    pub fn new(backend: MatteBackend) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    /// Model file that the local backend will load
    ///
    /// # Errors
    /// - No explicit path and no home directory to derive the default from
    pub fn resolved_model_path(&self) -> Result<PathBuf> {
        self.model_path
            .clone()
            .or_else(|| self.model_kind.default_path())
            .ok_or_else(|| {
                NormalizeError::invalid_config(
                    "No model path given and home directory is unknown; pass --model",
                )
            })
    }
}

/// Construct the provider described by `settings`
///
/// # Errors
/// - Local backend requested but the `tract` feature is disabled
/// - Model file missing or unloadable
/// - Remote backend without an endpoint
pub fn create_provider(settings: &MatteSettings) -> Result<Box<dyn MatteProvider>> {
    match settings.backend {
        MatteBackend::Local => create_local(settings),
        MatteBackend::Remote => {
            let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                NormalizeError::invalid_config(concat!(
                    "Remote matte backend requires an endpoint ",
                    "(--matte-endpoint or BGNORM_MATTE_URL)"
                ))
            })?;
            let provider = RemoteMatte::new(
                endpoint,
                settings.api_key.clone(),
                settings.timeout.unwrap_or(Duration::from_secs(30)),
            )?;
            Ok(Box::new(provider))
        },
        MatteBackend::Passthrough => Ok(Box::new(PassthroughMatte)),
    }
}

#[cfg(feature = "tract")]
fn create_local(settings: &MatteSettings) -> Result<Box<dyn MatteProvider>> {
    let path = settings.resolved_model_path()?;
    Ok(Box::new(LocalModelMatte::from_path(&path, settings.model_kind)?))
}

#[cfg(not(feature = "tract"))]
fn create_local(_settings: &MatteSettings) -> Result<Box<dyn MatteProvider>> {
    Err(NormalizeError::invalid_config(
        "Local matte backend requires the 'tract' feature",
    ))
}

/// Install `mask` as the alpha of `image`, keeping any existing transparency
///
/// Pixels with zero resulting alpha are cleared to `(0, 0, 0, 0)`.
///
/// # Errors
/// - Mask dimensions differ from the image
pub fn apply_mask(image: &DynamicImage, mask: &GrayImage) -> Result<RgbaImage> {
    let rgba = image.to_rgba8();
    if rgba.dimensions() != mask.dimensions() {
        return Err(NormalizeError::matte(format!(
            "mask is {}x{} but image is {}x{}",
            mask.width(),
            mask.height(),
            rgba.width(),
            rgba.height()
        )));
    }

    Ok(RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let m = mask.get_pixel(x, y).0[0];
        let alpha = ((u32::from(a) * u32::from(m) + 127) / 255) as u8;
        if alpha == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([r, g, b, alpha])
        }
    }))
}
