//! Image I/O operations service
//!
//! Decoding sniffs the container from content, so inputs without an
//! extension (URLs, temp files) work. Output is always PNG.

use crate::error::{NormalizeError, Result};
use image::{DynamicImage, ImageFormat};
use std::path::Path;

/// Service for handling image decode, encode and file output
pub struct ImageIOService;

impl ImageIOService {
    /// Identify the container format from the leading bytes
    ///
    /// # Errors
    /// - Bytes do not start with a known image signature
    pub fn sniff_format(bytes: &[u8]) -> Result<ImageFormat> {
        image::guess_format(bytes).map_err(|_| {
            let preview: Vec<String> = bytes.iter().take(8).map(|b| format!("{b:02x}")).collect();
            NormalizeError::processing_stage_error(
                "decode",
                "unrecognized image signature",
                Some(&format!("{} bytes, starts with [{}]", bytes.len(), preview.join(" "))),
            )
        })
    }

    /// Decode an image from raw bytes
    ///
    /// # Errors
    /// - Unknown format or corrupt data
    ///
    /// # Examples
    /// ```rust,no_run
    /// use bgnorm::services::ImageIOService;
    ///
    /// let data = std::fs::read("input.jpg")?;
    /// let image = ImageIOService::decode_bytes(&data)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(NormalizeError::processing_stage_error(
                "decode",
                "no image data",
                None,
            ));
        }
        let format = Self::sniff_format(bytes)?;
        image::load_from_memory_with_format(bytes, format).map_err(|e| {
            NormalizeError::processing_stage_error(
                "decode",
                &format!("Failed to decode {:?} image: {}", format, e),
                Some(&format!("{} bytes", bytes.len())),
            )
        })
    }

    /// Read the raw bytes of an image file
    ///
    /// # Errors
    /// - File does not exist or cannot be read
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        let path_ref = path.as_ref();
        if !path_ref.is_file() {
            return Err(NormalizeError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }
        std::fs::read(path_ref)
            .map_err(|e| NormalizeError::file_io_error("read image file", path_ref, &e))
    }

    /// Encode to PNG in memory
    ///
    /// # Errors
    /// - Encoder failure
    pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| {
                NormalizeError::processing_stage_error(
                    "save",
                    &format!("Failed to encode PNG: {}", e),
                    None,
                )
            })?;
        Ok(buffer)
    }

    /// Encode as PNG and write to `path` in one write, creating parent directories
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    /// - Encoder failure
    /// - Parent directory cannot be created or file cannot be written
    pub fn save_png<P: AsRef<Path>>(image: &DynamicImage, path: P) -> Result<u64> {
        let path_ref = path.as_ref();
        let encoded = Self::encode_png(image)?;

        if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                NormalizeError::file_io_error("create output directory", parent, &e)
            })?;
        }

        std::fs::write(path_ref, &encoded)
            .map_err(|e| NormalizeError::file_io_error("write PNG", path_ref, &e))?;
        Ok(encoded.len() as u64)
    }
}
