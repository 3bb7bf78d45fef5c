//! CSV-driven batch driver
//!
//! Rows are processed strictly in file order, one at a time. Every data row
//! consumes a 1-based index whether it is processed, skipped or fails, and
//! a successful row `i` is written to `<output_dir>/processed_<i>.png`.
//! Only manifest-level problems (unreadable file, empty file, missing
//! `image_url` column) abort the run.

use crate::error::{NormalizeError, Result};
use crate::pipeline::{
    NormalizationPipeline, ProcessingStage, SavedImage, StageContext, StageError,
};
use crate::services::ImageFetcher;
use crate::tracing_config::spans;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn, Instrument};

/// Column that holds the source URL
pub const IMAGE_URL_COLUMN: &str = "image_url";

/// Output file name for a row index
#[must_use]
pub fn output_file_name(index: usize) -> String {
    format!("processed_{}.png", index)
}

/// What a single data row asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSource {
    Url(String),
    /// Empty or absent `image_url` value
    Missing,
    /// The record itself could not be parsed
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
    /// 1-based position among data rows
    pub index: usize,
    pub source: RowSource,
}

/// Parsed and validated CSV input
#[derive(Debug, Clone)]
pub struct CsvManifest {
    headers: Vec<String>,
    rows: Vec<ManifestRow>,
}

impl CsvManifest {
    /// Read and validate a manifest file
    ///
    /// # Errors
    /// - File missing, unreadable or not UTF-8
    /// - Any error from [`Self::parse`]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        if !path_ref.is_file() {
            return Err(NormalizeError::file_io_error(
                "read CSV file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }
        let bytes = std::fs::read(path_ref)
            .map_err(|e| NormalizeError::file_io_error("read CSV file", path_ref, &e))?;
        let text = String::from_utf8(bytes).map_err(|e| {
            NormalizeError::csv(format!(
                "CSV file '{}' is not valid UTF-8: {}",
                path_ref.display(),
                e.utf8_error()
            ))
        })?;
        Self::parse(&text)
    }

    /// Parse manifest text; a leading byte-order mark is ignored
    ///
    /// # Errors
    /// - Empty input or no header row
    /// - Header lacks an `image_url` column
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        if text.trim().is_empty() {
            return Err(NormalizeError::csv("CSV file is empty"));
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let column = headers
            .iter()
            .position(|h| h == IMAGE_URL_COLUMN)
            .ok_or_else(|| {
                NormalizeError::csv(format!(
                    "CSV must have '{}' column (found: {})",
                    IMAGE_URL_COLUMN,
                    headers.join(", ")
                ))
            })?;

        let rows = reader
            .records()
            .enumerate()
            .map(|(offset, record)| {
                let source = match record {
                    Ok(record) => record
                        .get(column)
                        .map(str::trim)
                        .filter(|url| !url.is_empty())
                        .map_or(RowSource::Missing, |url| RowSource::Url(url.to_string())),
                    Err(e) => RowSource::Malformed(e.to_string()),
                };
                ManifestRow {
                    index: offset + 1,
                    source,
                }
            })
            .collect();

        Ok(Self { headers, rows })
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[ManifestRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// How one row ended
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RowStatus {
    Processed {
        saved: SavedImage,
    },
    Skipped {
        reason: String,
    },
    Failed {
        stage: Option<ProcessingStage>,
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RowOutcome {
    pub index: usize,
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub status: RowStatus,
}

/// Summary of a completed batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    pub matte_backend: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rows: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<RowOutcome>,
}

impl BatchReport {
    /// Write the report as pretty JSON
    ///
    /// # Errors
    /// - Serialization or file write failure
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| NormalizeError::internal(format!("Failed to serialize report: {e}")))?;
        if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| NormalizeError::file_io_error("create report directory", parent, &e))?;
        }
        std::fs::write(path_ref, json)
            .map_err(|e| NormalizeError::file_io_error("write report", path_ref, &e))
    }
}

/// Drives a [`NormalizationPipeline`] over every manifest row
pub struct BatchProcessor<F: ImageFetcher> {
    pipeline: NormalizationPipeline,
    fetcher: F,
}

impl<F: ImageFetcher> BatchProcessor<F> {
    #[must_use]
    pub fn new(pipeline: NormalizationPipeline, fetcher: F) -> Self {
        Self { pipeline, fetcher }
    }

    /// Process all rows into `output_dir`
    ///
    /// Per-row failures are logged and recorded in the report; they never
    /// abort the run.
    ///
    /// # Errors
    /// - Output directory cannot be created
    pub async fn run(&mut self, manifest: &CsvManifest, output_dir: &Path) -> Result<BatchReport> {
        self.run_inner(manifest, output_dir)
            .instrument(spans::batch(output_dir, manifest.len()))
            .await
    }

    async fn run_inner(
        &mut self,
        manifest: &CsvManifest,
        output_dir: &Path,
    ) -> Result<BatchReport> {
        std::fs::create_dir_all(output_dir).map_err(|e| {
            NormalizeError::file_io_error("create output directory", output_dir, &e)
        })?;

        let started_at = Utc::now();
        info!(headers = ?manifest.headers(), "Processing {} rows", manifest.len());

        let mut outcomes = Vec::with_capacity(manifest.len());
        for row in manifest.rows() {
            let outcome = self
                .process_row(row, output_dir)
                .instrument(spans::row(row.index))
                .await;
            outcomes.push(outcome);
        }

        let count = |pred: fn(&RowStatus) -> bool| {
            outcomes.iter().filter(|o| pred(&o.status)).count()
        };
        let processed = count(|s| matches!(s, RowStatus::Processed { .. }));
        let skipped = count(|s| matches!(s, RowStatus::Skipped { .. }));
        let failed = count(|s| matches!(s, RowStatus::Failed { .. }));

        info!(processed, skipped, failed, "Batch finished");

        Ok(BatchReport {
            output_dir: output_dir.to_path_buf(),
            matte_backend: self.pipeline.matte_name().to_string(),
            started_at,
            finished_at: Utc::now(),
            rows: outcomes.len(),
            processed,
            skipped,
            failed,
            outcomes,
        })
    }

    async fn process_row(&mut self, row: &ManifestRow, output_dir: &Path) -> RowOutcome {
        let index = row.index;
        let url = match &row.source {
            RowSource::Url(url) => url.clone(),
            RowSource::Missing => {
                warn!("No image URL found in row {}", index);
                return RowOutcome {
                    index,
                    image_url: None,
                    status: RowStatus::Skipped {
                        reason: "missing image_url".to_string(),
                    },
                };
            },
            RowSource::Malformed(reason) => {
                error!("Error processing row {}: malformed CSV record: {}", index, reason);
                return RowOutcome {
                    index,
                    image_url: None,
                    status: RowStatus::Failed {
                        stage: None,
                        error: format!("malformed CSV record: {}", reason),
                    },
                };
            },
        };

        info!("Processing image {}: {}", index, url);
        let output = output_dir.join(output_file_name(index));

        let status = match self.fetch_and_process(&url, &output).await {
            Ok(saved) => {
                info!("Successfully processed and saved: {}", saved.path.display());
                RowStatus::Processed { saved }
            },
            Err(e) => {
                error!(stage = %e.stage, "Error processing row {}: {}", index, e.source);
                RowStatus::Failed {
                    stage: Some(e.stage),
                    error: e.source.to_string(),
                }
            },
        };

        RowOutcome {
            index,
            image_url: Some(url),
            status,
        }
    }

    async fn fetch_and_process(
        &mut self,
        url: &str,
        output: &Path,
    ) -> std::result::Result<SavedImage, StageError> {
        info!("Downloading image...");
        let bytes = self
            .fetcher
            .fetch(url)
            .await
            .at_stage(ProcessingStage::Fetch)?;
        self.pipeline.process_bytes(&bytes, output).await
    }
}

/// Validate `csv_path`, then process it into `output_dir`
///
/// Nothing is created on disk when the manifest is rejected.
///
/// # Errors
/// - Any manifest error from [`CsvManifest::from_path`]
/// - Output directory cannot be created
pub async fn process_csv<F: ImageFetcher>(
    csv_path: &Path,
    output_dir: &Path,
    processor: &mut BatchProcessor<F>,
) -> Result<BatchReport> {
    info!("Reading CSV file {}", csv_path.display());
    let manifest = CsvManifest::from_path(csv_path)?;
    processor.run(&manifest, output_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_indexes_every_row() {
        let text = "name,image_url\na,http://x/1.jpg\nb,\nc, http://x/3.jpg \n";
        let manifest = CsvManifest::parse(text).unwrap();
        assert_eq!(manifest.len(), 3);
        assert_eq!(
            manifest.rows(),
            &[
                ManifestRow {
                    index: 1,
                    source: RowSource::Url("http://x/1.jpg".to_string())
                },
                ManifestRow {
                    index: 2,
                    source: RowSource::Missing
                },
                ManifestRow {
                    index: 3,
                    source: RowSource::Url("http://x/3.jpg".to_string())
                },
            ]
        );
    }

    #[test]
    fn test_bom_is_stripped_from_first_header() {
        let manifest = CsvManifest::parse("\u{feff}image_url,sku\nhttp://x/a.png,1\n").unwrap();
        assert_eq!(manifest.headers(), &["image_url".to_string(), "sku".to_string()]);
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_short_row_counts_as_missing() {
        let manifest = CsvManifest::parse("name,image_url\nonly-name\n").unwrap();
        assert_eq!(manifest.rows()[0].source, RowSource::Missing);
    }

    #[test]
    fn test_header_only_is_valid_and_empty() {
        let manifest = CsvManifest::parse("image_url\n").unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_empty_and_bom_only_inputs_are_fatal() {
        for input in ["", "\u{feff}", "\n\n  \n"] {
            let err = CsvManifest::parse(input).unwrap_err();
            assert!(err.to_string().contains("empty"), "input {:?}", input);
        }
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let err = CsvManifest::parse("name,url\na,http://x\n").unwrap_err();
        assert!(matches!(err, NormalizeError::Csv(_)));
        assert!(err.to_string().contains("image_url"));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = CsvManifest::from_path("/nonexistent/rows.csv").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_from_path_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        std::fs::write(&path, b"image_url\n\xff\xfe\n").unwrap();
        assert!(matches!(
            CsvManifest::from_path(&path),
            Err(NormalizeError::Csv(_))
        ));
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(7), "processed_7.png");
    }
}
