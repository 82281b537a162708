use std::num::NonZeroUsize;
use std::path::Path;
use std::thread;

use image::DynamicImage;
use labeldate_core::{DateExtractor, DateRoles};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locator::RegionLocator;
use crate::preprocess::{self, PreprocessError};
use crate::recognizer::{OcrError, TextRecognizer};
use crate::types::{BoundingBox, LabelScan, RecognitionMode};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("Text region detection failed: {0}")]
    Locate(#[source] OcrError),
    #[error("OCR recognition failed: {0}")]
    Recognize(#[source] OcrError),
    #[error("Region {0:?} lies outside the image")]
    EmptyRegion(BoundingBox),
    #[error("A region recognition worker panicked")]
    WorkerPanicked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Crop and recognize regions of one image on separate threads, at most
    /// [`thread::available_parallelism`] at a time.
    pub parallel_regions: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { parallel_regions: true }
    }
}

/// Orchestrates: locate → (crop each region | sharpen whole image) → OCR →
/// extract dates → assign roles.
///
/// The locator and recognizer are injected here and only ever borrowed
/// immutably, so one pipeline can serve concurrent requests.
pub struct LabelPipeline<L: RegionLocator, R: TextRecognizer> {
    locator: L,
    recognizer: R,
    config: PipelineConfig,
}

impl<L: RegionLocator, R: TextRecognizer> LabelPipeline<L, R> {
    pub fn new(locator: L, recognizer: R) -> Self {
        Self::with_config(locator, recognizer, PipelineConfig::default())
    }

    pub fn with_config(locator: L, recognizer: R, config: PipelineConfig) -> Self {
        Self { locator, recognizer, config }
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Read a file from disk and process it.
    pub async fn process_file(&self, path: &Path) -> Result<LabelScan, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        self.process_bytes(&bytes)
    }

    /// Decode a file (format sniffed from content) and process it.
    pub fn process_path(&self, path: &Path) -> Result<LabelScan, PipelineError> {
        let image = preprocess::load_from_path(path)?;
        self.process_image(&image)
    }

    /// Decode raw bytes (camera capture, upload body) and process them.
    pub fn process_bytes(&self, data: &[u8]) -> Result<LabelScan, PipelineError> {
        let image = preprocess::load_from_bytes(data)?;
        self.process_image(&image)
    }

    /// Run every stage on one decoded image. Any collaborator failure fails
    /// the whole run; unparseable date tokens and a region-less image do not.
    pub fn process_image(&self, image: &DynamicImage) -> Result<LabelScan, PipelineError> {
        // 1. Locate text regions.
        let regions = self.locator.locate(image).map_err(PipelineError::Locate)?;

        // 2. Recognize, per region or on the sharpened whole image.
        let (mode, texts) = if regions.is_empty() {
            tracing::info!("no text regions located; recognizing sharpened whole image");
            let sharpened = preprocess::sharpen(image);
            let text = self
                .recognizer
                .recognize(&sharpened)
                .map_err(PipelineError::Recognize)?;
            (RecognitionMode::WholeImageFallback, vec![text])
        } else {
            tracing::info!(regions = regions.len(), "recognizing located text regions");
            let texts = self.recognize_regions(image, &regions)?;
            (RecognitionMode::PerRegion { regions: regions.len() }, texts)
        };

        for (i, text) in texts.iter().enumerate() {
            tracing::debug!(region = i, text = %text, "recognized");
        }

        // 3. Extract and pool dates, 4. assign roles.
        let dates = DateExtractor::extract_all(&texts);
        tracing::info!(%mode, dates = dates.len(), "extracted dates");
        let roles = DateRoles::assign(dates);

        Ok(LabelScan { mode, texts, roles })
    }

    /// Texts come back in region order regardless of which worker finishes first.
    fn recognize_regions(
        &self,
        image: &DynamicImage,
        regions: &[BoundingBox],
    ) -> Result<Vec<String>, PipelineError> {
        let recognizer = &self.recognizer;
        let recognize_one = |bbox: &BoundingBox| -> Result<String, PipelineError> {
            let crop = preprocess::crop_region(image, bbox)
                .ok_or(PipelineError::EmptyRegion(*bbox))?;
            recognizer.recognize(&crop).map_err(PipelineError::Recognize)
        };

        if !self.config.parallel_regions || regions.len() < 2 {
            return regions.iter().map(recognize_one).collect();
        }

        let recognize_one = &recognize_one;
        let workers = max_workers();
        let mut texts = Vec::with_capacity(regions.len());
        for batch in regions.chunks(workers) {
            let joined: Vec<_> = thread::scope(|s| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|bbox| s.spawn(move || recognize_one(bbox)))
                    .collect();
                // Join every worker before looking at results, so a panic is
                // reported as an error instead of escaping the scope.
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or(Err(PipelineError::WorkerPanicked)))
                    .collect()
            });
            for text in joined {
                texts.push(text?);
            }
        }
        Ok(texts)
    }
}

/// Upper bound on region workers alive at once for a single image.
fn max_workers() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
