use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::DynamicImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available: build with the `tesseract` feature")]
    NotAvailable,
    #[error("Invalid bounding box: {0}")]
    InvalidBox(String),
}

/// Abstraction over an OCR backend.
///
/// Implementations must tolerate concurrent calls from several threads: the
/// pipeline may recognize regions of one image in parallel, and one pipeline
/// is shared by every request in the server.
pub trait TextRecognizer: Send + Sync {
    /// Recognized text of `image`, or an empty string if nothing was read.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        (**self).recognize(image)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Arc<T> {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        (**self).recognize(image)
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string for every image.
pub struct MockRecognizer {
    pub text: String,
    calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), calls: AtomicUsize::new(0) }
    }

    /// How many times `recognize` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Hands out queued texts one call at a time, then empty strings.
///
/// Call order decides which text a region gets, so pair it with sequential
/// region recognition when the assignment matters.
pub struct ScriptedRecognizer {
    script: Mutex<VecDeque<String>>,
}

impl ScriptedRecognizer {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { script: Mutex::new(texts.into_iter().map(Into::into).collect()) }
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|q| q.len()).unwrap_or(0)
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
        let mut script = self
            .script
            .lock()
            .map_err(|_| OcrError::Engine("script lock poisoned".into()))?;
        Ok(script.pop_front().unwrap_or_default())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrError, TextRecognizer};
    use crate::preprocess::encode_as_png;
    use image::DynamicImage;
    use leptess::LepTess;

    /// Builds a fresh `LepTess` handle per call, so no engine state is shared
    /// between concurrent callers.
    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl TextRecognizer for TesseractRecognizer {
        fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
            let png = encode_as_png(image).map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(&png)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}
