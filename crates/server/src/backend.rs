use labeldate_ocr::{
    FixedLocator, LabelPipeline, MockRecognizer, OcrError, RegionLocator, TextRecognizer,
};

use crate::config::{RecognizerConfig, ServerConfig};

/// Pipeline with backends chosen at runtime from configuration.
pub type DynPipeline = LabelPipeline<Box<dyn RegionLocator>, Box<dyn TextRecognizer>>;

pub fn build_pipeline(config: &ServerConfig) -> Result<DynPipeline, OcrError> {
    let locator: Box<dyn RegionLocator> = Box::new(FixedLocator::from_coords(&config.regions)?);
    let recognizer = build_recognizer(&config.recognizer)?;
    Ok(LabelPipeline::with_config(locator, recognizer, config.pipeline.clone()))
}

fn build_recognizer(config: &RecognizerConfig) -> Result<Box<dyn TextRecognizer>, OcrError> {
    match config {
        RecognizerConfig::Mock { text } => {
            tracing::warn!("using mock recognizer; every image will read as {text:?}");
            Ok(Box::new(MockRecognizer::new(text.clone())))
        }
        #[cfg(feature = "tesseract")]
        RecognizerConfig::Tesseract { data_path, lang } => {
            tracing::info!(lang = %lang, "using tesseract recognizer");
            Ok(Box::new(labeldate_ocr::TesseractRecognizer::new(data_path.clone(), lang)))
        }
        #[cfg(not(feature = "tesseract"))]
        RecognizerConfig::Tesseract { .. } => Err(OcrError::NotAvailable),
    }
}
