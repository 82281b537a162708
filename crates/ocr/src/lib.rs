pub mod locator;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod types;

pub use locator::{FixedLocator, RegionLocator};
pub use pipeline::{LabelPipeline, PipelineConfig, PipelineError};
pub use preprocess::{crop_region, sharpen, PreprocessError, SHARPEN_KERNEL};
pub use recognizer::{MockRecognizer, OcrError, ScriptedRecognizer, TextRecognizer};
pub use types::{BoundingBox, LabelScan, RecognitionMode};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
