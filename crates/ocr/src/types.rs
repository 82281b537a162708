use labeldate_core::DateRoles;
use serde::{Deserialize, Serialize};

use crate::recognizer::OcrError;

/// Axis-aligned text region in image-pixel space.
///
/// Only constructible through [`BoundingBox::new`], so `x1 < x2` and `y1 < y2`
/// always hold. Serializes as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl BoundingBox {
    /// Rejects non-finite coordinates and boxes where `x1 >= x2` or `y1 >= y2`.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self, OcrError> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(OcrError::InvalidBox(format!(
                "non-finite coordinates ({x1}, {y1}, {x2}, {y2})"
            )));
        }
        if x1 >= x2 || y1 >= y2 {
            return Err(OcrError::InvalidBox(format!(
                "inverted or empty box ({x1}, {y1}, {x2}, {y2})"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    pub fn x1(&self) -> f32 {
        self.x1
    }

    pub fn y1(&self) -> f32 {
        self.y1
    }

    pub fn x2(&self) -> f32 {
        self.x2
    }

    pub fn y2(&self) -> f32 {
        self.y2
    }

    /// Pixel rectangle `(x, y, width, height)` after clamping to a
    /// `width`×`height` image. The top-left corner is floored and the
    /// bottom-right ceiled, so partial pixels are kept. `None` when nothing of
    /// the box lies inside the image.
    pub fn crop_rect(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let (w, h) = (width as f32, height as f32);
        let x1 = self.x1.floor().clamp(0.0, w) as u32;
        let y1 = self.y1.floor().clamp(0.0, h) as u32;
        let x2 = self.x2.ceil().clamp(0.0, w) as u32;
        let y2 = self.y2.ceil().clamp(0.0, h) as u32;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some((x1, y1, x2 - x1, y2 - y1))
    }
}

impl TryFrom<[f32; 4]> for BoundingBox {
    type Error = OcrError;

    fn try_from([x1, y1, x2, y2]: [f32; 4]) -> Result<Self, Self::Error> {
        BoundingBox::new(x1, y1, x2, y2)
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Which recognition path a pipeline run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionMode {
    /// Each located region was cropped and recognized on its own.
    PerRegion { regions: usize },
    /// No regions were located; the sharpened whole image was recognized once.
    WholeImageFallback,
}

impl std::fmt::Display for RecognitionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognitionMode::PerRegion { regions } => write!(f, "per_region({regions})"),
            RecognitionMode::WholeImageFallback => write!(f, "whole_image_fallback"),
        }
    }
}

/// Everything a single pipeline run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelScan {
    pub mode: RecognitionMode,
    /// Raw recognized text, one entry per region in discovery order (or a
    /// single entry in fallback mode).
    pub texts: Vec<String>,
    pub roles: DateRoles,
}
