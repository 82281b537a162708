use std::sync::Arc;

use image::DynamicImage;

use crate::recognizer::OcrError;
use crate::types::BoundingBox;

/// Finds rectangles of printed text in an image.
///
/// Shares the concurrency contract of
/// [`TextRecognizer`](crate::recognizer::TextRecognizer).
pub trait RegionLocator: Send + Sync {
    /// Regions in discovery order. An empty result is valid and routes the
    /// pipeline to its whole-image fallback.
    fn locate(&self, image: &DynamicImage) -> Result<Vec<BoundingBox>, OcrError>;
}

impl<T: RegionLocator + ?Sized> RegionLocator for Box<T> {
    fn locate(&self, image: &DynamicImage) -> Result<Vec<BoundingBox>, OcrError> {
        (**self).locate(image)
    }
}

impl<T: RegionLocator + ?Sized> RegionLocator for Arc<T> {
    fn locate(&self, image: &DynamicImage) -> Result<Vec<BoundingBox>, OcrError> {
        (**self).locate(image)
    }
}

/// Returns the same boxes for every image. With no boxes every image goes
/// through the sharpened whole-image path.
#[derive(Debug, Clone, Default)]
pub struct FixedLocator {
    regions: Vec<BoundingBox>,
}

impl FixedLocator {
    pub fn new(regions: Vec<BoundingBox>) -> Self {
        Self { regions }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Build from raw `[x1, y1, x2, y2]` arrays, validating each box.
    pub fn from_coords(coords: &[[f32; 4]]) -> Result<Self, OcrError> {
        let regions = coords
            .iter()
            .map(|c| BoundingBox::try_from(*c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(regions))
    }
}

impl RegionLocator for FixedLocator {
    fn locate(&self, _image: &DynamicImage) -> Result<Vec<BoundingBox>, OcrError> {
        Ok(self.regions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma};

    fn blank() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([255u8])))
    }

    #[test]
    fn fixed_locator_returns_its_boxes_in_order() {
        let locator =
            FixedLocator::from_coords(&[[0.0, 0.0, 4.0, 4.0], [4.0, 4.0, 8.0, 8.0]]).unwrap();
        let boxes = locator.locate(&blank()).unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[1].x1(), 4.0);
    }

    #[test]
    fn none_locates_nothing() {
        assert!(FixedLocator::none().locate(&blank()).unwrap().is_empty());
    }

    #[test]
    fn from_coords_rejects_bad_box() {
        let err = FixedLocator::from_coords(&[[0.0, 0.0, 4.0, 4.0], [5.0, 0.0, 1.0, 1.0]]);
        assert!(matches!(err, Err(OcrError::InvalidBox(_))));
    }

    #[test]
    fn boxed_locator_delegates() {
        let img: GrayImage = ImageBuffer::from_fn(2, 2, |_, _| Luma([0u8]));
        let boxed: Box<dyn RegionLocator> = Box::new(FixedLocator::none());
        assert!(boxed.locate(&DynamicImage::ImageLuma8(img)).unwrap().is_empty());
    }
}
