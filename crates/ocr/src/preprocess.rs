use image::{DynamicImage, ImageBuffer, Pixel};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

use crate::types::BoundingBox;

/// 3×3 sharpening kernel: center 5, four-connected neighbors -1, corners 0.
#[rustfmt::skip]
pub const SHARPEN_KERNEL: [f32; 9] = [
    0.0, -1.0, 0.0,
    -1.0, 5.0, -1.0,
    0.0, -1.0, 0.0,
];

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Decode an image file, sniffing the format from its content rather than
/// trusting the extension.
pub fn load_from_path(path: &Path) -> Result<DynamicImage, PreprocessError> {
    Ok(image::ImageReader::open(path)?.with_guessed_format()?.decode()?)
}

/// Decode raw JPEG / PNG / WEBP / … bytes.
pub fn load_from_bytes(data: &[u8]) -> Result<DynamicImage, PreprocessError> {
    Ok(image::load_from_memory(data)?)
}

/// Edge-enhance the whole image with [`SHARPEN_KERNEL`]. Used only when no
/// text regions were found.
///
/// Border pixels see their missing neighbors as copies of the nearest edge
/// pixel, so a flat image comes back unchanged all the way to the edge.
pub fn sharpen(img: &DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return img.clone();
    }
    // filter3x3 leaves its outermost ring at zero; convolve a copy padded by one
    // replicated pixel on every side and cut the original area back out.
    pad_edges(img)
        .filter3x3(&SHARPEN_KERNEL)
        .crop_imm(1, 1, width, height)
}

fn pad_edges(img: &DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(b) => DynamicImage::ImageLuma8(replicate_border(b)),
        DynamicImage::ImageLumaA8(b) => DynamicImage::ImageLumaA8(replicate_border(b)),
        DynamicImage::ImageRgb8(b) => DynamicImage::ImageRgb8(replicate_border(b)),
        DynamicImage::ImageRgba8(b) => DynamicImage::ImageRgba8(replicate_border(b)),
        DynamicImage::ImageLuma16(b) => DynamicImage::ImageLuma16(replicate_border(b)),
        DynamicImage::ImageLumaA16(b) => DynamicImage::ImageLumaA16(replicate_border(b)),
        DynamicImage::ImageRgb16(b) => DynamicImage::ImageRgb16(replicate_border(b)),
        DynamicImage::ImageRgba16(b) => DynamicImage::ImageRgba16(replicate_border(b)),
        DynamicImage::ImageRgb32F(b) => DynamicImage::ImageRgb32F(replicate_border(b)),
        DynamicImage::ImageRgba32F(b) => DynamicImage::ImageRgba32F(replicate_border(b)),
        other => DynamicImage::ImageRgba8(replicate_border(&other.to_rgba8())),
    }
}

/// Grow `img` by one pixel on each side, copying the nearest edge pixel.
fn replicate_border<P: Pixel>(
    img: &ImageBuffer<P, Vec<P::Subpixel>>,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let (width, height) = img.dimensions();
    ImageBuffer::from_fn(width + 2, height + 2, |x, y| {
        let src_x = x.saturating_sub(1).min(width - 1);
        let src_y = y.saturating_sub(1).min(height - 1);
        *img.get_pixel(src_x, src_y)
    })
}

/// Cut `bbox` out of `img`, clamped to the image bounds. `None` if the box
/// lies entirely outside.
pub fn crop_region(img: &DynamicImage, bbox: &BoundingBox) -> Option<DynamicImage> {
    let (x, y, w, h) = bbox.crop_rect(img.width(), img.height())?;
    Some(img.crop_imm(x, y, w, h))
}

pub fn encode_as_png(img: &DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
