// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — flatten, bounded downscale, and JPEG encoding of decoded
// embedded images. Operates on in-memory images using the `image` crate.

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use pagewerk_core::error::PagewerkError;
use tracing::{debug, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`,
/// enabling method chaining.
///
/// ```ignore
/// let (processor, downscaled) = ImageProcessor::from_dynamic(img)
///     .flatten()
///     .fit_within(1500);
/// let jpeg = processor.to_jpeg_bytes(if downscaled { 30 } else { 60 })?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether the working image has a single luminance channel.
    pub fn is_gray(&self) -> bool {
        matches!(self.image, DynamicImage::ImageLuma8(_))
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Reduce to 8-bit gray or 8-bit RGB, dropping any alpha channel.
    pub fn flatten(self) -> Self {
        let image = match self.image {
            DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(gray),
            other if other.color().has_color() => DynamicImage::ImageRgb8(other.to_rgb8()),
            other => DynamicImage::ImageLuma8(other.to_luma8()),
        };
        Self { image }
    }

    /// Downscale so that neither side exceeds `max_dimension`, preserving the
    /// aspect ratio. The longer side becomes exactly `max_dimension`; the other
    /// is truncated. Returns whether a resize happened.
    #[instrument(skip(self), fields(width = self.image.width(), height = self.image.height()))]
    pub fn fit_within(self, max_dimension: u32) -> (Self, bool) {
        let (width, height) = (self.image.width(), self.image.height());
        let Some((new_width, new_height)) = bounded_dimensions(width, height, max_dimension) else {
            return (self, false);
        };

        let resized = self
            .image
            .resize_exact(new_width, new_height, FilterType::Triangle);
        debug!(new_width, new_height, "Downscale complete");
        (Self { image: resized }, true)
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    ///
    /// Gray images stay single-channel; everything else is written as RGB.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, PagewerkError> {
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        let result = match &self.image {
            DynamicImage::ImageLuma8(gray) => gray.write_with_encoder(encoder),
            other => other.to_rgb8().write_with_encoder(encoder),
        };
        result.map_err(|err| PagewerkError::Image(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

/// Target size for an image that exceeds `max_dimension` on either side, or
/// `None` when it already fits.
pub fn bounded_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    if width <= max_dimension && height <= max_dimension {
        return None;
    }
    let (width, height, max) = (width as u64, height as u64, max_dimension as u64);
    let (new_width, new_height) = if width >= height {
        (max, height * max / width)
    } else {
        (width * max / height, max)
    };
    Some((new_width.max(1) as u32, new_height.max(1) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    #[test]
    fn bounded_dimensions_preserves_aspect_ratio() {
        assert_eq!(bounded_dimensions(3000, 3000, 1500), Some((1500, 1500)));
        assert_eq!(bounded_dimensions(4000, 1000, 1500), Some((1500, 375)));
        assert_eq!(bounded_dimensions(1001, 3001, 1500), Some((500, 1500)));
        assert_eq!(bounded_dimensions(1500, 1500, 1500), None);
        assert_eq!(bounded_dimensions(1, 100_000, 1500), Some((1, 1500)));
    }

    #[test]
    fn flatten_drops_alpha() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 40])));
        let flat = ImageProcessor::from_dynamic(rgba).flatten().into_dynamic();
        assert!(matches!(flat, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn gray_stays_gray_through_jpeg() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, Luma([128])));
        let processor = ImageProcessor::from_dynamic(gray).flatten();
        assert!(processor.is_gray());
        let bytes = processor.to_jpeg_bytes(50).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color().channel_count(), 1);
    }

    #[test]
    fn fit_within_reports_resize() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(300, 100));
        let (processor, resized) = ImageProcessor::from_dynamic(img).fit_within(150);
        assert!(resized);
        assert_eq!((processor.width(), processor.height()), (150, 50));

        let small = DynamicImage::ImageLuma8(GrayImage::new(10, 10));
        let (_, resized) = ImageProcessor::from_dynamic(small).fit_within(150);
        assert!(!resized);
    }
}
