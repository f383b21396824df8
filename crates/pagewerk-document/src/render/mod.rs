// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterisation seam.
//
// Renderers receive a self-contained single-page PDF (rotation already folded
// into its `/Rotate`) and a scale factor relative to 72 dpi.

#[cfg(feature = "render")]
pub mod pdfium;

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use lopdf::Document;
use pagewerk_core::error::{PagewerkError, Result};
use tracing::debug;

use crate::pdf::copy;

#[cfg(feature = "render")]
pub use self::pdfium::PdfiumRenderer;

/// US letter, used when a page carries no usable `/MediaBox`.
const FALLBACK_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Channel layout of [`RasterImage::pixels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    Rgb8,
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgb8 => 3,
            Self::Gray8 => 1,
        }
    }
}

/// A rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Bytes per row.
    pub stride: usize,
    pub pixels: Vec<u8>,
    pub format: PixelFormat,
}

impl RasterImage {
    /// Wrap tightly packed RGBA pixels.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width as usize * 4,
            pixels,
            format: PixelFormat::Rgba8,
        }
    }

    /// A raster filled with a single RGBA colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat(width as usize * height as usize);
        Self::from_rgba(width, height, pixels)
    }

    /// Convert to an `image` buffer, dropping any row padding.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let row_bytes = self.width as usize * self.format.bytes_per_pixel();
        let mut packed = Vec::with_capacity(row_bytes * self.height as usize);
        for row in 0..self.height as usize {
            let start = row * self.stride;
            let line = self.pixels.get(start..start + row_bytes).ok_or_else(|| {
                PagewerkError::Render(format!(
                    "raster buffer too short for {}x{} image",
                    self.width, self.height
                ))
            })?;
            packed.extend_from_slice(line);
        }

        let too_short = || PagewerkError::Render("raster buffer size mismatch".into());
        let image = match self.format {
            PixelFormat::Rgba8 => DynamicImage::ImageRgba8(
                RgbaImage::from_raw(self.width, self.height, packed).ok_or_else(too_short)?,
            ),
            PixelFormat::Rgb8 => DynamicImage::ImageRgb8(
                RgbImage::from_raw(self.width, self.height, packed).ok_or_else(too_short)?,
            ),
            PixelFormat::Gray8 => DynamicImage::ImageLuma8(
                GrayImage::from_raw(self.width, self.height, packed).ok_or_else(too_short)?,
            ),
        };
        Ok(image)
    }
}

/// Rasterises single-page PDFs.
pub trait PageRenderer {
    fn render(&self, page_pdf: &[u8], scale: f32) -> Result<RasterImage>;
}

impl<R: PageRenderer + ?Sized> PageRenderer for &R {
    fn render(&self, page_pdf: &[u8], scale: f32) -> Result<RasterImage> {
        (**self).render(page_pdf, scale)
    }
}

/// Produces white rasters with the page's rendered geometry.
///
/// Used where no rendering engine is linked. Dimensions follow the page box
/// scaled by `scale`, with width and height swapped for quarter turns.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankRenderer;

impl PageRenderer for BlankRenderer {
    fn render(&self, page_pdf: &[u8], scale: f32) -> Result<RasterImage> {
        let (width, height) = page_pixel_size(page_pdf, scale)?;
        debug!(width, height, "Blank page raster");
        Ok(RasterImage::filled(width, height, [255, 255, 255, 255]))
    }
}

/// Pixel size of the first page of `page_pdf` at `scale`, honouring `/Rotate`.
pub fn page_pixel_size(page_pdf: &[u8], scale: f32) -> Result<(u32, u32)> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(PagewerkError::Render(format!("invalid render scale {}", scale)));
    }
    let document = Document::load_mem(page_pdf)
        .map_err(|err| PagewerkError::Render(format!("cannot parse page: {}", err)))?;
    let page_id = document
        .get_pages()
        .values()
        .next()
        .copied()
        .ok_or_else(|| PagewerkError::Render("page document has no pages".into()))?;

    let [x0, y0, x1, y1] = copy::media_box(&document, page_id).unwrap_or(FALLBACK_MEDIA_BOX);
    let scale = scale as f64;
    let width = ((x1 - x0).abs() * scale).round().max(1.0) as u32;
    let height = ((y1 - y0).abs() * scale).round().max(1.0) as u32;

    if copy::page_rotation(&document, page_id).is_quarter_turn() {
        Ok((height, width))
    } else {
        Ok((width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PhysicalStore;
    use crate::testing::labelled_pdf;
    use pagewerk_core::Rotation;

    #[test]
    fn blank_renderer_follows_page_geometry() {
        let mut store = PhysicalStore::default();
        store.append_document(&labelled_pdf("A", 1)).unwrap();

        let upright = store.extract_page(0, Rotation::NONE).unwrap();
        let raster = BlankRenderer.render(&upright, 0.5).unwrap();
        assert_eq!((raster.width, raster.height), (306, 396));
        assert_eq!(raster.pixels.len(), 306 * 396 * 4);

        let turned = store
            .extract_page(0, Rotation::from_degrees(90).unwrap())
            .unwrap();
        let raster = BlankRenderer.render(&turned, 0.5).unwrap();
        assert_eq!((raster.width, raster.height), (396, 306));
    }

    #[test]
    fn zero_scale_is_rejected() {
        let mut store = PhysicalStore::default();
        store.append_document(&labelled_pdf("A", 1)).unwrap();
        let page = store.extract_page(0, Rotation::NONE).unwrap();
        assert!(matches!(
            BlankRenderer.render(&page, 0.0),
            Err(PagewerkError::Render(_))
        ));
    }

    #[test]
    fn padded_rows_are_packed() {
        let raster = RasterImage {
            width: 2,
            height: 2,
            stride: 8,
            pixels: vec![
                1, 2, 3, 4, 5, 6, 0, 0, //
                7, 8, 9, 10, 11, 12, 0, 0,
            ],
            format: PixelFormat::Rgb8,
        };
        let image = raster.to_dynamic().unwrap().to_rgb8();
        assert_eq!(image.as_raw(), &vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }
}
