// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk-document — Document engine for the Pagewerk page editor.
//
// Provides the append-only physical page store, page copying with shared
// object deduplication, structural compaction and serialisation, embedded
// image recompression, the page rendering seam (Pdfium behind "render"), and
// the text recognition seam with invisible text overlays (ocrs behind "ocr").

pub mod image;
pub mod ocr;
pub mod pdf;
pub mod render;

#[cfg(any(test, feature = "fixtures"))]
pub mod testing;

// Re-export the primary types so callers can use `pagewerk_document::PhysicalStore` etc.
pub use self::image::{CompressionReport, CompressionSettings, Compressor, ImageProcessor};
pub use self::ocr::{OverlayMerger, RecognizedWord, TextOverlay, TextRecognizer};
pub use self::pdf::{PageCopier, PhysicalStore};
pub use self::render::{BlankRenderer, PageRenderer, PixelFormat, RasterImage};

#[cfg(feature = "render")]
pub use self::render::PdfiumRenderer;

#[cfg(feature = "ocr")]
pub use self::ocr::{OcrConfig, OcrsRecognizer};
