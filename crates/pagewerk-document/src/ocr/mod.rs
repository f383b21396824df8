// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition seam and searchable-text overlays.
//
// A `TextRecognizer` turns a rendered page into word boxes in pixel space;
// `overlay` maps those boxes back into page space as invisible text.

#[cfg(feature = "ocr")]
pub mod engine;
pub mod overlay;

use pagewerk_core::error::Result;
use serde::{Deserialize, Serialize};

use crate::render::RasterImage;

#[cfg(feature = "ocr")]
pub use engine::{OcrConfig, OcrsRecognizer};
pub use overlay::OverlayMerger;

/// One recognised word, in pixels of the raster it was found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedWord {
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Everything recognised on one page raster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub image_width: u32,
    pub image_height: u32,
    pub words: Vec<RecognizedWord>,
}

impl TextOverlay {
    pub fn new(image_width: u32, image_height: u32) -> Self {
        Self {
            image_width,
            image_height,
            words: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// All words joined with single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|word| word.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Recognises text on rendered pages.
///
/// Implementations report failures as
/// [`PagewerkError::Recognition`](pagewerk_core::PagewerkError::Recognition).
pub trait TextRecognizer {
    fn recognize_page(&self, page: &RasterImage) -> Result<TextOverlay>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for &T {
    fn recognize_page(&self, page: &RasterImage) -> Result<TextOverlay> {
        (**self).recognize_page(page)
    }
}
