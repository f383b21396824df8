// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Embedded image recompression for the most aggressive export tier.
//
// Every distinct image XObject is decoded, flattened to gray or RGB, bounded
// to a maximum dimension and re-encoded as JPEG. Failures are per image: the
// offending image is left untouched and the run continues.

use lopdf::{Document, Object, ObjectId};
use pagewerk_core::SessionConfig;
use pagewerk_core::error::{PagewerkError, Result};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::processor::ImageProcessor;
use crate::pdf::images::{self, ImageMetadata};

/// Parameters of one recompression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionSettings {
    pub max_dimension: u32,
    pub downscaled_quality: u8,
    pub quality: u8,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for CompressionSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            max_dimension: config.max_image_dimension,
            downscaled_quality: config.downscaled_jpeg_quality,
            quality: config.jpeg_quality,
        }
    }
}

/// One image that was rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecompressedImage {
    pub object: ObjectId,
    pub original_size: (u32, u32),
    pub new_size: (u32, u32),
    pub bytes_before: usize,
    pub bytes_after: usize,
}

impl RecompressedImage {
    pub fn downscaled(&self) -> bool {
        self.original_size != self.new_size
    }
}

/// Outcome of a recompression run.
#[derive(Debug, Default)]
pub struct CompressionReport {
    pub recompressed: Vec<RecompressedImage>,
    /// Images left unmodified, with the reason.
    pub skipped: Vec<PagewerkError>,
}

impl CompressionReport {
    pub fn bytes_saved(&self) -> i64 {
        self.recompressed
            .iter()
            .map(|image| image.bytes_before as i64 - image.bytes_after as i64)
            .sum()
    }
}

/// Rewrites embedded images in place.
#[derive(Debug, Clone, Default)]
pub struct Compressor {
    settings: CompressionSettings,
}

impl Compressor {
    pub fn new(settings: CompressionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> CompressionSettings {
        self.settings
    }

    /// Recompress every distinct image reachable from the document's pages.
    ///
    /// Each object reference is processed at most once, in page order.
    #[instrument(skip_all, fields(max_dimension = self.settings.max_dimension))]
    pub fn compress_document(&self, document: &mut Document) -> CompressionReport {
        let references = images::document_image_references(document);
        let mut report = CompressionReport::default();

        for id in references {
            match self.recompress(document, id) {
                Ok(done) => report.recompressed.push(done),
                Err(err) => {
                    warn!(?id, %err, "Image left unmodified");
                    report.skipped.push(err);
                }
            }
        }

        info!(
            recompressed = report.recompressed.len(),
            skipped = report.skipped.len(),
            bytes_saved = report.bytes_saved(),
            "Image recompression complete"
        );
        report
    }

    /// Decode, flatten, bound, encode and replace a single image.
    pub fn recompress(&self, document: &mut Document, id: ObjectId) -> Result<RecompressedImage> {
        let bytes_before = match document.get_object(id) {
            Ok(Object::Stream(stream)) => stream.content.len(),
            _ => 0,
        };
        let decoded = images::decode_image(document, id)?;
        let original_size = (decoded.width(), decoded.height());

        let (processor, downscaled) = ImageProcessor::from_dynamic(decoded)
            .flatten()
            .fit_within(self.settings.max_dimension);
        let quality = if downscaled {
            self.settings.downscaled_quality
        } else {
            self.settings.quality
        };

        let encoded = processor
            .to_jpeg_bytes(quality)
            .map_err(|err| PagewerkError::ImageRecompression {
                object: id,
                reason: err.to_string(),
            })?;
        let metadata = ImageMetadata {
            width: processor.width(),
            height: processor.height(),
            bits_per_component: 8,
            color_space: if processor.is_gray() {
                "DeviceGray"
            } else {
                "DeviceRGB"
            },
            filter: "DCTDecode",
        };
        let bytes_after = encoded.len();
        images::replace_image(document, id, encoded, &metadata)?;

        debug!(
            ?id,
            ?original_size,
            width = metadata.width,
            height = metadata.height,
            quality,
            bytes_before,
            bytes_after,
            "Image recompressed"
        );
        Ok(RecompressedImage {
            object: id,
            original_size,
            new_size: (metadata.width, metadata.height),
            bytes_before,
            bytes_after,
        })
    }
}
