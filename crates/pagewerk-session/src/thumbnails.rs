// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Thumbnail cache keyed by (physical page, rotation).
//
// Only renders at the canonical thumbnail scale are kept. Entries are
// dropped when their page is rotated and never on reorder or delete; the
// number of keys is bounded by the pages ever loaded.

use std::collections::HashMap;
use std::sync::Arc;

use pagewerk_core::error::Result;
use pagewerk_core::types::Rotation;
use pagewerk_document::RasterImage;
use tracing::debug;

pub type ThumbnailKey = (usize, Rotation);

#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    scale: f32,
    entries: HashMap<ThumbnailKey, Arc<RasterImage>>,
}

impl ThumbnailCache {
    pub fn new(canonical_scale: f32) -> Self {
        Self {
            scale: canonical_scale,
            entries: HashMap::new(),
        }
    }

    pub fn canonical_scale(&self) -> f32 {
        self.scale
    }

    /// Whether renders at `scale` are eligible for caching.
    pub fn is_canonical(&self, scale: f32) -> bool {
        (scale - self.scale).abs() <= f32::EPSILON
    }

    pub fn get(&self, key: ThumbnailKey) -> Option<Arc<RasterImage>> {
        self.entries.get(&key).cloned()
    }

    /// Return the cached raster for `key`, or produce it with `render`.
    ///
    /// The result is stored only when `scale` is the canonical scale. Render
    /// failures are returned and nothing is cached.
    pub fn get_or_render(
        &mut self,
        key: ThumbnailKey,
        scale: f32,
        render: impl FnOnce() -> Result<RasterImage>,
    ) -> Result<Arc<RasterImage>> {
        let canonical = self.is_canonical(scale);
        if canonical && let Some(hit) = self.entries.get(&key) {
            return Ok(Arc::clone(hit));
        }

        let raster = Arc::new(render()?);
        if canonical {
            self.entries.insert(key, Arc::clone(&raster));
            debug!(physical = key.0, rotation = %key.1, cached = self.entries.len(), "Thumbnail cached");
        }
        Ok(raster)
    }

    /// Drop every entry for `physical_index`, whatever its rotation.
    pub fn invalidate_page(&mut self, physical_index: usize) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(page, _), _| *page != physical_index);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(physical_index, removed, "Thumbnails invalidated");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
