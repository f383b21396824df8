// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pdfium-backed page rasteriser (feature "render").

use std::path::{Path, PathBuf};

use pagewerk_core::error::{PagewerkError, Result};
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument};

use super::{PageRenderer, RasterImage};

/// Renders pages with a dynamically bound Pdfium library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Bind to Pdfium, preferring `vendor/pdfium/lib` under the working
    /// directory and falling back to the system library.
    pub fn new() -> Result<Self> {
        let vendor = std::env::current_dir()
            .ok()
            .map(|dir| dir.join("vendor/pdfium/lib"))
            .filter(|dir| dir.exists());
        if let Some(dir) = vendor
            && let Ok(renderer) = Self::from_library_dir(&dir)
        {
            return Ok(renderer);
        }

        let bindings = Pdfium::bind_to_system_library().map_err(|err| {
            PagewerkError::Render(format!("cannot bind system Pdfium library: {}", err))
        })?;
        info!("Bound system Pdfium library");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Bind to the Pdfium library found in `dir`.
    pub fn from_library_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let path: PathBuf = Pdfium::pdfium_platform_library_name_at_path(dir.as_ref());
        let bindings = Pdfium::bind_to_library(&path).map_err(|err| {
            PagewerkError::Render(format!(
                "cannot bind Pdfium at {}: {}",
                path.display(),
                err
            ))
        })?;
        info!(path = %path.display(), "Bound Pdfium library");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageRenderer for PdfiumRenderer {
    #[instrument(skip(self, page_pdf), fields(bytes = page_pdf.len()))]
    fn render(&self, page_pdf: &[u8], scale: f32) -> Result<RasterImage> {
        let render_error = |err: PdfiumError| PagewerkError::Render(err.to_string());

        let document = self
            .pdfium
            .load_pdf_from_byte_slice(page_pdf, None)
            .map_err(render_error)?;
        let page = document.pages().get(0).map_err(render_error)?;

        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page.render_with_config(&config).map_err(render_error)?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let pixels = bitmap.as_rgba_bytes().to_vec();
        debug!(width, height, "Page rendered");
        Ok(RasterImage::from_rgba(width, height, pixels))
    }
}
