// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export pipeline — assemble a fresh document from resolved page records,
// optionally recompress its images, add searchable text, and serialise.
//
// An `ExportPlan` owns everything it needs (a shared handle on the physical
// store plus a copy of the records), so it can be moved to a worker thread
// while the session keeps serving the interactive thread.

use std::sync::Arc;

use lopdf::{Document, ObjectId};
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{CompactionLevel, PageRecord, Rotation};
use pagewerk_document::pdf::{copy, writer};
use pagewerk_document::{
    CompressionReport, CompressionSettings, Compressor, OverlayMerger, PageCopier, PageRenderer,
    PhysicalStore, TextRecognizer,
};
use tracing::{debug, info, instrument};

/// Serialised export plus what the image stage did, if it ran.
#[derive(Debug)]
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    pub report: Option<CompressionReport>,
}

/// A document assembled from a plan, with its pages in output order.
#[derive(Debug)]
pub struct Assembled {
    pub document: Document,
    pub pages: Vec<ObjectId>,
}

/// An immutable, self-contained description of one export.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    store: Arc<PhysicalStore>,
    records: Vec<PageRecord>,
}

impl ExportPlan {
    pub fn new(store: Arc<PhysicalStore>, records: Vec<PageRecord>) -> Self {
        Self { store, records }
    }

    pub fn records(&self) -> &[PageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy every planned page, in order and with its rotation folded into
    /// `/Rotate`, into a new document.
    pub fn assemble(&self) -> Result<Assembled> {
        self.assemble_with_progress(|_, _| {})
    }

    /// As [`assemble`](Self::assemble), calling `progress(done, total)` after
    /// each page.
    #[instrument(skip_all, fields(pages = self.records.len()))]
    pub fn assemble_with_progress(&self, mut progress: impl FnMut(usize, usize)) -> Result<Assembled> {
        if self.records.is_empty() {
            return Err(PagewerkError::EmptySelection);
        }

        let (mut document, root_id) = copy::new_document(self.store.version());
        let mut copier = PageCopier::new(self.store.document());
        let total = self.records.len();
        let mut pages = Vec::with_capacity(total);

        for (done, record) in self.records.iter().enumerate() {
            let page_id = self.store.page_id(record.physical_index).ok_or(
                PagewerkError::IndexOutOfRange {
                    index: record.physical_index,
                    len: self.store.len(),
                },
            )?;
            let copied = copier.copy_page(&mut document, root_id, page_id, record.rotation)?;
            pages.push(copied);
            debug!(
                physical = record.physical_index,
                rotation = %record.rotation,
                "Page assembled"
            );
            progress(done + 1, total);
        }

        copy::set_page_tree(&mut document, root_id, &pages)?;
        info!(pages = pages.len(), objects = document.objects.len(), "Document assembled");
        Ok(Assembled { document, pages })
    }

    /// Assemble, recompress images when `level` asks for it, and serialise.
    #[instrument(skip(self, settings), fields(pages = self.records.len()))]
    pub fn save(&self, level: CompactionLevel, settings: CompressionSettings) -> Result<ExportOutput> {
        let Assembled { mut document, .. } = self.assemble()?;

        let report = level
            .recompresses_images()
            .then(|| Compressor::new(settings).compress_document(&mut document));
        let bytes = writer::serialize(&mut document, level)?;

        info!(bytes = bytes.len(), "Export serialised");
        Ok(ExportOutput { bytes, report })
    }

    /// Assemble, then overlay recognised text on every page.
    ///
    /// Each page is rendered at `scale` and handed to `recognizer`. Any
    /// failure aborts the whole run with no output. `progress(done, total)`
    /// is called after each page.
    #[instrument(skip_all, fields(pages = self.records.len(), scale = %scale))]
    pub fn make_searchable<R, T>(
        &self,
        renderer: &R,
        recognizer: &T,
        scale: f32,
        level: CompactionLevel,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<Vec<u8>>
    where
        R: PageRenderer + ?Sized,
        T: TextRecognizer + ?Sized,
    {
        let Assembled {
            mut document,
            pages,
        } = self.assemble()?;
        let total = pages.len();
        let mut merger = OverlayMerger::new();

        for (done, page_id) in pages.into_iter().enumerate() {
            let page_number = done + 1;
            let page_pdf = copy::extract_page(&document, page_id, Rotation::NONE, self.store.version())?;
            let raster = renderer.render(&page_pdf, scale)?;
            let overlay = recognizer.recognize_page(&raster).map_err(|err| match err {
                PagewerkError::Recognition(reason) => {
                    PagewerkError::Recognition(format!("page {}: {}", page_number, reason))
                }
                other => PagewerkError::Recognition(format!("page {}: {}", page_number, other)),
            })?;
            merger.merge(&mut document, page_id, &overlay)?;
            debug!(page = page_number, words = overlay.words.len(), "Page made searchable");
            progress(page_number, total);
        }

        let bytes = writer::serialize(&mut document, level)?;
        info!(pages = total, bytes = bytes.len(), "Searchable document serialised");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewerk_core::types::SourceFile;
    use pagewerk_document::testing::{labelled_pdf, page_labels};

    fn plan(order: &[usize]) -> ExportPlan {
        let mut store = PhysicalStore::default();
        let range = store.append_document(&labelled_pdf("A", 3)).unwrap();
        let file = SourceFile::new("a.pdf", range.len());
        let records = order.iter().map(|&i| PageRecord::new(i, &file)).collect();
        ExportPlan::new(Arc::new(store), records)
    }

    #[test]
    fn assembly_follows_plan_order() {
        let assembled = plan(&[2, 0]).assemble().unwrap();
        assert_eq!(
            page_labels(&assembled.document),
            vec![Some("A3".to_string()), Some("A1".to_string())]
        );
    }

    #[test]
    fn progress_reports_every_page() {
        let mut seen = Vec::new();
        plan(&[0, 1, 2])
            .assemble_with_progress(|done, total| seen.push((done, total)))
            .unwrap();
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn empty_plan_is_rejected() {
        assert!(matches!(plan(&[]).assemble(), Err(PagewerkError::EmptySelection)));
    }

    #[test]
    fn dangling_record_is_rejected() {
        assert!(matches!(
            plan(&[0, 9]).assemble(),
            Err(PagewerkError::IndexOutOfRange { index: 9, len: 3 })
        ));
    }

    #[test]
    fn low_level_skips_image_stage() {
        let output = plan(&[0])
            .save(CompactionLevel::Low, CompressionSettings::default())
            .unwrap();
        assert!(output.report.is_none());
        assert!(output.bytes.starts_with(b"%PDF-1.5"));
    }
}
