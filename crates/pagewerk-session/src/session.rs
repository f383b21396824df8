// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The editing session — owns the physical store, the page order, history,
// and thumbnail cache, and exposes every operation the UI layer calls.

use std::path::Path;
use std::sync::Arc;

use pagewerk_core::SessionConfig;
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{CompactionLevel, FileGroup, FileId, PageRecord, SourceFile};
use pagewerk_document::pdf::writer;
use pagewerk_document::{
    BlankRenderer, CompressionSettings, PageRenderer, PhysicalStore, RasterImage, TextRecognizer,
};
use tracing::{debug, info, instrument, warn};

use crate::export::{ExportOutput, ExportPlan};
use crate::history::HistoryManager;
use crate::order::{self, PageOrderModel};
use crate::thumbnails::ThumbnailCache;

/// Outcome of a batch load.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Files that were appended, in batch order.
    pub loaded: Vec<SourceFile>,
    /// One `LoadFailure` per file that was skipped.
    pub failures: Vec<PagewerkError>,
    /// Visible page count after the batch.
    pub page_count: usize,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A multi-file page editing session.
///
/// Edits never touch the physical store; they rearrange an ordered list of
/// records pointing into it. Every edit that changes the order is undoable.
/// Operations given out-of-range indices do nothing and return `false`.
pub struct Session<R = BlankRenderer> {
    config: SessionConfig,
    store: Arc<PhysicalStore>,
    files: Vec<SourceFile>,
    order: PageOrderModel,
    history: HistoryManager<Vec<PageRecord>>,
    thumbnails: ThumbnailCache,
    renderer: R,
}

impl Session<BlankRenderer> {
    /// A session with default settings and no rendering engine.
    ///
    /// Thumbnails and page images from this session are blank placeholders
    /// sized like the page. Use [`Session::with_renderer`] with a real
    /// [`PageRenderer`] (such as `PdfiumRenderer` under the `render` feature)
    /// to see page content.
    pub fn new() -> Self {
        Self::build(SessionConfig::default(), BlankRenderer)
    }

    pub fn with_config(config: SessionConfig) -> Result<Self> {
        Self::with_renderer(config, BlankRenderer)
    }
}

impl Default for Session<BlankRenderer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PageRenderer> Session<R> {
    pub fn with_renderer(config: SessionConfig, renderer: R) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, renderer))
    }

    fn build(config: SessionConfig, renderer: R) -> Self {
        Self {
            store: Arc::new(PhysicalStore::new(config.pdf_version.clone())),
            files: Vec::new(),
            order: PageOrderModel::new(),
            history: HistoryManager::new(config.history_limit),
            thumbnails: ThumbnailCache::new(config.thumbnail_scale),
            renderer,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Every file loaded since the session started, including files whose
    /// pages have all been deleted.
    pub fn source_files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn store(&self) -> &PhysicalStore {
        &self.store
    }

    // -- Loading --------------------------------------------------------------

    /// Append the pages of each `(name, bytes)` source to the end of the
    /// order.
    ///
    /// Files load all-or-nothing; a file that fails is reported and skipped
    /// while the rest of the batch continues.
    #[instrument(skip_all)]
    pub fn load<I, N, B>(&mut self, sources: I) -> LoadReport
    where
        I: IntoIterator<Item = (N, B)>,
        N: Into<String>,
        B: AsRef<[u8]>,
    {
        let before = self.order.snapshot();
        let mut report = LoadReport::default();

        for (name, bytes) in sources {
            let name = name.into();
            match Arc::make_mut(&mut self.store).append_document(bytes.as_ref()) {
                Ok(range) => {
                    let file = SourceFile::new(name, range.len());
                    info!(file = %file.name, id = %file.id, pages = file.page_count, "File loaded");
                    self.order.append(&file, range);
                    self.files.push(file.clone());
                    report.loaded.push(file);
                }
                Err(err) => {
                    warn!(file = %name, %err, "File skipped");
                    report.failures.push(PagewerkError::LoadFailure {
                        name,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if !report.loaded.is_empty() {
            self.history.record(before);
        }
        report.page_count = self.order.len();
        report
    }

    /// Read each path from disk and [`load`](Self::load) it. Unreadable
    /// files become load failures.
    pub fn load_paths<P: AsRef<Path>>(&mut self, paths: impl IntoIterator<Item = P>) -> LoadReport {
        let mut readable = Vec::new();
        let mut failures = Vec::new();

        for path in paths {
            let path = path.as_ref();
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            match std::fs::read(path) {
                Ok(bytes) => readable.push((name, bytes)),
                Err(err) => {
                    warn!(path = %path.display(), %err, "File unreadable");
                    failures.push(PagewerkError::LoadFailure {
                        name,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let mut report = self.load(readable);
        report.failures.extend(failures);
        report
    }

    // -- Editing --------------------------------------------------------------

    /// Apply `change` to the order, recording the prior state only when
    /// something actually changed.
    fn edit(&mut self, change: impl FnOnce(&mut PageOrderModel) -> bool) -> bool {
        let before = self.order.snapshot();
        if !change(&mut self.order) {
            return false;
        }
        self.history.record(before);
        true
    }

    /// Move the page at `from` so that it ends up at `to`.
    pub fn move_page(&mut self, from: usize, to: usize) -> bool {
        self.edit(|order| order.move_page(from, to))
    }

    /// Rotate the page at `index` clockwise by `delta_degrees`, a multiple of
    /// 90 (negative values turn counter-clockwise).
    pub fn rotate(&mut self, index: usize, delta_degrees: i64) -> bool {
        let mut rotated = None;
        let changed = self.edit(|order| {
            rotated = order.rotate(index, delta_degrees);
            rotated.is_some()
        });
        if let Some(physical_index) = rotated {
            self.thumbnails.invalidate_page(physical_index);
        }
        changed
    }

    /// Remove the pages at `indices` from the order. Physical pages stay in
    /// the store.
    pub fn delete(&mut self, indices: &[usize]) -> bool {
        self.edit(|order| order.delete(indices) > 0)
    }

    /// Move all pages of `file_id` as a block to `new_position` among files.
    pub fn regroup_file(&mut self, file_id: FileId, new_position: usize) -> bool {
        self.edit(|order| order.regroup_file(file_id, new_position))
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.order.snapshot()) {
            Some(previous) => {
                self.order.restore(previous);
                debug!(remaining = self.history.undo_len(), "Undo");
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.order.snapshot()) {
            Some(next) => {
                self.order.restore(next);
                debug!(remaining = self.history.redo_len(), "Redo");
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Number of undo steps currently available.
    pub fn undo_depth(&self) -> usize {
        self.history.undo_len()
    }

    // -- Queries --------------------------------------------------------------

    pub fn get(&self, index: usize) -> Option<&PageRecord> {
        self.order.get(index)
    }

    pub fn count(&self) -> usize {
        self.order.len()
    }

    pub fn pages(&self) -> &[PageRecord] {
        self.order.records()
    }

    pub fn files_in_order(&self) -> Vec<FileGroup> {
        self.order.files_in_order()
    }

    // -- Previews -------------------------------------------------------------

    /// Thumbnail at the canonical scale, served from the cache when possible.
    pub fn get_thumbnail(&mut self, index: usize) -> Result<Arc<RasterImage>> {
        self.render(index, self.config.thumbnail_scale)
    }

    /// Full-size viewer render. Never cached.
    pub fn get_page_image(&mut self, index: usize) -> Result<Arc<RasterImage>> {
        self.render(index, self.config.viewer_scale)
    }

    /// Render the page at `index` with its rotation at `scale`.
    ///
    /// Only renders at the canonical thumbnail scale go through the cache.
    pub fn render(&mut self, index: usize, scale: f32) -> Result<Arc<RasterImage>> {
        let record = self.order.get(index).ok_or(PagewerkError::IndexOutOfRange {
            index,
            len: self.order.len(),
        })?;
        let key = order::cache_key(record);
        let (physical_index, rotation) = key;

        let store = &self.store;
        let renderer = &self.renderer;
        self.thumbnails.get_or_render(key, scale, || {
            let page = store.extract_page(physical_index, rotation)?;
            renderer.render(&page, scale)
        })
    }

    // -- Export ---------------------------------------------------------------

    /// Freeze the pages at `indices` (in that order) into a plan that can be
    /// run independently of the session. Out-of-range indices are skipped.
    pub fn export_plan(&self, indices: &[usize]) -> Result<ExportPlan> {
        let records: Vec<PageRecord> = indices
            .iter()
            .filter_map(|&index| self.order.get(index).cloned())
            .collect();
        if records.is_empty() {
            return Err(PagewerkError::EmptySelection);
        }
        if records.len() < indices.len() {
            debug!(
                requested = indices.len(),
                kept = records.len(),
                "Out-of-range export indices skipped"
            );
        }
        Ok(ExportPlan::new(Arc::clone(&self.store), records))
    }

    fn all_indices(&self) -> Vec<usize> {
        (0..self.order.len()).collect()
    }

    fn compression_settings(&self) -> CompressionSettings {
        CompressionSettings::from(&self.config)
    }

    /// Every page in the current order, lightly compacted.
    #[instrument(skip(self), fields(pages = self.order.len()))]
    pub fn save_all(&self) -> Result<Vec<u8>> {
        let plan = self.export_plan(&self.all_indices())?;
        Ok(plan.save(CompactionLevel::Low, self.compression_settings())?.bytes)
    }

    /// The pages at `indices`, in that order. Used for splitting.
    #[instrument(skip(self, indices), fields(selected = indices.len()))]
    pub fn export_subset(&self, indices: &[usize]) -> Result<Vec<u8>> {
        let plan = self.export_plan(indices)?;
        Ok(plan.save(CompactionLevel::Low, self.compression_settings())?.bytes)
    }

    /// Every page in the current order at the given compaction level. `High`
    /// also recompresses embedded images.
    #[instrument(skip(self), fields(pages = self.order.len()))]
    pub fn compress(&self, level: CompactionLevel) -> Result<ExportOutput> {
        let plan = self.export_plan(&self.all_indices())?;
        plan.save(level, self.compression_settings())
    }

    pub fn save_all_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        writer::write_to_file(&self.save_all()?, path)
    }

    pub fn export_subset_to_file(&self, indices: &[usize], path: impl AsRef<Path>) -> Result<()> {
        writer::write_to_file(&self.export_subset(indices)?, path)
    }

    pub fn compress_to_file(&self, level: CompactionLevel, path: impl AsRef<Path>) -> Result<ExportOutput> {
        let output = self.compress(level)?;
        writer::write_to_file(&output.bytes, path)?;
        Ok(output)
    }

    /// Export the pages at `indices` with an invisible layer of recognised
    /// text. Pages are rendered at the viewer scale.
    pub fn make_searchable<T: TextRecognizer + ?Sized>(
        &self,
        indices: &[usize],
        recognizer: &T,
        progress: impl FnMut(usize, usize),
    ) -> Result<Vec<u8>> {
        let plan = self.export_plan(indices)?;
        plan.make_searchable(
            &self.renderer,
            recognizer,
            self.config.viewer_scale,
            CompactionLevel::Low,
            progress,
        )
    }

    // -- Teardown -------------------------------------------------------------

    /// Drop every loaded file, page, history step and cached thumbnail.
    pub fn clear_session(&mut self) {
        self.store = Arc::new(PhysicalStore::new(self.config.pdf_version.clone()));
        self.files.clear();
        self.order.clear();
        self.history.clear();
        self.thumbnails.clear();
        info!("Session cleared");
    }

    pub fn cached_thumbnails(&self) -> usize {
        self.thumbnails.len()
    }
}
