// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Physical page store — one append-only merged document holding every page
// ever loaded into a session.

use lopdf::{Document, ObjectId};
use pagewerk_core::Rotation;
use pagewerk_core::error::{PagewerkError, Result};
use tracing::{debug, info, instrument, warn};

use super::copy::{self, PageCopier};

/// Append-only backing store of physical pages.
///
/// Physical indices are assigned at load time and never change; pages are
/// never removed. Editing happens on a separate ordered view that only holds
/// indices into this store.
#[derive(Debug, Clone)]
pub struct PhysicalStore {
    /// The merged document.
    document: Document,
    /// Root `/Pages` node of `document`.
    root_id: ObjectId,
    /// Physical index -> page object id.
    pages: Vec<ObjectId>,
    /// Version written on documents derived from this store.
    version: String,
}

impl PhysicalStore {
    /// Create an empty store.
    pub fn new(version: impl Into<String>) -> Self {
        let version = version.into();
        let (document, root_id) = copy::new_document(&version);
        Self {
            document,
            root_id,
            pages: Vec::new(),
            version,
        }
    }

    // -- Loading --------------------------------------------------------------

    /// Parse `data` and append all of its pages.
    ///
    /// Returns the physical indices assigned to the new pages. Either every
    /// page is appended or none is: on failure the store is left exactly as it
    /// was before the call.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn append_document(&mut self, data: &[u8]) -> Result<std::ops::Range<usize>> {
        let source = Document::load_mem(data)
            .map_err(|err| PagewerkError::Engine(format!("failed to parse PDF: {}", err)))?;

        if source.is_encrypted() {
            return Err(PagewerkError::Engine("document is encrypted".into()));
        }

        let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        if source_pages.is_empty() {
            return Err(PagewerkError::Engine("document has no pages".into()));
        }

        let checkpoint_id = self.document.max_id;
        let checkpoint_len = self.pages.len();

        match self.copy_all(&source, &source_pages) {
            Ok(()) => {
                let range = checkpoint_len..self.pages.len();
                info!(
                    added = range.len(),
                    total = self.pages.len(),
                    "Pages appended to physical store"
                );
                Ok(range)
            }
            Err(err) => {
                warn!(%err, "Rolling back partial append");
                self.document.objects.retain(|id, _| id.0 <= checkpoint_id);
                self.document.max_id = checkpoint_id;
                self.pages.truncate(checkpoint_len);
                copy::set_page_tree(&mut self.document, self.root_id, &self.pages)?;
                Err(err)
            }
        }
    }

    fn copy_all(&mut self, source: &Document, source_pages: &[ObjectId]) -> Result<()> {
        let mut copier = PageCopier::new(source);
        for page_id in source_pages {
            let new_id =
                copier.copy_page(&mut self.document, self.root_id, *page_id, Rotation::NONE)?;
            self.pages.push(new_id);
        }
        copy::set_page_tree(&mut self.document, self.root_id, &self.pages)
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of physical pages ever loaded.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Object id of the physical page, if the index is valid.
    pub fn page_id(&self, physical_index: usize) -> Option<ObjectId> {
        self.pages.get(physical_index).copied()
    }

    /// Rotation stored on the physical page itself.
    pub fn stored_rotation(&self, physical_index: usize) -> Option<Rotation> {
        self.page_id(physical_index)
            .map(|id| copy::page_rotation(&self.document, id))
    }

    /// The merged document. Read-only: pages are copied out, never edited in place.
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    // -- Extraction -----------------------------------------------------------

    /// Serialise one physical page as a standalone PDF with `extra` rotation
    /// applied on top of its stored rotation.
    #[instrument(skip(self), fields(rotation = extra.degrees()))]
    pub fn extract_page(&self, physical_index: usize, extra: Rotation) -> Result<Vec<u8>> {
        let page_id = self.page_id(physical_index).ok_or(PagewerkError::IndexOutOfRange {
            index: physical_index,
            len: self.pages.len(),
        })?;
        let bytes = copy::extract_page(&self.document, page_id, extra, &self.version)?;
        debug!(physical_index, output_bytes = bytes.len(), "Page extracted");
        Ok(bytes)
    }
}

impl Default for PhysicalStore {
    fn default() -> Self {
        Self::new("1.5")
    }
}
