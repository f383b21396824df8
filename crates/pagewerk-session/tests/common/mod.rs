// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared helpers for pagewerk-session integration tests.

#![allow(dead_code)]

use std::cell::Cell;

use pagewerk_core::FileId;
use pagewerk_core::error::Result;
use pagewerk_document::testing::labelled_pdf;
use pagewerk_document::{BlankRenderer, PageRenderer, RasterImage};
use pagewerk_session::Session;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness (`RUST_LOG=debug`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Blank renderer that counts how often it is asked to render.
#[derive(Debug, Default)]
pub struct CountingRenderer {
    pub calls: Cell<usize>,
}

impl PageRenderer for CountingRenderer {
    fn render(&self, page_pdf: &[u8], scale: f32) -> Result<RasterImage> {
        self.calls.set(self.calls.get() + 1);
        BlankRenderer.render(page_pdf, scale)
    }
}

/// A session holding `A.pdf` with pages A1..A`a` then `B.pdf` with B1..B`b`.
pub fn session_ab(a: usize, b: usize) -> Session {
    init_tracing();
    let mut session = Session::new();
    let report = session.load([("A.pdf", labelled_pdf("A", a)), ("B.pdf", labelled_pdf("B", b))]);
    assert!(report.is_complete(), "fixtures must load: {:?}", report.failures);
    session
}

/// `{file}{page}` labels of the current order, e.g. `["B2", "A1"]`.
pub fn labels<R: PageRenderer>(session: &Session<R>) -> Vec<String> {
    session
        .pages()
        .iter()
        .map(|record| {
            let file = record.source_file_name.trim_end_matches(".pdf");
            let page = record.physical_index - first_physical_index(session, record.source_file_id) + 1;
            format!("{}{}", file, page)
        })
        .collect()
}

/// Files are appended to the store in load order.
fn first_physical_index<R: PageRenderer>(session: &Session<R>, file: FileId) -> usize {
    let mut offset = 0;
    for source in session.source_files() {
        if source.id == file {
            return offset;
        }
        offset += source.page_count;
    }
    offset
}
