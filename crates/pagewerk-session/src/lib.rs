// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk-session — The editing core of a Pagewerk session.
//
// Combines pages from several PDFs into one ordered, editable sequence with
// move/rotate/delete/regroup, bounded undo/redo, a thumbnail cache, and an
// export pipeline for merge, split, compression and searchable output.

pub mod export;
pub mod history;
pub mod order;
pub mod session;
pub mod thumbnails;

pub use export::{Assembled, ExportOutput, ExportPlan};
pub use history::HistoryManager;
pub use order::PageOrderModel;
pub use session::{LoadReport, Session};
pub use thumbnails::ThumbnailCache;
