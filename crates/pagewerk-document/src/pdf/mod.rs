// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — the physical page store, page copying, embedded images, and
// serialisation.

pub mod copy;
pub mod images;
pub mod store;
pub mod writer;

pub use copy::PageCopier;
pub use store::PhysicalStore;
