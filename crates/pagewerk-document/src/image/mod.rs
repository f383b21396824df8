// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — pixel processing and embedded image recompression.

pub mod compressor;
pub mod processor;

pub use compressor::{CompressionReport, CompressionSettings, Compressor};
pub use processor::ImageProcessor;
