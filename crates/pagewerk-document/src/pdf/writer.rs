// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — structural compaction and serialisation of assembled documents.

use std::path::Path;

use lopdf::Document;
use pagewerk_core::CompactionLevel;
use pagewerk_core::error::{PagewerkError, Result};
use tracing::{debug, info, instrument};

/// Compact `document` according to `level` and serialise it.
///
/// * `Low` drops objects no longer reachable from the trailer.
/// * `Medium` additionally deflates every stream that has no filter yet.
/// * `High` additionally renumbers objects densely.
///
/// Image recompression is not part of this step; run the
/// [`Compressor`](crate::Compressor) on the document first.
#[instrument(skip(document), fields(objects = document.objects.len()))]
pub fn serialize(document: &mut Document, level: CompactionLevel) -> Result<Vec<u8>> {
    let pruned = document.prune_objects();
    debug!(pruned = pruned.len(), "Unreferenced objects removed");

    if level == CompactionLevel::High {
        document.renumber_objects();
    }
    if level.deflates_streams() {
        document.compress();
    }

    let mut output = Vec::new();
    document.save_to(&mut output).map_err(|err| {
        PagewerkError::Engine(format!("failed to serialise PDF: {}", err))
    })?;

    info!(
        level = %level,
        garbage_level = level.garbage_level(),
        output_bytes = output.len(),
        "PDF serialised"
    );
    Ok(output)
}

/// Write serialised PDF bytes to `path`.
pub fn write_to_file(bytes: &[u8], path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path.as_ref(), bytes)?;
    info!("Wrote PDF to {}", path.as_ref().display());
    Ok(())
}
