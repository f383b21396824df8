// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagewerk.

use thiserror::Error;

/// Top-level error type for all Pagewerk operations.
///
/// Only [`Engine`](Self::Engine), [`Recognition`](Self::Recognition),
/// [`Render`](Self::Render) and [`Io`](Self::Io) ever abort a whole export.
/// The remaining variants describe conditions that the session absorbs
/// locally and surfaces through reports.
#[derive(Debug, Error)]
pub enum PagewerkError {
    // -- Loading --
    #[error("failed to load {name}: {reason}")]
    LoadFailure { name: String, reason: String },

    // -- Editing --
    #[error("page index {index} out of range (session has {len} pages)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no pages selected")]
    EmptySelection,

    // -- Document engine --
    #[error("PDF engine failure: {0}")]
    Engine(String),

    #[error("image {} {} R could not be recompressed: {reason}", object.0, object.1)]
    ImageRecompression { object: (u32, u16), reason: String },

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("text recognition failed: {0}")]
    Recognition(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PagewerkError {
    /// Whether the session absorbs this error instead of failing the
    /// surrounding operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::LoadFailure { .. }
                | Self::IndexOutOfRange { .. }
                | Self::ImageRecompression { .. }
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagewerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recompression_error_formats_object_reference() {
        let err = PagewerkError::ImageRecompression {
            object: (12, 0),
            reason: "unsupported colour space".into(),
        };
        assert_eq!(
            err.to_string(),
            "image 12 0 R could not be recompressed: unsupported colour space"
        );
    }

    #[test]
    fn only_local_conditions_are_recoverable() {
        assert!(PagewerkError::IndexOutOfRange { index: 9, len: 3 }.is_recoverable());
        assert!(
            PagewerkError::LoadFailure {
                name: "a.pdf".into(),
                reason: "bad xref".into()
            }
            .is_recoverable()
        );
        assert!(!PagewerkError::Engine("save failed".into()).is_recoverable());
        assert!(!PagewerkError::Recognition("model missing".into()).is_recoverable());
    }
}
