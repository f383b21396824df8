// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the editing UI.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives whether the UI shows a passing notice or a blocking dialog.

use crate::error::PagewerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something was left out but the operation carried on (a file, an image).
    Skipped,
    /// The user has to change something before trying again.
    ActionRequired,
    /// The operation failed and produced no output.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `PagewerkError` into a `HumanError`.
pub fn humanize_error(err: &PagewerkError) -> HumanError {
    match err {
        PagewerkError::LoadFailure { name, reason } => {
            let suggestion = if reason.contains("encrypt") || reason.contains("password") {
                "This file is password protected. Remove the password and add it again."
            } else {
                "The file may be damaged or not a PDF. The other files were added normally."
            };
            HumanError {
                message: format!("We couldn't open {}.", name),
                suggestion: suggestion.into(),
                severity: Severity::Skipped,
            }
        }

        PagewerkError::IndexOutOfRange { .. } => HumanError {
            message: "That page is no longer in the document.".into(),
            suggestion: "Nothing was changed.".into(),
            severity: Severity::Skipped,
        },

        PagewerkError::EmptySelection => HumanError {
            message: "No pages are selected.".into(),
            suggestion: "Select one or more pages and try again.".into(),
            severity: Severity::ActionRequired,
        },

        PagewerkError::ImageRecompression { .. } => HumanError {
            message: "One picture could not be shrunk.".into(),
            suggestion: "It was kept at its original quality; the rest of the file was compressed."
                .into(),
            severity: Severity::Skipped,
        },

        PagewerkError::Engine(_) => HumanError {
            message: "The PDF could not be written.".into(),
            suggestion: "Try saving again, or choose a lower compression level.".into(),
            severity: Severity::Permanent,
        },

        PagewerkError::Image(_) | PagewerkError::Render(_) => HumanError {
            message: "A page preview could not be drawn.".into(),
            suggestion: "The page itself is unchanged and will still be saved.".into(),
            severity: Severity::Permanent,
        },

        PagewerkError::Recognition(_) => HumanError {
            message: "Text recognition didn't finish.".into(),
            suggestion: "No searchable file was created. Check that the OCR models are installed."
                .into(),
            severity: Severity::Permanent,
        },

        PagewerkError::InvalidConfig(detail) => HumanError {
            message: "A setting has an invalid value.".into(),
            suggestion: format!("Fix the setting and try again ({}).", detail),
            severity: Severity::ActionRequired,
        },

        PagewerkError::Io(io) => {
            if io.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We aren't allowed to write there.".into(),
                    suggestion: "Choose a different folder.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "The file couldn't be read or written.".into(),
                    suggestion: "Check that the disk isn't full and the file still exists.".into(),
                    severity: Severity::Permanent,
                }
            }
        }

        PagewerkError::Serialization(_) => HumanError {
            message: "The settings file is damaged.".into(),
            suggestion: "Defaults will be used until the settings are saved again.".into(),
            severity: Severity::ActionRequired,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failure_is_skipped_and_names_file() {
        let err = PagewerkError::LoadFailure {
            name: "scan.pdf".into(),
            reason: "invalid file header".into(),
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Skipped);
        assert!(human.message.contains("scan.pdf"));
    }

    #[test]
    fn encrypted_file_gets_password_hint() {
        let err = PagewerkError::LoadFailure {
            name: "locked.pdf".into(),
            reason: "document is encrypted".into(),
        };
        assert!(humanize_error(&err).suggestion.contains("password"));
    }

    #[test]
    fn engine_failure_is_permanent() {
        let human = humanize_error(&PagewerkError::Engine("xref overflow".into()));
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn permission_denied_is_action_required() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let human = humanize_error(&PagewerkError::Io(io));
        assert_eq!(human.severity, Severity::ActionRequired);
    }
}
