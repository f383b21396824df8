// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagewerk session engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::PagewerkError;

/// Unique identifier for one load operation.
///
/// Loading the same path twice yields two distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub Uuid);

impl FileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A source file that contributed pages to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: FileId,
    /// Display name (usually the file name). Not unique.
    pub name: String,
    /// Pages the file had when it was loaded.
    pub page_count: usize,
    pub loaded_at: DateTime<Utc>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, page_count: usize) -> Self {
        Self {
            id: FileId::new(),
            name: name.into(),
            page_count,
            loaded_at: Utc::now(),
        }
    }
}

/// Clockwise quarter-turn rotation, always one of 0, 90, 180 or 270.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct Rotation(u16);

impl Rotation {
    pub const NONE: Rotation = Rotation(0);

    /// Normalise `degrees` into `[0, 360)`.
    ///
    /// Returns `None` when `degrees` is not a multiple of 90.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(Self(degrees.rem_euclid(360) as u16))
    }

    /// Rotate further by `delta` degrees. `None` for non-quarter turns.
    pub fn rotated_by(self, delta: i64) -> Option<Self> {
        if delta % 90 != 0 {
            return None;
        }
        Self::from_degrees(self.0 as i64 + delta.rem_euclid(360))
    }

    pub fn degrees(self) -> u16 {
        self.0
    }

    /// Whether width and height swap when this rotation is applied.
    pub fn is_quarter_turn(self) -> bool {
        self.0 == 90 || self.0 == 270
    }
}

impl TryFrom<i64> for Rotation {
    type Error = PagewerkError;

    fn try_from(degrees: i64) -> Result<Self, Self::Error> {
        Self::from_degrees(degrees).ok_or_else(|| {
            PagewerkError::InvalidConfig(format!(
                "rotation must be a multiple of 90, got {}",
                degrees
            ))
        })
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.0
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// One page in the user-visible session order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Index into the physical store. Stable for the life of the session.
    pub physical_index: usize,
    pub source_file_id: FileId,
    pub source_file_name: String,
    /// Applied on top of whatever rotation the physical page already has.
    pub rotation: Rotation,
}

impl PageRecord {
    pub fn new(physical_index: usize, source: &SourceFile) -> Self {
        Self {
            physical_index,
            source_file_id: source.id,
            source_file_name: source.name.clone(),
            rotation: Rotation::NONE,
        }
    }
}

/// Derived view of one source file inside the current order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileGroup {
    pub file_id: FileId,
    pub name: String,
    /// Pages of this file still present in the order.
    pub page_count: usize,
}

/// Structural compaction aggressiveness applied when serialising.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompactionLevel {
    /// Drop unreferenced objects.
    Low,
    /// Also deflate uncompressed streams.
    #[default]
    Medium,
    /// Also renumber objects and recompress embedded images.
    High,
}

impl CompactionLevel {
    /// Numeric garbage-collection tier (1..=3).
    pub fn garbage_level(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn deflates_streams(self) -> bool {
        !matches!(self, Self::Low)
    }

    pub fn recompresses_images(self) -> bool {
        matches!(self, Self::High)
    }
}

impl FromStr for CompactionLevel {
    type Err = PagewerkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(PagewerkError::InvalidConfig(format!(
                "unknown compaction level: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CompactionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(name)
    }
}
