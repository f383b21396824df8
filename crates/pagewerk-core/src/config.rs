// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PagewerkError, Result};

/// Tunables for an editing session and its export pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Canonical thumbnail scale. Only renders at exactly this scale are cached.
    pub thumbnail_scale: f32,
    /// Scale used for full-page viewer renders (never cached).
    pub viewer_scale: f32,
    /// Maximum number of undo snapshots kept.
    pub history_limit: usize,
    /// Images wider or taller than this are downscaled during recompression.
    pub max_image_dimension: u32,
    /// JPEG quality for images that had to be downscaled.
    pub downscaled_jpeg_quality: u8,
    /// JPEG quality for images already within bounds.
    pub jpeg_quality: u8,
    /// PDF header version written on assembled documents.
    pub pdf_version: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            thumbnail_scale: 0.3,
            viewer_scale: 2.0,
            history_limit: 50,
            max_image_dimension: 1500,
            downscaled_jpeg_quality: 30,
            jpeg_quality: 60,
            pdf_version: "1.5".to_string(),
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the session cannot operate with.
    pub fn validate(&self) -> Result<()> {
        for (name, scale) in [
            ("thumbnail_scale", self.thumbnail_scale),
            ("viewer_scale", self.viewer_scale),
        ] {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(PagewerkError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, scale
                )));
            }
        }
        if self.history_limit == 0 {
            return Err(PagewerkError::InvalidConfig(
                "history_limit must be at least 1".into(),
            ));
        }
        if self.max_image_dimension == 0 {
            return Err(PagewerkError::InvalidConfig(
                "max_image_dimension must be at least 1".into(),
            ));
        }
        for (name, quality) in [
            ("downscaled_jpeg_quality", self.downscaled_jpeg_quality),
            ("jpeg_quality", self.jpeg_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(PagewerkError::InvalidConfig(format!(
                    "{} must be within 1..=100, got {}",
                    name, quality
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.max_image_dimension, 1500);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = SessionConfig::from_json(r#"{ "history_limit": 10 }"#).unwrap();
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.thumbnail_scale, 0.3);
    }

    #[test]
    fn rejects_zero_scale_and_bad_quality() {
        assert!(SessionConfig::from_json(r#"{ "thumbnail_scale": 0.0 }"#).is_err());
        assert!(SessionConfig::from_json(r#"{ "jpeg_quality": 0 }"#).is_err());
        assert!(SessionConfig::from_json(r#"{ "history_limit": 0 }"#).is_err());
    }

    #[test]
    fn json_round_trip_preserves_values() {
        let config = SessionConfig {
            viewer_scale: 1.5,
            ..SessionConfig::default()
        };
        let parsed = SessionConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
