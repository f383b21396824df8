// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition with the `ocrs` crate (feature "ocr").
//
// `ocrs` is a pure-Rust OCR engine running neural network models through
// `rten`. It needs two model files:
//
// - `text-detection.rten` locates words in the image.
// - `text-recognition.rten` decodes the characters of each text line.
//
// Running `ocrs-cli` once downloads both to `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is where `OcrConfig::default` looks.
//
// The `ocrs` and `rten` crates are very slow in debug builds; build them
// with optimisations when recognising real pages.

use std::path::{Path, PathBuf};

use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use pagewerk_core::error::{PagewerkError, Result};
use rten::Model;
use tracing::{debug, info, instrument};

use super::{RecognizedWord, TextOverlay, TextRecognizer};
use crate::render::RasterImage;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, then `~/.cache/ocrs`, then `./ocrs-models`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the two model files.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Expect both models, under their usual names, in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (role, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(PagewerkError::Recognition(format!(
                    "{} model not found at {}; run `ocrs-cli` once to download models",
                    role,
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// [`TextRecognizer`] backed by `ocrs`.
///
/// Model loading is the expensive part; build one recognizer and reuse it
/// for every page.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = load_model(&config.detection_model_path)?;
        info!("Loading OCR recognition model");
        let recognition_model = load_model(&config.recognition_model_path)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| {
            PagewerkError::Recognition(format!("failed to initialise OCR engine: {}", err))
        })?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(OcrConfig::default())
    }
}

fn load_model(path: &Path) -> Result<Model> {
    Model::load_file(path).map_err(|err| {
        PagewerkError::Recognition(format!(
            "failed to load model from {}: {}",
            path.display(),
            err
        ))
    })
}

impl TextRecognizer for OcrsRecognizer {
    #[instrument(skip_all, fields(width = page.width, height = page.height))]
    fn recognize_page(&self, page: &RasterImage) -> Result<TextOverlay> {
        let rgb = page
            .to_dynamic()
            .map_err(|err| PagewerkError::Recognition(err.to_string()))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            PagewerkError::Recognition(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;
        let input = self.engine.prepare_input(source).map_err(|err| {
            PagewerkError::Recognition(format!("OCR preprocessing failed: {}", err))
        })?;

        let word_rects = self.engine.detect_words(&input).map_err(|err| {
            PagewerkError::Recognition(format!("word detection failed: {}", err))
        })?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let lines = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| {
                PagewerkError::Recognition(format!("line recognition failed: {}", err))
            })?;

        let mut overlay = TextOverlay::new(width, height);
        for line in lines.iter().flatten() {
            for word in line.words() {
                let text: String = word.chars().iter().map(|ch| ch.char).collect();
                if text.trim().is_empty() {
                    continue;
                }
                let rect = word.bounding_rect();
                overlay.words.push(RecognizedWord {
                    text,
                    left: rect.left() as f32,
                    top: rect.top() as f32,
                    width: rect.width() as f32,
                    height: rect.height() as f32,
                });
            }
        }

        debug!(
            detected = word_rects.len(),
            lines = line_rects.len(),
            words = overlay.words.len(),
            "Page recognised"
        );
        Ok(overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_dir_uses_standard_names() {
        let config = OcrConfig::from_dir("/tmp/models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/tmp/models/text-recognition.rten")
        );
    }

    #[test]
    fn missing_models_are_a_recognition_failure() {
        let config = OcrConfig::from_dir("/nonexistent/pagewerk-models");
        assert!(matches!(
            OcrsRecognizer::new(config),
            Err(PagewerkError::Recognition(_))
        ));
    }
}
