// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Invisible text overlays.
//
// Recognised words are drawn with text render mode 3 (neither filled nor
// stroked) so the page looks unchanged but its text can be selected and
// searched. Word boxes arrive in raster pixels of the page as displayed,
// i.e. after `/Rotate`, and are mapped back into default user space here.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use pagewerk_core::Rotation;
use pagewerk_core::error::{PagewerkError, Result};
use tracing::debug;

use super::TextOverlay;
use crate::pdf::copy;

/// Resource name of the overlay font.
const FONT_NAME: &[u8] = b"PwOcr";

/// Average Helvetica glyph advance as a fraction of the font size.
const AVERAGE_ADVANCE: f32 = 0.5;

/// Axis-aligned page box `[x0, y0, x1, y1]` plus display rotation.
#[derive(Debug, Clone, Copy)]
struct PageFrame {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    rotation: Rotation,
}

impl PageFrame {
    fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Map a point in displayed raster space, given as fractions of the
    /// raster width and height, to user space.
    fn to_user(&self, fx: f32, fy: f32) -> (f32, f32) {
        let (w, h) = (self.width(), self.height());
        match self.rotation.degrees() {
            90 => (self.x0 + fy * w, self.y0 + fx * h),
            180 => (self.x1 - fx * w, self.y0 + fy * h),
            270 => (self.x1 - fy * w, self.y1 - fx * h),
            _ => (self.x0 + fx * w, self.y1 - fy * h),
        }
    }

    /// User-space length of the displayed horizontal and vertical axes.
    fn displayed_extent(&self) -> (f32, f32) {
        if self.rotation.is_quarter_turn() {
            (self.height(), self.width())
        } else {
            (self.width(), self.height())
        }
    }

    /// Text matrix rotation `[a b c d]` that makes glyphs read left to right
    /// on the displayed page.
    fn text_axes(&self) -> [f32; 4] {
        match self.rotation.degrees() {
            90 => [0.0, 1.0, -1.0, 0.0],
            180 => [-1.0, 0.0, 0.0, -1.0],
            270 => [0.0, -1.0, 1.0, 0.0],
            _ => [1.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Adds invisible text overlays to pages of one document, sharing a single
/// font object between them.
#[derive(Debug, Default)]
pub struct OverlayMerger {
    font: Option<ObjectId>,
}

impl OverlayMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `overlay` invisibly over `page_id`.
    ///
    /// The existing content is wrapped in `q`/`Q` so its graphics state
    /// cannot leak into the overlay. Pages with no recognised words are left
    /// untouched.
    pub fn merge(&mut self, document: &mut Document, page_id: ObjectId, overlay: &TextOverlay) -> Result<()> {
        if overlay.is_empty() {
            return Ok(());
        }
        if overlay.image_width == 0 || overlay.image_height == 0 {
            return Err(PagewerkError::Recognition(
                "overlay raster has zero size".into(),
            ));
        }

        let [x0, y0, x1, y1] = copy::media_box(document, page_id).ok_or_else(|| {
            PagewerkError::Engine(format!("page {:?} has no media box", page_id))
        })?;
        let frame = PageFrame {
            x0: x0.min(x1) as f32,
            y0: y0.min(y1) as f32,
            x1: x0.max(x1) as f32,
            y1: y0.max(y1) as f32,
            rotation: copy::page_rotation(document, page_id),
        };

        let content = overlay_content(&frame, overlay)
            .encode()
            .map_err(|err| PagewerkError::Engine(format!("cannot encode overlay: {}", err)))?;

        let font_id = self.font_id(document);
        let resources = resources_with_font(document, page_id, font_id)?;

        let open_id = document.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let close_id = document.add_object(Stream::new(dictionary! {}, b"\nQ\n".to_vec()));
        let overlay_id = document.add_object(Stream::new(dictionary! {}, content));

        let page = document
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| PagewerkError::Engine(format!("cannot edit page {:?}: {}", page_id, err)))?;

        let mut contents = vec![Object::Reference(open_id)];
        match page.get(b"Contents") {
            Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
            Ok(existing @ Object::Reference(_)) => contents.push(existing.clone()),
            _ => {}
        }
        contents.push(Object::Reference(close_id));
        contents.push(Object::Reference(overlay_id));

        page.set("Contents", Object::Array(contents));
        page.set("Resources", Object::Dictionary(resources));

        debug!(?page_id, words = overlay.words.len(), "Text overlay merged");
        Ok(())
    }

    fn font_id(&mut self, document: &mut Document) -> ObjectId {
        *self.font.get_or_insert_with(|| {
            document.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            })
        })
    }
}

/// Build the overlay's content operations.
fn overlay_content(frame: &PageFrame, overlay: &TextOverlay) -> Content {
    let (extent_x, extent_y) = frame.displayed_extent();
    let along = extent_x / overlay.image_width as f32;
    let across = extent_y / overlay.image_height as f32;
    let [a, b, c, d] = frame.text_axes();

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tr", vec![Object::Integer(3)]),
    ];

    for word in &overlay.words {
        let encoded = latin1(&word.text);
        if encoded.is_empty() || word.width <= 0.0 || word.height <= 0.0 {
            continue;
        }

        let font_size = (word.height * across).max(1.0);
        let natural_width = AVERAGE_ADVANCE * font_size * encoded.len() as f32;
        let target_width = word.width * along;
        let horizontal_scale = 100.0 * target_width / natural_width;

        let fx = word.left / overlay.image_width as f32;
        let fy = (word.top + word.height) / overlay.image_height as f32;
        let (e, f) = frame.to_user(fx, fy);

        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(FONT_NAME.to_vec()), font_size.into()],
        ));
        operations.push(Operation::new("Tz", vec![horizontal_scale.into()]));
        operations.push(Operation::new(
            "Tm",
            vec![a.into(), b.into(), c.into(), d.into(), e.into(), f.into()],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(encoded, StringFormat::Literal)],
        ));
    }

    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

/// The page's resources as an owned dictionary with the overlay font added.
///
/// Shared resource and font dictionaries are copied, not edited in place.
fn resources_with_font(document: &Document, page_id: ObjectId, font_id: ObjectId) -> Result<Dictionary> {
    let mut resources = match copy::inherited_attribute(document, page_id, b"Resources") {
        Some(object) => match copy::resolve(document, &object) {
            Object::Dictionary(dict) => dict.clone(),
            _ => Dictionary::new(),
        },
        None => Dictionary::new(),
    };

    let mut fonts = match resources.get(b"Font") {
        Ok(object) => match copy::resolve(document, object) {
            Object::Dictionary(dict) => dict.clone(),
            _ => Dictionary::new(),
        },
        Err(_) => Dictionary::new(),
    };
    fonts.set(FONT_NAME.to_vec(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));
    Ok(resources)
}

/// Encode for WinAnsi, replacing characters outside Latin-1 with `?`.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
        .collect()
}
