// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory PDF fixtures for unit and integration tests.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// Pixel layout of a raw fixture image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureColor {
    Gray,
    Rgb,
    Cmyk,
}

impl FixtureColor {
    fn components(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Gray => "DeviceGray",
            Self::Rgb => "DeviceRGB",
            Self::Cmyk => "DeviceCMYK",
        }
    }
}

/// A document with `pages` US-letter pages, each showing `{label}{n}`.
pub fn labelled_pdf(label: &str, pages: usize) -> Vec<u8> {
    let mut builder = FixtureBuilder::new();
    for n in 1..=pages {
        builder.add_text_page(&format!("{}{}", label, n));
    }
    builder.finish()
}

/// A single page document drawing one unfiltered raw image.
pub fn raw_image_pdf(width: u32, height: u32, color: FixtureColor) -> Vec<u8> {
    let mut builder = FixtureBuilder::new();
    let image = builder.add_raw_image(width, height, color);
    builder.add_image_page(&[image]);
    builder.finish()
}

/// Two pages that both draw the same image object.
pub fn shared_image_pdf(width: u32, height: u32) -> Vec<u8> {
    let mut builder = FixtureBuilder::new();
    let image = builder.add_raw_image(width, height, FixtureColor::Rgb);
    builder.add_image_page(&[image]);
    builder.add_image_page(&[image]);
    builder.finish()
}

/// A single page with one JPEG (`DCTDecode`) image.
pub fn jpeg_image_pdf(width: u32, height: u32) -> Vec<u8> {
    let rgb = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut encoded = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut encoded, 90);
    rgb.write_with_encoder(encoder)
        .expect("fixture JPEG encodes");

    let mut builder = FixtureBuilder::new();
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(width as i64),
            "Height" => Object::Integer(height as i64),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
            "Filter" => "DCTDecode",
        },
        encoded,
    );
    let image = builder.document.add_object(stream);
    builder.add_image_page(&[image]);
    builder.finish()
}

/// First string shown with `Tj` on the page, if any.
pub fn page_label(document: &Document, page_id: ObjectId) -> Option<String> {
    let content = document.get_page_content(page_id).ok()?;
    let content = Content::decode(&content).ok()?;
    content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .find_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => String::from_utf8(bytes.clone()).ok(),
            _ => None,
        })
}

/// Labels of every page in page-tree order.
pub fn page_labels(document: &Document) -> Vec<Option<String>> {
    document
        .get_pages()
        .values()
        .map(|id| page_label(document, *id))
        .collect()
}

struct FixtureBuilder {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    font_id: ObjectId,
}

impl FixtureBuilder {
    fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let font_id = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        Self {
            document,
            pages_id,
            kids: Vec::new(),
            font_id,
        }
    }

    fn add_text_page(&mut self, text: &str) {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), Object::Integer(24)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(700)]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let resources = dictionary! { "Font" => dictionary! { "F1" => self.font_id } };
        self.add_page(content, resources);
    }

    fn add_raw_image(&mut self, width: u32, height: u32, color: FixtureColor) -> ObjectId {
        let components = color.components();
        let mut pixels = Vec::with_capacity(width as usize * height as usize * components);
        for y in 0..height {
            for x in 0..width {
                for c in 0..components {
                    pixels.push(((x + y + c as u32 * 40) % 256) as u8);
                }
            }
        }
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(width as i64),
                "Height" => Object::Integer(height as i64),
                "ColorSpace" => color.name(),
                "BitsPerComponent" => Object::Integer(8),
            },
            pixels,
        );
        self.document.add_object(stream.with_compression(false))
    }

    fn add_image_page(&mut self, images: &[ObjectId]) {
        let mut operations = Vec::new();
        let mut xobjects = Dictionary::new();
        for (n, image) in images.iter().enumerate() {
            let name = format!("Im{}", n);
            xobjects.set(name.clone(), Object::Reference(*image));
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![
                    Object::Integer(400),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(400),
                    Object::Integer(100),
                    Object::Integer(200),
                ],
            ));
            operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
            operations.push(Operation::new("Q", vec![]));
        }
        let resources = dictionary! { "XObject" => xobjects };
        self.add_page(Content { operations }, resources);
    }

    fn add_page(&mut self, content: Content, resources: Dictionary) {
        let encoded = content.encode().expect("fixture content encodes");
        let content_id = self.document.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(Object::Reference(page_id));
    }

    fn finish(mut self) -> Vec<u8> {
        let count = self.kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => Object::Integer(count),
            }),
        );
        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .expect("fixture document serialises");
        output
    }
}
