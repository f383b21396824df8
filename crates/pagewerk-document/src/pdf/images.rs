// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Embedded image XObjects — discovery, decoding to pixels, and payload
// replacement.

use std::collections::HashSet;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pagewerk_core::error::{PagewerkError, Result};
use tracing::debug;

use super::copy::{inherited_attribute, resolve};

/// Colour model of a decodable embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorModel {
    fn from_components(components: i64) -> Option<Self> {
        match components {
            1 => Some(Self::Gray),
            3 => Some(Self::Rgb),
            4 => Some(Self::Cmyk),
            _ => None,
        }
    }

    pub fn components(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
        }
    }
}

/// Metadata written alongside a replacement payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    /// Colour space name, e.g. `DeviceRGB`.
    pub color_space: &'static str,
    /// Filter name, e.g. `DCTDecode`.
    pub filter: &'static str,
}

/// Image XObjects drawn by a page, in discovery order, without duplicates.
///
/// Form XObjects are searched recursively.
pub fn image_references(document: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let mut found = Vec::new();
    let mut visited = HashSet::new();
    if let Some(resources) = inherited_attribute(document, page_id, b"Resources") {
        collect_from_resources(document, &resources, &mut found, &mut visited);
    }
    found
}

/// Every distinct image in the document, in page order.
pub fn document_image_references(document: &Document) -> Vec<ObjectId> {
    let mut seen = HashSet::new();
    let mut all = Vec::new();
    for page_id in document.get_pages().into_values() {
        for image in image_references(document, page_id) {
            if seen.insert(image) {
                all.push(image);
            }
        }
    }
    all
}

fn collect_from_resources(
    document: &Document,
    resources: &Object,
    found: &mut Vec<ObjectId>,
    visited: &mut HashSet<ObjectId>,
) {
    let Ok(resources) = resolve(document, resources).as_dict() else {
        return;
    };
    let Ok(xobjects) = resources.get(b"XObject") else {
        return;
    };
    let Ok(xobjects) = resolve(document, xobjects).as_dict() else {
        return;
    };

    for (_, value) in xobjects.iter() {
        let Object::Reference(id) = value else {
            continue;
        };
        if !visited.insert(*id) {
            continue;
        }
        let Ok(Object::Stream(stream)) = document.get_object(*id) else {
            continue;
        };
        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => found.push(*id),
            Ok(b"Form") => {
                if let Ok(form_resources) = stream.dict.get(b"Resources") {
                    collect_from_resources(document, form_resources, found, visited);
                }
            }
            _ => {}
        }
    }
}

/// Decode an image XObject into pixels.
///
/// Supports 8-bit raw samples (unfiltered or `FlateDecode`) in gray, RGB,
/// CMYK or ICC-based spaces with 1, 3 or 4 components, and `DCTDecode`
/// JPEG payloads. CMYK samples are converted to RGB.
pub fn decode_image(document: &Document, id: ObjectId) -> Result<DynamicImage> {
    let stream = image_stream(document, id)?;
    let dict = &stream.dict;

    if dict.get(b"ImageMask").and_then(Object::as_bool).unwrap_or(false) {
        return Err(unsupported(id, "stencil masks are not recompressed"));
    }

    let filters = filter_names(document, dict);
    match filters.as_slice() {
        [filter] if filter.as_slice() == b"DCTDecode" => {
            let decoded = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|err| unsupported(id, &format!("JPEG decode failed: {}", err)))?;
            debug!(?id, width = decoded.width(), height = decoded.height(), "JPEG image decoded");
            Ok(decoded)
        }
        [] => decode_raw(document, id, dict, &stream.content),
        [filter] if filter.as_slice() == b"FlateDecode" => {
            let samples = stream
                .decompressed_content()
                .map_err(|err| unsupported(id, &format!("inflate failed: {}", err)))?;
            decode_raw(document, id, dict, &samples)
        }
        other => Err(unsupported(
            id,
            &format!(
                "unsupported filter chain {:?}",
                other
                    .iter()
                    .map(|name| String::from_utf8_lossy(name).into_owned())
                    .collect::<Vec<_>>()
            ),
        )),
    }
}

/// Replace an image's payload and rewrite its metadata to match.
///
/// Width, height, bit depth, colour space and filter are updated together with
/// the content. Entries that only made sense for the old encoding (`Decode`,
/// `DecodeParms`) are removed.
pub fn replace_image(
    document: &mut Document,
    id: ObjectId,
    encoded: Vec<u8>,
    metadata: &ImageMetadata,
) -> Result<()> {
    let stream = match document.get_object_mut(id) {
        Ok(Object::Stream(stream)) => stream,
        _ => return Err(unsupported(id, "object is not a stream")),
    };

    let dict = &mut stream.dict;
    dict.set("Width", Object::Integer(metadata.width as i64));
    dict.set("Height", Object::Integer(metadata.height as i64));
    dict.set("BitsPerComponent", Object::Integer(metadata.bits_per_component as i64));
    dict.set("ColorSpace", Object::Name(metadata.color_space.as_bytes().to_vec()));
    dict.set("Filter", Object::Name(metadata.filter.as_bytes().to_vec()));
    dict.remove(b"DecodeParms");
    dict.remove(b"Decode");
    stream.set_content(encoded);
    stream.allows_compression = false;
    Ok(())
}

fn image_stream(document: &Document, id: ObjectId) -> Result<&Stream> {
    match document.get_object(id) {
        Ok(Object::Stream(stream)) => Ok(stream),
        Ok(_) => Err(unsupported(id, "object is not a stream")),
        Err(err) => Err(unsupported(id, &format!("cannot resolve object: {}", err))),
    }
}

fn filter_names(document: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    let Ok(filter) = dict.get(b"Filter") else {
        return Vec::new();
    };
    match resolve(document, filter) {
        Object::Name(name) => vec![name.clone()],
        Object::Array(items) => items
            .iter()
            .filter_map(|item| resolve(document, item).as_name().ok())
            .map(<[u8]>::to_vec)
            .collect(),
        _ => Vec::new(),
    }
}

fn color_model(document: &Document, id: ObjectId, dict: &Dictionary) -> Result<ColorModel> {
    let space = dict
        .get(b"ColorSpace")
        .map_err(|_| unsupported(id, "missing colour space"))?;
    match resolve(document, space) {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" => Ok(ColorModel::Gray),
            b"DeviceRGB" | b"CalRGB" => Ok(ColorModel::Rgb),
            b"DeviceCMYK" => Ok(ColorModel::Cmyk),
            other => Err(unsupported(
                id,
                &format!("unsupported colour space {}", String::from_utf8_lossy(other)),
            )),
        },
        Object::Array(items) => {
            let family = items
                .first()
                .and_then(|item| resolve(document, item).as_name().ok())
                .unwrap_or_default();
            match family {
                b"ICCBased" => {
                    let components = items
                        .get(1)
                        .and_then(|item| match resolve(document, item) {
                            Object::Stream(profile) => profile.dict.get(b"N").ok(),
                            _ => None,
                        })
                        .and_then(|n| n.as_i64().ok())
                        .ok_or_else(|| unsupported(id, "ICC profile without /N"))?;
                    ColorModel::from_components(components).ok_or_else(|| {
                        unsupported(id, &format!("ICC profile with {} components", components))
                    })
                }
                b"CalGray" => Ok(ColorModel::Gray),
                b"CalRGB" => Ok(ColorModel::Rgb),
                other => Err(unsupported(
                    id,
                    &format!("unsupported colour space {}", String::from_utf8_lossy(other)),
                )),
            }
        }
        _ => Err(unsupported(id, "malformed colour space")),
    }
}

fn decode_raw(
    document: &Document,
    id: ObjectId,
    dict: &Dictionary,
    samples: &[u8],
) -> Result<DynamicImage> {
    let width = dimension(dict, b"Width").ok_or_else(|| unsupported(id, "missing /Width"))?;
    let height = dimension(dict, b"Height").ok_or_else(|| unsupported(id, "missing /Height"))?;
    let bits = dict
        .get(b"BitsPerComponent")
        .and_then(Object::as_i64)
        .unwrap_or(8);
    if bits != 8 {
        return Err(unsupported(id, &format!("{} bits per component", bits)));
    }

    let model = color_model(document, id, dict)?;
    let expected = width as usize * height as usize * model.components();
    if samples.len() < expected {
        return Err(unsupported(
            id,
            &format!("sample data too short ({} < {})", samples.len(), expected),
        ));
    }
    let samples = &samples[..expected];

    let image = match model {
        ColorModel::Gray => GrayImage::from_raw(width, height, samples.to_vec())
            .map(DynamicImage::ImageLuma8),
        ColorModel::Rgb => {
            RgbImage::from_raw(width, height, samples.to_vec()).map(DynamicImage::ImageRgb8)
        }
        ColorModel::Cmyk => RgbImage::from_raw(width, height, cmyk_to_rgb(samples))
            .map(DynamicImage::ImageRgb8),
    };
    let image = image.ok_or_else(|| unsupported(id, "sample buffer does not match dimensions"))?;
    debug!(?id, width, height, ?model, "Raw image decoded");
    Ok(image)
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .and_then(Object::as_i64)
        .ok()
        .filter(|value| *value > 0 && *value <= u32::MAX as i64)
        .map(|value| value as u32)
}

/// Naive CMYK -> RGB conversion without a colour profile.
fn cmyk_to_rgb(samples: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(samples.len() / 4 * 3);
    for pixel in samples.chunks_exact(4) {
        let k = 255 - pixel[3] as u32;
        for channel in &pixel[..3] {
            rgb.push(((255 - *channel as u32) * k / 255) as u8);
        }
    }
    rgb
}

fn unsupported(id: ObjectId, reason: &str) -> PagewerkError {
    PagewerkError::ImageRecompression {
        object: id,
        reason: reason.to_string(),
    }
}
