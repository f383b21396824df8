// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page copying between lopdf documents.
//
// A page is copied together with every object it transitively references.
// References are remapped through a per-copier memo so objects shared by
// several pages (fonts, images) land in the target exactly once.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use pagewerk_core::Rotation;
use pagewerk_core::error::{PagewerkError, Result};
use tracing::{debug, warn};

/// Page attributes that a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Create an empty document with a catalog and an empty page tree.
///
/// Returns the document and the object id of its root `/Pages` node.
pub fn new_document(version: &str) -> (Document, ObjectId) {
    let mut document = Document::with_version(version);
    let pages_id = document.new_object_id();
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => Object::Integer(0),
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    (document, pages_id)
}

/// Rewrite `/Kids` and `/Count` of the root page node to exactly `pages`.
pub fn set_page_tree(document: &mut Document, root_id: ObjectId, pages: &[ObjectId]) -> Result<()> {
    let root = document
        .get_object_mut(root_id)
        .and_then(Object::as_dict_mut)
        .map_err(|err| PagewerkError::Engine(format!("page tree root missing: {}", err)))?;
    let kids: Vec<Object> = pages.iter().map(|id| Object::Reference(*id)).collect();
    root.set("Count", Object::Integer(kids.len() as i64));
    root.set("Kids", Object::Array(kids));
    Ok(())
}

/// Append one page reference to the root page node.
pub fn attach_page(document: &mut Document, root_id: ObjectId, page_id: ObjectId) -> Result<()> {
    let root = document
        .get_object_mut(root_id)
        .and_then(Object::as_dict_mut)
        .map_err(|err| PagewerkError::Engine(format!("page tree root missing: {}", err)))?;

    let has_kids = matches!(root.get(b"Kids"), Ok(Object::Array(_)));
    if has_kids {
        if let Ok(Object::Array(kids)) = root.get_mut(b"Kids") {
            kids.push(Object::Reference(page_id));
        }
    } else {
        root.set("Kids", vec![Object::Reference(page_id)]);
    }

    let count = match root.get(b"Kids") {
        Ok(Object::Array(kids)) => kids.len(),
        _ => 0,
    };
    root.set("Count", Object::Integer(count as i64));
    Ok(())
}

/// Look up `key` on a page, walking up `/Parent` links when the page itself
/// does not carry it.
pub fn inherited_attribute(document: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    // Bounded walk; malformed files can contain parent cycles.
    for _ in 0..64 {
        let node = document.get_dictionary(current).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        current = node.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Rotation stored on the page (or inherited), normalised.
///
/// Values that are not quarter turns are treated as unrotated.
pub fn page_rotation(document: &Document, page_id: ObjectId) -> Rotation {
    inherited_attribute(document, page_id, b"Rotate")
        .and_then(|value| resolve(document, &value).as_i64().ok())
        .and_then(Rotation::from_degrees)
        .unwrap_or(Rotation::NONE)
}

/// Page size in default user-space units, taken from the (inherited) `/MediaBox`.
pub fn media_box(document: &Document, page_id: ObjectId) -> Option<[f64; 4]> {
    let value = inherited_attribute(document, page_id, b"MediaBox")?;
    let array = resolve(document, &value).as_array().ok()?.clone();
    if array.len() != 4 {
        return None;
    }
    let mut rect = [0.0; 4];
    for (slot, item) in rect.iter_mut().zip(array.iter()) {
        *slot = number(resolve(document, item))?;
    }
    Some(rect)
}

/// Follow a single level of indirection.
pub fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        other => other,
    }
}

pub fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(*value as f64),
        _ => None,
    }
}

/// Copy a single page into a fresh one-page document and serialise it.
///
/// `extra` is added to the page's own rotation. Used to hand individual pages
/// to a renderer.
pub fn extract_page(
    source: &Document,
    page_id: ObjectId,
    extra: Rotation,
    version: &str,
) -> Result<Vec<u8>> {
    let (mut target, root_id) = new_document(version);
    let mut copier = PageCopier::new(source);
    let new_page = copier.copy_page(&mut target, root_id, page_id, extra)?;
    attach_page(&mut target, root_id, new_page)?;

    let mut output = Vec::new();
    target.save_to(&mut output).map_err(|err| {
        PagewerkError::Engine(format!("failed to serialise extracted page: {}", err))
    })?;
    Ok(output)
}

/// Copies pages out of one source document, remembering what it already copied.
pub struct PageCopier<'a> {
    source: &'a Document,
    /// Source object id -> target object id.
    memo: HashMap<ObjectId, ObjectId>,
}

impl<'a> PageCopier<'a> {
    pub fn new(source: &'a Document) -> Self {
        Self {
            source,
            memo: HashMap::new(),
        }
    }

    /// Copy `page_id` into `target` and return the new page's object id.
    ///
    /// The copy's `/Parent` is `target_root`, but it is not attached to the
    /// page tree; call [`attach_page`] or [`set_page_tree`] for that. Inherited
    /// attributes are materialised on the copy and `extra` is added to its
    /// `/Rotate`.
    pub fn copy_page(
        &mut self,
        target: &mut Document,
        target_root: ObjectId,
        page_id: ObjectId,
        extra: Rotation,
    ) -> Result<ObjectId> {
        let source = self.source;
        let page = source.get_dictionary(page_id).map_err(|err| {
            PagewerkError::Engine(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        let mut merged = page.clone();
        for key in INHERITABLE_KEYS {
            if !merged.has(key)
                && let Some(value) = inherited_attribute(source, page_id, key)
            {
                merged.set(key.to_vec(), value);
            }
        }
        merged.remove(b"Parent");

        let rotation = page_rotation(source, page_id)
            .rotated_by(extra.degrees() as i64)
            .unwrap_or(Rotation::NONE);
        merged.set("Rotate", Object::Integer(rotation.degrees() as i64));

        // Register first so annotations pointing back at the page resolve to the copy.
        let new_id = target.new_object_id();
        self.memo.insert(page_id, new_id);

        let mut cloned = self.clone_dictionary(target, &merged);
        cloned.set("Parent", Object::Reference(target_root));
        target.objects.insert(new_id, Object::Dictionary(cloned));

        debug!(?page_id, ?new_id, rotation = rotation.degrees(), "Page copied");
        Ok(new_id)
    }

    fn clone_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut new_dict = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" && self.points_into_page_tree(value) {
                continue;
            }
            let cloned_value = self.clone_object(target, value);
            new_dict.set(key.clone(), cloned_value);
        }
        new_dict
    }

    fn clone_object(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Dictionary(dict) => Object::Dictionary(self.clone_dictionary(target, dict)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.clone_object(target, item))
                    .collect(),
            ),
            Object::Stream(stream) => {
                let mut cloned = stream.clone();
                cloned.dict = self.clone_dictionary(target, &stream.dict);
                Object::Stream(cloned)
            }
            Object::Reference(id) => self.clone_reference(target, *id),
            other => other.clone(),
        }
    }

    fn clone_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(mapped) = self.memo.get(&id) {
            return Object::Reference(*mapped);
        }

        let source = self.source;
        let referenced = match source.get_object(id) {
            Ok(object) => object,
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, using Null");
                return Object::Null;
            }
        };

        // Pages that are not part of this copy (link destinations and the like)
        // must not drag their whole content along.
        if is_page_tree_node(referenced) {
            debug!(?id, "Dropping reference to uncopied page");
            return Object::Null;
        }

        let new_id = target.new_object_id();
        self.memo.insert(id, new_id);
        let cloned = self.clone_object(target, referenced);
        target.objects.insert(new_id, cloned);
        Object::Reference(new_id)
    }

    fn points_into_page_tree(&self, value: &Object) -> bool {
        match value {
            Object::Reference(id) => self.source.get_object(*id).is_ok_and(is_page_tree_node),
            _ => false,
        }
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        _ => return false,
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Page") | Ok(b"Pages")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Stream;

    /// Two pages under an intermediate node that carries MediaBox and Rotate,
    /// both sharing one font.
    fn nested_document() -> (Document, Vec<ObjectId>) {
        let mut doc = Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let root_id = doc.new_object_id();
        let inner_id = doc.new_object_id();
        let mut pages = Vec::new();
        for _ in 0..2 {
            let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET".to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => inner_id,
                "Contents" => content_id,
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            });
            pages.push(page_id);
        }
        doc.objects.insert(
            inner_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Parent" => root_id,
                "Kids" => pages.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                "Count" => Object::Integer(2),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(200),
                    Object::Integer(100),
                ],
                "Rotate" => Object::Integer(90),
            }),
        );
        doc.objects.insert(
            root_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(inner_id)],
                "Count" => Object::Integer(2),
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => root_id });
        doc.trailer.set("Root", catalog_id);
        (doc, pages)
    }

    #[test]
    fn new_document_has_empty_page_tree() {
        let (doc, _) = new_document("1.5");
        assert!(doc.catalog().is_ok());
        assert_eq!(doc.get_pages().len(), 0);
    }

    #[test]
    fn inherited_attributes_are_materialised() {
        let (source, pages) = nested_document();
        let (mut target, root) = new_document("1.5");
        let mut copier = PageCopier::new(&source);
        let copy = copier
            .copy_page(&mut target, root, pages[0], Rotation::NONE)
            .unwrap();
        attach_page(&mut target, root, copy).unwrap();

        let page = target.get_dictionary(copy).unwrap();
        assert!(page.has(b"MediaBox"));
        assert_eq!(page.get(b"Rotate").unwrap().as_i64().unwrap(), 90);
        assert_eq!(media_box(&target, copy), Some([0.0, 0.0, 200.0, 100.0]));
        assert_eq!(target.get_pages().len(), 1);
    }

    #[test]
    fn extra_rotation_adds_to_stored_rotation() {
        let (source, pages) = nested_document();
        let (mut target, root) = new_document("1.5");
        let mut copier = PageCopier::new(&source);
        let copy = copier
            .copy_page(&mut target, root, pages[1], Rotation::from_degrees(270).unwrap())
            .unwrap();
        assert_eq!(page_rotation(&target, copy), Rotation::NONE);
    }

    #[test]
    fn shared_objects_are_copied_once() {
        let (source, pages) = nested_document();
        let (mut target, root) = new_document("1.5");
        let mut copier = PageCopier::new(&source);
        for page in &pages {
            let copy = copier.copy_page(&mut target, root, *page, Rotation::NONE).unwrap();
            attach_page(&mut target, root, copy).unwrap();
        }
        let fonts = target
            .objects
            .values()
            .filter(|object| {
                object
                    .as_dict()
                    .and_then(|dict| dict.get(b"Type"))
                    .and_then(Object::as_name)
                    .is_ok_and(|name| name == b"Font")
            })
            .count();
        assert_eq!(fonts, 1);
    }

    #[test]
    fn extracted_page_loads_as_single_page_document() {
        let (source, pages) = nested_document();
        let bytes = extract_page(&source, pages[0], Rotation::NONE, "1.5").unwrap();
        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 1);
    }
}
