// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document handles — the load / copy-pages / serialise capability the
// structural engine is built on, implemented over `lopdf`.
//
// A handle owns its object graph outright.  Pages enter a handle only by being
// deep-copied from another handle, so two handles never share storage.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use transient_core::error::{Result, TransientError};
use tracing::{debug, instrument, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic /Parent chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// An owned, mutable PDF document.
pub struct DocumentHandle {
    document: Document,
    /// Page objects in document order.
    pages: Vec<ObjectId>,
    /// Root /Pages node that copied pages are attached to.  Only set for
    /// handles built with [`DocumentHandle::empty`].
    pages_root: Option<ObjectId>,
}

impl DocumentHandle {
    /// Parse `data` into a handle.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn load(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            TransientError::MalformedDocument(format!("failed to load PDF from memory: {err}"))
        })?;

        // A document without a catalog or page tree is not usable even if the
        // object syntax parsed.
        document.catalog().map_err(|err| {
            TransientError::MalformedDocument(format!("document has no catalog: {err}"))
        })?;

        let pages: Vec<ObjectId> = document.get_pages().into_values().collect();
        debug!(pages = pages.len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            pages,
            pages_root: None,
        })
    }

    /// A new document with an empty page tree.
    pub fn empty() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_root = document.new_object_id();

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Kids", Object::Array(Vec::new()));
        pages_dict.set("Count", Object::Integer(0));
        document
            .objects
            .insert(pages_root, Object::Dictionary(pages_dict));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_root));
        let catalog_id = document.add_object(Object::Dictionary(catalog));
        document.trailer.set("Root", Object::Reference(catalog_id));

        Self {
            document,
            pages: Vec::new(),
            pages_root: Some(pages_root),
        }
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The underlying document, for read-only inspection.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Append every page of `source`, in its native order.
    pub fn append_all(&mut self, source: &DocumentHandle) -> Result<()> {
        let all: Vec<usize> = (0..source.page_count()).collect();
        self.append_pages(source, &all)
    }

    /// Append the pages of `source` at the given zero-based indices, in
    /// exactly the order given.  Repeated indices produce repeated pages.
    pub fn append_pages(&mut self, source: &DocumentHandle, indices: &[usize]) -> Result<()> {
        let mut copier = ObjectCopier::new(&source.document);

        for &index in indices {
            let page_id = *source.pages.get(index).ok_or_else(|| {
                TransientError::MalformedDocument(format!(
                    "page index {} out of range (document has {} pages)",
                    index,
                    source.page_count()
                ))
            })?;
            let copied = copier.copy_page(&mut self.document, page_id)?;
            self.attach_page(copied)?;
        }

        Ok(())
    }

    /// Serialise the document.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            TransientError::MalformedDocument(format!("failed to serialise PDF: {err}"))
        })?;
        Ok(output)
    }

    /// Add a copied page object to the end of this handle's page tree.
    fn attach_page(&mut self, page_id: ObjectId) -> Result<()> {
        let pages_root = self.pages_root.ok_or_else(|| {
            TransientError::MalformedDocument(
                "pages can only be appended to a handle created empty".to_string(),
            )
        })?;

        match self.document.get_object_mut(pages_root) {
            Ok(Object::Dictionary(pages_dict)) => {
                if let Ok(Object::Array(kids)) = pages_dict.get_mut(b"Kids") {
                    kids.push(Object::Reference(page_id));
                }
                pages_dict.set("Count", Object::Integer(self.pages.len() as i64 + 1));
            }
            _ => {
                return Err(TransientError::MalformedDocument(
                    "page tree root is not a dictionary".to_string(),
                ));
            }
        }

        if let Ok(Object::Dictionary(page_dict)) = self.document.get_object_mut(page_id) {
            page_dict.set("Parent", Object::Reference(pages_root));
        }

        self.pages.push(page_id);
        Ok(())
    }
}

/// Copies objects out of one source document into a target, remembering what
/// it has already copied so shared resources (fonts, images) are copied once
/// and reference cycles terminate.
struct ObjectCopier<'a> {
    source: &'a Document,
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document) -> Self {
        Self {
            source,
            copied: HashMap::new(),
        }
    }

    /// Copy one page object, flattening inherited attributes onto it.  Every
    /// call produces a fresh page object, even for a page copied before.
    fn copy_page(&mut self, target: &mut Document, page_id: ObjectId) -> Result<ObjectId> {
        let mut page = self
            .source
            .get_dictionary(page_id)
            .map_err(|err| {
                TransientError::MalformedDocument(format!(
                    "cannot read page object {page_id:?}: {err}"
                ))
            })?
            .clone();

        for key in INHERITABLE_KEYS {
            if !page.has(key)
                && let Some(value) = self.inherited_attribute(page_id, key)
            {
                page.set(key.to_vec(), value);
            }
        }

        // Annotations belong to exactly one page, so a page copied twice
        // gets its own annotation objects each time.
        for annot_id in annotation_ids(self.source, &page) {
            self.copied.remove(&annot_id);
        }

        let new_id = target.new_object_id();
        // Back-references to the page (e.g. an annotation's /P) resolve to
        // this copy.
        self.copied.insert(page_id, new_id);
        let cloned = self.copy_dictionary(target, &page)?;
        target.objects.insert(new_id, Object::Dictionary(cloned));
        Ok(new_id)
    }

    /// Walk the /Parent chain looking for `key`.
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<Object> {
        let mut current = self.source.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
            let parent = self.source.get_dictionary(parent_id).ok()?;
            if let Ok(value) = parent.get(key) {
                return Some(value.clone());
            }
            current = parent;
        }
        warn!(?page_id, "page tree deeper than expected, giving up on inheritance");
        None
    }

    fn copy_object(&mut self, target: &mut Document, object: &Object) -> Result<Object> {
        match object {
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.copy_dictionary(target, dict)?)),
            Object::Array(items) => {
                let mut copied = Vec::with_capacity(items.len());
                for item in items {
                    copied.push(self.copy_object(target, item)?);
                }
                Ok(Object::Array(copied))
            }
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(target, &stream.dict)?;
                let mut copied = Stream::new(dict, stream.content.clone());
                copied.allows_compression = stream.allows_compression;
                Ok(Object::Stream(copied))
            }
            Object::Reference(id) => Ok(self.copy_reference(target, *id)),
            other => Ok(other.clone()),
        }
    }

    fn copy_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Result<Dictionary> {
        let mut copied = Dictionary::new();
        for (key, value) in dict.iter() {
            // /Parent is re-pointed by the target handle; following it would
            // drag the whole source page tree along.
            if key == b"Parent" {
                continue;
            }
            copied.set(key.clone(), self.copy_object(target, value)?);
        }
        Ok(copied)
    }

    fn copy_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(existing) = self.copied.get(&id) {
            return Object::Reference(*existing);
        }

        let referenced = match self.source.get_object(id) {
            Ok(object) => object,
            Err(err) => {
                warn!(ref_id = ?id, %err, "Cannot resolve reference, using Null");
                return Object::Null;
            }
        };

        // Reserve the id before descending so cycles point back here.
        let new_id = target.new_object_id();
        self.copied.insert(id, new_id);
        match self.copy_object(target, referenced) {
            Ok(object) => {
                target.objects.insert(new_id, object);
                Object::Reference(new_id)
            }
            Err(err) => {
                warn!(ref_id = ?id, %err, "Cannot copy referenced object, using Null");
                target.objects.insert(new_id, Object::Null);
                Object::Reference(new_id)
            }
        }
    }
}

/// Indirect objects making up a page's /Annots entry: the array itself when
/// it is indirect, plus every annotation it references.
fn annotation_ids(source: &Document, page: &Dictionary) -> Vec<ObjectId> {
    let mut ids = Vec::new();
    let annots = match page.get(b"Annots") {
        Ok(Object::Reference(id)) => {
            ids.push(*id);
            source.get_object(*id).ok()
        }
        Ok(object) => Some(object),
        Err(_) => None,
    };
    if let Some(Object::Array(items)) = annots {
        ids.extend(items.iter().filter_map(|item| item.as_reference().ok()));
    }
    ids
}
