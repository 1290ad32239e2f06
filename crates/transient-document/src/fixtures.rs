// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small synthetic PDFs for tests and benchmarks.
//
// Page N (1-based) of a sample document has a MediaBox width of 100 + N
// points, so page order survives any copy and can be read back with
// `page_widths`.

use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

/// Build a PDF with `page_count` pages.  With a title, the /Info dictionary
/// also carries `Author: Transient Fixtures`.
pub fn sample_pdf(page_count: usize, title: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    let font_id = doc.add_object(Object::Dictionary(font));

    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut kids = Vec::with_capacity(page_count);
    for number in 1..=page_count {
        let text = format!("BT /F1 12 Tf 20 100 Td (Page {number}) Tj ET");
        let content_id = doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            text.into_bytes(),
        )));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(100 + number as i64),
                Object::Integer(200),
            ]),
        );
        page.set("Contents", Object::Reference(content_id));
        kids.push(Object::Reference(doc.add_object(Object::Dictionary(page))));
    }

    // Resources live on the tree root so copies must resolve inheritance.
    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(page_count as i64));
    pages.set("Kids", Object::Array(kids));
    pages.set("Resources", Object::Dictionary(resources));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    if let Some(title) = title {
        let mut info = Dictionary::new();
        info.set(
            "Title",
            Object::String(title.as_bytes().to_vec(), StringFormat::Literal),
        );
        info.set(
            "Author",
            Object::String(b"Transient Fixtures".to_vec(), StringFormat::Literal),
        );
        let info_id = doc.add_object(Object::Dictionary(info));
        doc.trailer.set("Info", Object::Reference(info_id));
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .expect("serialising an in-memory fixture cannot fail");
    output
}

/// MediaBox width of every page, in document order.  Pages without a
/// readable integer width report 0.
pub fn page_widths(data: &[u8]) -> Vec<i64> {
    let Ok(doc) = Document::load_mem(data) else {
        return Vec::new();
    };
    doc.get_pages()
        .values()
        .map(|&page_id| {
            doc.get_dictionary(page_id)
                .ok()
                .and_then(|page| page.get(b"MediaBox").ok())
                .and_then(|media_box| media_box.as_array().ok())
                .and_then(|values| values.get(2))
                .and_then(|width| width.as_i64().ok())
                .unwrap_or(0)
        })
        .collect()
}

/// Whether a copied page still resolves its /F1 font through its own
/// /Resources entry.
pub fn page_has_font(data: &[u8], page_index: usize) -> bool {
    let Ok(doc) = Document::load_mem(data) else {
        return false;
    };
    let Some(&page_id) = doc.get_pages().values().nth(page_index) else {
        return false;
    };
    doc.get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Resources").ok())
        .and_then(|resources| match resources {
            Object::Reference(id) => doc.get_dictionary(*id).ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        })
        .and_then(|resources| resources.get(b"Font").ok())
        .and_then(|fonts| fonts.as_dict().ok())
        .is_some_and(|fonts| fonts.has(b"F1"))
}
