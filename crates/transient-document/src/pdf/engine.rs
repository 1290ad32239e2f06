// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Structural PDF operations — merge, split, reorder, and metadata inspection.
//
// Every operation loads its inputs into private handles, builds fresh output
// handles by copying pages across, and serialises them.  Input buffers are
// never modified.

use lopdf::{Document, Object};
use serde::Serialize;
use transient_core::error::{Result, TransientError};
use tracing::{debug, info, instrument};

use super::handle::DocumentHandle;
use super::range::{self, PageGroup};

/// A serialised output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfOutput {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl PdfOutput {
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    fn from_handle(mut handle: DocumentHandle) -> Result<Self> {
        let page_count = handle.page_count();
        let bytes = handle.to_bytes()?;
        Ok(Self { bytes, page_count })
    }
}

/// One output of [`split`], tagged with the group expression that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPart {
    pub bytes: Vec<u8>,
    pub source_expression: String,
    pub page_count: usize,
}

impl SplitPart {
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

/// Basic document metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Concatenate documents in the order given, keeping each one's native page
/// order.
#[instrument(skip_all, fields(documents = buffers.len()))]
pub fn merge<B: AsRef<[u8]>>(buffers: &[B]) -> Result<PdfOutput> {
    if buffers.is_empty() {
        return Err(TransientError::NoDocuments);
    }

    let mut output = DocumentHandle::empty();
    for (position, buffer) in buffers.iter().enumerate() {
        let source = DocumentHandle::load(buffer.as_ref()).map_err(|err| match err {
            TransientError::MalformedDocument(detail) => {
                TransientError::MalformedDocument(format!("document #{}: {detail}", position + 1))
            }
            other => other,
        })?;
        debug!(position, pages = source.page_count(), "Appending document");
        output.append_all(&source)?;
    }

    let merged = PdfOutput::from_handle(output)?;
    info!(
        pages = merged.page_count,
        output_bytes = merged.byte_len(),
        "Merge complete"
    );
    Ok(merged)
}

/// Build one document per group expression.
///
/// Each group's pages appear in ascending document order.  Groups selecting
/// nothing are left out of the result; only a call where every group is empty
/// fails.
#[instrument(skip_all, fields(bytes_len = buffer.len(), groups = groups.len()))]
pub fn split<S: AsRef<str>>(buffer: &[u8], groups: &[S]) -> Result<Vec<SplitPart>> {
    let source = DocumentHandle::load(buffer)?;
    let total = source.page_count();
    let groups = groups.iter().map(|group| PageGroup {
        expression: group.as_ref().to_string(),
        pages: range::parse(group.as_ref(), total),
    });
    split_groups(&source, groups)
}

/// Split using a single `;`-separated expression, one output per segment.
pub fn split_expression(buffer: &[u8], expression: &str) -> Result<Vec<SplitPart>> {
    let source = DocumentHandle::load(buffer)?;
    let groups = range::parse_groups(expression, source.page_count());
    split_groups(&source, groups)
}

fn split_groups(
    source: &DocumentHandle,
    groups: impl IntoIterator<Item = PageGroup>,
) -> Result<Vec<SplitPart>> {
    let total = source.page_count();
    let mut parts = Vec::new();
    for group in groups {
        if group.pages.is_empty() {
            debug!(expression = %group.expression, total, "Group selects no pages, skipping");
            continue;
        }

        let mut output = DocumentHandle::empty();
        output.append_pages(source, group.pages.as_slice())?;
        let built = PdfOutput::from_handle(output)?;
        parts.push(SplitPart {
            bytes: built.bytes,
            source_expression: group.expression,
            page_count: built.page_count,
        });
    }

    if parts.is_empty() {
        return Err(TransientError::NoValidPages);
    }

    info!(total, outputs = parts.len(), "Split complete");
    Ok(parts)
}

/// Build one document whose pages follow `order` (1-based) exactly.
///
/// Out-of-range entries are dropped; duplicates and arbitrary permutations
/// are kept as written.
#[instrument(skip_all, fields(bytes_len = buffer.len(), requested = order.len()))]
pub fn reorder(buffer: &[u8], order: &[i64]) -> Result<PdfOutput> {
    let source = DocumentHandle::load(buffer)?;
    let total = source.page_count() as i64;

    let indices: Vec<usize> = order
        .iter()
        .filter(|&&page| page >= 1 && page <= total)
        .map(|&page| (page - 1) as usize)
        .collect();

    if indices.is_empty() {
        return Err(TransientError::InvalidPageOrder);
    }

    let mut output = DocumentHandle::empty();
    output.append_pages(&source, &indices)?;
    let reordered = PdfOutput::from_handle(output)?;
    info!(
        pages = reordered.page_count,
        dropped = order.len() - indices.len(),
        "Reorder complete"
    );
    Ok(reordered)
}

/// Page count plus the /Title and /Author entries of the /Info dictionary.
#[instrument(skip_all, fields(bytes_len = buffer.len()))]
pub fn info(buffer: &[u8]) -> Result<DocumentInfo> {
    let handle = DocumentHandle::load(buffer)?;
    let document = handle.document();
    Ok(DocumentInfo {
        page_count: handle.page_count(),
        title: info_entry(document, b"Title"),
        author: info_entry(document, b"Author"),
    })
}

fn info_entry(document: &Document, key: &[u8]) -> Option<String> {
    let info = match document.trailer.get(b"Info").ok()? {
        Object::Reference(id) => document.get_dictionary(*id).ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };
    let value = match info.get(key).ok()? {
        Object::Reference(id) => document.get_object(*id).ok()?,
        other => other,
    };
    match value {
        Object::String(bytes, _) => {
            let text = decode_text_string(bytes);
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE when it carries a byte-order mark,
/// otherwise treated as single-byte text.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{page_has_font, page_widths, sample_pdf};

    #[test]
    fn merge_concatenates_in_input_order() {
        let first = sample_pdf(2, None);
        let second = sample_pdf(3, None);

        let merged = merge(&[&second, &first]).unwrap();
        assert_eq!(merged.page_count, 5);
        assert_eq!(merged.byte_len(), merged.bytes.len());
        assert_eq!(page_widths(&merged.bytes), vec![101, 102, 103, 101, 102]);
    }

    #[test]
    fn merge_rejects_garbage_with_position() {
        let good = sample_pdf(1, None);
        let err = merge(&[good.as_slice(), b"not a pdf".as_slice()]).unwrap_err();
        match err {
            TransientError::MalformedDocument(detail) => assert!(detail.contains("document #2")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn merge_of_nothing_is_an_error() {
        let empty: [&[u8]; 0] = [];
        assert!(matches!(merge(&empty), Err(TransientError::NoDocuments)));
    }

    #[test]
    fn merge_leaves_inputs_untouched() {
        let input = sample_pdf(2, Some("Original"));
        let snapshot = input.clone();
        merge(&[&input, &input]).unwrap();
        assert_eq!(input, snapshot);
    }

    #[test]
    fn split_pages_follow_document_order() {
        let doc = sample_pdf(6, None);
        let parts = split(&doc, &["5,1-3", "6"]).unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].source_expression, "5,1-3");
        assert_eq!(parts[0].page_count, 4);
        assert_eq!(page_widths(&parts[0].bytes), vec![101, 102, 103, 105]);
        assert_eq!(page_widths(&parts[1].bytes), vec![106]);
    }

    #[test]
    fn copied_pages_carry_inherited_resources() {
        let doc = sample_pdf(3, None);
        let parts = split(&doc, &["2"]).unwrap();
        assert!(page_has_font(&parts[0].bytes, 0));
    }

    #[test]
    fn split_omits_empty_groups() {
        let doc = sample_pdf(4, None);
        let parts = split(&doc, &["99", "2-3", "0"]).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].source_expression, "2-3");
        assert_eq!(parts[0].page_count, 2);
    }

    #[test]
    fn split_with_only_empty_groups_fails() {
        let doc = sample_pdf(5, None);
        assert!(matches!(split(&doc, &["99"]), Err(TransientError::NoValidPages)));
        let none: [&str; 0] = [];
        assert!(matches!(split(&doc, &none), Err(TransientError::NoValidPages)));
    }

    #[test]
    fn split_expression_uses_semicolon_groups() {
        let doc = sample_pdf(4, None);
        let parts = split_expression(&doc, "1-2; ;3;4-1").unwrap();
        let expressions: Vec<&str> = parts.iter().map(|p| p.source_expression.as_str()).collect();
        assert_eq!(expressions, vec!["1-2", "3"]);
    }

    #[test]
    fn full_range_split_then_merge_keeps_page_count() {
        let doc = sample_pdf(3, None);
        let parts = split(&doc, &["1-3"]).unwrap();
        let merged = merge(&[&parts[0].bytes]).unwrap();
        assert_eq!(merged.page_count, 3);
        assert_eq!(info(&merged.bytes).unwrap().page_count, 3);
    }

    #[test]
    fn reorder_keeps_caller_order() {
        let doc = sample_pdf(4, None);
        let reordered = reorder(&doc, &[3, 1, 2, 4]).unwrap();
        assert_eq!(reordered.page_count, 4);
        assert_eq!(page_widths(&reordered.bytes), vec![103, 101, 102, 104]);
    }

    #[test]
    fn reorder_honours_duplicates_and_drops_out_of_range() {
        let doc = sample_pdf(3, None);
        let reordered = reorder(&doc, &[2, 0, 2, 7, -1, 1]).unwrap();
        assert_eq!(page_widths(&reordered.bytes), vec![102, 102, 101]);
    }

    #[test]
    fn reorder_with_no_valid_pages_fails() {
        let doc = sample_pdf(3, None);
        assert!(matches!(reorder(&doc, &[0, 4, 9]), Err(TransientError::InvalidPageOrder)));
        assert!(matches!(reorder(&doc, &[]), Err(TransientError::InvalidPageOrder)));
    }

    #[test]
    fn reorder_rejects_garbage() {
        assert!(matches!(
            reorder(b"%PDF-garbage", &[1]),
            Err(TransientError::MalformedDocument(_))
        ));
    }

    #[test]
    fn info_reads_title_and_author() {
        let doc = sample_pdf(2, Some("Quarterly Report"));
        let details = info(&doc).unwrap();
        assert_eq!(details.page_count, 2);
        assert_eq!(details.title.as_deref(), Some("Quarterly Report"));
        assert_eq!(details.author.as_deref(), Some("Transient Fixtures"));

        let bare = info(&sample_pdf(1, None)).unwrap();
        assert_eq!(bare.title, None);
        assert_eq!(bare.author, None);
    }

    #[test]
    fn utf16_titles_decode() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "Résumé".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text_string(&bytes), "Résumé");
    }
}
