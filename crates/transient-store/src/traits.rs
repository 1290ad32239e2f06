// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The object-store capability.
//
// Every call is a potentially slow round trip to an external provider, so the
// trait is async and implementations must be shareable across tasks.

use async_trait::async_trait;
use transient_core::error::Result;
use transient_core::{ListRequest, ObjectId, ObjectPage, ResourceKind, StoredObject, TransformSpec, UploadOptions};

/// Largest page a provider will return from a single tag listing.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Upload, delete, list-by-tag, and URL generation against an object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short name used in logs (e.g. "memory", "dir").
    fn name(&self) -> &str;

    /// Store `data` with the given tags and kind, returning its descriptor.
    async fn upload(&self, data: Vec<u8>, options: UploadOptions) -> Result<StoredObject>;

    /// Remove an object.  Unknown ids are reported as
    /// `TransientError::ObjectNotFound`.
    async fn delete(&self, id: &ObjectId, kind: ResourceKind) -> Result<()>;

    /// One page of objects of `kind` carrying `tag`, in a stable order.
    async fn list_by_tag(
        &self,
        tag: &str,
        kind: ResourceKind,
        request: ListRequest,
    ) -> Result<ObjectPage>;

    /// Delivery URL for an object with the given transforms applied by the
    /// provider.
    fn build_url(&self, id: &ObjectId, kind: ResourceKind, spec: &TransformSpec) -> Result<String>;
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`.
pub fn effective_page_size(requested: u32) -> usize {
    requested.clamp(1, MAX_PAGE_SIZE) as usize
}

/// Decode an offset cursor as produced by [`offset_cursor`].  Garbage cursors
/// restart from the beginning.
pub fn decode_offset_cursor(cursor: Option<&str>) -> usize {
    cursor.and_then(|c| c.parse().ok()).unwrap_or(0)
}

/// Cursor for the page after `offset + taken` when more items remain.
pub fn offset_cursor(offset: usize, taken: usize, total: usize) -> Option<String> {
    let next = offset + taken;
    (next < total).then(|| next.to_string())
}
