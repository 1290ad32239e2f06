// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process object store.
//
// Holds payloads in a map guarded by a std `Mutex` (every critical section is
// short and never held across an await).  Failure injection hooks let tests
// make individual deletes or whole-kind listings fail, and a configurable
// delete delay makes long-running sweeps observable.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use transient_core::clock::{Clock, SystemClock};
use transient_core::error::{Result, TransientError};
use transient_core::{
    ListRequest, ObjectId, ObjectPage, ResourceKind, StoredObject, TaggedObject, TransformSpec,
    UploadOptions,
};
use tracing::{debug, instrument};

use crate::integrity::hash_bytes;
use crate::dimensions::image_dimensions;
use crate::traits::{ObjectStore, decode_offset_cursor, effective_page_size, offset_cursor};

struct Entry {
    object: TaggedObject,
    data: Vec<u8>,
}

#[derive(Default)]
struct Faults {
    failing_deletes: HashSet<ObjectId>,
    failing_listings: HashSet<ResourceKind>,
    delete_delay: Option<Duration>,
}

/// Object store that keeps everything in memory.
pub struct MemoryStore {
    objects: Mutex<BTreeMap<(ResourceKind, ObjectId), Entry>>,
    faults: Mutex<Faults>,
    deleted: Mutex<Vec<ObjectId>>,
    list_calls: Mutex<usize>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// A store that stamps uploads with time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            faults: Mutex::new(Faults::default()),
            deleted: Mutex::new(Vec::new()),
            list_calls: Mutex::new(0),
            clock,
        }
    }

    /// Seed an object directly, bypassing upload (arbitrary creation time).
    pub fn insert(&self, object: TaggedObject) {
        let data = vec![0; object.byte_size as usize];
        lock(&self.objects).insert((object.kind, object.id.clone()), Entry { object, data });
    }

    /// Make every delete of `id` fail with `UpstreamUnavailable`.
    pub fn fail_delete_of(&self, id: impl Into<ObjectId>) {
        lock(&self.faults).failing_deletes.insert(id.into());
    }

    /// Make every listing of `kind` fail with `UpstreamUnavailable`.
    pub fn fail_listing_of(&self, kind: ResourceKind) {
        lock(&self.faults).failing_listings.insert(kind);
    }

    /// Sleep this long inside every delete.
    pub fn set_delete_delay(&self, delay: Duration) {
        lock(&self.faults).delete_delay = Some(delay);
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        lock(&self.objects).keys().any(|(_, key)| key == id)
    }

    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.objects).is_empty()
    }

    /// Payload of a stored object.
    pub fn data(&self, id: &ObjectId) -> Option<Vec<u8>> {
        lock(&self.objects)
            .iter()
            .find(|((_, key), _)| key == id)
            .map(|(_, entry)| entry.data.clone())
    }

    /// Ids removed by successful deletes, in order.
    pub fn deleted(&self) -> Vec<ObjectId> {
        lock(&self.deleted).clone()
    }

    /// Number of `list_by_tag` calls served (including failed ones).
    pub fn list_calls(&self) -> usize {
        *lock(&self.list_calls)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    #[instrument(skip_all, fields(bytes_len = data.len(), kind = %options.kind))]
    async fn upload(&self, data: Vec<u8>, options: UploadOptions) -> Result<StoredObject> {
        let id = ObjectId::new();
        let created_at = self.clock.now();
        let (width, height) = match options.kind {
            ResourceKind::Image => image_dimensions(&data).unzip(),
            ResourceKind::Raw => (None, None),
        };

        let stored = StoredObject {
            id: id.clone(),
            kind: options.kind,
            byte_size: data.len() as u64,
            width,
            height,
            created_at,
            checksum: hash_bytes(&data),
        };
        let object = TaggedObject {
            id: id.clone(),
            kind: options.kind,
            tags: options.tags,
            created_at,
            byte_size: stored.byte_size,
        };

        lock(&self.objects).insert((options.kind, id), Entry { object, data });
        debug!(id = %stored.id, "object stored in memory");
        Ok(stored)
    }

    async fn delete(&self, id: &ObjectId, kind: ResourceKind) -> Result<()> {
        let (fail, delay) = {
            let faults = lock(&self.faults);
            (faults.failing_deletes.contains(id), faults.delete_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(TransientError::UpstreamUnavailable(format!(
                "injected delete failure for {id}"
            )));
        }

        match lock(&self.objects).remove(&(kind, id.clone())) {
            Some(_) => {
                lock(&self.deleted).push(id.clone());
                Ok(())
            }
            None => Err(TransientError::ObjectNotFound(id.to_string())),
        }
    }

    async fn list_by_tag(
        &self,
        tag: &str,
        kind: ResourceKind,
        request: ListRequest,
    ) -> Result<ObjectPage> {
        *lock(&self.list_calls) += 1;
        if lock(&self.faults).failing_listings.contains(&kind) {
            return Err(TransientError::UpstreamUnavailable(format!(
                "injected listing failure for {kind}"
            )));
        }

        let matching: Vec<TaggedObject> = lock(&self.objects)
            .values()
            .filter(|entry| entry.object.kind == kind && entry.object.has_tag(tag))
            .map(|entry| entry.object.clone())
            .collect();

        let offset = decode_offset_cursor(request.cursor.as_deref());
        let page_size = effective_page_size(request.page_size);
        let items: Vec<TaggedObject> = matching.iter().skip(offset).take(page_size).cloned().collect();
        let next_cursor = offset_cursor(offset, items.len(), matching.len());

        Ok(ObjectPage { items, next_cursor })
    }

    fn build_url(&self, id: &ObjectId, kind: ResourceKind, spec: &TransformSpec) -> Result<String> {
        let base = format!("memory://{kind}/{id}");
        if spec.is_empty() {
            Ok(base)
        } else {
            Ok(format!("{base}?{}", spec.to_query()))
        }
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use transient_core::{ManualClock, TEMPORARY_TAG};

    use super::*;

    fn tagged(id: &str, kind: ResourceKind, created_at: DateTime<Utc>) -> TaggedObject {
        TaggedObject {
            id: ObjectId::from(id),
            kind,
            tags: [TEMPORARY_TAG.to_string()].into_iter().collect(),
            created_at,
            byte_size: 4,
        }
    }

    #[tokio::test]
    async fn upload_records_tags_and_clock_time() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let store = MemoryStore::with_clock(Arc::new(ManualClock::new(start)));

        let stored = store
            .upload(b"%PDF".to_vec(), UploadOptions::temporary(ResourceKind::Raw, start))
            .await
            .unwrap();
        assert_eq!(stored.created_at, start);
        assert_eq!(stored.byte_size, 4);
        assert_eq!(stored.width, None);

        let page = store
            .list_by_tag(TEMPORARY_TAG, ResourceKind::Raw, ListRequest::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].tagged_creation_time(), Some(start));
    }

    #[tokio::test]
    async fn listing_pages_through_matching_objects() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for id in ["a", "b", "c", "d", "e"] {
            store.insert(tagged(id, ResourceKind::Image, now));
        }
        store.insert(tagged("z", ResourceKind::Raw, now));

        let first = store
            .list_by_tag(
                TEMPORARY_TAG,
                ResourceKind::Image,
                ListRequest {
                    cursor: None,
                    page_size: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_cursor.as_deref(), Some("2"));

        let last = store
            .list_by_tag(
                TEMPORARY_TAG,
                ResourceKind::Image,
                ListRequest {
                    cursor: Some("4".into()),
                    page_size: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.next_cursor, None);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_upstream_errors() {
        let store = MemoryStore::new();
        store.insert(tagged("keep", ResourceKind::Raw, Utc::now()));
        store.fail_delete_of("keep");
        store.fail_listing_of(ResourceKind::Image);

        let err = store
            .delete(&ObjectId::from("keep"), ResourceKind::Raw)
            .await
            .unwrap_err();
        assert!(matches!(err, TransientError::UpstreamUnavailable(_)));
        assert!(store.contains(&ObjectId::from("keep")));

        let err = store
            .list_by_tag(TEMPORARY_TAG, ResourceKind::Image, ListRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TransientError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn deleting_unknown_object_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .delete(&ObjectId::from("ghost"), ResourceKind::Image)
            .await
            .unwrap_err();
        assert!(matches!(err, TransientError::ObjectNotFound(_)));
    }

    #[test]
    fn url_carries_transform_query() {
        let store = MemoryStore::new();
        let spec = TransformSpec {
            rotate: Some(180),
            ..Default::default()
        };
        let url = store
            .build_url(&ObjectId::from("abc"), ResourceKind::Image, &spec)
            .unwrap();
        assert_eq!(url, "memory://image/abc?rotate=180");
    }
}
