// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Directory-backed object store.
//
// Layout: `<root>/<kind>/<id>.bin` holds the payload and `<root>/<kind>/<id>.json`
// holds the `TaggedObject` metadata plus checksum.  The sidecar is written
// last, so an object only becomes visible to listings once its payload is
// complete.  All I/O goes through `tokio::fs`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use transient_core::clock::{Clock, SystemClock};
use transient_core::error::{Result, TransientError};
use transient_core::{
    ListRequest, ObjectId, ObjectPage, ResourceKind, StoredObject, TaggedObject, TransformSpec,
    UploadOptions,
};
use tracing::{debug, info, instrument, warn};

use crate::integrity::{hash_bytes, verify_hash};
use crate::dimensions::image_dimensions;
use crate::traits::{ObjectStore, decode_offset_cursor, effective_page_size, offset_cursor};

const PAYLOAD_EXT: &str = "bin";
const SIDECAR_EXT: &str = "json";

/// Metadata persisted next to each payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Sidecar {
    object: TaggedObject,
    checksum: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// Object store rooted at a local directory.
pub struct DirStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl DirStore {
    /// Open (or create) a store rooted at `root`.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_clock(root, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(root: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for kind in ResourceKind::ALL {
            tokio::fs::create_dir_all(root.join(kind.as_str()))
                .await
                .map_err(|err| upstream(&format!("create {}", root.display()), err))?;
        }
        info!(root = %root.display(), "directory store opened");
        Ok(Self { root, clock })
    }

    /// Read back a payload, verifying it against the recorded checksum.
    pub async fn read(&self, id: &ObjectId, kind: ResourceKind) -> Result<Vec<u8>> {
        let sidecar = self.read_sidecar(&self.sidecar_path(id, kind)).await?;
        let data = tokio::fs::read(self.payload_path(id, kind))
            .await
            .map_err(|err| not_found_or_upstream(id, err))?;
        verify_hash(&data, &sidecar.checksum)?;
        Ok(data)
    }

    fn kind_dir(&self, kind: ResourceKind) -> PathBuf {
        self.root.join(kind.as_str())
    }

    fn payload_path(&self, id: &ObjectId, kind: ResourceKind) -> PathBuf {
        self.kind_dir(kind).join(format!("{id}.{PAYLOAD_EXT}"))
    }

    fn sidecar_path(&self, id: &ObjectId, kind: ResourceKind) -> PathBuf {
        self.kind_dir(kind).join(format!("{id}.{SIDECAR_EXT}"))
    }

    async fn read_sidecar(&self, path: &Path) -> Result<Sidecar> {
        let raw = tokio::fs::read(path)
            .await
            .map_err(|err| upstream(&format!("read {}", path.display()), err))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Sorted ids of every sidecar in a kind directory.
    async fn sidecar_ids(&self, kind: ResourceKind) -> Result<Vec<ObjectId>> {
        let dir = self.kind_dir(kind);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|err| upstream(&format!("list {}", dir.display()), err))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| upstream(&format!("list {}", dir.display()), err))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SIDECAR_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(ObjectId::from(stem));
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl ObjectStore for DirStore {
    fn name(&self) -> &str {
        "dir"
    }

    #[instrument(skip_all, fields(bytes_len = data.len(), kind = %options.kind))]
    async fn upload(&self, data: Vec<u8>, options: UploadOptions) -> Result<StoredObject> {
        let id = ObjectId::new();
        let created_at = self.clock.now();
        let (width, height) = match options.kind {
            ResourceKind::Image => image_dimensions(&data).unzip(),
            ResourceKind::Raw => (None, None),
        };
        let checksum = hash_bytes(&data);
        let byte_size = data.len() as u64;

        let payload_path = self.payload_path(&id, options.kind);
        tokio::fs::write(&payload_path, &data)
            .await
            .map_err(|err| upstream(&format!("write {}", payload_path.display()), err))?;

        let sidecar = Sidecar {
            object: TaggedObject {
                id: id.clone(),
                kind: options.kind,
                tags: options.tags,
                created_at,
                byte_size,
            },
            checksum: checksum.clone(),
            width,
            height,
        };
        let sidecar_path = self.sidecar_path(&id, options.kind);
        let json = serde_json::to_vec_pretty(&sidecar)?;
        if let Err(err) = tokio::fs::write(&sidecar_path, json).await {
            // Leave nothing half-written behind.
            let _ = tokio::fs::remove_file(&payload_path).await;
            return Err(upstream(&format!("write {}", sidecar_path.display()), err));
        }

        debug!(%id, byte_size, "object written");
        Ok(StoredObject {
            id,
            kind: options.kind,
            byte_size,
            width,
            height,
            created_at,
            checksum,
        })
    }

    async fn delete(&self, id: &ObjectId, kind: ResourceKind) -> Result<()> {
        // Sidecar first: once it is gone the object is invisible to listings.
        tokio::fs::remove_file(self.sidecar_path(id, kind))
            .await
            .map_err(|err| not_found_or_upstream(id, err))?;

        match tokio::fs::remove_file(self.payload_path(id, kind)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(%id, "payload already missing");
                Ok(())
            }
            Err(err) => Err(upstream(&format!("delete payload {id}"), err)),
        }
    }

    async fn list_by_tag(
        &self,
        tag: &str,
        kind: ResourceKind,
        request: ListRequest,
    ) -> Result<ObjectPage> {
        let offset = decode_offset_cursor(request.cursor.as_deref());
        let page_size = effective_page_size(request.page_size);

        let mut matching = Vec::new();
        for id in self.sidecar_ids(kind).await? {
            let path = self.sidecar_path(&id, kind);
            match self.read_sidecar(&path).await {
                Ok(sidecar) if sidecar.object.has_tag(tag) => matching.push(sidecar.object),
                Ok(_) => {}
                // Deleted between listing and reading, or unreadable.
                Err(err) => warn!(path = %path.display(), %err, "skipping unreadable sidecar"),
            }
        }

        let total = matching.len();
        let items: Vec<TaggedObject> = matching.into_iter().skip(offset).take(page_size).collect();
        let next_cursor = offset_cursor(offset, items.len(), total);
        Ok(ObjectPage { items, next_cursor })
    }

    fn build_url(&self, id: &ObjectId, kind: ResourceKind, spec: &TransformSpec) -> Result<String> {
        let base = format!("file://{}", self.payload_path(id, kind).display());
        if spec.is_empty() {
            Ok(base)
        } else {
            Ok(format!("{base}?{}", spec.to_query()))
        }
    }
}

fn upstream(context: &str, err: std::io::Error) -> TransientError {
    TransientError::UpstreamUnavailable(format!("{context}: {err}"))
}

fn not_found_or_upstream(id: &ObjectId, err: std::io::Error) -> TransientError {
    if err.kind() == std::io::ErrorKind::NotFound {
        TransientError::ObjectNotFound(id.to_string())
    } else {
        upstream(&format!("object {id}"), err)
    }
}
