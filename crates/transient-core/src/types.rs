// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for temporary objects and their storage descriptors.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag carried by every object that the retention sweeper owns.
pub const TEMPORARY_TAG: &str = "temporary";

/// Prefix of the tag that records an object's creation time in unix seconds.
pub const CREATED_TAG_PREFIX: &str = "created:";

/// Unique identifier for a stored object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub String);

impl ObjectId {
    /// Fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Storage class of an object.  The sweeper handles each independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Raster images the provider can transform.
    Image,
    /// Opaque bytes (PDFs and anything else).
    Raw,
}

impl ResourceKind {
    /// Every kind, in sweep order.
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Image, ResourceKind::Raw];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Raw => "raw",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported upload document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Pdf,
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl DocumentType {
    /// Which store resource kind this type is uploaded as.
    pub fn resource_kind(&self) -> ResourceKind {
        match self {
            Self::Pdf => ResourceKind::Raw,
            _ => ResourceKind::Image,
        }
    }
}

/// Build the creation-time tag for `at`.
pub fn created_tag(at: DateTime<Utc>) -> String {
    format!("{CREATED_TAG_PREFIX}{}", at.timestamp())
}

/// Parse a creation-time tag back into a timestamp.
pub fn parse_created_tag(tag: &str) -> Option<DateTime<Utc>> {
    let secs = tag.strip_prefix(CREATED_TAG_PREFIX)?.parse::<i64>().ok()?;
    DateTime::from_timestamp(secs, 0)
}

/// Options for an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOptions {
    pub kind: ResourceKind,
    pub tags: BTreeSet<String>,
}

impl UploadOptions {
    /// Options for a temporary upload: carries the temporary marker and a
    /// creation-time tag for `now`.
    pub fn temporary(kind: ResourceKind, now: DateTime<Utc>) -> Self {
        let tags = [TEMPORARY_TAG.to_string(), created_tag(now)]
            .into_iter()
            .collect();
        Self { kind, tags }
    }
}

/// Descriptor returned by the store after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub id: ObjectId,
    pub kind: ResourceKind,
    pub byte_size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub created_at: DateTime<Utc>,
    /// SHA-256 of the payload, lowercase hex.
    pub checksum: String,
}

/// An object as seen through a tag listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedObject {
    pub id: ObjectId,
    pub kind: ResourceKind,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub byte_size: u64,
}

impl TaggedObject {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Creation time as recorded in the `created:` tag, if present.
    pub fn tagged_creation_time(&self) -> Option<DateTime<Utc>> {
        self.tags.iter().find_map(|tag| parse_created_tag(tag))
    }
}

/// One page of a tag listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Opaque continuation token from the previous page.
    pub cursor: Option<String>,
    pub page_size: u32,
}

/// One page of a tag listing response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub items: Vec<TaggedObject>,
    /// Present when more items remain.
    pub next_cursor: Option<String>,
}
