// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retention scanner — walks a tag listing page by page and classifies objects
// by age.
//
// The listing is exposed as a lazy stream: the next provider page is fetched
// only when the consumer has drained the current one, so memory stays bounded
// by one page regardless of how many objects carry the tag.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use transient_core::clock::Clock;
use transient_core::config::{DEFAULT_LIST_PAGE_SIZE, DEFAULT_MAX_LIST_PAGES, RetentionWindow};
use transient_core::error::Result;
use transient_core::{ListRequest, ResourceKind, TaggedObject};
use tracing::{debug, warn};
use transient_store::ObjectStore;

/// Pagination limits for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    /// Items requested per provider page (the provider caps this at 500).
    pub page_size: u32,
    /// Stop after this many pages even if the provider has more.
    pub max_pages: u32,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_LIST_PAGE_SIZE,
            max_pages: DEFAULT_MAX_LIST_PAGES,
        }
    }
}

/// Where the listing is between pages.
enum Cursor {
    Start,
    Next(String),
    Done,
}

struct ListState {
    store: Arc<dyn ObjectStore>,
    tag: String,
    kind: ResourceKind,
    limits: ScanLimits,
    buffered: VecDeque<TaggedObject>,
    cursor: Cursor,
    pages_fetched: u32,
}

/// Lists tagged objects and decides which are expired.
#[derive(Clone)]
pub struct RetentionScanner {
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    limits: ScanLimits,
}

impl RetentionScanner {
    pub fn new(store: Arc<dyn ObjectStore>, clock: Arc<dyn Clock>, limits: ScanLimits) -> Self {
        Self {
            store,
            clock,
            limits,
        }
    }

    /// Every object of `kind` carrying `tag`, fetched lazily across pages.
    ///
    /// Each call starts a fresh listing.  A provider error ends the stream
    /// with that error as its last item.
    pub fn list_tagged(&self, tag: &str, kind: ResourceKind) -> BoxStream<'static, Result<TaggedObject>> {
        let state = ListState {
            store: Arc::clone(&self.store),
            tag: tag.to_string(),
            kind,
            limits: self.limits,
            buffered: VecDeque::new(),
            cursor: Cursor::Start,
            pages_fetched: 0,
        };

        stream::unfold(state, |mut state| async move {
            loop {
                if let Some(object) = state.buffered.pop_front() {
                    return Some((Ok(object), state));
                }

                let cursor = match std::mem::replace(&mut state.cursor, Cursor::Done) {
                    Cursor::Done => return None,
                    Cursor::Start => None,
                    Cursor::Next(token) => Some(token),
                };

                if state.pages_fetched >= state.limits.max_pages {
                    warn!(
                        kind = %state.kind,
                        pages = state.pages_fetched,
                        "listing page limit reached, remaining objects wait for the next sweep"
                    );
                    return None;
                }

                let request = ListRequest {
                    cursor,
                    page_size: state.limits.page_size,
                };
                let listed = state.store.list_by_tag(&state.tag, state.kind, request).await;
                match listed {
                    Ok(page) => {
                        state.pages_fetched += 1;
                        debug!(
                            kind = %state.kind,
                            page = state.pages_fetched,
                            items = page.items.len(),
                            "fetched listing page"
                        );
                        state.buffered.extend(page.items);
                        state.cursor = match page.next_cursor {
                            Some(token) => Cursor::Next(token),
                            None => Cursor::Done,
                        };
                    }
                    // Cursor is already Done, so the stream ends after this.
                    Err(err) => return Some((Err(err), state)),
                }
            }
        })
        .boxed()
    }

    /// Whether `object` is older than the window's TTL, measured against the
    /// clock at the moment of the call.
    pub fn is_expired(&self, object: &TaggedObject, window: &RetentionWindow) -> bool {
        is_expired_at(object, window, self.clock.now())
    }
}

/// Age check against an explicit `now`.
pub fn is_expired_at(
    object: &TaggedObject,
    window: &RetentionWindow,
    now: chrono::DateTime<chrono::Utc>,
) -> bool {
    let age = now.signed_duration_since(object.created_at);
    match chrono::Duration::from_std(window.ttl()) {
        Ok(ttl) => age > ttl,
        // A TTL too large to represent never expires anything.
        Err(_) => false,
    }
}
