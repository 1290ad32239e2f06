// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — wires the document engine, the object store, and
// the retention sweeper together behind one cloneable facade.
//
// lopdf work is synchronous and CPU-bound, so every document operation runs
// on the blocking pool and is bounded by the configured request timeout.
// Nothing is uploaded until the document work has returned, so a request
// that times out never leaves an object behind.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use transient_core::clock::{Clock, SystemClock};
use transient_core::error::{Result, TransientError};
use transient_core::{AppConfig, ObjectId, ResourceKind, StoredObject, TransformSpec, UploadOptions};
use transient_document::pdf;
use transient_document::{DocumentInfo, PdfOutput, SplitPart};
use transient_retention::{RetentionSweeper, ScanLimits, SweepReport, SweepScheduler};
use transient_store::{DirStore, ObjectStore};
use tracing::{info, instrument, warn};

/// Shared application services.
///
/// All fields are Arc-wrapped so the struct can be cloned into spawned tasks.
#[derive(Clone)]
pub struct TransientService {
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    sweeper: Arc<RetentionSweeper>,
    request_timeout: Duration,
}

impl TransientService {
    /// Build the facade over an arbitrary store and clock.
    pub fn new(store: Arc<dyn ObjectStore>, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        let limits = ScanLimits {
            page_size: config.list_page_size(),
            max_pages: config.max_list_pages(),
        };
        let sweeper = RetentionSweeper::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.retention_window(),
            limits,
        );
        Self {
            store,
            clock,
            sweeper: Arc::new(sweeper),
            request_timeout: config.request_timeout(),
        }
    }

    /// Open the directory store at `store_root` and build the facade on it.
    pub async fn init(config: &AppConfig, store_root: &Path) -> Result<Self> {
        info!(path = %store_root.display(), "initialising services");
        let store = DirStore::open(store_root).await?;
        let window = config.retention_window();
        info!(
            ttl_secs = window.ttl().as_secs(),
            interval_secs = window.interval().as_secs(),
            "retention window configured"
        );
        Ok(Self::new(Arc::new(store), Arc::new(SystemClock), config))
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// A scheduler that drives this service's sweeper.
    pub fn scheduler(&self) -> SweepScheduler {
        SweepScheduler::new(Arc::clone(&self.sweeper))
    }

    // -- Documents -----------------------------------------------------------

    /// Concatenate documents in the order given.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub async fn merge_documents(&self, documents: Vec<Vec<u8>>) -> Result<PdfOutput> {
        bounded(self.request_timeout, "merge", move || pdf::merge(&documents)).await
    }

    /// One output document per page-range group.
    #[instrument(skip_all, fields(bytes_len = document.len(), groups = groups.len()))]
    pub async fn split_document(
        &self,
        document: Vec<u8>,
        groups: Vec<String>,
    ) -> Result<Vec<SplitPart>> {
        bounded(self.request_timeout, "split", move || pdf::split(&document, &groups)).await
    }

    /// Pages rearranged into `order` (1-based, duplicates kept).
    #[instrument(skip_all, fields(bytes_len = document.len(), requested = order.len()))]
    pub async fn reorder_document(&self, document: Vec<u8>, order: Vec<i64>) -> Result<PdfOutput> {
        bounded(self.request_timeout, "reorder", move || pdf::reorder(&document, &order)).await
    }

    pub async fn document_info(&self, document: Vec<u8>) -> Result<DocumentInfo> {
        bounded(self.request_timeout, "info", move || pdf::info(&document)).await
    }

    // -- Object store --------------------------------------------------------

    /// Upload a finished result as a temporary object, stamped with the
    /// current time so the retention sweeper can reclaim it later.
    #[instrument(skip_all, fields(bytes_len = data.len(), %kind))]
    pub async fn upload_temporary(&self, data: Vec<u8>, kind: ResourceKind) -> Result<StoredObject> {
        let options = UploadOptions::temporary(kind, self.clock.now());
        let stored = self.store.upload(data, options).await?;
        info!(id = %stored.id, byte_size = stored.byte_size, "temporary object stored");
        Ok(stored)
    }

    /// Delivery URL for a stored object with `spec` applied by the provider.
    pub fn transform_url(
        &self,
        id: &ObjectId,
        kind: ResourceKind,
        spec: &TransformSpec,
    ) -> Result<String> {
        self.store.build_url(id, kind, spec)
    }

    // -- Retention -----------------------------------------------------------

    /// Run one sweep now.  `None` means a sweep was already running and this
    /// trigger was dropped.
    pub async fn run_retention_sweep(&self) -> Option<SweepReport> {
        let report = self.sweeper.try_sweep().await;
        if report.is_none() {
            warn!("manual sweep skipped, another sweep is in progress");
        }
        report
    }
}

/// Run `work` on the blocking pool, giving up after `limit`.
///
/// On timeout the blocking task keeps running to completion in the
/// background, but its result is discarded.
async fn bounded<T, F>(limit: Duration, operation: &'static str, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(TransientError::Task(format!("{operation}: {join_err}"))),
        Err(_) => {
            warn!(operation, limit_secs = limit.as_secs_f64(), "document request timed out");
            Err(TransientError::Timeout(limit))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use transient_core::{ErrorKind, ManualClock, TEMPORARY_TAG, TaggedObject};
    use transient_document::fixtures::{page_widths, sample_pdf};
    use transient_store::MemoryStore;

    use super::*;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn service_over(store: Arc<MemoryStore>, clock: Arc<ManualClock>) -> TransientService {
        TransientService::new(store, clock, &AppConfig::default())
    }

    #[tokio::test]
    async fn split_then_merge_round_trips_pages() {
        let clock = Arc::new(ManualClock::new(start()));
        let svc = service_over(Arc::new(MemoryStore::new()), clock);

        let parts = svc
            .split_document(sample_pdf(3, None), vec!["1-3".into()])
            .await
            .unwrap();
        assert_eq!(parts.len(), 1);

        let merged = svc
            .merge_documents(parts.into_iter().map(|p| p.bytes).collect())
            .await
            .unwrap();
        assert_eq!(merged.page_count, 3);
        assert_eq!(page_widths(&merged.bytes), vec![101, 102, 103]);
    }

    #[tokio::test]
    async fn reorder_and_info_run_through_the_facade() {
        let svc = service_over(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(start())),
        );

        let reordered = svc
            .reorder_document(sample_pdf(4, None), vec![3, 1, 2, 4])
            .await
            .unwrap();
        assert_eq!(page_widths(&reordered.bytes), vec![103, 101, 102, 104]);

        let info = svc.document_info(sample_pdf(2, Some("Quarterly"))).await.unwrap();
        assert_eq!(info.page_count, 2);
        assert_eq!(info.title.as_deref(), Some("Quarterly"));
    }

    #[tokio::test]
    async fn document_errors_surface_unchanged() {
        let svc = service_over(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(start())),
        );

        let err = svc
            .split_document(sample_pdf(5, None), vec!["99".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, TransientError::NoValidPages));

        let err = svc.document_info(b"not a pdf".to_vec()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadInput);
    }

    #[tokio::test]
    async fn uploads_are_tagged_temporary_and_swept_after_ttl() {
        let clock = Arc::new(ManualClock::new(start()));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let svc = service_over(store.clone(), clock.clone());

        let stored = svc
            .upload_temporary(sample_pdf(1, None), ResourceKind::Raw)
            .await
            .unwrap();
        assert_eq!(stored.created_at, start());

        let report = svc.run_retention_sweep().await.unwrap();
        assert_eq!(report.attempted(), 1);
        assert_eq!(report.deleted(), 0);

        clock.advance(chrono::Duration::hours(2));
        let report = svc.run_retention_sweep().await.unwrap();
        assert_eq!(report.deleted(), 1);
        assert!(!store.contains(&stored.id));
    }

    #[tokio::test]
    async fn dir_store_sweep_pages_through_every_expired_object() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let store = DirStore::open_with_clock(dir.path(), clock.clone())
            .await
            .unwrap();
        let config = AppConfig {
            list_page_size: 2,
            ..Default::default()
        };
        let svc = TransientService::new(Arc::new(store), clock.clone(), &config);

        let mut ids = Vec::new();
        for _ in 0..5 {
            let stored = svc
                .upload_temporary(sample_pdf(1, None), ResourceKind::Raw)
                .await
                .unwrap();
            ids.push(stored.id);
        }

        clock.advance(chrono::Duration::hours(2));
        let report = svc.run_retention_sweep().await.unwrap();
        assert_eq!(report.attempted(), 5);
        assert_eq!(report.deleted(), 5);
        assert_eq!(report.failed(), 0);

        for id in &ids {
            let url = svc
                .transform_url(id, ResourceKind::Raw, &TransformSpec::default())
                .unwrap();
            let path = url.trim_start_matches("file://");
            assert!(!Path::new(path).exists(), "{path} survived the sweep");
        }
    }

    #[tokio::test]
    async fn sweep_leaves_permanent_objects() {
        let clock = Arc::new(ManualClock::new(start()));
        let store = Arc::new(MemoryStore::new());
        store.insert(TaggedObject {
            id: ObjectId::from("kept"),
            kind: ResourceKind::Image,
            tags: ["permanent".to_string()].into_iter().collect(),
            created_at: start() - chrono::Duration::days(7),
            byte_size: 3,
        });
        store.insert(TaggedObject {
            id: ObjectId::from("stale"),
            kind: ResourceKind::Image,
            tags: [TEMPORARY_TAG.to_string()].into_iter().collect(),
            created_at: start() - chrono::Duration::days(7),
            byte_size: 3,
        });
        let svc = service_over(store.clone(), clock);

        let report = svc.run_retention_sweep().await.unwrap();
        assert_eq!(report.deleted(), 1);
        assert!(store.contains(&ObjectId::from("kept")));
    }

    #[tokio::test]
    async fn transform_url_delegates_to_the_store() {
        let svc = service_over(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(start())),
        );
        let spec = TransformSpec {
            format: Some("webp".into()),
            ..Default::default()
        };
        let url = svc
            .transform_url(&ObjectId::from("abc"), ResourceKind::Image, &spec)
            .unwrap();
        assert_eq!(url, "memory://image/abc?format=webp");
    }

    #[tokio::test]
    async fn slow_work_times_out() {
        let err = bounded(Duration::from_millis(10), "slow", || {
            std::thread::sleep(Duration::from_millis(300));
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, TransientError::Timeout(_)));
    }

    #[tokio::test]
    async fn dir_backed_service_stores_results() {
        let dir = tempfile::tempdir().unwrap();
        let svc = TransientService::init(&AppConfig::default(), dir.path())
            .await
            .unwrap();
        assert_eq!(svc.store_name(), "dir");

        let merged = svc
            .merge_documents(vec![sample_pdf(1, None), sample_pdf(2, None)])
            .await
            .unwrap();
        let stored = svc
            .upload_temporary(merged.bytes, ResourceKind::Raw)
            .await
            .unwrap();
        let url = svc
            .transform_url(&stored.id, ResourceKind::Raw, &TransformSpec::default())
            .unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with(&format!("{}.bin", stored.id)));
    }
}
