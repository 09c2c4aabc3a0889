//! TTL-cached dataset manager.
//!
//! Wraps [`ingest_all`] with a time-to-live cache and retry logic. Callers
//! use [`DatasetManager::get_data`] to obtain a fresh-or-cached
//! [`DatasetBundle`]; the manager handles staleness checks, up to three
//! ingestion attempts with back-off, and fallback to the previous bundle when
//! every attempt fails.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use covid_core::SeriesError;
use covid_data::analysis::{ingest_all, DatasetBundle};

/// Default cache TTL in seconds. The upstream files change once a day.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

const MAX_RETRY_ATTEMPTS: u32 = 3;

// ── DatasetManager ────────────────────────────────────────────────────────────

/// TTL-cached owner of the latest ingestion result.
///
/// Bundles are handed out as `Arc`s: a re-ingestion replaces the cached
/// bundle and never mutates one a consumer already holds.
///
/// # Example
/// ```no_run
/// use covid_runtime::data_manager::DatasetManager;
///
/// let mut mgr = DatasetManager::new(300, None);
/// if let Some(bundle) = mgr.get_data(false) {
///     println!("provincial records: {}", bundle.metadata.province_records);
/// }
/// ```
pub struct DatasetManager {
    cache_ttl: Duration,
    /// `None` uses the default data directory.
    data_path: Option<PathBuf>,
    cache: Option<Arc<DatasetBundle>>,
    cache_timestamp: Option<Instant>,
    last_error: Option<String>,
}

impl DatasetManager {
    pub fn new(cache_ttl_secs: u64, data_path: Option<PathBuf>) -> Self {
        Self {
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            data_path,
            cache: None,
            cache_timestamp: None,
            last_error: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the current bundle, re-ingesting when the cache is stale.
    ///
    /// `force_refresh` bypasses the cache. When every attempt fails the
    /// previous bundle (if any) is returned, however old.
    pub fn get_data(&mut self, force_refresh: bool) -> Option<Arc<DatasetBundle>> {
        if !force_refresh && self.is_cache_valid() {
            tracing::debug!("returning cached dataset bundle");
            return self.cache.clone();
        }

        match self.fetch_with_retry() {
            Ok(bundle) => {
                tracing::debug!(
                    provinces = bundle.metadata.province_records,
                    regions = bundle.metadata.region_records,
                    "dataset cache updated"
                );
                self.cache = Some(Arc::new(bundle));
                self.cache_timestamp = Some(Instant::now());
                self.last_error = None;
                self.cache.clone()
            }
            Err(e) => {
                tracing::warn!(error = %e, "ingestion failed; falling back to cached data");
                self.last_error = Some(e.to_string());
                self.cache.clone()
            }
        }
    }

    /// Discard the cache so the next [`get_data`](Self::get_data) ingests.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.cache_timestamp = None;
        tracing::debug!("cache invalidated");
    }

    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    /// Description of the last failed ingestion, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn is_cache_valid(&self) -> bool {
        match (self.cache.as_ref(), self.cache_timestamp) {
            (Some(_), Some(ts)) => ts.elapsed() < self.cache_ttl,
            _ => false,
        }
    }

    /// Back-off schedule: 0 ms, 100 ms, 200 ms.
    fn fetch_with_retry(&self) -> Result<DatasetBundle, SeriesError> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let sleep_ms = u64::from(attempt) * 100;
                tracing::debug!(attempt, sleep_ms, "retrying ingestion after back-off");
                thread::sleep(Duration::from_millis(sleep_ms));
            }

            match ingest_all(self.data_path.as_deref()) {
                Ok(bundle) => return Ok(bundle),
                Err(e) if attempt + 1 >= MAX_RETRY_ATTEMPTS => return Err(e),
                Err(e) => tracing::warn!(attempt, error = %e, "ingestion attempt failed"),
            }
            attempt += 1;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod testdata {
    use std::path::Path;

    /// Minimal regional and provincial files plus a one-day national file.
    pub fn write_minimal_tree(dir: &Path) {
        std::fs::write(
            dir.join("dpc-covid19-ita-andamento-nazionale.json"),
            r#"[{"data": "2020-02-24T18:00:00", "stato": "ITA", "totale_casi": 229}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("dpc-covid19-ita-regioni.json"),
            r#"[{"data": "2020-02-24T18:00:00", "stato": "ITA", "codice_regione": 3,
                 "denominazione_regione": "Lombardia", "totale_casi": 172}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("dpc-covid19-ita-province.json"),
            r#"[{"data": "2020-02-24T18:00:00", "stato": "ITA", "codice_regione": 3,
                 "denominazione_regione": "Lombardia", "codice_provincia": 98,
                 "denominazione_provincia": "Lodi", "sigla_provincia": "LO",
                 "totale_casi": 125}]"#,
        )
        .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::testdata::write_minimal_tree;
    use super::*;
    use tempfile::TempDir;

    fn make_manager_with_dir(ttl_secs: u64) -> (DatasetManager, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        write_minimal_tree(dir.path());
        let mgr = DatasetManager::new(ttl_secs, Some(dir.path().to_path_buf()));
        (mgr, dir)
    }

    // ── cache behaviour ───────────────────────────────────────────────────

    #[test]
    fn test_cache_miss_on_first_call() {
        let (mgr, _dir) = make_manager_with_dir(30);
        assert!(!mgr.is_cache_valid());
        assert!(mgr.cache_age().is_none());
        assert!(mgr.last_error().is_none());
    }

    #[test]
    fn test_cache_valid_within_ttl() {
        let (mut mgr, _dir) = make_manager_with_dir(30);

        let first = mgr.get_data(false).expect("bundle after first fetch");
        assert_eq!(first.metadata.province_records, 1);

        let second = mgr.get_data(false).expect("cached bundle");
        assert!(Arc::ptr_eq(&first, &second));

        let age = mgr.cache_age().expect("cache age is Some after population");
        assert!(age < Duration::from_secs(5));
    }

    #[test]
    fn test_cache_expired() {
        let (mut mgr, _dir) = make_manager_with_dir(0);

        let first = mgr.get_data(false).unwrap();
        assert!(!mgr.is_cache_valid());

        let second = mgr.get_data(false).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_invalidate_cache() {
        let (mut mgr, _dir) = make_manager_with_dir(30);

        mgr.get_data(false);
        assert!(mgr.cache.is_some());

        mgr.invalidate_cache();
        assert!(mgr.cache.is_none());
        assert!(mgr.cache_timestamp.is_none());
        assert!(mgr.cache_age().is_none());
    }

    #[test]
    fn test_force_refresh_bypasses_cache() {
        let (mut mgr, _dir) = make_manager_with_dir(60);

        mgr.get_data(false);
        let ts1 = mgr.cache_timestamp.unwrap();
        thread::sleep(Duration::from_millis(10));

        mgr.get_data(true);
        let ts2 = mgr.cache_timestamp.unwrap();
        assert!(ts2 > ts1);
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn test_failure_without_cache_returns_none() {
        let dir = TempDir::new().unwrap();
        let mut mgr = DatasetManager::new(30, Some(dir.path().to_path_buf()));

        assert!(mgr.get_data(false).is_none());
        assert!(mgr.last_error().unwrap().contains("Dataset not found"));
    }

    #[test]
    fn test_failure_falls_back_to_previous_bundle() {
        let (mut mgr, dir) = make_manager_with_dir(30);
        let first = mgr.get_data(false).unwrap();

        std::fs::remove_file(dir.path().join("dpc-covid19-ita-province.json")).unwrap();
        let fallback = mgr.get_data(true).expect("previous bundle kept");

        assert!(Arc::ptr_eq(&first, &fallback));
        assert!(mgr.last_error().is_some());
    }

    #[test]
    fn test_error_cleared_after_recovery() {
        let dir = TempDir::new().unwrap();
        let mut mgr = DatasetManager::new(30, Some(dir.path().to_path_buf()));
        assert!(mgr.get_data(false).is_none());

        write_minimal_tree(dir.path());
        assert!(mgr.get_data(false).is_some());
        assert!(mgr.last_error().is_none());
    }
}
