//! Periodic dataset refresh.
//!
//! Runs a [`DatasetManager`] in a tokio task and sends a [`DatasetSnapshot`]
//! through an `mpsc` channel after every refresh, so consumers only ever see
//! immutable bundles.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use covid_data::analysis::DatasetBundle;
use tokio::sync::mpsc;
use tokio::time;

use crate::data_manager::{DatasetManager, DEFAULT_CACHE_TTL_SECS};

// ── Public types ──────────────────────────────────────────────────────────────

/// One refresh result forwarded to consumers.
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    pub bundle: Arc<DatasetBundle>,
    pub refreshed_at: DateTime<Utc>,
    /// Set when this refresh failed and `bundle` is the previous one.
    pub last_error: Option<String>,
}

impl DatasetSnapshot {
    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }
}

// ── RefreshOrchestrator ───────────────────────────────────────────────────────

/// Background re-ingestion loop.
pub struct RefreshOrchestrator {
    update_interval: Duration,
    data_path: Option<PathBuf>,
}

impl RefreshOrchestrator {
    pub fn new(update_interval_secs: u64, data_path: Option<PathBuf>) -> Self {
        Self {
            update_interval: Duration::from_secs(update_interval_secs),
            data_path,
        }
    }

    /// Spawn the refresh loop.
    ///
    /// Returns the snapshot receiver and a [`RefreshHandle`] that aborts the
    /// loop. The loop also exits once the receiver is dropped.
    pub fn start(self) -> (mpsc::Receiver<DatasetSnapshot>, RefreshHandle) {
        let (tx, rx) = mpsc::channel(4);

        let handle = tokio::spawn(async move {
            self.refresh_loop(tx).await;
        });

        (rx, RefreshHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    async fn refresh_loop(self, tx: mpsc::Sender<DatasetSnapshot>) {
        let mut manager = DatasetManager::new(DEFAULT_CACHE_TTL_SECS, self.data_path.clone());

        Self::refresh_and_send(&mut manager, &tx).await;

        let mut interval = time::interval(self.update_interval);
        // The first tick fires immediately; the initial refresh already ran.
        interval.tick().await;

        loop {
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("snapshot channel closed; exiting loop");
                break;
            }

            Self::refresh_and_send(&mut manager, &tx).await;
        }
    }

    /// Every tick re-ingests; the manager's cache only serves as the
    /// fallback when ingestion fails.
    async fn refresh_and_send(manager: &mut DatasetManager, tx: &mpsc::Sender<DatasetSnapshot>) {
        let Some(bundle) = manager.get_data(true) else {
            tracing::warn!(
                error = manager.last_error().unwrap_or("unknown"),
                "no dataset available; skipping send"
            );
            return;
        };

        let snapshot = DatasetSnapshot {
            bundle,
            refreshed_at: Utc::now(),
            last_error: manager.last_error().map(str::to_string),
        };

        if let Err(e) = tx.send(snapshot).await {
            tracing::warn!(error = %e, "failed to send snapshot; receiver dropped");
        }
    }
}

// ── RefreshHandle ─────────────────────────────────────────────────────────────

/// Handle to the background refresh task.
pub struct RefreshHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl RefreshHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
