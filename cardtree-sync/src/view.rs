//! The card view.
//!
//! A [`CardTree`] is bound to one card id for its whole life. Each
//! [`CardTree::sync`] fetches the full subtree, rebuilds it, and publishes
//! the result by swapping a single `Arc<CardSnapshot>`. Readers never see
//! a half-updated view, and a failed sync publishes nothing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cardtree_core::{rebuild, CardSnapshot, MissingKeyPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{watch, Mutex};

use crate::source::BlockSource;

/// How overlapping `sync()` calls on one view interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// One fetch+rebuild at a time; calls complete in the order issued
    #[default]
    Serialized,
    /// Fetches run independently; the last rebuild to finish wins
    Concurrent,
}

/// View configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub policy: SyncPolicy,
    /// Placement of comments without `createAt` and fragments without `order`
    pub missing_keys: MissingKeyPolicy,
}

/// Errors constructing a view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("Card id must not be empty")]
    EmptyCardId,
}

/// Read-through view of one card, its contents and its comments.
pub struct CardTree<S> {
    card_id: String,
    source: S,
    config: SyncConfig,

    /// Current snapshot; replaced whole on every successful sync
    snapshot_tx: watch::Sender<Arc<CardSnapshot>>,

    /// Held across fetch+rebuild under `SyncPolicy::Serialized`
    sync_lock: Mutex<()>,

    sync_count: AtomicU64,
}

impl<S: BlockSource> CardTree<S> {
    /// Create an unsynced view. Nothing is fetched until [`sync`](Self::sync).
    pub fn new(card_id: impl Into<String>, source: S) -> Result<Self, ViewError> {
        Self::with_config(card_id, source, SyncConfig::default())
    }

    pub fn with_config(
        card_id: impl Into<String>,
        source: S,
        config: SyncConfig,
    ) -> Result<Self, ViewError> {
        let card_id = card_id.into();
        if card_id.is_empty() {
            return Err(ViewError::EmptyCardId);
        }
        let (snapshot_tx, _) = watch::channel(Arc::new(CardSnapshot::unsynced(card_id.clone())));
        Ok(Self {
            card_id,
            source,
            config,
            snapshot_tx,
            sync_lock: Mutex::new(()),
            sync_count: AtomicU64::new(0),
        })
    }

    /// Fetch the card subtree and publish a rebuilt snapshot.
    ///
    /// A fetch failure is returned exactly as the source produced it and
    /// leaves the current snapshot in place.
    pub async fn sync(&self) -> Result<(), S::Error> {
        let _guard = match self.config.policy {
            SyncPolicy::Serialized => Some(self.sync_lock.lock().await),
            SyncPolicy::Concurrent => None,
        };

        let blocks = self.source.fetch_subtree(&self.card_id).await?;
        log::trace!("card {}: fetched {} blocks", self.card_id, blocks.len());

        let snapshot = rebuild(&self.card_id, blocks, self.config.missing_keys);
        self.snapshot_tx.send_replace(Arc::new(snapshot));
        let count = self.sync_count.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!("card {}: sync #{count} published", self.card_id);
        Ok(())
    }

    pub fn card_id(&self) -> &str {
        &self.card_id
    }

    pub fn config(&self) -> SyncConfig {
        self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The current snapshot. Cheap; clones an `Arc`.
    pub fn snapshot(&self) -> Arc<CardSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot_tx.borrow().is_ready()
    }

    /// Receiver notified after every successful sync.
    pub fn subscribe(&self) -> watch::Receiver<Arc<CardSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Number of successful syncs so far.
    pub fn sync_count(&self) -> u64 {
        self.sync_count.load(Ordering::Acquire)
    }
}
