//! Block sources: where a card's subtree comes from.
//!
//! [`CardTree`](crate::view::CardTree) only needs one operation from the
//! outside world, fetching every block under a root id. Transport, auth
//! and timeouts all live behind [`BlockSource`].

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cardtree_core::{parse_blocks, Block, DecodeError};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Supplies the flat block subtree of a card.
pub trait BlockSource: Send + Sync {
    /// Failure type, handed to `sync()` callers unchanged.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch every block belonging to `root_id`, the root block included.
    /// The returned order carries no meaning.
    fn fetch_subtree(
        &self,
        root_id: &str,
    ) -> impl Future<Output = Result<Vec<Block>, Self::Error>> + Send;
}

impl<S: BlockSource> BlockSource for Arc<S> {
    type Error = S::Error;

    fn fetch_subtree(
        &self,
        root_id: &str,
    ) -> impl Future<Output = Result<Vec<Block>, Self::Error>> + Send {
        (**self).fetch_subtree(root_id)
    }
}

/// Fetch errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network or transport failure
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Not authorized to read card {0}")]
    Unauthorized(String),
    #[error("Card not found: {0}")]
    NotFound(String),
    /// Response could not be decoded into blocks
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<DecodeError> for FetchError {
    fn from(e: DecodeError) -> Self {
        FetchError::Malformed(e.to_string())
    }
}

/// In-process block source.
///
/// Holds one block list per root id. Latency and queued failures can be
/// injected to exercise callers.
#[derive(Default)]
pub struct MemorySource {
    subtrees: RwLock<HashMap<String, Vec<Block>>>,
    failures: Mutex<VecDeque<FetchError>>,
    latency: Option<Duration>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every fetch by `latency`.
    pub fn set_latency(&mut self, latency: Duration) {
        self.latency = Some(latency);
    }

    /// Replace the subtree stored under `root_id`.
    pub async fn insert(&self, root_id: impl Into<String>, blocks: Vec<Block>) {
        self.subtrees.write().await.insert(root_id.into(), blocks);
    }

    /// Replace the subtree under `root_id` from a JSON array of blocks.
    pub async fn insert_json(
        &self,
        root_id: impl Into<String>,
        json: &str,
    ) -> Result<(), FetchError> {
        let blocks = parse_blocks(json)?;
        self.insert(root_id, blocks).await;
        Ok(())
    }

    pub async fn remove(&self, root_id: &str) -> Option<Vec<Block>> {
        self.subtrees.write().await.remove(root_id)
    }

    /// Make the next fetch fail with `error`. Queued failures are
    /// consumed in FIFO order, one per fetch.
    pub async fn fail_next(&self, error: FetchError) {
        self.failures.lock().await.push_back(error);
    }
}

impl BlockSource for MemorySource {
    type Error = FetchError;

    async fn fetch_subtree(&self, root_id: &str) -> Result<Vec<Block>, FetchError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(error) = self.failures.lock().await.pop_front() {
            return Err(error);
        }
        let subtrees = self.subtrees.read().await;
        let blocks = subtrees
            .get(root_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(root_id.to_string()))?;
        log::trace!("memory source: {} blocks for {root_id}", blocks.len());
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_inserted_subtree() {
        let source = MemorySource::new();
        source
            .insert("root", vec![Block::new("root", "card"), Block::new("t1", "text")])
            .await;

        let blocks = source.fetch_subtree("root").await.unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].id, "t1");
    }

    #[tokio::test]
    async fn test_fetch_unknown_root_is_not_found() {
        let source = MemorySource::new();
        let err = source.fetch_subtree("missing").await.unwrap_err();
        assert_eq!(err, FetchError::NotFound("missing".into()));
    }

    #[tokio::test]
    async fn test_failures_consumed_in_order() {
        let source = MemorySource::new();
        source.insert("root", Vec::new()).await;
        source.fail_next(FetchError::Transport("reset".into())).await;
        source.fail_next(FetchError::Unauthorized("root".into())).await;

        assert_eq!(
            source.fetch_subtree("root").await,
            Err(FetchError::Transport("reset".into()))
        );
        assert_eq!(
            source.fetch_subtree("root").await,
            Err(FetchError::Unauthorized("root".into()))
        );
        assert_eq!(source.fetch_subtree("root").await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_insert_json() {
        let source = MemorySource::new();
        source
            .insert_json("root", r#"[{"id":"root","type":"card"}]"#)
            .await
            .unwrap();
        assert_eq!(source.fetch_subtree("root").await.unwrap().len(), 1);

        let err = source.insert_json("root", "not json").await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_remove() {
        let source = MemorySource::new();
        source.insert("root", vec![Block::new("root", "card")]).await;
        assert!(source.remove("root").await.is_some());
        assert!(source.fetch_subtree("root").await.is_err());
    }

    #[tokio::test]
    async fn test_arc_source_delegates() {
        let source = Arc::new(MemorySource::new());
        source.insert("root", vec![Block::new("root", "card")]).await;
        let blocks = BlockSource::fetch_subtree(&source, "root").await.unwrap();
        assert_eq!(blocks.len(), 1);
    }
}
