use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{Block, BlockKind, Card};

/// Placement of records whose sort key is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingKeyPolicy {
    /// Keep them, after every keyed record, in fetch order
    #[default]
    SortLast,
    /// Drop them from their partition
    Exclude,
}

/// Immutable view of one card subtree.
///
/// Built in one piece by [`rebuild`]; never mutated afterwards. Holders
/// swap the whole value to publish a newer view.
#[derive(Clone, Debug, PartialEq)]
pub struct CardSnapshot {
    root_id: String,
    card: Option<Card>,
    comments: Vec<Block>,
    contents: Vec<Block>,
    is_ready: bool,
}

impl CardSnapshot {
    /// The view before any successful sync.
    pub fn unsynced(root_id: impl Into<String>) -> Self {
        Self {
            root_id: root_id.into(),
            card: None,
            comments: Vec::new(),
            contents: Vec::new(),
            is_ready: false,
        }
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// The card record, if the fetched set contained it.
    pub fn card(&self) -> Option<&Card> {
        self.card.as_ref()
    }

    pub fn root(&self) -> Option<&Block> {
        self.card.as_ref().map(Card::block)
    }

    /// Comments, oldest first.
    pub fn comments(&self) -> &[Block] {
        &self.comments
    }

    /// Text and image fragments in display order.
    pub fn contents(&self) -> &[Block] {
        &self.contents
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready
    }
}

/// Rebuild the card view from one fetched block set.
///
/// The first block whose id equals `root_id` becomes the card. Comments
/// are ordered by `createAt`, contents by `order`, both ascending and
/// stable with respect to `blocks`. Blocks of any other type are ignored.
pub fn rebuild(root_id: &str, blocks: Vec<Block>, policy: MissingKeyPolicy) -> CardSnapshot {
    let mut card = None;
    let mut comments = Vec::new();
    let mut contents = Vec::new();

    for block in blocks {
        if card.is_none() && block.id == root_id {
            card = Some(Card::new(block.clone()));
        }
        match block.classify(root_id) {
            BlockKind::Comment => comments.push(block),
            BlockKind::Content(_) => contents.push(block),
            BlockKind::Root | BlockKind::Other => {}
        }
    }

    let comments = sort_partition(comments, Block::comment_key, f64_cmp, policy);
    let contents = sort_partition(contents, Block::content_key, f64_cmp, policy);

    if card.is_none() {
        log::debug!("card {root_id}: root block missing from fetched set");
    }
    log::debug!(
        "card {root_id}: rebuilt with {} comments, {} contents",
        comments.len(),
        contents.len()
    );

    CardSnapshot {
        root_id: root_id.to_string(),
        card,
        comments,
        contents,
        is_ready: true,
    }
}

// Keys come from `comment_key`/`content_key`, which filter NaN.
fn f64_cmp(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

fn sort_partition<K>(
    mut blocks: Vec<Block>,
    key: fn(&Block) -> Option<K>,
    cmp: fn(&K, &K) -> Ordering,
    policy: MissingKeyPolicy,
) -> Vec<Block> {
    if policy == MissingKeyPolicy::Exclude {
        blocks.retain(|b| key(b).is_some());
    }
    // `sort_by` is stable; equal keys keep fetch order.
    blocks.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => cmp(&x, &y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    blocks
}
