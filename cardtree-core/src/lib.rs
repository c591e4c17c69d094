//! # cardtree-core — Block model and card view reconstruction
//!
//! A card is stored as a flat set of loosely-typed blocks: the card record
//! itself plus its comments and content fragments. This crate turns one
//! fetched set into a [`CardSnapshot`] with two ordered partitions.
//!
//! ```text
//! [Block, Block, Block, ...]          (fetch order, unsorted)
//!            │
//!            │ classify by `type`
//!            ▼
//! ┌──────────┬──────────────┬────────────────┬───────┐
//! │ Root     │ Comment      │ Content        │ Other │
//! │ (by id)  │ by createAt  │ by order       │ (drop)│
//! └────┬─────┴──────┬───────┴───────┬────────┴───────┘
//!      ▼            ▼               ▼
//!    Card      comments[]      contents[]     ──► CardSnapshot
//! ```
//!
//! ## Modules
//!
//! - [`card`] — read-only accessors over the root record
//! - [`tree`] — the pure rebuild step and the immutable snapshot

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod card;
pub mod tree;

pub use card::Card;
pub use tree::{rebuild, CardSnapshot, MissingKeyPolicy};

/// Discriminant of comment blocks.
pub const COMMENT_TYPE: &str = "comment";
/// Discriminant of text content fragments.
pub const TEXT_TYPE: &str = "text";
/// Discriminant of image content fragments.
pub const IMAGE_TYPE: &str = "image";

/// Errors decoding blocks from their JSON form.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid block JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Block {index} has an empty id")]
    EmptyId { index: usize },
}

/// One record of a card subtree.
///
/// Only `id`, `type`, `createAt` and `order` are interpreted here. Every
/// other key is carried through untouched in [`Block::attributes`].
/// A non-numeric `createAt` or `order` decodes as absent.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(rename = "type", default)]
    pub block_type: String,
    /// Creation timestamp in milliseconds, used to order comments.
    #[serde(
        default,
        alias = "createdAt",
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub create_at: Option<f64>,
    /// Rank among the content fragments. Not unique, not gap-free.
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub order: Option<f64>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Block {
    pub fn new(id: impl Into<String>, block_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            create_at: None,
            order: None,
            attributes: Map::new(),
        }
    }

    pub fn with_create_at(mut self, create_at: impl Into<f64>) -> Self {
        self.create_at = Some(create_at.into());
        self
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Classify this block relative to the card being viewed.
    ///
    /// The type discriminant is checked before the id, so a root record
    /// typed `text` still lands in the content partition.
    pub fn classify(&self, root_id: &str) -> BlockKind {
        match self.block_type.as_str() {
            COMMENT_TYPE => BlockKind::Comment,
            TEXT_TYPE => BlockKind::Content(ContentKind::Text),
            IMAGE_TYPE => BlockKind::Content(ContentKind::Image),
            _ if self.id == root_id => BlockKind::Root,
            _ => BlockKind::Other,
        }
    }

    /// Comment sort key. NaN counts as missing.
    pub fn comment_key(&self) -> Option<f64> {
        self.create_at.filter(|create_at| !create_at.is_nan())
    }

    /// Content sort key. NaN counts as missing.
    pub fn content_key(&self) -> Option<f64> {
        self.order.filter(|order| !order.is_nan())
    }
}

/// Kind of content fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Image,
}

/// Classification of a block within one card subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// The card record itself
    Root,
    Comment,
    Content(ContentKind),
    /// Unrecognized type; ignored by the view
    Other,
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64))
}

/// Decode a JSON array of blocks.
pub fn parse_blocks(json: &str) -> Result<Vec<Block>, DecodeError> {
    let blocks: Vec<Block> = serde_json::from_str(json)?;
    if let Some(index) = blocks.iter().position(|b| b.id.is_empty()) {
        return Err(DecodeError::EmptyId { index });
    }
    Ok(blocks)
}
