//! # cardtree-sync — Read-through card view over a block source
//!
//! Fetches the flat block subtree of one card and publishes it as an
//! immutable [`CardSnapshot`](cardtree_core::CardSnapshot).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  fetch_subtree(id)  ┌─────────────┐
//! │ CardTree    │ ──────────────────► │ BlockSource │
//! │ (per card)  │ ◄────────────────── │ (external)  │
//! └──────┬──────┘     Vec<Block>      └─────────────┘
//!        │ rebuild
//!        ▼
//! ┌─────────────┐   send_replace   ┌──────────────────┐
//! │ CardSnapshot│ ───────────────► │ watch::Receiver  │
//! │ (immutable) │                  │ (readers)        │
//! └─────────────┘                  └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`source`] — data source seam, fetch errors, in-memory source
//! - [`view`] — the `CardTree` view and its sync configuration

pub mod source;
pub mod view;

pub use source::{BlockSource, FetchError, MemorySource};
pub use view::{CardTree, SyncConfig, SyncPolicy, ViewError};

pub use cardtree_core::{Block, Card, CardSnapshot, MissingKeyPolicy};
