use serde_json::{Map, Value};

use crate::Block;

/// The card record of a subtree.
///
/// Wraps the root [`Block`] and reads the handful of card attributes
/// callers usually want. A missing or mistyped attribute reads as absent.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    block: Block,
}

impl Card {
    pub fn new(block: Block) -> Self {
        Self { block }
    }

    pub fn id(&self) -> &str {
        &self.block.id
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn into_block(self) -> Block {
        self.block
    }

    pub fn title(&self) -> &str {
        self.block
            .attributes
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn icon(&self) -> Option<&str> {
        self.field("icon").and_then(Value::as_str)
    }

    /// Property values keyed by property id.
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.field("properties").and_then(Value::as_object)
    }

    pub fn is_template(&self) -> bool {
        self.field("isTemplate")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.block
            .attributes
            .get("fields")
            .and_then(Value::as_object)
            .and_then(|fields| fields.get(name))
    }
}
