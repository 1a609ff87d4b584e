//! Markup handling for navpane.
//!
//! A tokenizer, an arena-based editable tree with implicit document
//! structure, and a serializer. The render pipeline parses a sanitized
//! document, rewrites attributes on the tree, and serializes it again.

pub mod dom;
pub mod serializer;
pub mod tokenizer;
pub mod tree_builder;

use navpane_types::Result;

pub use dom::{ElementData, MarkupTree, NodeId, NodeKind, TagName};
pub use serializer::{escape, push_escaped, serialize};

/// Tokenize and build a tree in one step.
pub fn parse(markup: &str) -> Result<MarkupTree> {
    let tokens = tokenizer::Tokenizer::new(markup).tokenize()?;
    let tree = tree_builder::TreeBuilder::build(tokens)?;
    log::trace!("parsed markup into {} nodes", tree.nodes.len());
    Ok(tree)
}
