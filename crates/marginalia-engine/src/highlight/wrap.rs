//! Identity bookkeeping stored as attributes on wrap nodes.

use uuid::Uuid;

use crate::models::SplitPosition;
use crate::tree::{DocumentTree, NodeId, TreeError};

pub const DATASET_IDENTIFIER: &str = "data-marginalia-id";
pub const DATASET_IDENTIFIER_EXTRA: &str = "data-marginalia-id-extra";
pub const DATASET_SPLIT_TYPE: &str = "data-marginalia-split-type";
pub const ID_DIVISION: char = ';';

/// An element carrying a primary highlight id
pub fn is_wrap_node(tree: &DocumentTree, node: NodeId) -> bool {
    tree.attr(node, DATASET_IDENTIFIER)
        .is_some_and(|id| !id.is_empty())
}

pub fn primary_id(tree: &DocumentTree, node: NodeId) -> Option<Uuid> {
    tree.attr(node, DATASET_IDENTIFIER)
        .and_then(|id| Uuid::parse_str(id).ok())
}

/// Hidden ids, most recently covered first. Tokens that are not ids are dropped.
pub fn extra_ids(tree: &DocumentTree, node: NodeId) -> Vec<Uuid> {
    tree.attr(node, DATASET_IDENTIFIER_EXTRA)
        .map(|raw| {
            raw.split(ID_DIVISION)
                .filter_map(|token| Uuid::parse_str(token.trim()).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub fn set_primary_id(tree: &mut DocumentTree, node: NodeId, id: Uuid) -> Result<(), TreeError> {
    tree.set_attr(node, DATASET_IDENTIFIER, &id.to_string())
}

pub fn set_extra_ids(tree: &mut DocumentTree, node: NodeId, ids: &[Uuid]) -> Result<(), TreeError> {
    let joined = ids
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(&ID_DIVISION.to_string());
    tree.set_attr(node, DATASET_IDENTIFIER_EXTRA, &joined)
}

pub fn set_split(tree: &mut DocumentTree, node: NodeId, split: SplitPosition) -> Result<(), TreeError> {
    tree.set_attr(node, DATASET_SPLIT_TYPE, split.as_str())
}

pub fn split(tree: &DocumentTree, node: NodeId) -> Option<SplitPosition> {
    tree.attr(node, DATASET_SPLIT_TYPE)?.parse().ok()
}

/// Whether `id` is the primary or one of the hidden ids of `node`
pub fn carries_id(tree: &DocumentTree, node: NodeId, id: Uuid) -> bool {
    primary_id(tree, node) == Some(id) || extra_ids(tree, node).contains(&id)
}

/// Outermost wrap node between `node` and `root`.
///
/// Returns `None` when there is no wrap or when `node` does not live under `root`.
pub fn outermost_wrap_in_root(tree: &DocumentTree, node: NodeId, root: NodeId) -> Option<NodeId> {
    let mut wrapper = None;
    let mut current = Some(node);
    while let Some(id) = current {
        if is_wrap_node(tree, id) {
            wrapper = Some(id);
        }
        if id == root {
            return wrapper;
        }
        current = tree.parent(id);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extra_ids_match_whole_tokens_only() {
        let mut tree = DocumentTree::new("body");
        let wrap = tree.append_element(tree.root(), "mark").unwrap();
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        set_primary_id(&mut tree, wrap, a).unwrap();
        set_extra_ids(&mut tree, wrap, &[b]).unwrap();

        assert!(is_wrap_node(&tree, wrap));
        assert!(carries_id(&tree, wrap, b));
        assert_eq!(extra_ids(&tree, wrap), vec![b]);

        // A token that merely contains the id text is not a match
        let raw = format!("x{b}");
        tree.set_attr(wrap, DATASET_IDENTIFIER_EXTRA, &raw).unwrap();
        assert!(!carries_id(&tree, wrap, b));
    }

    #[test]
    fn test_outermost_wrap_requires_root_ancestry() {
        let mut tree = DocumentTree::new("body");
        let root = tree.root();
        let wrap = tree.append_element(root, "mark").unwrap();
        set_primary_id(&mut tree, wrap, Uuid::from_u128(7)).unwrap();
        let leaf = tree.append_text(wrap, "text").unwrap();
        let stray = tree.create_text("loose");

        assert_eq!(outermost_wrap_in_root(&tree, leaf, root), Some(wrap));
        assert_eq!(outermost_wrap_in_root(&tree, stray, root), None);
        assert_eq!(outermost_wrap_in_root(&tree, root, root), None);
    }
}
