//! Turning a stored [`Anchor`] back into live tree coordinates.

use tracing::debug;

use super::error::HighlightError;
use crate::models::{Anchor, LiveCoordinate, LiveRange, NodeAddress, ParentIndex};
use crate::tree::{DocumentTree, NodeId};

/// Resolve both addresses of `anchor` against the current tree.
///
/// Pure with respect to the tree: resolving twice without mutations in between
/// yields identical coordinates. The returned range is already frozen.
pub fn resolve(
    tree: &DocumentTree,
    anchor: &Anchor,
    root: NodeId,
) -> Result<LiveRange, HighlightError> {
    let fail = |reason: String| HighlightError::AnchorSourceRecreate {
        id: anchor.id(),
        reason,
    };

    let start = resolve_address(tree, anchor.start(), root).map_err(&fail)?;
    let end = resolve_address(tree, anchor.end(), root).map_err(&fail)?;
    debug!(id = %anchor.id(), ?start, ?end, "resolved anchor");

    Ok(LiveRange::restored(start, end, anchor.text(), anchor.id()))
}

/// Resolve a single address to a text leaf and a local offset
pub fn resolve_address(
    tree: &DocumentTree,
    address: &NodeAddress,
    root: NodeId,
) -> Result<LiveCoordinate, String> {
    let parent = query_parent(tree, address, root).ok_or_else(|| {
        format!(
            "no <{}> at index {}",
            address.parent_tag_name,
            i64::from(address.parent_index)
        )
    })?;
    text_child_by_offset(tree, parent, address.text_offset).ok_or_else(|| {
        format!(
            "offset {} exceeds the text of <{}>",
            address.text_offset, address.parent_tag_name
        )
    })
}

fn query_parent(tree: &DocumentTree, address: &NodeAddress, root: NodeId) -> Option<NodeId> {
    match address.parent_index {
        ParentIndex::Root => Some(root),
        ParentIndex::Nth(index) => tree
            .query_all(root, &address.parent_tag_name)
            .get(index)
            .copied(),
    }
}

/// Walk the text leaves of `parent` until `offset` falls inside one.
///
/// An offset on a leaf boundary resolves to the end of the earlier leaf.
fn text_child_by_offset(tree: &DocumentTree, parent: NodeId, offset: usize) -> Option<LiveCoordinate> {
    let mut accumulated = 0;
    for leaf in tree.text_leaves(parent) {
        let len = tree.char_len(leaf);
        if len == 0 {
            continue;
        }
        if accumulated + len >= offset {
            return Some(LiveCoordinate::new(leaf, offset - accumulated));
        }
        accumulated += len;
    }
    None
}
