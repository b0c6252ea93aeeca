//! Turning a live selection into a frozen, persistable [`Anchor`].

use uuid::Uuid;

use super::error::HighlightError;
use super::hooks::Hooks;
use super::wrap;
use crate::models::{Anchor, LiveCoordinate, LiveRange, NodeAddress, ParentIndex};
use crate::tree::{DocumentTree, NodeId, byte_index};

/// Read the host selection under `root` as a fresh, unfrozen range.
///
/// Returns `None` when nothing is selected, the selection is collapsed, covers no
/// characters, or leaves `root`. Backwards selections are reordered.
pub fn capture_selection(tree: &DocumentTree, root: NodeId) -> Option<LiveRange> {
    let selection = tree.selection()?;
    if selection.is_collapsed() {
        return None;
    }
    let anchor = normalize_coordinate(tree, root, selection.anchor)?;
    let focus = normalize_coordinate(tree, root, selection.focus)?;
    let (start, end) = if is_before(tree, root, focus, anchor)? {
        (focus, anchor)
    } else {
        (anchor, focus)
    };

    let text = text_between(tree, root, start, end);
    if text.is_empty() {
        return None;
    }
    Some(LiveRange::new(start, end, text, Uuid::new_v4()))
}

/// Freeze `range` and describe it with tree-independent addresses.
///
/// Fails only on programmer error: an already frozen range, endpoints that are not
/// text leaves under `root`, or an end that precedes the start.
pub fn serialize(
    tree: &DocumentTree,
    range: &mut LiveRange,
    root: NodeId,
    class_names: &[String],
    hooks: &Hooks,
) -> Result<Anchor, HighlightError> {
    if range.is_frozen() {
        return Err(HighlightError::MalformedRange(format!(
            "range {} was already serialized",
            range.id
        )));
    }
    for coordinate in [range.start, range.end] {
        if !tree.is_text(coordinate.node) || !tree.contains(root, coordinate.node) {
            return Err(HighlightError::MalformedRange(format!(
                "{:?} is not a text leaf under the root",
                coordinate.node
            )));
        }
        if coordinate.offset > tree.char_len(coordinate.node) {
            return Err(HighlightError::MalformedRange(format!(
                "offset {} exceeds the text of {:?}",
                coordinate.offset, coordinate.node
            )));
        }
    }
    if is_before(tree, root, range.end, range.start) == Some(true) {
        return Err(HighlightError::MalformedRange(
            "range end precedes its start".to_string(),
        ));
    }

    let start = node_address(tree, range.start, root)?;
    let end = node_address(tree, range.end, root)?;
    let extra = hooks.record_info(range, tree, root);
    range.freeze();

    Ok(Anchor::new(
        start,
        end,
        range.text.clone(),
        range.id,
        class_names,
        extra,
    ))
}

/// Address of a text coordinate relative to its nearest non-wrap ancestor element
pub fn node_address(
    tree: &DocumentTree,
    coordinate: LiveCoordinate,
    root: NodeId,
) -> Result<NodeAddress, HighlightError> {
    let origin = origin_parent(tree, coordinate.node, root).ok_or_else(|| {
        HighlightError::MalformedRange(format!("{:?} has no parent element", coordinate.node))
    })?;
    let tag = tree.tag_name(origin).unwrap_or_default().to_string();

    let parent_index = if origin == root {
        ParentIndex::Root
    } else {
        let index = tree
            .query_all(root, &tag)
            .iter()
            .position(|n| *n == origin)
            .ok_or_else(|| {
                HighlightError::MalformedRange(format!("{origin:?} is not under the root"))
            })?;
        ParentIndex::Nth(index)
    };

    let preceding: usize = tree
        .text_leaves(origin)
        .take_while(|leaf| *leaf != coordinate.node)
        .map(|leaf| tree.char_len(leaf))
        .sum();

    Ok(NodeAddress {
        parent_tag_name: tag,
        parent_index,
        text_offset: preceding + coordinate.offset,
    })
}

/// Nearest ancestor element of `node` that is not a wrap node, stopping at `root`
fn origin_parent(tree: &DocumentTree, node: NodeId, root: NodeId) -> Option<NodeId> {
    let mut current = tree.parent(node)?;
    while current != root && wrap::is_wrap_node(tree, current) {
        current = tree.parent(current)?;
    }
    Some(current)
}

/// Map a selection endpoint onto a text leaf.
///
/// An element endpoint points at the child at `offset`: it becomes the first text
/// leaf from that child onward, or the end of the last leaf before it.
fn normalize_coordinate(
    tree: &DocumentTree,
    root: NodeId,
    coordinate: LiveCoordinate,
) -> Option<LiveCoordinate> {
    if !tree.contains(root, coordinate.node) {
        return None;
    }
    if tree.is_text(coordinate.node) {
        return (coordinate.offset <= tree.char_len(coordinate.node)).then_some(coordinate);
    }

    let children = tree.children(coordinate.node);
    let boundary = children.get(coordinate.offset).copied();
    let leaves: Vec<NodeId> = tree.text_leaves(root).collect();
    match boundary {
        Some(child) => {
            let position = tree.document_position(root, child)?;
            leaves
                .iter()
                .find(|leaf| tree.document_position(root, **leaf) >= Some(position))
                .map(|leaf| LiveCoordinate::new(*leaf, 0))
        }
        None => {
            let last = tree
                .text_leaves(coordinate.node)
                .last()
                .or_else(|| {
                    let position = tree.document_position(root, coordinate.node)?;
                    leaves
                        .iter()
                        .rev()
                        .find(|leaf| tree.document_position(root, **leaf) < Some(position))
                        .copied()
                })?;
            Some(LiveCoordinate::new(last, tree.char_len(last)))
        }
    }
}

/// Whether `a` comes strictly before `b` in document order
fn is_before(
    tree: &DocumentTree,
    root: NodeId,
    a: LiveCoordinate,
    b: LiveCoordinate,
) -> Option<bool> {
    let pa = tree.document_position(root, a.node)?;
    let pb = tree.document_position(root, b.node)?;
    Some((pa, a.offset) < (pb, b.offset))
}

/// Characters between two ordered text coordinates
pub(crate) fn text_between(
    tree: &DocumentTree,
    root: NodeId,
    start: LiveCoordinate,
    end: LiveCoordinate,
) -> String {
    let mut out = String::new();
    let mut within = false;
    for leaf in tree.text_leaves(root) {
        let text = tree.text(leaf).unwrap_or_default();
        let from = if leaf == start.node {
            within = true;
            byte_index(text, start.offset)
        } else {
            0
        };
        if !within {
            continue;
        }
        if leaf == end.node {
            let to = byte_index(text, end.offset).max(from);
            out.push_str(&text[from..to]);
            break;
        }
        out.push_str(&text[from..]);
    }
    out
}
