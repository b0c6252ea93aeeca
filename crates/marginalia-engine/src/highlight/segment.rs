//! Splitting text leaves at range boundaries and collecting the leaves to wrap.

use crate::models::{LiveCoordinate, SelectedSegment, SplitPosition};
use crate::tree::selector::is_excluded;
use crate::tree::{DocumentTree, NodeId, Selector, TreeError};

/// Enumerate the minimal set of text leaves covering `start..end`.
///
/// Boundary leaves are split in place, once each. Subtrees matching `except` are
/// skipped entirely; when that hides a boundary leaf its segment is simply absent.
/// Empty fragments never become segments, so a zero-length result means there is
/// nothing to render.
pub fn segment(
    tree: &mut DocumentTree,
    root: NodeId,
    start: LiveCoordinate,
    end: LiveCoordinate,
    except: &[Selector],
) -> Result<Vec<SelectedSegment>, TreeError> {
    if start.node == end.node && tree.is_text(start.node) {
        return segment_single_leaf(tree, root, start, end.offset, except);
    }

    let mut stack = vec![root];
    let mut segments = Vec::new();
    let mut within = false;

    while let Some(node) = stack.pop() {
        if tree.is_element(node) && is_excluded(tree, node, except) {
            if tree.contains(node, start.node) {
                within = true;
            }
            if tree.contains(node, end.node) {
                break;
            }
            continue;
        }
        stack.extend(tree.children(node).iter().rev().copied());

        if node == start.node {
            if tree.is_text(node) {
                if let Some(head) = split_start(tree, start)? {
                    segments.push(SelectedSegment::text(head, SplitPosition::Head));
                }
                within = true;
            }
        } else if node == end.node {
            if within && tree.is_text(node) {
                if let Some(tail) = split_end(tree, end)? {
                    segments.push(SelectedSegment::text(tail, SplitPosition::Tail));
                }
            }
            break;
        } else if within && tree.char_len(node) > 0 {
            segments.push(SelectedSegment::text(node, SplitPosition::None));
        }
    }

    Ok(segments)
}

fn segment_single_leaf(
    tree: &mut DocumentTree,
    root: NodeId,
    start: LiveCoordinate,
    end_offset: usize,
    except: &[Selector],
) -> Result<Vec<SelectedSegment>, TreeError> {
    let mut ancestor = Some(start.node);
    while let Some(id) = ancestor {
        if is_excluded(tree, id, except) {
            return Ok(Vec::new());
        }
        if id == root {
            break;
        }
        ancestor = tree.parent(id);
    }

    let len = tree.char_len(start.node);
    if end_offset > len {
        return Err(TreeError::OffsetOutOfRange {
            offset: end_offset,
            len,
        });
    }
    if end_offset <= start.offset {
        return Ok(Vec::new());
    }

    let mut node = start.node;
    if start.offset > 0 {
        node = tree.split_text(node, start.offset)?;
    }
    let selected = end_offset - start.offset;
    if selected < tree.char_len(node) {
        tree.split_text(node, selected)?;
    }
    Ok(vec![SelectedSegment::text(node, SplitPosition::Both)])
}

/// The selected tail of the start leaf, if it holds any characters
fn split_start(tree: &mut DocumentTree, start: LiveCoordinate) -> Result<Option<NodeId>, TreeError> {
    let len = tree.char_len(start.node);
    match start.offset {
        0 if len > 0 => Ok(Some(start.node)),
        offset if offset < len => tree.split_text(start.node, offset).map(Some),
        offset if offset == len => Ok(None),
        offset => Err(TreeError::OffsetOutOfRange { offset, len }),
    }
}

/// The selected head of the end leaf, if it holds any characters
fn split_end(tree: &mut DocumentTree, end: LiveCoordinate) -> Result<Option<NodeId>, TreeError> {
    let len = tree.char_len(end.node);
    match end.offset {
        0 => Ok(None),
        offset if offset < len => {
            tree.split_text(end.node, offset)?;
            Ok(Some(end.node))
        }
        offset if offset == len => Ok(Some(end.node)),
        offset => Err(TreeError::OffsetOutOfRange { offset, len }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(tree: &DocumentTree, segments: &[SelectedSegment]) -> Vec<String> {
        segments
            .iter()
            .map(|s| tree.text(s.node).unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_single_character_in_one_leaf() {
        let mut tree = DocumentTree::new("p");
        let root = tree.root();
        let leaf = tree.append_text(root, "abcde").unwrap();

        let segments = segment(
            &mut tree,
            root,
            LiveCoordinate::new(leaf, 2),
            LiveCoordinate::new(leaf, 3),
            &[],
        )
        .unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].split, SplitPosition::Both);
        assert_eq!(texts(&tree, &segments), vec!["c"]);
        assert_eq!(tree.children(root).len(), 3);
        assert_eq!(tree.text_content(root), "abcde");
    }

    #[test]
    fn test_whole_leaf_is_not_split() {
        let mut tree = DocumentTree::new("p");
        let root = tree.root();
        let leaf = tree.append_text(root, "abc").unwrap();

        let segments = segment(
            &mut tree,
            root,
            LiveCoordinate::new(leaf, 0),
            LiveCoordinate::new(leaf, 3),
            &[],
        )
        .unwrap();

        assert_eq!(segments, vec![SelectedSegment::text(leaf, SplitPosition::Both)]);
        assert_eq!(tree.children(root), &[leaf]);
    }

    #[test]
    fn test_spanning_leaves_marks_head_middle_tail() {
        let mut tree = DocumentTree::new("div");
        let root = tree.root();
        let a = tree.append_text(root, "one ").unwrap();
        let em = tree.append_element(root, "em").unwrap();
        tree.append_text(em, "two").unwrap();
        let c = tree.append_text(root, " three").unwrap();

        let segments = segment(
            &mut tree,
            root,
            LiveCoordinate::new(a, 1),
            LiveCoordinate::new(c, 3),
            &[],
        )
        .unwrap();

        let splits: Vec<_> = segments.iter().map(|s| s.split).collect();
        assert_eq!(
            splits,
            vec![SplitPosition::Head, SplitPosition::None, SplitPosition::Tail]
        );
        assert_eq!(texts(&tree, &segments), vec!["ne ", "two", " th"]);
        assert_eq!(tree.text_content(root), "one two three");
    }

    #[test]
    fn test_leaf_start_to_next_leaf_start() {
        let mut tree = DocumentTree::new("div");
        let root = tree.root();
        let a = tree.append_text(root, "first").unwrap();
        let b_el = tree.append_element(root, "b").unwrap();
        let b = tree.append_text(b_el, "second").unwrap();
        let c = tree.append_text(root, "third").unwrap();

        let segments = segment(
            &mut tree,
            root,
            LiveCoordinate::new(a, 0),
            LiveCoordinate::new(c, 0),
            &[],
        )
        .unwrap();

        assert_eq!(
            segments,
            vec![
                SelectedSegment::text(a, SplitPosition::Head),
                SelectedSegment::text(b, SplitPosition::None),
            ]
        );
    }

    #[test]
    fn test_excluded_subtree_is_skipped() {
        let mut tree = DocumentTree::new("div");
        let root = tree.root();
        let a = tree.append_text(root, "keep ").unwrap();
        let code = tree.append_element(root, "code").unwrap();
        tree.append_text(code, "skip").unwrap();
        let c = tree.append_text(root, " keep").unwrap();

        let segments = segment(
            &mut tree,
            root,
            LiveCoordinate::new(a, 0),
            LiveCoordinate::new(c, 5),
            &[Selector::parse("code")],
        )
        .unwrap();

        assert_eq!(texts(&tree, &segments), vec!["keep ", " keep"]);
    }

    #[test]
    fn test_range_inside_excluded_subtree_yields_nothing() {
        let mut tree = DocumentTree::new("div");
        let root = tree.root();
        let aside = tree.append_element(root, "aside").unwrap();
        tree.add_class(aside, "no-mark").unwrap();
        let a = tree.append_text(aside, "hidden").unwrap();
        let b = tree.append_text(aside, " too").unwrap();
        let except = [Selector::parse(".no-mark")];

        let across = segment(
            &mut tree,
            root,
            LiveCoordinate::new(a, 1),
            LiveCoordinate::new(b, 2),
            &except,
        )
        .unwrap();
        let single = segment(
            &mut tree,
            root,
            LiveCoordinate::new(a, 1),
            LiveCoordinate::new(a, 4),
            &except,
        )
        .unwrap();

        assert!(across.is_empty());
        assert!(single.is_empty());
        assert_eq!(tree.children(aside), &[a, b]);
    }

    #[test]
    fn test_excluded_start_keeps_later_leaves() {
        let mut tree = DocumentTree::new("div");
        let root = tree.root();
        let pre = tree.append_element(root, "pre").unwrap();
        let a = tree.append_text(pre, "code").unwrap();
        let b = tree.append_text(root, "prose").unwrap();

        let segments = segment(
            &mut tree,
            root,
            LiveCoordinate::new(a, 2),
            LiveCoordinate::new(b, 3),
            &[Selector::parse("pre")],
        )
        .unwrap();

        assert_eq!(segments, vec![SelectedSegment::text(b, SplitPosition::Tail)]);
        assert_eq!(texts(&tree, &segments), vec!["pro"]);
    }

    #[test]
    fn test_stale_offset_is_an_error_not_a_panic() {
        let mut tree = DocumentTree::new("p");
        let root = tree.root();
        let a = tree.append_text(root, "ab").unwrap();
        let b = tree.append_text(root, "cd").unwrap();

        let result = segment(
            &mut tree,
            root,
            LiveCoordinate::new(a, 5),
            LiveCoordinate::new(b, 1),
            &[],
        );

        assert_eq!(
            result,
            Err(TreeError::OffsetOutOfRange { offset: 5, len: 2 })
        );
    }
}
