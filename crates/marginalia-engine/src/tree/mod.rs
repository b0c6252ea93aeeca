//! Minimal mutable document tree the highlighter operates on.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Nodes that get
//! detached (replaced, unwrapped) stay in the arena but are no longer reachable
//! from the root, so every query starts from a scope node and walks down.

pub mod markup;
pub mod selector;

use std::collections::BTreeMap;

use crate::models::LiveCoordinate;

pub use markup::NodeSpec;
pub use selector::Selector;

/// Handle to a node stored in a [`DocumentTree`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Element payload: tag name, attributes and the ordered class list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementData {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),
    #[error("Node {0:?} is not a text leaf")]
    NotText(NodeId),
    #[error("Node {0:?} is not an element")]
    NotElement(NodeId),
    #[error("Node {0:?} is not attached to a parent")]
    Detached(NodeId),
    #[error("Moving {node:?} under {parent:?} would create a cycle")]
    Cycle { node: NodeId, parent: NodeId },
    #[error("Offset {offset} out of range for text of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },
    #[error("Root node must be an element")]
    RootNotElement,
}

/// Host selection: `anchor` is where the gesture started, `focus` where it ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: LiveCoordinate,
    pub focus: LiveCoordinate,
}

impl Selection {
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Arena-backed element/text tree with a single host selection
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<Node>,
    root: NodeId,
    selection: Option<Selection>,
}

impl DocumentTree {
    /// Create a tree holding a single empty root element
    pub fn new(root_tag: &str) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            selection: None,
        };
        tree.root = tree.create_element(root_tag);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_string(),
            ..ElementData::default()
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    /// Create an element and append it to `parent`
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, TreeError> {
        let id = self.create_element(tag);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Create a text leaf and append it to `parent`
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, TreeError> {
        let id = self.create_text(text);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Append `child` as last child of `parent`, detaching it from any previous parent
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.element(parent)?;
        self.node(child)?;
        if self.contains(child, parent) {
            return Err(TreeError::Cycle {
                node: child,
                parent,
            });
        }
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Replace `old` in its parent by the ordered `fragment`.
    ///
    /// Fragment nodes are detached from wherever they currently live first.
    /// `old` may itself appear in the fragment.
    pub fn replace_with(&mut self, old: NodeId, fragment: &[NodeId]) -> Result<(), TreeError> {
        let parent = self.node(old)?.parent.ok_or(TreeError::Detached(old))?;
        for &node in fragment {
            self.node(node)?;
            if self.contains(node, parent) {
                return Err(TreeError::Cycle { node, parent });
            }
        }
        for &node in fragment {
            if node != old {
                self.detach(node);
            }
        }
        let index = self.index_in_parent(old).ok_or(TreeError::Detached(old))?;
        self.nodes[parent.0]
            .children
            .splice(index..=index, fragment.iter().copied());
        self.nodes[old.0].parent = None;
        for &node in fragment {
            self.nodes[node.0].parent = Some(parent);
        }
        Ok(())
    }

    /// Remove `id` from its parent; a no-op for detached nodes
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get(id.0).and_then(|n| n.parent) else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != id);
        self.nodes[id.0].parent = None;
    }

    /// Split a text leaf at a character offset.
    ///
    /// The original leaf keeps the head, the returned new leaf holds the tail and is
    /// inserted as its next sibling (when the leaf is attached).
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId, TreeError> {
        let text = self.text(id).ok_or(TreeError::NotText(id))?;
        let len = text.chars().count();
        if offset > len {
            return Err(TreeError::OffsetOutOfRange { offset, len });
        }
        let split_at = byte_index(text, offset);
        let tail = text[split_at..].to_string();
        let head = text[..split_at].to_string();

        self.nodes[id.0].kind = NodeKind::Text(head);
        let new_leaf = self.create_text(&tail);
        if let Some(parent) = self.nodes[id.0].parent {
            let index = self.index_in_parent(id).ok_or(TreeError::Detached(id))?;
            self.nodes[parent.0].children.insert(index + 1, new_leaf);
            self.nodes[new_leaf.0].parent = Some(parent);
        }
        Ok(new_leaf)
    }

    /// Copy a node without its children (attributes and classes included)
    pub fn clone_shallow(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        let kind = self.node(id)?.kind.clone();
        Ok(self.push(kind))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_)))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element(_)))
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element(data) => Some(&data.tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Direct text of a text leaf
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    /// Length in characters of a text leaf, zero for elements
    pub fn char_len(&self, id: NodeId) -> usize {
        self.text(id).map_or(0, |t| t.chars().count())
    }

    /// Concatenated text of every leaf below `id`, in document order
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_leaves(id)
            .filter_map(|leaf| self.text(leaf))
            .collect()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map_or(&[], |n| n.children.as_slice())
    }

    /// Siblings that precede `id` inside its parent
    pub fn previous_siblings(&self, id: NodeId) -> &[NodeId] {
        match (self.parent(id), self.index_in_parent(id)) {
            (Some(parent), Some(index)) => &self.children(parent)[..index],
            _ => &[],
        }
    }

    /// Siblings that follow `id` inside its parent
    pub fn next_siblings(&self, id: NodeId) -> &[NodeId] {
        match (self.parent(id), self.index_in_parent(id)) {
            (Some(parent), Some(index)) => &self.children(parent)[index + 1..],
            _ => &[],
        }
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.previous_siblings(id).last().copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.next_siblings(id).first().copied()
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element(data) => data.attrs.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), TreeError> {
        self.element_mut(id)?
            .attrs
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<Option<String>, TreeError> {
        Ok(self.element_mut(id)?.attrs.remove(name))
    }

    pub fn classes(&self, id: NodeId) -> &[String] {
        match self.kind(id) {
            Some(NodeKind::Element(data)) => &data.classes,
            _ => &[],
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).iter().any(|c| c == class)
    }

    /// Add a class unless already present
    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<(), TreeError> {
        let data = self.element_mut(id)?;
        if !class.is_empty() && !data.classes.iter().any(|c| c == class) {
            data.classes.push(class.to_string());
        }
        Ok(())
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<(), TreeError> {
        self.element_mut(id)?.classes.retain(|c| c != class);
        Ok(())
    }

    pub fn clear_classes(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.element_mut(id)?.classes.clear();
        Ok(())
    }

    /// Whether `node` is `ancestor` or lives somewhere below it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Pre-order walk of `scope` and everything below it
    pub fn descendants(&self, scope: NodeId) -> Descendants<'_> {
        let stack = if self.nodes.get(scope.0).is_some() {
            vec![scope]
        } else {
            Vec::new()
        };
        Descendants { tree: self, stack }
    }

    /// Text leaves below `scope` in document order
    pub fn text_leaves(&self, scope: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(scope).filter(|id| self.is_text(*id))
    }

    /// Elements strictly below `scope` whose tag matches, in document order.
    ///
    /// Tag comparison ignores ASCII case.
    pub fn query_all(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .skip(1)
            .filter(|id| {
                self.tag_name(*id)
                    .is_some_and(|t| t.eq_ignore_ascii_case(tag))
            })
            .collect()
    }

    /// Pre-order position of `id` within `scope`
    pub fn document_position(&self, scope: NodeId, id: NodeId) -> Option<usize> {
        self.descendants(scope).position(|n| n == id)
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn set_selection(&mut self, anchor: LiveCoordinate, focus: LiveCoordinate) {
        self.selection = Some(Selection { anchor, focus });
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes.get_mut(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn element(&self, id: NodeId) -> Result<&ElementData, TreeError> {
        match &self.node(id)?.kind {
            NodeKind::Element(data) => Ok(data),
            NodeKind::Text(_) => Err(TreeError::NotElement(id)),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, TreeError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(data) => Ok(data),
            NodeKind::Text(_) => Err(TreeError::NotElement(id)),
        }
    }

    fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }
}

/// Explicit-stack pre-order iterator returned by [`DocumentTree::descendants`]
pub struct Descendants<'a> {
    tree: &'a DocumentTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Byte index of the `char_offset`-th character, or the string length past the end
pub(crate) fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph(text: &str) -> (DocumentTree, NodeId, NodeId) {
        let mut tree = DocumentTree::new("body");
        let p = tree.append_element(tree.root(), "p").unwrap();
        let leaf = tree.append_text(p, text).unwrap();
        (tree, p, leaf)
    }

    #[test]
    fn test_split_text_inserts_tail_after_head() {
        let (mut tree, p, leaf) = paragraph("Hello World");

        let tail = tree.split_text(leaf, 5).unwrap();

        assert_eq!(tree.text(leaf), Some("Hello"));
        assert_eq!(tree.text(tail), Some(" World"));
        assert_eq!(tree.children(p), &[leaf, tail]);
        assert_eq!(tree.text_content(p), "Hello World");
    }

    #[test]
    fn test_split_text_counts_characters_not_bytes() {
        let (mut tree, _, leaf) = paragraph("héllo");

        let tail = tree.split_text(leaf, 2).unwrap();

        assert_eq!(tree.text(leaf), Some("hé"));
        assert_eq!(tree.text(tail), Some("llo"));
    }

    #[test]
    fn test_split_text_rejects_offset_past_end() {
        let (mut tree, _, leaf) = paragraph("abc");

        assert_eq!(
            tree.split_text(leaf, 4),
            Err(TreeError::OffsetOutOfRange { offset: 4, len: 3 })
        );
    }

    #[test]
    fn test_replace_with_fragment_keeps_order() {
        let (mut tree, p, leaf) = paragraph("middle");
        let before = tree.append_text(p, "after").unwrap();
        let a = tree.create_text("x");
        let b = tree.create_element("span");

        tree.replace_with(leaf, &[a, b]).unwrap();

        assert_eq!(tree.children(p), &[a, b, before]);
        assert_eq!(tree.parent(leaf), None);
        assert_eq!(tree.parent(b), Some(p));
    }

    #[test]
    fn test_replace_with_rejects_cycles() {
        let (mut tree, p, leaf) = paragraph("text");
        let body = tree.root();

        assert_eq!(
            tree.replace_with(leaf, &[body]),
            Err(TreeError::Cycle {
                node: body,
                parent: p
            })
        );
    }

    #[test]
    fn test_query_all_is_preorder_and_case_insensitive() {
        let mut tree = DocumentTree::new("body");
        let root = tree.root();
        let outer = tree.append_element(root, "DIV").unwrap();
        let inner = tree.append_element(outer, "div").unwrap();
        let last = tree.append_element(root, "div").unwrap();

        assert_eq!(tree.query_all(root, "div"), vec![outer, inner, last]);
        assert!(tree.query_all(outer, "body").is_empty());
    }

    #[test]
    fn test_detached_nodes_are_invisible_from_root() {
        let (mut tree, p, leaf) = paragraph("gone");

        tree.detach(p);

        assert_eq!(tree.text_content(tree.root()), "");
        assert!(!tree.contains(tree.root(), leaf));
    }

    #[test]
    fn test_classes_are_unique_and_ordered() {
        let (mut tree, p, _) = paragraph("x");

        tree.add_class(p, "b").unwrap();
        tree.add_class(p, "a").unwrap();
        tree.add_class(p, "b").unwrap();
        assert_eq!(tree.classes(p), &["b".to_string(), "a".to_string()]);

        tree.remove_class(p, "b").unwrap();
        assert!(!tree.has_class(p, "b"));
        assert!(tree.has_class(p, "a"));
    }

    #[test]
    fn test_element_only_operations_reject_text() {
        let (mut tree, _, leaf) = paragraph("x");

        assert_eq!(
            tree.set_attr(leaf, "id", "nope"),
            Err(TreeError::NotElement(leaf))
        );
        assert_eq!(tree.append_text(leaf, "y"), Err(TreeError::NotElement(leaf)));
    }
}
