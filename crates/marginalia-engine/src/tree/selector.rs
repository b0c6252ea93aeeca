use std::fmt;

use super::{DocumentTree, NodeId};

/// Simple selector used to exclude subtrees from highlighting.
///
/// Supported forms: `.class`, `#id` and a bare tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Class(String),
    Id(String),
    Tag(String),
}

impl Selector {
    pub fn parse(selector: &str) -> Self {
        let selector = selector.trim();
        if let Some(class) = selector.strip_prefix('.') {
            Selector::Class(class.to_string())
        } else if let Some(id) = selector.strip_prefix('#') {
            Selector::Id(id.to_string())
        } else {
            Selector::Tag(selector.to_string())
        }
    }

    /// Whether the element `node` matches; text leaves never match
    pub fn matches(&self, tree: &DocumentTree, node: NodeId) -> bool {
        let Some(tag) = tree.tag_name(node) else {
            return false;
        };
        match self {
            Selector::Class(class) => tree.has_class(node, class),
            Selector::Id(id) => tree.attr(node, "id") == Some(id.as_str()),
            Selector::Tag(name) => tag.eq_ignore_ascii_case(name),
        }
    }
}

impl From<&str> for Selector {
    fn from(selector: &str) -> Self {
        Self::parse(selector)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Class(class) => write!(f, ".{class}"),
            Selector::Id(id) => write!(f, "#{id}"),
            Selector::Tag(tag) => f.write_str(tag),
        }
    }
}

/// Whether any selector in `selectors` matches `node`
pub fn is_excluded(tree: &DocumentTree, node: NodeId, selectors: &[Selector]) -> bool {
    selectors.iter().any(|s| s.matches(tree, node))
}
