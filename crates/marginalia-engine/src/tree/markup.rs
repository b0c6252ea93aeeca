use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{DocumentTree, ElementData, NodeId, NodeKind, TreeError};

/// Serializable description of a subtree.
///
/// A bare JSON string is a text leaf; an object is an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Text(String),
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attrs: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        classes: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeSpec>,
    },
}

impl DocumentTree {
    /// Build a tree whose root is the element described by `spec`
    pub fn from_spec(spec: &NodeSpec) -> Result<Self, TreeError> {
        let NodeSpec::Element {
            tag,
            attrs,
            classes,
            children,
        } = spec
        else {
            return Err(TreeError::RootNotElement);
        };

        let mut tree = DocumentTree::new(tag);
        let root = tree.root();
        if let NodeKind::Element(data) = &mut tree.nodes[root.0].kind {
            data.attrs = attrs.clone();
            data.classes = classes.clone();
        }
        for child in children {
            tree.append_spec(root, child)?;
        }
        Ok(tree)
    }

    /// Append the subtree described by `spec` under `parent`
    pub fn append_spec(&mut self, parent: NodeId, spec: &NodeSpec) -> Result<NodeId, TreeError> {
        match spec {
            NodeSpec::Text(text) => self.append_text(parent, text),
            NodeSpec::Element {
                tag,
                attrs,
                classes,
                children,
            } => {
                let id = self.push(NodeKind::Element(ElementData {
                    tag: tag.clone(),
                    attrs: attrs.clone(),
                    classes: classes.clone(),
                }));
                self.append_child(parent, id)?;
                for child in children {
                    self.append_spec(id, child)?;
                }
                Ok(id)
            }
        }
    }

    /// Describe the subtree rooted at `id`
    pub fn to_spec(&self, id: NodeId) -> Option<NodeSpec> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(NodeSpec::Text(text.clone())),
            NodeKind::Element(data) => Some(NodeSpec::Element {
                tag: data.tag.clone(),
                attrs: data.attrs.clone(),
                classes: data.classes.clone(),
                children: self
                    .children(id)
                    .iter()
                    .filter_map(|child| self.to_spec(*child))
                    .collect(),
            }),
        }
    }

    /// Render the subtree rooted at `id` as HTML-like markup.
    ///
    /// Empty text leaves render as nothing; `class` comes first, other attributes
    /// follow in name order.
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => out.push_str(&html_escape::encode_text(text)),
            Some(NodeKind::Element(data)) => {
                out.push('<');
                out.push_str(&data.tag);
                if !data.classes.is_empty() {
                    out.push_str(" class=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(
                        &data.classes.join(" "),
                    ));
                    out.push('"');
                }
                for (name, value) in &data.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                for child in self.children(id) {
                    self.write_markup(*child, out);
                }
                out.push_str("</");
                out.push_str(&data.tag);
                out.push('>');
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_spec_builds_nested_tree() {
        let spec: NodeSpec = serde_json::from_value(json!({
            "tag": "article",
            "children": [
                {"tag": "p", "classes": ["lead"], "children": ["Hello ", {"tag": "em", "children": ["there"]}]},
                "tail"
            ]
        }))
        .unwrap();

        let tree = DocumentTree::from_spec(&spec).unwrap();

        assert_eq!(tree.text_content(tree.root()), "Hello theretail");
        assert_eq!(tree.query_all(tree.root(), "em").len(), 1);
        assert_eq!(tree.to_spec(tree.root()), Some(spec));
    }

    #[test]
    fn test_from_spec_rejects_text_root() {
        let spec = NodeSpec::Text("loose".to_string());
        assert_eq!(
            DocumentTree::from_spec(&spec).unwrap_err(),
            TreeError::RootNotElement
        );
    }

    #[test]
    fn test_markup_escapes_text_and_orders_attributes() {
        let mut tree = DocumentTree::new("p");
        let root = tree.root();
        let span = tree.append_element(root, "span").unwrap();
        tree.set_attr(span, "title", "a \"quote\"").unwrap();
        tree.set_attr(span, "data-x", "1").unwrap();
        tree.add_class(span, "hl").unwrap();
        tree.append_text(span, "1 < 2").unwrap();

        assert_eq!(
            tree.to_markup(root),
            "<p><span class=\"hl\" data-x=\"1\" title=\"a &quot;quote&quot;\">1 &lt; 2</span></p>"
        );
    }
}
