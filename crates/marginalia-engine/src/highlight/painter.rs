use tracing::debug;
use uuid::Uuid;

use super::error::HighlightError;
use super::hooks::{Hooks, RemoveUpdate};
use super::segment::segment;
use super::wrap;
use crate::models::{LiveRange, SelectedSegment, SplitPosition};
use crate::tree::{DocumentTree, NodeId, Selector, TreeError};

/// Applies and removes wrap nodes.
///
/// Because highlights may overlap, a segment is wrapped in one of three ways:
/// - a brand new wrap when the leaf is not inside a wrap yet,
/// - a partial split when the leaf only covers part of an existing wrap,
/// - an id-only update when the leaf covers an existing wrap entirely.
///
/// The painter holds no highlight state; everything it needs lives on the tree.
#[derive(Debug, Clone)]
pub struct Painter {
    wrap_tag: String,
    except_selectors: Vec<Selector>,
    default_class_name: String,
}

impl Painter {
    pub fn new(
        wrap_tag: impl Into<String>,
        except_selectors: Vec<Selector>,
        default_class_name: impl Into<String>,
    ) -> Self {
        Self {
            wrap_tag: wrap_tag.into(),
            except_selectors,
            default_class_name: default_class_name.into(),
        }
    }

    pub fn wrap_tag(&self) -> &str {
        &self.wrap_tag
    }

    /// Segment a frozen range and wrap every segment.
    ///
    /// Returns the wrap nodes carrying the range's id; an empty list means nothing
    /// was rendered.
    pub fn highlight_range(
        &self,
        tree: &mut DocumentTree,
        root: NodeId,
        range: &LiveRange,
        class_names: &[String],
        hooks: &Hooks,
    ) -> Result<Vec<NodeId>, HighlightError> {
        if !range.is_frozen() {
            return Err(HighlightError::RangeNotFrozen(range.id));
        }

        let segments = segment(tree, root, range.start, range.end, &self.except_selectors)?;
        let segments = hooks.selected_segments(range.id, segments);
        debug!(id = %range.id, segments = segments.len(), "painting range");

        let mut wraps = Vec::with_capacity(segments.len());
        for selected in &segments {
            let node = self.wrap(tree, selected, range.id, class_names)?;
            hooks.wrap_node(tree, range.id, node);
            wraps.push(node);
        }
        Ok(wraps)
    }

    /// Wrap one segment, picking the strategy from the leaf's parent
    fn wrap(
        &self,
        tree: &mut DocumentTree,
        selected: &SelectedSegment,
        id: Uuid,
        class_names: &[String],
    ) -> Result<NodeId, TreeError> {
        let parent = tree
            .parent(selected.node)
            .ok_or(TreeError::Detached(selected.node))?;

        if !wrap::is_wrap_node(tree, parent) {
            return self.wrap_new(tree, selected, id, class_names);
        }

        let has_remainder = tree
            .previous_siblings(selected.node)
            .iter()
            .chain(tree.next_siblings(selected.node))
            .any(|sibling| !tree.text_content(*sibling).is_empty());
        if has_remainder {
            self.wrap_partial(tree, selected, parent, id, class_names)
        } else {
            self.wrap_overlap(tree, parent, id, class_names)
        }
    }

    fn wrap_new(
        &self,
        tree: &mut DocumentTree,
        selected: &SelectedSegment,
        id: Uuid,
        class_names: &[String],
    ) -> Result<NodeId, TreeError> {
        let node = tree.create_element(&self.wrap_tag);
        self.apply_classes(tree, node, class_names)?;
        tree.replace_with(selected.node, &[node])?;
        tree.append_child(node, selected.node)?;
        wrap::set_primary_id(tree, node, id)?;
        wrap::set_split(tree, node, selected.split)?;
        wrap::set_extra_ids(tree, node, &[])?;
        debug!(%id, ?node, "wrapped new node");
        Ok(node)
    }

    /// Replace `parent` by `[before-shell, new wrap, after-shell]`.
    ///
    /// The shells are shallow clones of the old wrap and keep its identity; the new
    /// wrap inherits the old primary and hidden ids as its own hidden ids.
    fn wrap_partial(
        &self,
        tree: &mut DocumentTree,
        selected: &SelectedSegment,
        parent: NodeId,
        id: Uuid,
        class_names: &[String],
    ) -> Result<NodeId, TreeError> {
        let before = tree.previous_siblings(selected.node).to_vec();
        let after = tree.next_siblings(selected.node).to_vec();

        let mut inherited: Vec<Uuid> = wrap::primary_id(tree, parent).into_iter().collect();
        inherited.extend(wrap::extra_ids(tree, parent));

        let node = tree.create_element(&self.wrap_tag);
        wrap::set_primary_id(tree, node, id)?;
        wrap::set_extra_ids(tree, node, &inherited)?;
        self.apply_classes(tree, node, class_names)?;

        let mut fragment = Vec::with_capacity(3);
        let head_split = self.shell_for(tree, parent, &before, &mut fragment)?;
        fragment.push(node);
        let tail_split = self.shell_for(tree, parent, &after, &mut fragment)?;

        tree.replace_with(parent, &fragment)?;
        tree.append_child(node, selected.node)?;
        wrap::set_split(tree, node, SplitPosition::from_cuts(head_split, tail_split))?;
        debug!(%id, ?node, head_split, tail_split, "split existing wrap");
        Ok(node)
    }

    /// Move `remainder` into a clone of `parent` when it holds any text
    fn shell_for(
        &self,
        tree: &mut DocumentTree,
        parent: NodeId,
        remainder: &[NodeId],
        fragment: &mut Vec<NodeId>,
    ) -> Result<bool, TreeError> {
        if remainder.iter().all(|n| tree.text_content(*n).is_empty()) {
            return Ok(false);
        }
        let shell = tree.clone_shallow(parent)?;
        for &node in remainder {
            tree.append_child(shell, node)?;
        }
        fragment.push(shell);
        Ok(true)
    }

    /// Take over a wrap that the segment covers entirely: ids only, no restructuring
    fn wrap_overlap(
        &self,
        tree: &mut DocumentTree,
        parent: NodeId,
        id: Uuid,
        class_names: &[String],
    ) -> Result<NodeId, TreeError> {
        let mut hidden: Vec<Uuid> = wrap::primary_id(tree, parent).into_iter().collect();
        hidden.extend(wrap::extra_ids(tree, parent));

        tree.clear_classes(parent)?;
        self.apply_classes(tree, parent, class_names)?;
        wrap::set_primary_id(tree, parent, id)?;
        wrap::set_extra_ids(tree, parent, &hidden)?;
        debug!(%id, node = ?parent, hidden = hidden.len(), "covered existing wrap");
        Ok(parent)
    }

    fn apply_classes(
        &self,
        tree: &mut DocumentTree,
        node: NodeId,
        class_names: &[String],
    ) -> Result<(), TreeError> {
        if class_names.is_empty() {
            return tree.add_class(node, &self.default_class_name);
        }
        for class in class_names {
            tree.add_class(node, class)?;
        }
        Ok(())
    }

    /// Every wrap node under `root`, in document order
    pub fn wrap_nodes(&self, tree: &DocumentTree, root: NodeId) -> Vec<NodeId> {
        tree.query_all(root, &self.wrap_tag)
            .into_iter()
            .filter(|node| wrap::is_wrap_node(tree, *node))
            .collect()
    }

    /// Wrap nodes whose primary or hidden ids include `id`
    pub fn wrap_nodes_by_id(&self, tree: &DocumentTree, root: NodeId, id: Uuid) -> Vec<NodeId> {
        self.wrap_nodes(tree, root)
            .into_iter()
            .filter(|node| wrap::carries_id(tree, *node, id))
            .collect()
    }

    /// Remove highlight `id` everywhere under `root`.
    ///
    /// Wraps where it is the only id are unwrapped; wraps where it is primary promote
    /// their first hidden id, re-adopting that highlight's classes from another live
    /// wrap or, failing that, from `promoted_classes`; wraps where it is hidden just
    /// forget it. Returns whether any node changed.
    pub fn remove_highlight(
        &self,
        tree: &mut DocumentTree,
        root: NodeId,
        id: Uuid,
        hooks: &Hooks,
        promoted_classes: impl Fn(Uuid) -> Option<Vec<String>>,
    ) -> bool {
        let wraps = self.wrap_nodes(tree, root);
        let mut to_remove = Vec::new();
        let mut id_update = Vec::new();
        let mut extra_update = Vec::new();

        for &node in &wraps {
            let primary = wrap::primary_id(tree, node);
            let hidden = wrap::extra_ids(tree, node);
            if primary == Some(id) && hidden.is_empty() {
                to_remove.push(node);
            } else if primary == Some(id) {
                id_update.push(node);
            } else if hidden.contains(&id) {
                extra_update.push(node);
            }
        }

        for &node in &id_update {
            let mut hidden = wrap::extra_ids(tree, node);
            let promoted = hidden.remove(0);
            let classes = wraps
                .iter()
                .find(|other| **other != node && wrap::primary_id(tree, **other) == Some(promoted))
                .map(|other| tree.classes(*other).to_vec())
                .or_else(|| promoted_classes(promoted));

            let updated = (|| -> Result<(), TreeError> {
                if let Some(classes) = &classes {
                    tree.clear_classes(node)?;
                    self.apply_classes(tree, node, classes)?;
                }
                wrap::set_primary_id(tree, node, promoted)?;
                wrap::set_extra_ids(tree, node, &hidden)
            })();
            if let Err(error) = updated {
                debug!(%error, ?node, "failed to promote hidden highlight");
            }
            hooks.remove_update(id, node, RemoveUpdate::IdUpdate);
        }

        for &node in &extra_update {
            let hidden: Vec<Uuid> = wrap::extra_ids(tree, node)
                .into_iter()
                .filter(|hidden| *hidden != id)
                .collect();
            if let Err(error) = wrap::set_extra_ids(tree, node, &hidden) {
                debug!(%error, ?node, "failed to drop hidden highlight");
            }
            hooks.remove_update(id, node, RemoveUpdate::ExtraUpdate);
        }

        for &node in &to_remove {
            unwrap_node(tree, node);
        }

        debug!(
            %id,
            removed = to_remove.len(),
            promoted = id_update.len(),
            forgotten = extra_update.len(),
            "removed highlight"
        );
        !(to_remove.is_empty() && id_update.is_empty() && extra_update.is_empty())
    }

    /// Unwrap every wrap node under `root`; returns how many were removed
    pub fn remove_all_highlights(&self, tree: &mut DocumentTree, root: NodeId) -> usize {
        let wraps = self.wrap_nodes(tree, root);
        for &node in &wraps {
            unwrap_node(tree, node);
        }
        wraps.len()
    }
}

/// Replace a wrap node by its own children, keeping the text in place
fn unwrap_node(tree: &mut DocumentTree, node: NodeId) {
    let children = tree.children(node).to_vec();
    if let Err(error) = tree.replace_with(node, &children) {
        debug!(%error, ?node, "failed to unwrap node");
    }
}
