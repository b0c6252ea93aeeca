use uuid::Uuid;

use crate::models::{LiveRange, SelectedSegment};
use crate::tree::{DocumentTree, NodeId};

/// What happened to a wrap node that survived a removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveUpdate {
    /// The removed id was primary; a hidden id got promoted
    IdUpdate,
    /// The removed id was only hidden on this node
    ExtraUpdate,
}

type SegmentsHook = Box<dyn Fn(Uuid, Vec<SelectedSegment>) -> Vec<SelectedSegment>>;
type WrapNodeHook = Box<dyn Fn(&mut DocumentTree, Uuid, NodeId)>;
type RecordInfoHook = Box<dyn Fn(&LiveRange, &DocumentTree, NodeId) -> Option<serde_json::Value>>;
type RemoveUpdateHook = Box<dyn Fn(Uuid, NodeId, RemoveUpdate)>;

/// Optional integration points around rendering, serializing and removal
#[derive(Default)]
pub struct Hooks {
    selected_segments: Option<SegmentsHook>,
    wrap_node: Option<WrapNodeHook>,
    record_info: Option<RecordInfoHook>,
    remove_update: Option<RemoveUpdateHook>,
}

impl Hooks {
    /// Filter or replace the segments of a range before they are wrapped
    pub fn on_selected_segments(
        &mut self,
        hook: impl Fn(Uuid, Vec<SelectedSegment>) -> Vec<SelectedSegment> + 'static,
    ) {
        self.selected_segments = Some(Box::new(hook));
    }

    /// Decorate every wrap node produced for a range
    pub fn on_wrap_node(&mut self, hook: impl Fn(&mut DocumentTree, Uuid, NodeId) + 'static) {
        self.wrap_node = Some(Box::new(hook));
    }

    /// Produce the opaque `extra` payload stored on a serialized anchor
    pub fn on_record_info(
        &mut self,
        hook: impl Fn(&LiveRange, &DocumentTree, NodeId) -> Option<serde_json::Value> + 'static,
    ) {
        self.record_info = Some(Box::new(hook));
    }

    pub fn on_remove_update(&mut self, hook: impl Fn(Uuid, NodeId, RemoveUpdate) + 'static) {
        self.remove_update = Some(Box::new(hook));
    }

    pub(crate) fn selected_segments(
        &self,
        id: Uuid,
        segments: Vec<SelectedSegment>,
    ) -> Vec<SelectedSegment> {
        match &self.selected_segments {
            Some(hook) => hook(id, segments),
            None => segments,
        }
    }

    pub(crate) fn wrap_node(&self, tree: &mut DocumentTree, id: Uuid, node: NodeId) {
        if let Some(hook) = &self.wrap_node {
            hook(tree, id, node);
        }
    }

    pub(crate) fn record_info(
        &self,
        range: &LiveRange,
        tree: &DocumentTree,
        root: NodeId,
    ) -> Option<serde_json::Value> {
        self.record_info.as_ref().and_then(|hook| hook(range, tree, root))
    }

    pub(crate) fn remove_update(&self, id: Uuid, node: NodeId, update: RemoveUpdate) {
        if let Some(hook) = &self.remove_update {
            hook(id, node, update);
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("selected_segments", &self.selected_segments.is_some())
            .field("wrap_node", &self.wrap_node.is_some())
            .field("record_info", &self.record_info.is_some())
            .field("remove_update", &self.remove_update.is_some())
            .finish()
    }
}
