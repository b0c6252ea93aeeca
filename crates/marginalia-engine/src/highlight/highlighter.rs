use tracing::{debug, info};
use uuid::Uuid;

use super::cache::AnnotationCache;
use super::capture::{capture_selection, serialize};
use super::error::{Diagnostics, HighlightError};
use super::events::{CreateOrigin, EventBus, EventKind, HighlightEvent, SubscriptionId};
use super::hooks::Hooks;
use super::painter::Painter;
use super::resolve::resolve;
use super::wrap;
use crate::models::{Anchor, LiveRange, NodeAddress};
use crate::tree::{DocumentTree, NodeId, Selector, TreeError};

pub const DEFAULT_WRAP_TAG: &str = "marginalia-mark";
pub const DEFAULT_CLASS_NAME: &str = "marginalia-default";

#[derive(Debug, Clone, PartialEq)]
pub struct HighlighterOptions {
    /// Container highlights live under; the tree root when unset
    pub root: Option<NodeId>,
    pub wrap_tag: String,
    pub except_selectors: Vec<Selector>,
    /// Applied to wraps of highlights created without class names
    pub default_class_name: String,
    /// Log diagnostics at warn level instead of debug
    pub verbose: bool,
}

impl Default for HighlighterOptions {
    fn default() -> Self {
        Self {
            root: None,
            wrap_tag: DEFAULT_WRAP_TAG.to_string(),
            except_selectors: Vec::new(),
            default_class_name: DEFAULT_CLASS_NAME.to_string(),
            verbose: false,
        }
    }
}

/// Pointer input forwarded by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    PointerOver { target: NodeId },
    /// End of a selection gesture
    PointerEnd,
    PointerTap { target: NodeId },
}

/// Owns highlight state for one document: the anchor cache, event listeners,
/// diagnostics and hooks.
///
/// The tree itself is owned by the host and passed into every call.
#[derive(Debug)]
pub struct Highlighter {
    options: HighlighterOptions,
    painter: Painter,
    cache: AnnotationCache,
    events: EventBus,
    diagnostics: Diagnostics,
    hooks: Hooks,
    hover_id: Option<Uuid>,
    running: bool,
}

impl Highlighter {
    pub fn new(options: HighlighterOptions) -> Self {
        let painter = Painter::new(
            options.wrap_tag.clone(),
            options.except_selectors.clone(),
            options.default_class_name.clone(),
        );
        Self {
            diagnostics: Diagnostics::new(options.verbose),
            options,
            painter,
            cache: AnnotationCache::new(),
            events: EventBus::new(),
            hooks: Hooks::default(),
            hover_id: None,
            running: false,
        }
    }

    pub fn options(&self) -> &HighlighterOptions {
        &self.options
    }

    pub fn cache(&self) -> &AnnotationCache {
        &self.cache
    }

    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    /// Start turning finished selection gestures into SELECT events
    pub fn run(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop listening and tear down every highlight
    pub fn dispose(&mut self, tree: &mut DocumentTree) {
        self.stop();
        self.remove_all(tree);
        self.hover_id = None;
        info!("highlighter disposed");
    }

    pub fn on(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&HighlightEvent) + 'static,
    ) -> SubscriptionId {
        self.events.on(kind, listener)
    }

    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.events.off(id)
    }

    pub fn on_diagnostic(&mut self, handler: impl FnMut(&HighlightError) + 'static) {
        self.diagnostics.subscribe(handler);
    }

    fn root(&self, tree: &DocumentTree) -> NodeId {
        self.options.root.unwrap_or_else(|| tree.root())
    }

    /// Dispatch pointer input.
    ///
    /// Returns the captured range for a finished selection gesture while running.
    pub fn handle_input(&mut self, tree: &DocumentTree, input: InputEvent) -> Option<LiveRange> {
        match input {
            InputEvent::PointerEnd => {
                if !self.running {
                    return None;
                }
                let range = self.capture_selection(tree)?;
                self.events.emit(&HighlightEvent::Select {
                    range: range.clone(),
                });
                Some(range)
            }
            InputEvent::PointerOver { target } => {
                self.handle_hover(tree, target);
                None
            }
            InputEvent::PointerTap { target } => {
                if let Some(id) = self.id_for_node(tree, target) {
                    self.events.emit(&HighlightEvent::Click { id });
                }
                None
            }
        }
    }

    /// HOVER_OUT for the previous highlight always precedes HOVER for a new one
    fn handle_hover(&mut self, tree: &DocumentTree, target: NodeId) {
        let hovered = self.id_for_node(tree, target);
        if hovered == self.hover_id {
            return;
        }
        if let Some(previous) = self.hover_id.take() {
            self.events.emit(&HighlightEvent::HoverOut { id: previous });
        }
        if let Some(id) = hovered {
            self.hover_id = Some(id);
            self.events.emit(&HighlightEvent::Hover { id });
        }
    }

    /// Read the current host selection under the root without emitting anything
    pub fn capture_selection(&self, tree: &DocumentTree) -> Option<LiveRange> {
        capture_selection(tree, self.root(tree))
    }

    /// Serialize, paint and cache a freshly captured range.
    ///
    /// Returns `Ok(None)` when nothing could be painted; the reason goes to the
    /// diagnostics channel and no CREATE event is emitted.
    pub fn from_range(
        &mut self,
        tree: &mut DocumentTree,
        range: &mut LiveRange,
        class_names: &[String],
    ) -> Result<Option<Anchor>, HighlightError> {
        let root = self.root(tree);
        let anchor = serialize(tree, range, root, class_names, &self.hooks)?;

        let wraps = match self
            .painter
            .highlight_range(tree, root, range, anchor.class_names(), &self.hooks)
        {
            Ok(wraps) => wraps,
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                self.diagnostics.report(&error);
                return Ok(None);
            }
        };
        if wraps.is_empty() {
            self.diagnostics
                .report(&HighlightError::EmptySelection { id: range.id });
            return Ok(None);
        }

        self.cache.save(anchor.clone());
        self.events.emit(&HighlightEvent::Create {
            sources: vec![anchor.clone()],
            origin: CreateOrigin::Input,
        });
        Ok(Some(anchor))
    }

    /// Re-render one stored anchor.
    ///
    /// Returns `None` and reports a diagnostic when it can no longer be rendered.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        &mut self,
        tree: &mut DocumentTree,
        start: NodeAddress,
        end: NodeAddress,
        text: &str,
        id: Uuid,
        class_names: &[String],
        extra: Option<serde_json::Value>,
    ) -> Option<Anchor> {
        let anchor = Anchor::new(start, end, text, id, class_names, extra);
        self.restore_sources(tree, vec![anchor]).into_iter().next()
    }

    /// Re-render a batch of stored anchors, returning those that rendered.
    ///
    /// Every anchor is cached, rendered or not; purging stale ones is up to the
    /// caller. A single CREATE event carries the rendered anchors.
    pub fn restore_sources(&mut self, tree: &mut DocumentTree, anchors: Vec<Anchor>) -> Vec<Anchor> {
        let root = self.root(tree);
        let mut rendered = Vec::with_capacity(anchors.len());

        for anchor in &anchors {
            match self.render_anchor(tree, root, anchor) {
                Ok(()) => rendered.push(anchor.clone()),
                Err(error) => self.diagnostics.report(&error),
            }
        }
        debug!(
            requested = anchors.len(),
            rendered = rendered.len(),
            "restored anchors"
        );

        self.cache.save_all(anchors);
        if !rendered.is_empty() {
            self.events.emit(&HighlightEvent::Create {
                sources: rendered.clone(),
                origin: CreateOrigin::Store,
            });
        }
        rendered
    }

    /// Like [`restore_sources`](Self::restore_sources) for raw storage payloads.
    ///
    /// Items that are not valid anchors are reported and skipped.
    pub fn restore_json(&mut self, tree: &mut DocumentTree, items: &[serde_json::Value]) -> Vec<Anchor> {
        let mut anchors = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<Anchor>(item.clone()) {
                Ok(anchor) => anchors.push(anchor),
                Err(error) => self
                    .diagnostics
                    .report(&HighlightError::SourceType(error.to_string())),
            }
        }
        self.restore_sources(tree, anchors)
    }

    fn render_anchor(
        &self,
        tree: &mut DocumentTree,
        root: NodeId,
        anchor: &Anchor,
    ) -> Result<(), HighlightError> {
        let range = resolve(tree, anchor, root)?;
        let wraps = self
            .painter
            .highlight_range(tree, root, &range, anchor.class_names(), &self.hooks)?;
        if wraps.is_empty() {
            return Err(HighlightError::SourceNoneRendered { id: anchor.id() });
        }
        Ok(())
    }

    /// Remove one highlight; returns whether the tree changed.
    ///
    /// REMOVE is emitted only when something changed. The anchor leaves the cache
    /// either way.
    pub fn remove(&mut self, tree: &mut DocumentTree, id: Uuid) -> bool {
        let root = self.root(tree);
        let cache = &self.cache;
        let changed = self
            .painter
            .remove_highlight(tree, root, id, &self.hooks, |promoted| {
                cache.class_names(&promoted)
            });
        self.cache.remove(&id);

        if changed {
            self.events.emit(&HighlightEvent::Remove { ids: vec![id] });
        }
        changed
    }

    /// Unwrap every highlight and empty the cache
    pub fn remove_all(&mut self, tree: &mut DocumentTree) {
        let root = self.root(tree);
        let unwrapped = self.painter.remove_all_highlights(tree, root);
        let mut ids = self.cache.remove_all();
        ids.sort();
        debug!(unwrapped, ids = ids.len(), "removed all highlights");

        if !ids.is_empty() {
            self.events.emit(&HighlightEvent::Remove { ids });
        }
    }

    /// Add `class` to the wraps of `id`, or to every wrap when `id` is `None`
    pub fn add_class(
        &self,
        tree: &mut DocumentTree,
        class: &str,
        id: Option<Uuid>,
    ) -> Result<(), TreeError> {
        for node in self.wrap_nodes(tree, id) {
            tree.add_class(node, class)?;
        }
        Ok(())
    }

    pub fn remove_class(
        &self,
        tree: &mut DocumentTree,
        class: &str,
        id: Option<Uuid>,
    ) -> Result<(), TreeError> {
        for node in self.wrap_nodes(tree, id) {
            tree.remove_class(node, class)?;
        }
        Ok(())
    }

    /// Primary id of the outermost wrap around `node`
    pub fn id_for_node(&self, tree: &DocumentTree, node: NodeId) -> Option<Uuid> {
        let root = self.root(tree);
        wrap::outermost_wrap_in_root(tree, node, root).and_then(|w| wrap::primary_id(tree, w))
    }

    pub fn extra_ids_for_node(&self, tree: &DocumentTree, node: NodeId) -> Vec<Uuid> {
        let root = self.root(tree);
        wrap::outermost_wrap_in_root(tree, node, root)
            .map(|w| wrap::extra_ids(tree, w))
            .unwrap_or_default()
    }

    /// Wrap nodes carrying `id`, or every wrap node when `id` is `None`
    pub fn wrap_nodes(&self, tree: &DocumentTree, id: Option<Uuid>) -> Vec<NodeId> {
        let root = self.root(tree);
        match id {
            Some(id) => self.painter.wrap_nodes_by_id(tree, root, id),
            None => self.painter.wrap_nodes(tree, root),
        }
    }
}
