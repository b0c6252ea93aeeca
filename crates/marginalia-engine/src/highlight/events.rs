use std::collections::BTreeMap;

use uuid::Uuid;

use crate::models::{Anchor, LiveRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Select,
    Create,
    Hover,
    HoverOut,
    Click,
    Remove,
}

/// Where the anchors of a CREATE event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOrigin {
    /// A live user selection
    Input,
    /// Anchors handed back by storage
    Store,
}

/// Lifecycle notifications emitted by the highlighter
#[derive(Debug, Clone, PartialEq)]
pub enum HighlightEvent {
    Select { range: LiveRange },
    Create { sources: Vec<Anchor>, origin: CreateOrigin },
    Hover { id: Uuid },
    HoverOut { id: Uuid },
    Click { id: Uuid },
    /// Only ids that actually changed the tree
    Remove { ids: Vec<Uuid> },
}

impl HighlightEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HighlightEvent::Select { .. } => EventKind::Select,
            HighlightEvent::Create { .. } => EventKind::Create,
            HighlightEvent::Hover { .. } => EventKind::Hover,
            HighlightEvent::HoverOut { .. } => EventKind::HoverOut,
            HighlightEvent::Click { .. } => EventKind::Click,
            HighlightEvent::Remove { .. } => EventKind::Remove,
        }
    }
}

/// Handle returned by [`EventBus::on`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&HighlightEvent)>;

/// Publish/subscribe registry keyed by event kind.
///
/// Listeners of one kind run in subscription order.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: BTreeMap<EventKind, BTreeMap<SubscriptionId, Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&HighlightEvent) + 'static,
    ) -> SubscriptionId {
        self.next_id = self.next_id.saturating_add(1);
        let id = SubscriptionId(self.next_id);
        self.listeners
            .entry(kind)
            .or_default()
            .insert(id, Box::new(listener));
        id
    }

    /// Returns whether the subscription existed
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.listeners
            .values_mut()
            .any(|listeners| listeners.remove(&id).is_some())
    }

    pub fn emit(&mut self, event: &HighlightEvent) {
        if let Some(listeners) = self.listeners.get_mut(&event.kind()) {
            for listener in listeners.values_mut() {
                listener(event);
            }
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, BTreeMap::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: BTreeMap<_, _> = self
            .listeners
            .iter()
            .map(|(kind, listeners)| (kind, listeners.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_reaches_only_matching_kind_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for tag in ["first", "second"] {
            let seen = Rc::clone(&seen);
            bus.on(EventKind::Click, move |_| seen.borrow_mut().push(tag));
        }
        let other = Rc::clone(&seen);
        bus.on(EventKind::Remove, move |_| other.borrow_mut().push("remove"));

        bus.emit(&HighlightEvent::Click { id: Uuid::nil() });

        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_off_unsubscribes_once() {
        let hits = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let counter = Rc::clone(&hits);
        let id = bus.on(EventKind::Hover, move |_| *counter.borrow_mut() += 1);

        assert!(bus.off(id));
        assert!(!bus.off(id));
        bus.emit(&HighlightEvent::Hover { id: Uuid::nil() });

        assert_eq!(*hits.borrow(), 0);
        assert_eq!(bus.listener_count(EventKind::Hover), 0);
    }
}
