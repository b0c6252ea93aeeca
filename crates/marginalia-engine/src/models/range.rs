use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::tree::NodeId;

/// Live pointer into the tree: a node plus a character offset into its text.
///
/// Only meaningful until the next tree mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LiveCoordinate {
    pub node: NodeId,
    pub offset: usize,
}

impl LiveCoordinate {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A span expressed in live tree coordinates.
///
/// Created unfrozen from a selection; frozen exactly once when serialized into an
/// [`Anchor`](crate::models::Anchor). Painters only accept frozen ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveRange {
    pub start: LiveCoordinate,
    pub end: LiveCoordinate,
    pub text: String,
    pub id: Uuid,
    frozen: bool,
}

impl LiveRange {
    pub fn new(start: LiveCoordinate, end: LiveCoordinate, text: impl Into<String>, id: Uuid) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            id,
            frozen: false,
        }
    }

    /// A range rebuilt from an already persisted anchor
    pub(crate) fn restored(
        start: LiveCoordinate,
        end: LiveCoordinate,
        text: impl Into<String>,
        id: Uuid,
    ) -> Self {
        Self {
            frozen: true,
            ..Self::new(start, end, text, id)
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }
}

/// Where a segment's leaf was cut relative to the original, longer leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitPosition {
    None,
    Head,
    Tail,
    Both,
}

impl SplitPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitPosition::None => "none",
            SplitPosition::Head => "head",
            SplitPosition::Tail => "tail",
            SplitPosition::Both => "both",
        }
    }

    pub(crate) fn from_cuts(head: bool, tail: bool) -> Self {
        match (head, tail) {
            (true, true) => SplitPosition::Both,
            (true, false) => SplitPosition::Head,
            (false, true) => SplitPosition::Tail,
            (false, false) => SplitPosition::None,
        }
    }
}

impl fmt::Display for SplitPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(SplitPosition::None),
            "head" => Ok(SplitPosition::Head),
            "tail" => Ok(SplitPosition::Tail),
            "both" => Ok(SplitPosition::Both),
            other => Err(format!("unknown split position: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
}

/// One text leaf the painter will wrap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedSegment {
    pub node: NodeId,
    pub kind: SegmentKind,
    pub split: SplitPosition,
}

impl SelectedSegment {
    pub fn text(node: NodeId, split: SplitPosition) -> Self {
        Self {
            node,
            kind: SegmentKind::Text,
            split,
        }
    }
}
