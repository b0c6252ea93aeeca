pub mod anchor;
pub mod range;

pub use anchor::{Anchor, InvalidParentIndex, NodeAddress, ParentIndex, ROOT_SENTINEL};
pub use range::{LiveCoordinate, LiveRange, SegmentKind, SelectedSegment, SplitPosition};
