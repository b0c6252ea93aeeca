/*!
 * # Highlight Engine
 *
 * Overlap-aware text highlighting on a host-owned [`DocumentTree`](crate::tree::DocumentTree).
 *
 * ## Flow
 *
 * - **Capture**: a live selection becomes an unfrozen [`LiveRange`](crate::models::LiveRange)
 * - **Serialize**: the range is frozen into a tree-independent [`Anchor`](crate::models::Anchor)
 * - **Segment**: boundary text leaves are split and the covered leaves collected
 * - **Paint**: every segment is wrapped, reusing existing wraps where highlights overlap
 *
 * Reloading goes the other way round: a stored anchor is resolved back into live
 * coordinates, then segmented and painted like a fresh selection.
 *
 * ## Overlap Bookkeeping
 *
 * Identity lives on the wrap nodes themselves as attributes: a primary id (the
 * visible highlight) and an ordered list of hidden ids for highlights that cover
 * exactly the same text. Removing the primary promotes the first hidden id, so
 * removal of one highlight never corrupts another.
 *
 * ## Module Structure
 *
 * - [`capture`]: selection capture and serialization
 * - [`resolve`]: anchor resolution
 * - [`segment`]: leaf splitting and enumeration
 * - [`painter`]: wrap strategies and removal
 * - [`highlighter`]: orchestration, cache, events and diagnostics
 */

pub mod cache;
pub mod capture;
pub mod error;
pub mod events;
pub mod highlighter;
pub mod hooks;
pub mod painter;
pub mod resolve;
pub mod segment;
pub mod wrap;

pub use cache::AnnotationCache;
pub use error::{Diagnostics, HighlightError};
pub use events::{CreateOrigin, EventBus, EventKind, HighlightEvent, SubscriptionId};
pub use highlighter::{
    DEFAULT_CLASS_NAME, DEFAULT_WRAP_TAG, Highlighter, HighlighterOptions, InputEvent,
};
pub use hooks::{Hooks, RemoveUpdate};
pub use painter::Painter;
