pub mod highlight;
pub mod models;
pub mod tree;

// Re-export key types for easier usage
pub use highlight::*;
pub use models::*;
pub use tree::{DocumentTree, NodeId, NodeKind, NodeSpec, Selection, Selector, TreeError};
