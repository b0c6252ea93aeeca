use tracing::{debug, warn};
use uuid::Uuid;

use crate::tree::TreeError;

/// Everything that can go wrong while creating, restoring or removing highlights.
///
/// Only [`RangeNotFrozen`](HighlightError::RangeNotFrozen) and
/// [`MalformedRange`](HighlightError::MalformedRange) are returned to callers; the
/// rest are reported through [`Diagnostics`] and turn into no-ops.
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("Failed to recreate highlight {id} from its anchor: {reason}")]
    AnchorSourceRecreate { id: Uuid, reason: String },

    #[error("Selection {id} produced no segments to highlight")]
    EmptySelection { id: Uuid },

    #[error("Malformed highlight source: {0}")]
    SourceType(String),

    #[error("Highlight {id} resolved but rendered nothing")]
    SourceNoneRendered { id: Uuid },

    #[error("Range {0} must be serialized before it can be painted")]
    RangeNotFrozen(Uuid),

    #[error("Malformed range: {0}")]
    MalformedRange(String),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl HighlightError {
    /// Contract violations by the integrating code, as opposed to drift in the tree
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HighlightError::RangeNotFrozen(_) | HighlightError::MalformedRange(_)
        )
    }
}

type DiagnosticHandler = Box<dyn FnMut(&HighlightError)>;

/// Single channel for non-fatal highlight failures.
///
/// Subscribers always receive every diagnostic; logging is at `warn` level only in
/// verbose mode and at `debug` otherwise.
#[derive(Default)]
pub struct Diagnostics {
    verbose: bool,
    handlers: Vec<DiagnosticHandler>,
}

impl Diagnostics {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            handlers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&HighlightError) + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn report(&mut self, error: &HighlightError) {
        if self.verbose {
            warn!(%error, "highlight diagnostic");
        } else {
            debug!(%error, "highlight diagnostic");
        }
        for handler in &mut self.handlers {
            handler(error);
        }
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("verbose", &self.verbose)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
