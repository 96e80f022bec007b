/*!
 * # Working Document
 *
 * The editable form of a document: an arena of [`WorkingNode`]s addressed by
 * [`NodeId`], plus the anchor and interactor tables that hang off it.
 *
 * ## Layout
 * - **`document`**: the arena, loading from and exporting to [`Node`](crate::model::Node),
 *   anchor and interactor bookkeeping.
 * - **`mutation`**: structural edits (insert, delete, join, split, facets).
 * - **`placement`**: where orphaned anchors land after their position is deleted.
 *
 * ## Invariants
 * Every anchor references a live node, and a grapheme index on it is within
 * that node's text. Every node's `parent` and `path_part` match its slot in
 * the parent's collection. Mutations either succeed completely or return an
 * error with nothing changed.
 *
 * Nodes are stored behind `Rc` so cloning a document for history is cheap;
 * writes go through `Rc::make_mut`.
 */

pub mod anchor;
pub mod document;
pub mod events;
pub mod ids;
pub mod interactor;
pub mod mutation;
pub mod node;
mod placement;

use serde::{Deserialize, Serialize};

pub use anchor::{Anchor, AnchorOrigin, AnchorParameters, AnchorUpdate};
pub use document::WorkingDocument;
pub use events::DocumentEvent;
pub use ids::{AnchorId, InteractorId, NodeId};
pub use interactor::{Interactor, InteractorParameters, InteractorStatus, InteractorUpdate};
pub use mutation::JoinResult;
pub use node::{WorkingChildren, WorkingFacetValue, WorkingNode};

/// Which way an edit flows through the document.
///
/// Deletions use it to pick the grapheme to remove and where orphaned
/// anchors land; joins use it to pick the sibling to merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowDirection {
    #[default]
    Backward,
    Forward,
}

impl FlowDirection {
    pub fn is_backward(self) -> bool {
        self == FlowDirection::Backward
    }

    pub fn reversed(self) -> Self {
        match self {
            FlowDirection::Backward => FlowDirection::Forward,
            FlowDirection::Forward => FlowDirection::Backward,
        }
    }
}
