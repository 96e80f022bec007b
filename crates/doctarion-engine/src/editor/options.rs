use serde::{Deserialize, Serialize};

use crate::working::FlowDirection;

/// What a caret delete does when there is nothing to delete in its own
/// block, e.g. backspace at the start of a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryPolicy {
    /// Leave document and caret alone.
    #[default]
    NoOp,
    /// Move the caret across the boundary without changing the document.
    Move,
    /// Join the block with its neighbour in the delete direction.
    Join,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Undo snapshots kept; the oldest are dropped beyond this.
    pub history_limit: usize,
    pub delete_boundary_policy: BoundaryPolicy,
    /// Where orphaned anchors go when a command does not say.
    pub orphan_direction: FlowDirection,
    /// Add a focused caret at the document start when loading a document
    /// that has no interactors.
    pub create_default_interactor: bool,
    /// After joins and deletes, merge neighbouring spans of the edited block
    /// into one.
    pub merge_adjacent_spans: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        EditorOptions {
            history_limit: 500,
            delete_boundary_policy: BoundaryPolicy::NoOp,
            orphan_direction: FlowDirection::Backward,
            create_default_interactor: true,
            merge_adjacent_spans: true,
        }
    }
}
