use serde::{Deserialize, Serialize};

use super::ids::{AnchorId, InteractorId, NodeId};
use crate::cursor::CursorOrientation;

/// Who owns an anchor. Owned anchors can only be deleted through their
/// owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorOrigin {
    Interactor(InteractorId),
    /// Held by an anchor or anchor-range facet of this node.
    Node(NodeId),
}

/// A stable logical position in a working document.
///
/// With a `grapheme_index` the anchor sits on that grapheme of the node's
/// text; without one it sits on the node's own boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub(crate) id: AnchorId,
    pub(crate) node: NodeId,
    pub(crate) orientation: CursorOrientation,
    pub(crate) grapheme_index: Option<usize>,
    pub(crate) name: Option<String>,
    pub(crate) origin: Option<AnchorOrigin>,
}

impl Anchor {
    pub fn id(&self) -> AnchorId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn orientation(&self) -> CursorOrientation {
        self.orientation
    }

    pub fn grapheme_index(&self) -> Option<usize> {
        self.grapheme_index
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn origin(&self) -> Option<AnchorOrigin> {
        self.origin
    }

    pub fn parameters(&self) -> AnchorParameters {
        AnchorParameters {
            node: self.node,
            orientation: self.orientation,
            grapheme_index: self.grapheme_index,
            name: self.name.clone(),
        }
    }

    /// Same position, ignoring identity and name.
    pub fn same_position_as(&self, other: &Anchor) -> bool {
        self.node == other.node
            && self.orientation == other.orientation
            && self.grapheme_index == other.grapheme_index
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorParameters {
    pub node: NodeId,
    pub orientation: CursorOrientation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grapheme_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Partial update of an anchor; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorUpdate {
    pub node: Option<NodeId>,
    pub orientation: Option<CursorOrientation>,
    pub grapheme_index: Option<Option<usize>>,
    pub name: Option<Option<String>>,
}

impl AnchorUpdate {
    /// Moves the anchor to the position in `parameters`, keeping its name.
    pub fn reposition(parameters: &AnchorParameters) -> Self {
        AnchorUpdate {
            node: Some(parameters.node),
            orientation: Some(parameters.orientation),
            grapheme_index: Some(parameters.grapheme_index),
            name: None,
        }
    }
}
