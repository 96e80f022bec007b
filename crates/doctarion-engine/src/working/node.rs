use std::collections::{BTreeMap, BTreeSet};

use super::ids::{AnchorId, NodeId};
use crate::model::NodeKind;
use crate::text::{FancyText, Grapheme, Text, TextStyleStrip};
use crate::traversal::PathPart;

/// Children of a working node. Node children are ids into the document's
/// node table.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkingChildren {
    None,
    Text(Text),
    FancyText(FancyText),
    Nodes(Vec<NodeId>),
}

impl WorkingChildren {
    pub fn len(&self) -> usize {
        match self {
            WorkingChildren::None => 0,
            WorkingChildren::Text(t) => t.len(),
            WorkingChildren::FancyText(t) => t.len(),
            WorkingChildren::Nodes(n) => n.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_text(&self) -> bool {
        matches!(self, WorkingChildren::Text(_) | WorkingChildren::FancyText(_))
    }

    pub fn nodes(&self) -> Option<&[NodeId]> {
        match self {
            WorkingChildren::Nodes(n) => Some(n),
            _ => None,
        }
    }

    pub(crate) fn nodes_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            WorkingChildren::Nodes(n) => Some(n),
            _ => None,
        }
    }

    pub fn grapheme(&self, index: usize) -> Option<&Grapheme> {
        match self {
            WorkingChildren::Text(t) => t.get(index),
            WorkingChildren::FancyText(t) => t.get(index).map(|g| &g.grapheme),
            _ => None,
        }
    }

    /// Plain text of text-bearing children; `None` for anything else.
    pub fn text(&self) -> Option<Text> {
        match self {
            WorkingChildren::Text(t) => Some(t.clone()),
            WorkingChildren::FancyText(t) => Some(t.to_text()),
            _ => None,
        }
    }

    pub(crate) fn insert_text(&mut self, index: usize, text: &Text) -> bool {
        match self {
            WorkingChildren::Text(t) => t.insert_text(index, text),
            WorkingChildren::FancyText(t) => t.insert_text(index, text),
            _ => return false,
        }
        true
    }

    pub(crate) fn remove_grapheme(&mut self, index: usize) -> bool {
        match self {
            WorkingChildren::Text(t) => t.remove(index).is_some(),
            WorkingChildren::FancyText(t) => t.remove(index).is_some(),
            _ => false,
        }
    }

    /// Splits text children, keeping `[0, at)`. Returns `None` for node
    /// children.
    pub(crate) fn split_text_off(&mut self, at: usize) -> Option<WorkingChildren> {
        match self {
            WorkingChildren::Text(t) => Some(WorkingChildren::Text(t.split_off(at))),
            WorkingChildren::FancyText(t) => Some(WorkingChildren::FancyText(t.split_off(at))),
            _ => None,
        }
    }

    /// Moves all graphemes of `other` to the end (or start) of these ones.
    pub(crate) fn take_text_from(&mut self, other: &mut WorkingChildren, prepend: bool) -> bool {
        match (self, other) {
            (WorkingChildren::Text(dest), WorkingChildren::Text(src)) => {
                if prepend {
                    dest.prepend(std::mem::take(src));
                } else {
                    dest.append(src);
                }
                true
            }
            (WorkingChildren::FancyText(dest), WorkingChildren::FancyText(src)) => {
                if prepend {
                    dest.prepend(std::mem::take(src));
                } else {
                    dest.append(src);
                }
                true
            }
            _ => false,
        }
    }

    /// An empty value with the same shape.
    pub(crate) fn empty_like(&self) -> WorkingChildren {
        match self {
            WorkingChildren::None => WorkingChildren::None,
            WorkingChildren::Text(_) => WorkingChildren::Text(Text::new()),
            WorkingChildren::FancyText(_) => WorkingChildren::FancyText(FancyText::new()),
            WorkingChildren::Nodes(_) => WorkingChildren::Nodes(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkingFacetValue {
    Boolean(bool),
    Text(String),
    Enum(String),
    EntityId(String),
    Anchor(AnchorId),
    AnchorRange { from: AnchorId, to: AnchorId },
    NodeArray(Vec<NodeId>),
    TextStyleStrip(TextStyleStrip),
}

impl WorkingFacetValue {
    pub(crate) fn anchor_ids(&self) -> Vec<AnchorId> {
        match self {
            WorkingFacetValue::Anchor(a) => vec![*a],
            WorkingFacetValue::AnchorRange { from, to } => vec![*from, *to],
            _ => Vec::new(),
        }
    }
}

/// The mutable counterpart of a [`Node`](crate::model::Node).
///
/// Nodes are owned by the document's node table; `parent` and the ids in
/// `children` are plain keys into that table.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingNode {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) path_part: Option<PathPart>,
    pub(crate) children: WorkingChildren,
    pub(crate) facets: BTreeMap<&'static str, WorkingFacetValue>,
    pub(crate) attached_anchors: BTreeSet<AnchorId>,
}

impl WorkingNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn path_part(&self) -> Option<PathPart> {
        self.path_part
    }

    pub fn children(&self) -> &WorkingChildren {
        &self.children
    }

    pub fn facet(&self, name: &str) -> Option<&WorkingFacetValue> {
        self.facets.get(name)
    }

    pub fn facets(&self) -> impl Iterator<Item = (&'static str, &WorkingFacetValue)> {
        self.facets.iter().map(|(k, v)| (*k, v))
    }

    pub fn attached_anchors(&self) -> impl Iterator<Item = AnchorId> + '_ {
        self.attached_anchors.iter().copied()
    }

    pub fn styles(&self) -> Option<&TextStyleStrip> {
        match self.facets.get("styles") {
            Some(WorkingFacetValue::TextStyleStrip(s)) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn strips_mut(&mut self) -> impl Iterator<Item = &mut TextStyleStrip> {
        self.facets.values_mut().filter_map(|v| match v {
            WorkingFacetValue::TextStyleStrip(s) => Some(s),
            _ => None,
        })
    }

    /// Ids of node children held in node-array facets, by facet name.
    pub(crate) fn facet_node_arrays(&self) -> impl Iterator<Item = (&'static str, &[NodeId])> {
        self.facets.iter().filter_map(|(k, v)| match v {
            WorkingFacetValue::NodeArray(ids) => Some((*k, ids.as_slice())),
            _ => None,
        })
    }

    /// The node ids under `facet`, or the regular children for `None`.
    pub(crate) fn child_ids(&self, facet: Option<&str>) -> Option<&[NodeId]> {
        match facet {
            None => self.children.nodes(),
            Some(name) => match self.facets.get(name) {
                Some(WorkingFacetValue::NodeArray(ids)) => Some(ids),
                _ => None,
            },
        }
    }
}
