use log::trace;

use super::anchor::AnchorParameters;
use super::document::WorkingDocument;
use super::events::DocumentEvent;
use super::ids::{AnchorId, NodeId};
use super::FlowDirection;
use crate::cursor::{CursorNavigator, CursorOrientation};
use crate::error::Result;
use crate::traversal::PathPart;

/// The slot a deleted child or grapheme used to occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Hole {
    pub(crate) parent: NodeId,
    pub(crate) facet: Option<&'static str>,
    pub(crate) index: usize,
}

impl Hole {
    pub(crate) fn new(parent: NodeId, facet: Option<&'static str>, index: usize) -> Self {
        Hole {
            parent,
            facet,
            index,
        }
    }

    fn part(&self, index: usize) -> PathPart {
        match self.facet {
            Some(facet) => PathPart::in_facet(facet, index),
            None => PathPart::new(index),
        }
    }
}

impl WorkingDocument {
    /// The caret position nearest to `hole`, looking in `direction` first.
    ///
    /// An emptied collection puts the caret on its parent. Otherwise the
    /// caret goes after the previous survivor (backward) or before the next
    /// one (forward), falling back to the other side at either end.
    pub(crate) fn position_for_hole(
        &self,
        hole: Hole,
        direction: FlowDirection,
    ) -> Result<AnchorParameters> {
        let parent = self.node(hole.parent)?;
        let parent_path = self.get_node_path(hole.parent)?;
        let len = match hole.facet {
            None => parent.children.len(),
            Some(facet) => parent.child_ids(Some(facet)).map_or(0, <[NodeId]>::len),
        };

        let (path, orientation) = if len == 0 {
            (parent_path, CursorOrientation::On)
        } else {
            let (index, orientation) = match direction {
                FlowDirection::Backward if hole.index > 0 => {
                    (hole.index.min(len) - 1, CursorOrientation::After)
                }
                FlowDirection::Backward => (0, CursorOrientation::Before),
                FlowDirection::Forward if hole.index < len => {
                    (hole.index, CursorOrientation::Before)
                }
                FlowDirection::Forward => (len - 1, CursorOrientation::After),
            };
            (parent_path.child(hole.part(index)), orientation)
        };

        let mut cursor = CursorNavigator::new(self);
        if !cursor.navigate_to(&path, orientation) {
            trace!("No caret position at {path}, falling back to document start");
            cursor.navigate_to_document_start();
        }
        Self::get_anchor_parameters_from_cursor_navigator(&cursor)
    }

    /// Moves orphaned anchors to the caret position nearest `hole`.
    pub(crate) fn reposition_orphans(
        &mut self,
        orphans: &[AnchorId],
        hole: Hole,
        direction: FlowDirection,
    ) -> Result<()> {
        if orphans.is_empty() {
            return Ok(());
        }
        let target = self.position_for_hole(hole, direction)?;
        for id in orphans {
            let Some(previous) = self.anchors.get(id).map(|a| a.node) else {
                continue;
            };
            if let Some(node) = self.nodes.get_mut(&previous) {
                std::rc::Rc::make_mut(node).attached_anchors.remove(id);
            }
            let Some(anchor) = self.anchors.get_mut(id) else {
                continue;
            };
            trace!(
                "Repositioning orphaned anchor {id} to {} {:?} {:?}",
                target.node, target.orientation, target.grapheme_index
            );
            anchor.node = target.node;
            anchor.orientation = target.orientation;
            anchor.grapheme_index = target.grapheme_index;
            self.node_mut(target.node)?.attached_anchors.insert(*id);
            self.emit(DocumentEvent::AnchorUpdated { anchor: *id });
        }
        Ok(())
    }
}
