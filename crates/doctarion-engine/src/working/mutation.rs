use std::collections::BTreeSet;

use log::{trace, warn};

use super::anchor::{AnchorOrigin, AnchorParameters};
use super::document::WorkingDocument;
use super::events::DocumentEvent;
use super::ids::{AnchorId, NodeId};
use super::node::{WorkingChildren, WorkingFacetValue, WorkingNode};
use super::placement::Hole;
use super::FlowDirection;
use crate::cursor::CursorOrientation;
use crate::error::{EditorError, Result};
use crate::model::{Facet, FacetValue, FacetValueType, Node, NodeKind};
use crate::text::{Text, TextStyleModifier, TextStyleStrip};
use crate::traversal::{Path, PathPart, Range};

const STYLES: &str = "styles";

/// Outcome of [`WorkingDocument::join_sibling_into_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinResult {
    /// The node that now holds the content of both.
    pub destination: NodeId,
    /// Index in the destination's children where the two runs meet.
    pub seam_index: usize,
}

fn part_for(facet: Option<&'static str>, index: usize) -> PathPart {
    match facet {
        Some(facet) => PathPart::in_facet(facet, index),
        None => PathPart::new(index),
    }
}

fn facet_of(kind: NodeKind, name: &str) -> Result<&'static Facet> {
    kind.facet(name)
        .ok_or_else(|| EditorError::unknown_id(format!("facet {name} on {kind}")))
}

/// Whether a working facet value has the shape `facet` declares.
fn working_value_fits(facet: &Facet, value: &WorkingFacetValue) -> bool {
    match (facet.value_type, value) {
        (FacetValueType::Enum(options), WorkingFacetValue::Enum(v)) => {
            options.contains(&v.as_str())
        }
        (FacetValueType::Boolean, WorkingFacetValue::Boolean(_))
        | (FacetValueType::Text, WorkingFacetValue::Text(_))
        | (FacetValueType::EntityId, WorkingFacetValue::EntityId(_))
        | (FacetValueType::Anchor, WorkingFacetValue::Anchor(_))
        | (FacetValueType::AnchorRange, WorkingFacetValue::AnchorRange { .. })
        | (FacetValueType::NodeArray(_), WorkingFacetValue::NodeArray(_))
        | (FacetValueType::TextStyleStrip, WorkingFacetValue::TextStyleStrip(_)) => true,
        _ => false,
    }
}

fn collect_anchor_specs<'n>(node: &'n Node, out: &mut Vec<&'n crate::model::AnchorSpec>) {
    for value in node.facets.values() {
        match value {
            FacetValue::Anchor(spec) => out.push(spec),
            FacetValue::AnchorRange { from, to } => {
                out.push(from);
                out.push(to);
            }
            FacetValue::NodeArray(nodes) => {
                for n in nodes {
                    collect_anchor_specs(n, out);
                }
            }
            _ => {}
        }
    }
    for child in node.child_nodes() {
        collect_anchor_specs(child, out);
    }
}

impl WorkingDocument {
    // ============ Bookkeeping ============

    /// `node` and everything below it, including node-array facets.
    pub(crate) fn subtree_ids(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(n) = self.get_node(id) else {
                continue;
            };
            out.push(id);
            if let Some(children) = n.children.nodes() {
                stack.extend(children.iter().rev());
            }
            for (_, ids) in n.facet_node_arrays() {
                stack.extend(ids.iter().rev());
            }
        }
        out
    }

    fn child_list_mut(
        &mut self,
        parent: NodeId,
        facet: Option<&'static str>,
    ) -> Result<&mut Vec<NodeId>> {
        let node = self.node_mut(parent)?;
        let kind = node.kind;
        match facet {
            None => node.children.nodes_mut().ok_or_else(|| {
                EditorError::invalid_operation(format!("{kind} nodes have no child nodes"))
            }),
            Some(name) => match node
                .facets
                .entry(name)
                .or_insert_with(|| WorkingFacetValue::NodeArray(Vec::new()))
            {
                WorkingFacetValue::NodeArray(ids) => Ok(ids),
                _ => Err(EditorError::type_mismatch(format!(
                    "facet {name} on {kind} does not hold nodes"
                ))),
            },
        }
    }

    /// Brings `parent` and `path_part` of every child in the collection in
    /// line with its slot.
    fn reindex_children(&mut self, parent: NodeId, facet: Option<&'static str>) -> Result<()> {
        let ids = self
            .node(parent)?
            .child_ids(facet)
            .map(<[NodeId]>::to_vec)
            .unwrap_or_default();
        for (index, id) in ids.into_iter().enumerate() {
            let part = part_for(facet, index);
            let current = self.node(id)?;
            if current.parent != Some(parent) || current.path_part != Some(part) {
                let node = self.node_mut(id)?;
                node.parent = Some(parent);
                node.path_part = Some(part);
            }
        }
        Ok(())
    }

    fn position_of(&self, node: NodeId) -> Result<(NodeId, PathPart)> {
        let n = self.node(node)?;
        match (n.parent, n.path_part) {
            (Some(parent), Some(part)) => Ok((parent, part)),
            _ => Err(EditorError::invalid_operation(
                "the document root has no parent",
            )),
        }
    }

    fn text_node(&self, node: NodeId) -> Result<&WorkingNode> {
        let n = self.node(node)?;
        if !n.children.is_text() {
            return Err(EditorError::invalid_operation(format!(
                "{} nodes do not hold text",
                n.kind
            )));
        }
        Ok(n)
    }

    /// Moves `On` anchors of `node` that are no longer on a valid caret
    /// position onto the nearest one.
    fn resettle_on_anchors(&mut self, node: NodeId) -> Result<()> {
        let ids: Vec<AnchorId> = self
            .node(node)?
            .attached_anchors()
            .filter(|a| {
                self.anchors.get(a).is_some_and(|a| {
                    a.orientation == CursorOrientation::On && a.grapheme_index.is_none()
                })
            })
            .collect();
        for id in ids {
            let cursor = self.cursor_navigator_for_anchor(id)?;
            let target = Self::get_anchor_parameters_from_cursor_navigator(&cursor)?;
            self.move_anchor(id, &target)?;
        }
        Ok(())
    }

    /// Moves every interactor anchor onto the canonical form of the caret
    /// position it denotes, e.g. `Before` a mid-span grapheme becomes `After`
    /// the previous one. Run after joins, which leave such seams behind.
    pub(crate) fn settle_interactor_anchors(&mut self) -> Result<()> {
        let ids: Vec<AnchorId> = self
            .interactors
            .values()
            .flat_map(|i| i.anchor_ids())
            .collect();
        for id in ids {
            let cursor = self.cursor_navigator_for_anchor(id)?;
            let target = Self::get_anchor_parameters_from_cursor_navigator(&cursor)?;
            self.move_anchor(id, &target)?;
        }
        Ok(())
    }

    fn move_anchor(&mut self, id: AnchorId, target: &AnchorParameters) -> Result<()> {
        let anchor = self.anchor(id)?;
        if anchor.node == target.node
            && anchor.orientation == target.orientation
            && anchor.grapheme_index == target.grapheme_index
        {
            return Ok(());
        }
        let previous = anchor.node;
        if previous != target.node {
            if let Ok(n) = self.node_mut(previous) {
                n.attached_anchors.remove(&id);
            }
            self.node_mut(target.node)?.attached_anchors.insert(id);
        }
        if let Some(a) = self.anchors.get_mut(&id) {
            a.node = target.node;
            a.orientation = target.orientation;
            a.grapheme_index = target.grapheme_index;
        }
        self.emit(DocumentEvent::AnchorUpdated { anchor: id });
        Ok(())
    }

    /// Resolves every anchor spec in `node` against the current tree.
    fn check_anchor_specs(&self, node: &Node) -> Result<()> {
        let mut specs = Vec::new();
        collect_anchor_specs(node, &mut specs);
        for spec in specs {
            self.anchor_parameters_for_spec(spec)?;
        }
        Ok(())
    }

    // ============ Insertion ============

    /// Inserts `node` (and its subtree) at `index` of `parent`'s children, or
    /// of the node-array facet named `facet`.
    pub fn insert_node(
        &mut self,
        parent: NodeId,
        node: Node,
        index: usize,
        facet: Option<&str>,
    ) -> Result<NodeId> {
        node.validate()?;
        let parent_node = self.node(parent)?;
        let facet = match facet {
            None => {
                if !parent_node.kind.can_contain_children_of_kind(node.kind) {
                    return Err(EditorError::invalid_operation(format!(
                        "{} cannot contain {}",
                        parent_node.kind, node.kind
                    )));
                }
                None
            }
            Some(name) => {
                let facet = facet_of(parent_node.kind, name)?;
                if !parent_node
                    .kind
                    .can_contain_facet_children_of_kind(facet.name, node.kind)
                {
                    return Err(EditorError::invalid_operation(format!(
                        "{} facet {} cannot contain {}",
                        parent_node.kind, facet.name, node.kind
                    )));
                }
                Some(facet.name)
            }
        };
        let len = parent_node.child_ids(facet).map_or(0, <[NodeId]>::len);
        if index > len {
            return Err(EditorError::invalid_path(format!(
                "index {index} of node {parent} with {len} children"
            )));
        }
        self.check_anchor_specs(&node)?;
        let was_empty = parent_node.children.is_empty();

        let mut pending = Vec::new();
        let id = self.create_subtree(&node, Some(parent), Some(part_for(facet, index)), &mut pending);
        // The new subtree is not linked yet, so existing paths still resolve
        // as they did before the call.
        let resolved = self.resolve_pending_anchor_facets(&pending)?;
        self.child_list_mut(parent, facet)?.insert(index, id);
        self.reindex_children(parent, facet)?;
        self.attach_anchor_facets(pending, resolved)?;
        if was_empty && facet.is_none() {
            self.resettle_on_anchors(parent)?;
        }
        self.emit(DocumentEvent::NodeUpdated { node: parent });
        self.touch();
        Ok(id)
    }

    /// Inserts `text` before the grapheme at `index` of a text-bearing node.
    ///
    /// Anchors and style entries at or after `index` move right with the
    /// graphemes they were on.
    ///
    /// Only a node's children hold graphemes. Text facets are plain strings
    /// carrying no anchors, and are replaced whole with `set_node_facet`, so
    /// there is no facet to name here.
    pub fn insert_node_text(&mut self, node: NodeId, index: usize, text: &Text) -> Result<()> {
        let n = self.text_node(node)?;
        let len = n.children.len();
        if index > len {
            return Err(EditorError::invalid_path(format!(
                "grapheme {index} of node {node} with {len} graphemes"
            )));
        }
        if text.is_empty() {
            return Ok(());
        }
        let count = text.len();
        let shifted: Vec<AnchorId> = n
            .attached_anchors()
            .filter(|a| {
                self.anchors
                    .get(a)
                    .and_then(|a| a.grapheme_index)
                    .is_some_and(|g| g >= index)
            })
            .collect();

        let n = self.node_mut(node)?;
        n.children.insert_text(index, text);
        for strip in n.strips_mut() {
            strip.update_due_to_grapheme_insertion(index, count);
        }
        for id in shifted {
            if let Some(a) = self.anchors.get_mut(&id) {
                a.grapheme_index = a.grapheme_index.map(|g| g + count);
                self.pending_events.push(DocumentEvent::AnchorUpdated { anchor: id });
            }
        }
        if len == 0 {
            self.resettle_on_anchors(node)?;
        }
        self.emit(DocumentEvent::NodeUpdated { node });
        self.touch();
        Ok(())
    }

    // ============ Deletion ============

    /// Removes `node` and its subtree.
    ///
    /// Anchors owned by facets inside the subtree are deleted. Every other
    /// anchor attached inside it is orphaned and moved to the caret position
    /// nearest the gap, looking in `direction` first.
    pub fn delete_node(&mut self, node: NodeId, direction: FlowDirection) -> Result<()> {
        if node == self.root {
            return Err(EditorError::invalid_operation("cannot delete the document root"));
        }
        let (parent, part) = self.position_of(node)?;
        let subtree = self.subtree_ids(node);

        let mut owned = BTreeSet::new();
        let mut attached = Vec::new();
        for id in &subtree {
            let n = self.node(*id)?;
            owned.extend(n.facets.values().flat_map(WorkingFacetValue::anchor_ids));
            attached.extend(n.attached_anchors());
        }
        for anchor in &owned {
            self.remove_anchor(*anchor);
        }
        let orphans: Vec<AnchorId> = attached
            .into_iter()
            .filter(|a| !owned.contains(a) && self.anchors.contains_key(a))
            .collect();

        self.child_list_mut(parent, part.facet)?.remove(part.index);
        self.reindex_children(parent, part.facet)?;
        for id in subtree {
            self.nodes.remove(&id);
            self.emit(DocumentEvent::NodeDeleted { node: id });
        }
        for anchor in &orphans {
            trace!("Anchor {anchor} orphaned by deletion of node {node}");
            self.emit(DocumentEvent::AnchorOrphaned { anchor: *anchor });
        }
        self.reposition_orphans(&orphans, Hole::new(parent, part.facet, part.index), direction)?;
        self.emit(DocumentEvent::NodeUpdated { node: parent });
        self.touch();
        Ok(())
    }

    /// Removes one grapheme of a text-bearing node.
    ///
    /// Anchors on it are orphaned, anchors past it shift left.
    pub fn delete_node_grapheme(
        &mut self,
        node: NodeId,
        index: usize,
        direction: FlowDirection,
    ) -> Result<()> {
        let n = self.text_node(node)?;
        let len = n.children.len();
        if index >= len {
            return Err(EditorError::invalid_path(format!(
                "grapheme {index} of node {node} with {len} graphemes"
            )));
        }
        let mut orphans = Vec::new();
        let mut shifted = Vec::new();
        for id in n.attached_anchors() {
            match self.anchors.get(&id).and_then(|a| a.grapheme_index) {
                Some(g) if g == index => orphans.push(id),
                Some(g) if g > index => shifted.push(id),
                _ => {}
            }
        }

        let n = self.node_mut(node)?;
        n.children.remove_grapheme(index);
        for strip in n.strips_mut() {
            strip.update_due_to_grapheme_deletion(index, 1);
            strip.truncate(len - 1);
        }
        for id in shifted {
            if let Some(a) = self.anchors.get_mut(&id) {
                a.grapheme_index = a.grapheme_index.map(|g| g - 1);
                self.pending_events.push(DocumentEvent::AnchorUpdated { anchor: id });
            }
        }
        for anchor in &orphans {
            trace!("Anchor {anchor} orphaned by deletion of grapheme {index} of {node}");
            self.emit(DocumentEvent::AnchorOrphaned { anchor: *anchor });
        }
        self.reposition_orphans(&orphans, Hole::new(node, None, index), direction)?;
        self.emit(DocumentEvent::NodeUpdated { node });
        self.touch();
        Ok(())
    }

    /// Deletes the node or grapheme at `path`.
    pub fn delete_node_at_path(&mut self, path: &Path, direction: FlowDirection) -> Result<()> {
        let mut nav = self.node_navigator();
        if !nav.navigate_to(path) {
            return Err(EditorError::invalid_path(path));
        }
        let target = match (nav.grapheme_index(), nav.parent_node(), nav.tip_node()) {
            (Some(index), Some(parent), _) => Some((parent.id, Some(index))),
            (None, _, Some(node)) => Some((node.id, None)),
            _ => None,
        };
        match target {
            Some((parent, Some(index))) => self.delete_node_grapheme(parent, index, direction),
            Some((node, None)) => self.delete_node(node, direction),
            None => Err(EditorError::invalid_path(path)),
        }
    }

    /// Deletes every node and grapheme in `range`, inclusive at both ends.
    ///
    /// A range covering the whole document empties the root instead of
    /// deleting it.
    pub fn delete_nodes_in_range(&mut self, range: &Range, direction: FlowDirection) -> Result<()> {
        enum Victim {
            Node(NodeId),
            Grapheme(NodeId, usize),
            ChildrenOf(NodeId),
        }
        let mut victims = Vec::new();
        for chain in range.chains_covering_range(self) {
            let victim = if chain.is_at_root() {
                Victim::ChildrenOf(self.root)
            } else if let Some(index) = chain.grapheme_index() {
                let parent = chain
                    .parent_node()
                    .ok_or_else(|| EditorError::invalid_path(chain.path()))?;
                Victim::Grapheme(parent, index)
            } else {
                let node = chain
                    .tip_node()
                    .ok_or_else(|| EditorError::invalid_path(chain.path()))?;
                Victim::Node(node)
            };
            victims.push(victim);
        }
        for victim in victims.into_iter().rev() {
            match victim {
                Victim::Node(id) => {
                    if self.get_node(id).is_some() {
                        self.delete_node(id, direction)?;
                    }
                }
                Victim::Grapheme(id, index) => self.delete_node_grapheme(id, index, direction)?,
                Victim::ChildrenOf(id) => {
                    let children = self
                        .node(id)?
                        .children
                        .nodes()
                        .map(<[NodeId]>::to_vec)
                        .unwrap_or_default();
                    for child in children.into_iter().rev() {
                        self.delete_node(child, direction)?;
                    }
                }
            }
        }
        Ok(())
    }

    // ============ Joining and splitting ============

    /// Merges a sibling of `node` into it.
    ///
    /// Backward merges the preceding sibling in front of `node`'s content,
    /// forward merges the following sibling after it. Both must be the same
    /// kind. Anchors on the merged sibling move along with its content and
    /// the emptied sibling is deleted.
    pub fn join_sibling_into_node(
        &mut self,
        node: NodeId,
        direction: FlowDirection,
    ) -> Result<JoinResult> {
        let (parent, part) = self.position_of(node)?;
        let siblings = self
            .node(parent)?
            .child_ids(part.facet)
            .map(<[NodeId]>::to_vec)
            .unwrap_or_default();
        let source_index = match direction {
            FlowDirection::Backward => part.index.checked_sub(1),
            FlowDirection::Forward => Some(part.index + 1).filter(|i| *i < siblings.len()),
        };
        let Some(source) = source_index.and_then(|i| siblings.get(i).copied()) else {
            warn!("Node {node} has no {direction:?} sibling to join");
            return Err(EditorError::invalid_operation(format!(
                "node {node} has no sibling to join in that direction"
            )));
        };
        let destination = self.node(node)?;
        let source_node = self.node(source)?;
        if destination.kind != source_node.kind {
            return Err(EditorError::invalid_operation(format!(
                "cannot join {} into {}",
                source_node.kind, destination.kind
            )));
        }
        let backward = direction.is_backward();
        let destination_len = destination.children.len();
        let source_len = source_node.children.len();
        let seam_index = if backward { source_len } else { destination_len };
        let destination_was_empty = destination_len == 0;

        let mut source_grapheme_anchors = Vec::new();
        let mut source_node_anchors = Vec::new();
        for id in source_node.attached_anchors() {
            match self.anchors.get(&id).map(|a| a.grapheme_index) {
                Some(Some(_)) => source_grapheme_anchors.push(id),
                Some(None) => source_node_anchors.push(id),
                None => {}
            }
        }
        let destination_grapheme_anchors: Vec<AnchorId> = destination
            .attached_anchors()
            .filter(|a| self.anchors.get(a).is_some_and(|a| a.grapheme_index.is_some()))
            .collect();

        let mut source_children =
            std::mem::replace(&mut self.node_mut(source)?.children, WorkingChildren::None);
        let empty = source_children.empty_like();
        if let WorkingChildren::Nodes(moved) = &mut source_children {
            let moved = std::mem::take(moved);
            let list = self.child_list_mut(node, None)?;
            if backward {
                list.splice(0..0, moved);
            } else {
                list.extend(moved);
            }
            self.reindex_children(node, None)?;
        } else if source_children.is_text() {
            self.node_mut(node)?
                .children
                .take_text_from(&mut source_children, backward);
            self.join_styles(node, source, backward, destination_len, source_len)?;
            let (moved, offset) = if backward {
                (&destination_grapheme_anchors, source_len)
            } else {
                (&source_grapheme_anchors, destination_len)
            };
            for id in moved {
                if let Some(a) = self.anchors.get_mut(id) {
                    a.grapheme_index = a.grapheme_index.map(|g| g + offset);
                }
            }
            for id in &source_grapheme_anchors {
                if let Some(a) = self.anchors.get_mut(id) {
                    a.node = node;
                }
            }
            let source_mut = self.node_mut(source)?;
            for id in &source_grapheme_anchors {
                source_mut.attached_anchors.remove(id);
            }
            let destination_mut = self.node_mut(node)?;
            destination_mut
                .attached_anchors
                .extend(source_grapheme_anchors.iter().copied());
            for id in moved.iter().chain(&source_grapheme_anchors) {
                self.pending_events.push(DocumentEvent::AnchorUpdated { anchor: *id });
            }
        }
        self.node_mut(source)?.children = empty;

        self.reposition_orphans(
            &source_node_anchors,
            Hole::new(node, None, seam_index),
            self.orphan_direction,
        )?;
        if destination_was_empty {
            self.resettle_on_anchors(node)?;
        }
        self.delete_node(source, direction)?;
        self.emit(DocumentEvent::NodesJoined {
            destination: node,
            source,
        });
        self.touch();
        Ok(JoinResult {
            destination: node,
            seam_index,
        })
    }

    fn join_styles(
        &mut self,
        node: NodeId,
        source: NodeId,
        backward: bool,
        destination_len: usize,
        source_len: usize,
    ) -> Result<()> {
        let source_strip = self.node(source)?.styles().cloned();
        let destination_strip = self.node(node)?.styles().cloned();
        if source_strip.is_none() && destination_strip.is_none() {
            return Ok(());
        }
        let source_strip = source_strip.unwrap_or_default();
        let destination_strip = destination_strip.unwrap_or_default();
        let merged = if backward {
            let mut merged = source_strip;
            merged.append(source_len, destination_strip, destination_len);
            merged
        } else {
            let mut merged = destination_strip;
            merged.append(destination_len, source_strip, source_len);
            merged
        };
        let n = self.node_mut(node)?;
        if merged.is_empty() {
            n.facets.remove(STYLES);
        } else if n.kind.facet(STYLES).is_some() {
            n.facets.insert(STYLES, WorkingFacetValue::TextStyleStrip(merged));
        }
        Ok(())
    }

    /// Merges the spans on either side of `index` in `parent`'s children.
    ///
    /// Styling lives in the strip, which the join carries over grapheme for
    /// grapheme, so any two neighbouring spans can merge. Returns whether a
    /// merge happened.
    pub fn join_spans_at(&mut self, parent: NodeId, index: usize) -> Result<bool> {
        if index == 0 {
            return Ok(false);
        }
        let Some(children) = self.node(parent)?.children.nodes() else {
            return Ok(false);
        };
        let (Some(left), Some(right)) = (children.get(index - 1), children.get(index)) else {
            return Ok(false);
        };
        let (left, right) = (self.node(*left)?, self.node(*right)?);
        if left.kind != NodeKind::Span || right.kind != NodeKind::Span {
            return Ok(false);
        }
        let left = left.id;
        self.join_sibling_into_node(left, FlowDirection::Forward)?;
        Ok(true)
    }

    /// Splits `node` at a position below it.
    ///
    /// `indices` is a child path relative to `node`: every level down to the
    /// last index is cut in two and the tail halves form a copy of the chain
    /// that is inserted right after `node`. Anchors and style entries in the
    /// tail move to the copy. Returns the new node.
    pub fn split_node(&mut self, node: NodeId, indices: &[usize]) -> Result<NodeId> {
        if node == self.root {
            return Err(EditorError::invalid_operation("cannot split the document root"));
        }
        let (parent, part) = self.position_of(node)?;
        self.check_split(node, indices)?;
        let clone = self.split_subtree(node, indices)?;
        let index = part.index + 1;
        self.child_list_mut(parent, part.facet)?.insert(index, clone);
        self.reindex_children(parent, part.facet)?;
        self.emit(DocumentEvent::NodeUpdated { node: parent });
        self.touch();
        Ok(clone)
    }

    fn check_split(&self, node: NodeId, indices: &[usize]) -> Result<()> {
        let Some((&first, rest)) = indices.split_first() else {
            return Err(EditorError::invalid_path("an empty split position"));
        };
        let n = self.node(node)?;
        let len = n.children.len();
        match &n.children {
            WorkingChildren::None => Err(EditorError::invalid_operation(format!(
                "{} nodes cannot be split",
                n.kind
            ))),
            WorkingChildren::Text(_) | WorkingChildren::FancyText(_) if rest.is_empty() => {
                if first > len {
                    return Err(EditorError::invalid_path(format!(
                        "split at {first} of {len} graphemes"
                    )));
                }
                Ok(())
            }
            WorkingChildren::Nodes(_) if rest.is_empty() => {
                if first > len {
                    return Err(EditorError::invalid_path(format!(
                        "split at {first} of {len} children"
                    )));
                }
                Ok(())
            }
            WorkingChildren::Nodes(ids) => match ids.get(first) {
                Some(child) => self.check_split(*child, rest),
                None => Err(EditorError::invalid_path(format!(
                    "split through child {first} of {len}"
                ))),
            },
            _ => Err(EditorError::invalid_path("split position goes below a grapheme")),
        }
    }

    /// Cuts `node` at `indices` (already checked) and returns an unlinked
    /// node holding the tail.
    fn split_subtree(&mut self, node: NodeId, indices: &[usize]) -> Result<NodeId> {
        let Some((&first, rest)) = indices.split_first() else {
            return Err(EditorError::invalid_path("an empty split position"));
        };
        let id = self.ids.node();
        let source = self.node(node)?;
        let kind = source.kind;
        let mut facets: std::collections::BTreeMap<&'static str, WorkingFacetValue> = source
            .facets
            .iter()
            .filter(|(_, v)| {
                matches!(
                    v,
                    WorkingFacetValue::Boolean(_)
                        | WorkingFacetValue::Text(_)
                        | WorkingFacetValue::Enum(_)
                        | WorkingFacetValue::EntityId(_)
                )
            })
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        let moved_anchors: Vec<AnchorId> = source
            .attached_anchors()
            .filter(|a| {
                self.anchors
                    .get(a)
                    .and_then(|a| a.grapheme_index)
                    .is_some_and(|g| g >= first)
            })
            .collect();

        let children = if self.node(node)?.children.is_text() {
            let n = self.node_mut(node)?;
            let tail = n
                .children
                .split_text_off(first)
                .ok_or_else(|| EditorError::invalid_operation("text split failed"))?;
            let tail_len = tail.len();
            let strip_names: Vec<&'static str> = n
                .facets
                .iter()
                .filter(|(_, v)| matches!(v, WorkingFacetValue::TextStyleStrip(_)))
                .map(|(k, _)| *k)
                .collect();
            for name in strip_names {
                let Some(WorkingFacetValue::TextStyleStrip(strip)) = n.facets.get_mut(name) else {
                    continue;
                };
                let mut right = strip.split_at(first);
                right.truncate(tail_len);
                let left_empty = strip.is_empty();
                if !right.is_empty() {
                    facets.insert(name, WorkingFacetValue::TextStyleStrip(right));
                }
                if left_empty {
                    n.facets.remove(name);
                }
            }
            for anchor in &moved_anchors {
                n.attached_anchors.remove(anchor);
            }
            for anchor in &moved_anchors {
                if let Some(a) = self.anchors.get_mut(anchor) {
                    a.node = id;
                    a.grapheme_index = a.grapheme_index.map(|g| g - first);
                    self.pending_events.push(DocumentEvent::AnchorUpdated { anchor: *anchor });
                }
            }
            tail
        } else {
            let tail_ids = if rest.is_empty() {
                self.child_list_mut(node, None)?.split_off(first)
            } else {
                let child = self
                    .node(node)?
                    .children
                    .nodes()
                    .and_then(|ids| ids.get(first).copied())
                    .ok_or_else(|| EditorError::invalid_path(format!("child {first}")))?;
                let child_clone = self.split_subtree(child, rest)?;
                let mut tail = self.child_list_mut(node, None)?.split_off(first + 1);
                tail.insert(0, child_clone);
                tail
            };
            WorkingChildren::Nodes(tail_ids)
        };

        let attached_anchors = if children.is_text() {
            moved_anchors.into_iter().collect()
        } else {
            BTreeSet::new()
        };
        let child_ids = children.nodes().map(<[NodeId]>::to_vec).unwrap_or_default();
        self.nodes.insert(
            id,
            std::rc::Rc::new(WorkingNode {
                id,
                kind,
                parent: None,
                path_part: None,
                children,
                facets,
                attached_anchors,
            }),
        );
        if !child_ids.is_empty() {
            self.reindex_children(id, None)?;
        }
        self.emit(DocumentEvent::NodeCreated { node: id });
        self.emit(DocumentEvent::NodeUpdated { node });
        Ok(id)
    }

    // ============ Facets and node types ============

    /// Sets (or with `None` clears) the facet named `name` on `node`.
    ///
    /// Anchor facets replace their previous anchors. Node-array facets
    /// replace their previous nodes.
    pub fn set_node_facet(
        &mut self,
        node: NodeId,
        name: &str,
        value: Option<FacetValue>,
    ) -> Result<()> {
        let n = self.node(node)?;
        let facet = *facet_of(n.kind, name)?;
        if let Some(value) = &value {
            if !facet.accepts(value) {
                return Err(EditorError::type_mismatch(format!(
                    "facet {} on {} does not accept a {} value",
                    facet.name,
                    n.kind,
                    value.type_name()
                )));
            }
        } else if !facet.optional {
            return Err(EditorError::invalid_operation(format!(
                "facet {} on {} is required",
                facet.name, n.kind
            )));
        }

        let resolved = match &value {
            Some(FacetValue::Anchor(spec)) => Some((self.anchor_parameters_for_spec(spec)?, None)),
            Some(FacetValue::AnchorRange { from, to }) => Some((
                self.anchor_parameters_for_spec(from)?,
                Some(self.anchor_parameters_for_spec(to)?),
            )),
            Some(FacetValue::NodeArray(nodes)) => {
                for child in nodes {
                    child.validate()?;
                    self.check_anchor_specs(child)?;
                }
                None
            }
            _ => None,
        };

        self.clear_facet(node, facet.name)?;
        match value {
            None => {}
            Some(FacetValue::Anchor(_)) | Some(FacetValue::AnchorRange { .. }) => {
                if let Some((from, to)) = resolved {
                    let origin = Some(AnchorOrigin::Node(node));
                    let from = self.add_anchor_with_origin(from, origin)?;
                    let working = match to {
                        Some(to) => WorkingFacetValue::AnchorRange {
                            from,
                            to: self.add_anchor_with_origin(to, origin)?,
                        },
                        None => WorkingFacetValue::Anchor(from),
                    };
                    self.node_mut(node)?.facets.insert(facet.name, working);
                }
            }
            Some(FacetValue::NodeArray(nodes)) => {
                self.node_mut(node)?
                    .facets
                    .insert(facet.name, WorkingFacetValue::NodeArray(Vec::new()));
                for (index, child) in nodes.into_iter().enumerate() {
                    self.insert_node(node, child, index, Some(facet.name))?;
                }
            }
            Some(scalar) => {
                let working = match scalar {
                    FacetValue::Boolean(b) => WorkingFacetValue::Boolean(b),
                    FacetValue::Text(s) => WorkingFacetValue::Text(s),
                    FacetValue::Enum(s) => WorkingFacetValue::Enum(s),
                    FacetValue::EntityId(s) => WorkingFacetValue::EntityId(s),
                    FacetValue::TextStyleStrip(mut s) => {
                        s.truncate(self.node(node)?.children.len());
                        WorkingFacetValue::TextStyleStrip(s)
                    }
                    _ => return Err(EditorError::type_mismatch("unexpected facet value")),
                };
                self.node_mut(node)?.facets.insert(facet.name, working);
            }
        }
        self.emit(DocumentEvent::NodeUpdated { node });
        self.touch();
        Ok(())
    }

    /// Removes a facet value, deleting the anchors and nodes it owns.
    fn clear_facet(&mut self, node: NodeId, name: &'static str) -> Result<()> {
        let Some(old) = self.node_mut(node)?.facets.remove(name) else {
            return Ok(());
        };
        for anchor in old.anchor_ids() {
            self.remove_anchor(anchor);
        }
        if let WorkingFacetValue::NodeArray(ids) = old {
            // Put the array back so the children can be deleted through
            // their slots.
            self.node_mut(node)?
                .facets
                .insert(name, WorkingFacetValue::NodeArray(ids.clone()));
            for id in ids.into_iter().rev() {
                self.delete_node(id, self.orphan_direction)?;
            }
            self.node_mut(node)?.facets.remove(name);
        }
        Ok(())
    }

    /// Replaces the style entry at exactly `index` of a span's text.
    pub fn set_node_text_style_modifier(
        &mut self,
        node: NodeId,
        index: usize,
        modifier: TextStyleModifier,
    ) -> Result<()> {
        let n = self.text_node(node)?;
        let facet = *facet_of(n.kind, STYLES)?;
        let len = n.children.len();
        if index >= len {
            return Err(EditorError::invalid_path(format!(
                "grapheme {index} of node {node} with {len} graphemes"
            )));
        }
        let mut strip = n.styles().cloned().unwrap_or_default();
        strip.set_modifier(index, modifier);
        self.store_strip(node, facet.name, strip)
    }

    /// Applies `modifier` to every grapheme in `start..end` of a span,
    /// rewriting its strip with the fewest entries that give the new styles.
    pub fn apply_text_style_to_range(
        &mut self,
        node: NodeId,
        start: usize,
        end: usize,
        modifier: &TextStyleModifier,
    ) -> Result<()> {
        let n = self.text_node(node)?;
        let facet = *facet_of(n.kind, STYLES)?;
        let len = n.children.len();
        if start > end || end > len {
            return Err(EditorError::invalid_path(format!(
                "graphemes {start}..{end} of node {node} with {len} graphemes"
            )));
        }
        let strip = n.styles().cloned().unwrap_or_default();
        let mut styles: Vec<_> = (0..len).map(|i| strip.resolve_style_at(i)).collect();
        for style in &mut styles[start..end] {
            style.apply_modifier(modifier);
        }
        let mut rebuilt = TextStyleStrip::new();
        let mut previous = crate::text::TextStyle::default();
        for (index, style) in styles.into_iter().enumerate() {
            rebuilt.set_modifier(index, previous.difference_to(&style));
            previous = style;
        }
        self.store_strip(node, facet.name, rebuilt)
    }

    fn store_strip(&mut self, node: NodeId, name: &'static str, strip: TextStyleStrip) -> Result<()> {
        let n = self.node_mut(node)?;
        if strip.is_empty() {
            n.facets.remove(name);
        } else {
            n.facets.insert(name, WorkingFacetValue::TextStyleStrip(strip));
        }
        self.emit(DocumentEvent::NodeUpdated { node });
        self.touch();
        Ok(())
    }

    /// Changes the kind of `node` in place. Both kinds must hold the same
    /// shape of children.
    ///
    /// Facets the new kind does not declare are dropped. A missing required
    /// enum facet takes its first option.
    pub fn change_node_type(&mut self, node: NodeId, kind: NodeKind) -> Result<()> {
        let n = self.node(node)?;
        if n.kind == kind {
            return Ok(());
        }
        if n.kind == NodeKind::Document || kind == NodeKind::Document {
            return Err(EditorError::invalid_operation(
                "the document root cannot change kind",
            ));
        }
        if n.kind.children_type() != kind.children_type() {
            return Err(EditorError::invalid_operation(format!(
                "cannot change {} into {}",
                n.kind, kind
            )));
        }
        let (parent, part) = self.position_of(node)?;
        let parent_kind = self.node(parent)?.kind;
        let allowed = match part.facet {
            None => parent_kind.can_contain_children_of_kind(kind),
            Some(facet) => parent_kind.can_contain_facet_children_of_kind(facet, kind),
        };
        if !allowed {
            return Err(EditorError::invalid_operation(format!(
                "{parent_kind} cannot contain {kind}"
            )));
        }
        if let Some(children) = n.children.nodes() {
            for child in children {
                let child_kind = self.node(*child)?.kind;
                if !kind.can_contain_children_of_kind(child_kind) {
                    return Err(EditorError::invalid_operation(format!(
                        "{kind} cannot contain {child_kind}"
                    )));
                }
            }
        }

        let mut dropped = Vec::new();
        for (name, value) in &n.facets {
            if !kind.facet(name).is_some_and(|f| working_value_fits(f, value)) {
                dropped.push(*name);
            }
        }
        let mut filled = Vec::new();
        for facet in kind.facets() {
            let present = n.facets.contains_key(facet.name) && !dropped.contains(&facet.name);
            if present || facet.optional {
                continue;
            }
            match facet.value_type {
                FacetValueType::Enum(options) if !options.is_empty() => {
                    filled.push((facet.name, WorkingFacetValue::Enum(options[0].to_string())));
                }
                _ => {
                    return Err(EditorError::invalid_operation(format!(
                        "{kind} requires facet {} which {} lacks",
                        facet.name, n.kind
                    )));
                }
            }
        }

        for name in dropped {
            self.clear_facet(node, name)?;
        }
        let n = self.node_mut(node)?;
        n.kind = kind;
        n.facets.extend(filled);
        self.emit(DocumentEvent::NodeUpdated { node });
        self.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::builders::*;
    use crate::model::AnchorSpec;
    use crate::working::{AnchorParameters, InteractorParameters};
    use pretty_assertions::assert_eq;

    fn path(s: &str) -> Path {
        s.parse().expect("Should parse path")
    }

    fn node_at(doc: &WorkingDocument, p: &str) -> NodeId {
        let mut nav = doc.node_navigator();
        assert!(nav.navigate_to(&path(p)), "path {p} should resolve");
        nav.tip_node().expect("Should be a node").id()
    }

    fn text_at(doc: &WorkingDocument, p: &str) -> String {
        let id = node_at(doc, p);
        doc.export_node(id).expect("Should export node").text_content()
    }

    fn caret(doc: &mut WorkingDocument, p: &str, orientation: CursorOrientation) -> AnchorId {
        let params = doc
            .anchor_parameters_for_cursor_path(&crate::cursor::CursorPath::new(
                path(p),
                orientation,
            ))
            .expect("Should resolve caret");
        doc.add_anchor(params).expect("Should add anchor")
    }

    fn anchor_at(doc: &WorkingDocument, id: AnchorId) -> String {
        doc.cursor_path_for_anchor(id)
            .expect("Should resolve anchor")
            .to_string()
    }

    fn two_spans() -> WorkingDocument {
        WorkingDocument::new(document(vec![
            paragraph(vec![span("AB"), span("CD")]),
            paragraph(vec![span("EF")]),
        ]))
        .expect("Should load document")
    }

    // ============ Insertion tests ============

    #[test]
    fn test_insert_node_reindexes_following_siblings() {
        let mut doc = two_spans();
        let p = node_at(&doc, "0");
        let cd = node_at(&doc, "0/1");
        let new = doc.insert_node(p, span("XY"), 1, None).expect("Should insert");

        assert_eq!(doc.get_node_path(new).expect("Should have path"), path("0/1"));
        assert_eq!(doc.get_node_path(cd).expect("Should have path"), path("0/2"));
        assert_eq!(doc.to_node().expect("Should export").text_content(), "ABXYCDEF");
    }

    #[test]
    fn test_insert_node_rejects_wrong_container() {
        let mut doc = two_spans();
        let p = node_at(&doc, "0");
        let err = doc
            .insert_node(p, paragraph(vec![]), 0, None)
            .expect_err("Should refuse nesting paragraphs");
        assert!(matches!(err, EditorError::InvalidOperation(_)));
        let err = doc
            .insert_node(p, span("X"), 7, None)
            .expect_err("Should refuse out of range index");
        assert!(matches!(err, EditorError::InvalidPath(_)));
    }

    #[test]
    fn test_insert_into_empty_paragraph_moves_on_anchor_inside() {
        let mut doc = WorkingDocument::new(document(vec![paragraph(vec![])]))
            .expect("Should load document");
        let anchor = caret(&mut doc, "0", CursorOrientation::On);
        assert_eq!(anchor_at(&doc, anchor), "0N");

        let p = node_at(&doc, "0");
        doc.insert_node(p, span("X"), 0, None).expect("Should insert");
        let a = doc.anchor(anchor).expect("Should exist");
        assert_eq!(a.grapheme_index(), Some(0));
        assert_eq!(anchor_at(&doc, anchor), "0/0/0<");
    }

    #[test]
    fn test_insert_annotation_resolves_anchor_facet() {
        let mut doc = two_spans();
        let root = doc.root_id();
        let floater = Node::new(NodeKind::Floater).with_facet(
            "anchor",
            FacetValue::Anchor(AnchorSpec {
                node: path("1/0"),
                orientation: CursorOrientation::After,
                grapheme_index: Some(1),
                name: None,
            }),
        );
        let id = doc
            .insert_node(root, floater, 0, Some("annotations"))
            .expect("Should insert floater");
        assert_eq!(
            doc.get_node_path(id).expect("Should have path").to_string(),
            "annotations:0"
        );
        let Some(WorkingFacetValue::Anchor(anchor)) = doc.node(id).expect("live").facet("anchor")
        else {
            panic!("floater should own an anchor");
        };
        let anchor = doc.anchor(*anchor).expect("Should exist");
        assert_eq!(anchor.node(), node_at(&doc, "1/0"));
        assert_eq!(anchor.origin(), Some(AnchorOrigin::Node(id)));
    }

    #[test]
    fn test_insert_text_shifts_anchors_and_styles() {
        let mut doc = WorkingDocument::new(document(vec![paragraph(vec![styled_span(
            "ABCD",
            &[(2, TextStyleModifier::bold())],
        )])]))
        .expect("Should load document");
        let s = node_at(&doc, "0/0");
        let before = caret(&mut doc, "0/0/0", CursorOrientation::After);
        let after = caret(&mut doc, "0/0/2", CursorOrientation::After);

        doc.insert_node_text(s, 1, &Text::from("xy")).expect("Should insert text");
        assert_eq!(text_at(&doc, "0/0"), "AxyBCD");
        assert_eq!(doc.anchor(before).expect("live").grapheme_index(), Some(0));
        assert_eq!(doc.anchor(after).expect("live").grapheme_index(), Some(4));
        assert_eq!(
            doc.node(s).expect("live").styles().expect("styled").to_string(),
            "4:+B"
        );
    }

    #[test]
    fn test_clone_shares_everything_an_edit_leaves_alone() {
        let mut doc = two_spans();
        caret(&mut doc, "1/0/0", CursorOrientation::After);
        let snapshot = doc.clone();
        assert!(snapshot.nodes.ptr_eq(&doc.nodes));
        assert!(snapshot.anchors.ptr_eq(&doc.anchors));

        let edited = node_at(&doc, "0/0");
        let untouched = node_at(&doc, "1/0");
        doc.insert_node_text(edited, 0, &Text::from("x")).expect("Should insert text");

        let shared = |id: NodeId| {
            std::rc::Rc::ptr_eq(
                snapshot.nodes.get(&id).expect("in snapshot"),
                doc.nodes.get(&id).expect("in document"),
            )
        };
        assert!(shared(untouched));
        assert!(shared(node_at(&doc, "1")));
        assert!(!shared(edited));
        assert_eq!(text_at(&snapshot, "0/0"), "AB");
        assert_eq!(text_at(&doc, "0/0"), "xAB");
    }

    // ============ Deletion tests ============

    #[test]
    fn test_delete_grapheme_orphans_anchor_backward() {
        let mut doc = two_spans();
        let s = node_at(&doc, "0/0");
        let on_b = caret(&mut doc, "0/0/1", CursorOrientation::After);
        doc.delete_node_grapheme(s, 1, FlowDirection::Backward)
            .expect("Should delete");
        assert_eq!(text_at(&doc, "0/0"), "A");
        assert_eq!(anchor_at(&doc, on_b), "0/0/0>");
    }

    #[test]
    fn test_delete_grapheme_shifts_later_anchors() {
        let mut doc = two_spans();
        let s = node_at(&doc, "0/1");
        let on_d = caret(&mut doc, "0/1/1", CursorOrientation::After);
        doc.delete_node_grapheme(s, 0, FlowDirection::Backward)
            .expect("Should delete");
        assert_eq!(doc.anchor(on_d).expect("live").grapheme_index(), Some(0));
        assert_eq!(anchor_at(&doc, on_d), "0/1/0>");
    }

    #[test]
    fn test_delete_node_repositions_by_direction() {
        let mut doc = two_spans();
        let cd = node_at(&doc, "0/1");
        let backward = caret(&mut doc, "0/1/1", CursorOrientation::After);
        doc.delete_node(cd, FlowDirection::Backward).expect("Should delete");
        assert_eq!(anchor_at(&doc, backward), "0/0/1>");

        let mut doc = two_spans();
        let ab = node_at(&doc, "0/0");
        let forward = caret(&mut doc, "0/0/0", CursorOrientation::After);
        doc.delete_node(ab, FlowDirection::Forward).expect("Should delete");
        assert_eq!(anchor_at(&doc, forward), "0/0/0<");
        assert_eq!(text_at(&doc, "0/0"), "CD");
    }

    #[test]
    fn test_delete_last_child_leaves_anchor_on_parent() {
        let mut doc = two_spans();
        let ef = node_at(&doc, "1/0");
        let anchor = caret(&mut doc, "1/0/1", CursorOrientation::After);
        doc.delete_node(ef, FlowDirection::Forward).expect("Should delete");
        assert_eq!(anchor_at(&doc, anchor), "1N");
        assert_eq!(doc.anchor(anchor).expect("live").node(), node_at(&doc, "1"));
    }

    #[test]
    fn test_delete_root_is_refused() {
        let mut doc = two_spans();
        let root = doc.root_id();
        let err = doc
            .delete_node(root, FlowDirection::Backward)
            .expect_err("Should refuse");
        assert!(matches!(err, EditorError::InvalidOperation(_)));
    }

    #[test]
    fn test_deleting_anchor_owner_removes_its_anchors() {
        let mut doc = WorkingDocument::new(
            document(vec![paragraph(vec![span("AB")])]).with_facet(
                "annotations",
                FacetValue::NodeArray(vec![Node::new(NodeKind::Footnote).with_facet(
                    "anchor",
                    FacetValue::Anchor(AnchorSpec {
                        node: path("0/0"),
                        orientation: CursorOrientation::After,
                        grapheme_index: Some(1),
                        name: None,
                    }),
                )]),
            ),
        )
        .expect("Should load document");
        assert_eq!(doc.anchors().count(), 1);
        let footnote = node_at(&doc, "annotations:0");
        doc.delete_node(footnote, FlowDirection::Backward)
            .expect("Should delete");
        assert_eq!(doc.anchors().count(), 0);
    }

    #[test]
    fn test_delete_range_across_blocks() {
        let mut doc = two_spans();
        let anchor = caret(&mut doc, "1/0/0", CursorOrientation::After);
        doc.delete_nodes_in_range(&Range::new(path("0/0/1"), path("1/0/0")), FlowDirection::Backward)
            .expect("Should delete range");
        assert_eq!(doc.to_node().expect("Should export").text_content(), "AF");
        assert_eq!(anchor_at(&doc, anchor), "1/0/0<");
    }

    // ============ Join and split tests ============

    #[test]
    fn test_join_text_moves_anchors_and_merges_styles() {
        let mut doc = WorkingDocument::new(document(vec![paragraph(vec![
            styled_span("AB", &[(0, TextStyleModifier::bold())]),
            span("CD"),
        ])]))
        .expect("Should load document");
        let left = node_at(&doc, "0/0");
        let on_d = caret(&mut doc, "0/1/1", CursorOrientation::After);

        let result = doc
            .join_sibling_into_node(left, FlowDirection::Forward)
            .expect("Should join");
        assert_eq!(result, JoinResult { destination: left, seam_index: 2 });
        assert_eq!(text_at(&doc, "0/0"), "ABCD");
        assert_eq!(doc.anchor(on_d).expect("live").grapheme_index(), Some(3));
        assert_eq!(doc.anchor(on_d).expect("live").node(), left);
        assert_eq!(
            doc.node(left).expect("live").styles().expect("styled").to_string(),
            "0:+B,2:-B"
        );
    }

    #[test]
    fn test_join_backward_prepends_preceding_sibling() {
        let mut doc = two_spans();
        let second = node_at(&doc, "1");
        let on_f = caret(&mut doc, "1/0/1", CursorOrientation::After);
        let result = doc
            .join_sibling_into_node(second, FlowDirection::Backward)
            .expect("Should join");
        assert_eq!(result.seam_index, 2);
        assert_eq!(doc.get_node_path(second).expect("path"), path("0"));
        assert_eq!(text_at(&doc, "0"), "ABCDEF");
        assert_eq!(anchor_at(&doc, on_f), "0/2/1>");
    }

    #[test]
    fn test_join_rejects_mismatched_kinds() {
        let mut doc = WorkingDocument::new(document(vec![
            header(vec![span("H")]),
            paragraph(vec![span("P")]),
        ]))
        .expect("Should load document");
        let p = node_at(&doc, "1");
        let err = doc
            .join_sibling_into_node(p, FlowDirection::Backward)
            .expect_err("Should refuse");
        assert!(matches!(err, EditorError::InvalidOperation(_)));
    }

    #[test]
    fn test_split_block_moves_tail_and_anchors() {
        let mut doc = two_spans();
        let p = node_at(&doc, "0");
        let on_c = caret(&mut doc, "0/1/0", CursorOrientation::After);
        let on_a = caret(&mut doc, "0/0/0", CursorOrientation::After);

        let clone = doc.split_node(p, &[1, 1]).expect("Should split");
        assert_eq!(doc.get_node_path(clone).expect("path"), path("1"));
        assert_eq!(text_at(&doc, "0"), "ABC");
        assert_eq!(text_at(&doc, "1"), "D");
        assert_eq!(text_at(&doc, "2"), "EF");
        assert_eq!(anchor_at(&doc, on_c), "0/1/0>");
        assert_eq!(anchor_at(&doc, on_a), "0/0/0>");
    }

    #[test]
    fn test_split_then_join_restores_text_and_anchors() {
        let mut doc = WorkingDocument::new(document(vec![paragraph(vec![styled_span(
            "ABCDE",
            &[(1, TextStyleModifier::bold()), (3, TextStyleModifier::italic())],
        )])]))
        .expect("Should load document");
        let s = node_at(&doc, "0/0");
        let anchors: Vec<AnchorId> = (0..5)
            .map(|i| caret(&mut doc, &format!("0/0/{i}"), CursorOrientation::After))
            .collect();
        let before: Vec<String> = anchors.iter().map(|a| anchor_at(&doc, *a)).collect();
        let styles_before: Vec<_> = (0..5)
            .map(|i| doc.node(s).expect("live").styles().expect("styled").resolve_style_at(i))
            .collect();

        let clone = doc.split_node(s, &[2]).expect("Should split");
        assert_eq!(text_at(&doc, "0/1"), "CDE");
        doc.join_sibling_into_node(clone, FlowDirection::Backward)
            .expect("Should join");

        assert_eq!(text_at(&doc, "0/0"), "ABCDE");
        let after: Vec<String> = anchors.iter().map(|a| anchor_at(&doc, *a)).collect();
        assert_eq!(after, before);
        let strip = doc.node(clone).expect("live").styles().expect("styled").clone();
        let styles_after: Vec<_> = (0..5).map(|i| strip.resolve_style_at(i)).collect();
        assert_eq!(styles_after, styles_before);
    }

    #[test]
    fn test_split_out_of_range_is_invalid_path() {
        let mut doc = two_spans();
        let s = node_at(&doc, "0/0");
        let err = doc.split_node(s, &[9]).expect_err("Should refuse");
        assert!(matches!(err, EditorError::InvalidPath(_)));
    }

    #[test]
    fn test_join_spans_at_merges_unstyled_neighbours() {
        let mut doc = two_spans();
        let p = node_at(&doc, "0");
        assert!(doc.join_spans_at(p, 1).expect("Should join"));
        assert_eq!(doc.node(p).expect("live").children().len(), 1);
        assert_eq!(text_at(&doc, "0/0"), "ABCD");
        assert!(!doc.join_spans_at(p, 1).expect("Nothing to join"));
    }

    // ============ Facet and type tests ============

    #[test]
    fn test_set_facet_checks_names_and_types() {
        let mut doc = WorkingDocument::new(document(vec![header(vec![span("H")])]))
            .expect("Should load document");
        let h = node_at(&doc, "0");
        doc.set_node_facet(h, "level", Some(FacetValue::Enum("TWO".to_string())))
            .expect("Should set level");
        assert_eq!(
            doc.node(h).expect("live").facet("level"),
            Some(&WorkingFacetValue::Enum("TWO".to_string()))
        );

        let err = doc
            .set_node_facet(h, "level", Some(FacetValue::Boolean(true)))
            .expect_err("Should refuse");
        assert!(matches!(err, EditorError::TypeMismatch(_)));
        let err = doc
            .set_node_facet(h, "colour", Some(FacetValue::Boolean(true)))
            .expect_err("Should refuse");
        assert!(matches!(err, EditorError::UnknownId(_)));
        let err = doc.set_node_facet(h, "level", None).expect_err("Should refuse");
        assert!(matches!(err, EditorError::InvalidOperation(_)));
    }

    #[test]
    fn test_set_anchor_facet_replaces_previous_anchor() {
        let spec = |i| {
            FacetValue::Anchor(AnchorSpec {
                node: path("0/0"),
                orientation: CursorOrientation::After,
                grapheme_index: Some(i),
                name: None,
            })
        };
        let mut doc = WorkingDocument::new(
            document(vec![paragraph(vec![span("AB")])]).with_facet(
                "laterals",
                FacetValue::NodeArray(vec![
                    Node::new(NodeKind::Sidebar).with_facet("anchor", spec(0)),
                ]),
            ),
        )
        .expect("Should load document");
        assert_eq!(doc.anchors().count(), 1);
        let sidebar = node_at(&doc, "laterals:0");
        doc.set_node_facet(sidebar, "anchor", Some(spec(1)))
            .expect("Should replace");
        assert_eq!(doc.anchors().count(), 1);
        assert_eq!(doc.anchors().next().map(|a| a.grapheme_index()), Some(Some(1)));
    }

    #[test]
    fn test_apply_text_style_to_range_builds_minimal_strip() {
        let mut doc = WorkingDocument::new(document(vec![paragraph(vec![span("ABCDEF")])]))
            .expect("Should load document");
        let s = node_at(&doc, "0/0");
        doc.apply_text_style_to_range(s, 1, 3, &TextStyleModifier::bold())
            .expect("Should style");
        doc.apply_text_style_to_range(s, 3, 4, &TextStyleModifier::bold())
            .expect("Should style");
        assert_eq!(
            doc.node(s).expect("live").styles().expect("styled").to_string(),
            "1:+B,4:-B"
        );
        doc.apply_text_style_to_range(
            s,
            0,
            6,
            &TextStyleModifier {
                bold: Some(false),
                ..Default::default()
            },
        )
        .expect("Should style");
        assert_eq!(doc.node(s).expect("live").styles(), None);
    }

    #[test]
    fn test_change_node_type_fills_and_drops_facets() {
        let mut doc = two_spans();
        let p = node_at(&doc, "0");
        doc.change_node_type(p, NodeKind::Header).expect("Should change");
        assert_eq!(doc.node(p).expect("live").kind(), NodeKind::Header);
        assert_eq!(
            doc.node(p).expect("live").facet("level"),
            Some(&WorkingFacetValue::Enum("ONE".to_string()))
        );
        doc.change_node_type(p, NodeKind::Paragraph).expect("Should change back");
        assert_eq!(doc.node(p).expect("live").facet("level"), None);

        let err = doc
            .change_node_type(p, NodeKind::List)
            .expect_err("Should refuse different children shape");
        assert!(matches!(err, EditorError::InvalidOperation(_)));
    }

    // ============ Interactor tests ============

    #[test]
    fn test_interactor_anchors_follow_deletion() {
        let mut doc = two_spans();
        let s = node_at(&doc, "0/1");
        let params = AnchorParameters {
            node: s,
            orientation: CursorOrientation::After,
            grapheme_index: Some(0),
            name: None,
        };
        let mut interactor = InteractorParameters::caret(params);
        interactor.name = Some("α".to_string());
        let id = doc.add_interactor(interactor).expect("Should add interactor");
        let main = doc.interactor(id).expect("live").main_anchor();
        assert_eq!(doc.anchor(main).expect("live").name(), Some("α-MAIN"));

        doc.delete_node(s, FlowDirection::Backward).expect("Should delete");
        assert_eq!(anchor_at(&doc, main), "0/0/1>");
        assert_eq!(
            doc.delete_anchor(main, false).expect_err("Owned anchor"),
            EditorError::InvalidOperation(format!(
                "anchor {main} is owned by {:?}",
                Some(AnchorOrigin::Interactor(id))
            ))
        );
    }
}
