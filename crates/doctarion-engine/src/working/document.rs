use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use im_rc::{HashMap, OrdMap};

use super::anchor::{Anchor, AnchorOrigin, AnchorParameters, AnchorUpdate};
use super::events::DocumentEvent;
use super::FlowDirection;
use super::ids::{AnchorId, IdGenerator, InteractorId, NodeId};
use super::interactor::{Interactor, InteractorParameters, InteractorUpdate};
use super::node::{WorkingChildren, WorkingFacetValue, WorkingNode};
use crate::cursor::{CursorNavigator, CursorOrientation, CursorPath};
use crate::error::{EditorError, Result};
use crate::model::{AnchorSpec, FacetValue, Node, NodeChildren, NodeKind};
use crate::traversal::{NodeNavigator, Path, PathPart};

/// An anchor or anchor-range facet found while loading nodes, waiting for
/// its anchors to be created.
pub(crate) struct PendingAnchorFacet {
    node: NodeId,
    facet: &'static str,
    from: AnchorSpec,
    to: Option<AnchorSpec>,
}

/// The mutable, editable form of a document.
///
/// Owns the node table, the anchor table and the interactors. All structural
/// change goes through its methods so anchors and parent links stay
/// coherent. The tables are persistent maps, so a clone is a handful of
/// pointer copies and an edit copies only the nodes and anchors it touches.
#[derive(Debug, Clone)]
pub struct WorkingDocument {
    pub(crate) root: NodeId,
    pub(crate) nodes: HashMap<NodeId, Rc<WorkingNode>>,
    pub(crate) anchors: OrdMap<AnchorId, Anchor>,
    pub(crate) interactors: OrdMap<InteractorId, Interactor>,
    pub(crate) focused_interactor: Option<InteractorId>,
    pub(crate) ids: IdGenerator,
    /// Events not yet handed to the editor.
    pub(crate) pending_events: Vec<DocumentEvent>,
    /// Bumped by every mutation.
    pub(crate) version: u64,
    /// Where anchors go when a primitive orphans them without being told.
    pub(crate) orphan_direction: FlowDirection,
}

impl WorkingDocument {
    /// Loads a `Document` node tree. The result has no interactors.
    pub fn new(document: Node) -> Result<Self> {
        if document.kind != NodeKind::Document {
            return Err(EditorError::invalid_operation(format!(
                "cannot load a {} node as a document",
                document.kind
            )));
        }
        document.validate()?;

        let mut doc = WorkingDocument {
            root: NodeId(0),
            nodes: HashMap::new(),
            anchors: OrdMap::new(),
            interactors: OrdMap::new(),
            focused_interactor: None,
            ids: IdGenerator::default(),
            pending_events: Vec::new(),
            version: 0,
            orphan_direction: FlowDirection::Backward,
        };
        let mut pending = Vec::new();
        doc.root = doc.create_subtree(&document, None, None, &mut pending);
        let resolved = doc.resolve_pending_anchor_facets(&pending)?;
        doc.attach_anchor_facets(pending, resolved)?;
        doc.pending_events.clear();
        doc.version = 0;
        Ok(doc)
    }

    // ============ Accessors ============

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn orphan_direction(&self) -> FlowDirection {
        self.orphan_direction
    }

    /// Direction used for anchors orphaned by joins and facet replacement,
    /// which have no edit direction of their own.
    pub fn set_orphan_direction(&mut self, direction: FlowDirection) {
        self.orphan_direction = direction;
    }

    pub fn get_node(&self, id: NodeId) -> Option<&WorkingNode> {
        self.nodes.get(&id).map(Rc::as_ref)
    }

    pub fn node(&self, id: NodeId) -> Result<&WorkingNode> {
        self.get_node(id)
            .ok_or_else(|| EditorError::unknown_id(format!("node {id}")))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut WorkingNode> {
        self.nodes
            .get_mut(&id)
            .map(Rc::make_mut)
            .ok_or_else(|| EditorError::unknown_id(format!("node {id}")))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &WorkingNode> {
        self.nodes.values().map(Rc::as_ref)
    }

    pub fn anchor(&self, id: AnchorId) -> Result<&Anchor> {
        self.anchors
            .get(&id)
            .ok_or_else(|| EditorError::unknown_id(format!("anchor {id}")))
    }

    pub fn anchors(&self) -> impl Iterator<Item = &Anchor> {
        self.anchors.values()
    }

    pub fn interactor(&self, id: InteractorId) -> Result<&Interactor> {
        self.interactors
            .get(&id)
            .ok_or_else(|| EditorError::unknown_id(format!("interactor {id}")))
    }

    pub fn interactors(&self) -> impl Iterator<Item = &Interactor> {
        self.interactors.values()
    }

    pub fn focused_interactor_id(&self) -> Option<InteractorId> {
        self.focused_interactor
    }

    pub fn focused_interactor(&self) -> Option<&Interactor> {
        self.focused_interactor
            .and_then(|id| self.interactors.get(&id))
    }

    pub(crate) fn touch(&mut self) {
        self.version += 1;
    }

    pub(crate) fn emit(&mut self, event: DocumentEvent) {
        self.pending_events.push(event);
    }

    pub(crate) fn take_events(&mut self) -> Vec<DocumentEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn get_node_path(&self, id: NodeId) -> Result<Path> {
        let mut parts = Vec::new();
        let mut current = self.node(id)?;
        while let Some(parent) = current.parent {
            let part = current.path_part.ok_or_else(|| {
                EditorError::invalid_operation(format!("node {} has no position", current.id))
            })?;
            parts.push(part);
            current = self.node(parent)?;
        }
        parts.reverse();
        Ok(Path::new(parts))
    }

    pub fn node_navigator(&self) -> NodeNavigator<'_> {
        NodeNavigator::new(self)
    }

    // ============ Loading and export ============

    /// Registers `node` and its whole subtree in the node table. The new
    /// root is not linked into `parent`'s children.
    pub(crate) fn create_subtree(
        &mut self,
        node: &Node,
        parent: Option<NodeId>,
        path_part: Option<PathPart>,
        pending: &mut Vec<PendingAnchorFacet>,
    ) -> NodeId {
        let id = self.ids.node();
        let children = match &node.children {
            NodeChildren::None => WorkingChildren::None,
            NodeChildren::Text(t) => WorkingChildren::Text(t.clone()),
            NodeChildren::FancyText(t) => WorkingChildren::FancyText(t.clone()),
            NodeChildren::Nodes(nodes) => WorkingChildren::Nodes(
                nodes
                    .iter()
                    .enumerate()
                    .map(|(i, child)| {
                        self.create_subtree(child, Some(id), Some(PathPart::new(i)), pending)
                    })
                    .collect(),
            ),
        };

        let mut facets = BTreeMap::new();
        for (name, value) in &node.facets {
            let Some(facet) = node.kind.facet(name) else {
                continue;
            };
            let working = match value {
                FacetValue::Boolean(b) => WorkingFacetValue::Boolean(*b),
                FacetValue::Text(s) => WorkingFacetValue::Text(s.clone()),
                FacetValue::Enum(s) => WorkingFacetValue::Enum(s.clone()),
                FacetValue::EntityId(s) => WorkingFacetValue::EntityId(s.clone()),
                FacetValue::TextStyleStrip(s) => WorkingFacetValue::TextStyleStrip(s.clone()),
                FacetValue::NodeArray(nodes) => WorkingFacetValue::NodeArray(
                    nodes
                        .iter()
                        .enumerate()
                        .map(|(i, child)| {
                            let part = PathPart::in_facet(facet.name, i);
                            self.create_subtree(child, Some(id), Some(part), pending)
                        })
                        .collect(),
                ),
                FacetValue::Anchor(spec) => {
                    pending.push(PendingAnchorFacet {
                        node: id,
                        facet: facet.name,
                        from: spec.clone(),
                        to: None,
                    });
                    continue;
                }
                FacetValue::AnchorRange { from, to } => {
                    pending.push(PendingAnchorFacet {
                        node: id,
                        facet: facet.name,
                        from: from.clone(),
                        to: Some(to.clone()),
                    });
                    continue;
                }
            };
            facets.insert(facet.name, working);
        }

        self.nodes.insert(
            id,
            Rc::new(WorkingNode {
                id,
                kind: node.kind,
                parent,
                path_part,
                children,
                facets,
                attached_anchors: BTreeSet::new(),
            }),
        );
        self.emit(DocumentEvent::NodeCreated { node: id });
        id
    }

    pub(crate) fn anchor_parameters_for_spec(&self, spec: &AnchorSpec) -> Result<AnchorParameters> {
        let mut nav = NodeNavigator::new(self);
        if !nav.navigate_to(&spec.node) {
            return Err(EditorError::invalid_path(&spec.node));
        }
        let node = nav
            .tip_node()
            .ok_or_else(|| EditorError::invalid_path(format!("{} is not a node", spec.node)))?;
        self.check_anchor_position(node.id, spec.grapheme_index)?;
        Ok(AnchorParameters {
            node: node.id,
            orientation: spec.orientation,
            grapheme_index: spec.grapheme_index,
            name: spec.name.clone(),
        })
    }

    pub(crate) fn resolve_pending_anchor_facets(
        &self,
        pending: &[PendingAnchorFacet],
    ) -> Result<Vec<(AnchorParameters, Option<AnchorParameters>)>> {
        pending
            .iter()
            .map(|p| {
                let from = self.anchor_parameters_for_spec(&p.from)?;
                let to = p
                    .to
                    .as_ref()
                    .map(|spec| self.anchor_parameters_for_spec(spec))
                    .transpose()?;
                Ok((from, to))
            })
            .collect()
    }

    pub(crate) fn attach_anchor_facets(
        &mut self,
        pending: Vec<PendingAnchorFacet>,
        resolved: Vec<(AnchorParameters, Option<AnchorParameters>)>,
    ) -> Result<()> {
        for (p, (from, to)) in pending.into_iter().zip(resolved) {
            let origin = Some(AnchorOrigin::Node(p.node));
            let from = self.add_anchor_with_origin(from, origin)?;
            let value = match to {
                Some(to) => WorkingFacetValue::AnchorRange {
                    from,
                    to: self.add_anchor_with_origin(to, origin)?,
                },
                None => WorkingFacetValue::Anchor(from),
            };
            self.node_mut(p.node)?.facets.insert(p.facet, value);
        }
        Ok(())
    }

    /// Exports the document back to an interchange tree.
    pub fn to_node(&self) -> Result<Node> {
        self.export_node(self.root)
    }

    pub fn export_node(&self, id: NodeId) -> Result<Node> {
        let node = self.node(id)?;
        let children = match &node.children {
            WorkingChildren::None => NodeChildren::None,
            WorkingChildren::Text(t) => NodeChildren::Text(t.clone()),
            WorkingChildren::FancyText(t) => NodeChildren::FancyText(t.clone()),
            WorkingChildren::Nodes(ids) => NodeChildren::Nodes(
                ids.iter()
                    .map(|c| self.export_node(*c))
                    .collect::<Result<_>>()?,
            ),
        };
        let mut facets = BTreeMap::new();
        for (name, value) in &node.facets {
            let exported = match value {
                WorkingFacetValue::Boolean(b) => FacetValue::Boolean(*b),
                WorkingFacetValue::Text(s) => FacetValue::Text(s.clone()),
                WorkingFacetValue::Enum(s) => FacetValue::Enum(s.clone()),
                WorkingFacetValue::EntityId(s) => FacetValue::EntityId(s.clone()),
                WorkingFacetValue::TextStyleStrip(s) => FacetValue::TextStyleStrip(s.clone()),
                WorkingFacetValue::Anchor(a) => FacetValue::Anchor(self.anchor_spec(*a)?),
                WorkingFacetValue::AnchorRange { from, to } => FacetValue::AnchorRange {
                    from: self.anchor_spec(*from)?,
                    to: self.anchor_spec(*to)?,
                },
                WorkingFacetValue::NodeArray(ids) => FacetValue::NodeArray(
                    ids.iter()
                        .map(|c| self.export_node(*c))
                        .collect::<Result<_>>()?,
                ),
            };
            facets.insert(name.to_string(), exported);
        }
        Ok(Node {
            kind: node.kind,
            children,
            facets,
        })
    }

    pub fn anchor_spec(&self, id: AnchorId) -> Result<AnchorSpec> {
        let anchor = self.anchor(id)?;
        Ok(AnchorSpec {
            node: self.get_node_path(anchor.node)?,
            orientation: anchor.orientation,
            grapheme_index: anchor.grapheme_index,
            name: anchor.name.clone(),
        })
    }

    // ============ Anchors ============

    fn check_anchor_position(&self, node: NodeId, grapheme_index: Option<usize>) -> Result<()> {
        let n = self.node(node)?;
        if let Some(index) = grapheme_index {
            if !n.children.is_text() {
                return Err(EditorError::invalid_operation(format!(
                    "{} nodes have no graphemes to anchor to",
                    n.kind
                )));
            }
            if index >= n.children.len() {
                return Err(EditorError::invalid_path(format!(
                    "grapheme {index} of node {node}"
                )));
            }
        }
        Ok(())
    }

    pub fn add_anchor(&mut self, parameters: AnchorParameters) -> Result<AnchorId> {
        self.add_anchor_with_origin(parameters, None)
    }

    pub(crate) fn add_anchor_with_origin(
        &mut self,
        parameters: AnchorParameters,
        origin: Option<AnchorOrigin>,
    ) -> Result<AnchorId> {
        self.check_anchor_position(parameters.node, parameters.grapheme_index)?;
        let id = self.ids.anchor();
        self.node_mut(parameters.node)?.attached_anchors.insert(id);
        self.anchors.insert(
            id,
            Anchor {
                id,
                node: parameters.node,
                orientation: parameters.orientation,
                grapheme_index: parameters.grapheme_index,
                name: parameters.name,
                origin,
            },
        );
        self.emit(DocumentEvent::AnchorAdded { anchor: id });
        self.touch();
        Ok(id)
    }

    /// Deletes a free-standing anchor. Anchors owned by an interactor or a
    /// node facet are refused unless `bypass_origin_check` is set.
    pub fn delete_anchor(&mut self, id: AnchorId, bypass_origin_check: bool) -> Result<()> {
        let anchor = self.anchor(id)?;
        if anchor.origin.is_some() && !bypass_origin_check {
            return Err(EditorError::invalid_operation(format!(
                "anchor {id} is owned by {:?}",
                anchor.origin
            )));
        }
        self.remove_anchor(id);
        Ok(())
    }

    pub(crate) fn remove_anchor(&mut self, id: AnchorId) {
        let Some(anchor) = self.anchors.remove(&id) else {
            return;
        };
        if let Ok(node) = self.node_mut(anchor.node) {
            node.attached_anchors.remove(&id);
        }
        self.emit(DocumentEvent::AnchorDeleted { anchor: id });
        self.touch();
    }

    pub fn update_anchor(&mut self, id: AnchorId, update: AnchorUpdate) -> Result<()> {
        let anchor = self.anchor(id)?.clone();
        let node = update.node.unwrap_or(anchor.node);
        let grapheme_index = update.grapheme_index.unwrap_or(anchor.grapheme_index);
        self.check_anchor_position(node, grapheme_index)?;

        if node != anchor.node {
            if let Ok(old) = self.node_mut(anchor.node) {
                old.attached_anchors.remove(&id);
            }
            self.node_mut(node)?.attached_anchors.insert(id);
        }
        if let Some(a) = self.anchors.get_mut(&id) {
            a.node = node;
            a.grapheme_index = grapheme_index;
            if let Some(orientation) = update.orientation {
                a.orientation = orientation;
            }
            if let Some(name) = update.name {
                a.name = name;
            }
        }
        self.emit(DocumentEvent::AnchorUpdated { anchor: id });
        self.touch();
        Ok(())
    }

    /// A cursor navigator positioned at the anchor.
    ///
    /// `Before` a grapheme other than the first is read as `After` the
    /// previous one, and the result is corrected onto a canonical position.
    pub fn cursor_navigator_for_anchor(&self, id: AnchorId) -> Result<CursorNavigator<'_>> {
        let anchor = self.anchor(id)?;
        let mut path = self.get_node_path(anchor.node)?;
        let mut orientation = anchor.orientation;
        if let Some(index) = anchor.grapheme_index {
            let index = match orientation {
                CursorOrientation::Before if index > 0 => {
                    orientation = CursorOrientation::After;
                    index - 1
                }
                _ => index,
            };
            path.push(PathPart::new(index));
        }
        let mut cursor = CursorNavigator::new(self);
        if !cursor.navigate_to(&path, orientation) {
            return Err(EditorError::invalid_path(path));
        }
        Ok(cursor)
    }

    pub fn cursor_path_for_anchor(&self, id: AnchorId) -> Result<CursorPath> {
        Ok(self.cursor_navigator_for_anchor(id)?.cursor_path())
    }

    pub fn get_anchor_parameters_from_cursor_navigator(
        cursor: &CursorNavigator<'_>,
    ) -> Result<AnchorParameters> {
        let nav = cursor.node_navigator();
        let (node, grapheme_index) = match nav.grapheme_index() {
            Some(index) => (nav.parent_node(), Some(index)),
            None => (nav.tip_node(), None),
        };
        let node = node.ok_or_else(|| EditorError::invalid_path(nav.path()))?;
        Ok(AnchorParameters {
            node: node.id,
            orientation: cursor.orientation(),
            grapheme_index,
            name: None,
        })
    }

    /// Anchor parameters for a caret at `cursor`, corrected onto a canonical
    /// position.
    pub fn anchor_parameters_for_cursor_path(&self, cursor: &CursorPath) -> Result<AnchorParameters> {
        let mut nav = CursorNavigator::new(self);
        if !nav.navigate_to_cursor_path(cursor) {
            return Err(EditorError::invalid_path(&cursor.path));
        }
        Self::get_anchor_parameters_from_cursor_navigator(&nav)
    }

    // ============ Interactors ============

    pub fn add_interactor(&mut self, parameters: InteractorParameters) -> Result<InteractorId> {
        self.check_anchor_position(parameters.main_anchor.node, parameters.main_anchor.grapheme_index)?;
        if let Some(selection) = &parameters.selection_anchor {
            self.check_anchor_position(selection.node, selection.grapheme_index)?;
        }
        let id = self.ids.interactor();
        let origin = Some(AnchorOrigin::Interactor(id));
        let main_anchor = self.add_anchor_with_origin(
            named(parameters.main_anchor, parameters.name.as_deref(), "MAIN"),
            origin,
        )?;
        let selection_anchor = parameters
            .selection_anchor
            .map(|s| {
                self.add_anchor_with_origin(named(s, parameters.name.as_deref(), "SELECTION"), origin)
            })
            .transpose()?;
        self.interactors.insert(
            id,
            Interactor {
                id,
                main_anchor,
                selection_anchor,
                status: parameters.status,
                line_movement_horizontal_visual_position: parameters
                    .line_movement_horizontal_visual_position,
                name: parameters.name,
            },
        );
        self.emit(DocumentEvent::InteractorAdded { interactor: id });
        self.touch();
        Ok(id)
    }

    pub fn update_interactor(&mut self, id: InteractorId, update: InteractorUpdate) -> Result<()> {
        let interactor = self.interactor(id)?.clone();
        if let Some(main) = &update.main_anchor {
            self.check_anchor_position(main.node, main.grapheme_index)?;
        }
        if let Some(Some(selection)) = &update.selection_anchor {
            self.check_anchor_position(selection.node, selection.grapheme_index)?;
        }

        let name = match &update.name {
            Some(name) => name.clone(),
            None => interactor.name.clone(),
        };
        if let Some(main) = &update.main_anchor {
            self.update_anchor(interactor.main_anchor, AnchorUpdate::reposition(main))?;
        }
        let mut selection_anchor = interactor.selection_anchor;
        match (update.selection_anchor, interactor.selection_anchor) {
            (Some(None), Some(existing)) => {
                self.remove_anchor(existing);
                selection_anchor = None;
            }
            (Some(Some(selection)), Some(existing)) => {
                self.update_anchor(existing, AnchorUpdate::reposition(&selection))?;
            }
            (Some(Some(selection)), None) => {
                selection_anchor = Some(self.add_anchor_with_origin(
                    named(selection, name.as_deref(), "SELECTION"),
                    Some(AnchorOrigin::Interactor(id)),
                )?);
            }
            _ => {}
        }
        if update.name.is_some() {
            self.rename_interactor_anchors(interactor.main_anchor, selection_anchor, name.as_deref());
        }

        if let Some(i) = self.interactors.get_mut(&id) {
            i.selection_anchor = selection_anchor;
            if let Some(status) = update.status {
                i.status = status;
            }
            if let Some(position) = update.line_movement_horizontal_visual_position {
                i.line_movement_horizontal_visual_position = position;
            }
            i.name = name;
        }
        self.emit(DocumentEvent::InteractorUpdated { interactor: id });
        self.touch();
        Ok(())
    }

    fn rename_interactor_anchors(
        &mut self,
        main: AnchorId,
        selection: Option<AnchorId>,
        name: Option<&str>,
    ) {
        for (anchor, suffix) in [(Some(main), "MAIN"), (selection, "SELECTION")] {
            if let Some(a) = anchor.and_then(|a| self.anchors.get_mut(&a)) {
                a.name = name.map(|n| format!("{n}-{suffix}"));
            }
        }
    }

    /// Deletes the interactor and its anchors, clearing focus if it had it.
    pub fn delete_interactor(&mut self, id: InteractorId) -> Result<()> {
        let interactor = self.interactor(id)?.clone();
        for anchor in interactor.anchor_ids() {
            self.remove_anchor(anchor);
        }
        self.interactors.remove(&id);
        if self.focused_interactor == Some(id) {
            self.focused_interactor = None;
        }
        self.emit(DocumentEvent::InteractorDeleted { interactor: id });
        self.touch();
        Ok(())
    }

    pub fn set_focused_interactor(&mut self, id: Option<InteractorId>) -> Result<()> {
        if let Some(id) = id {
            self.interactor(id)?;
        }
        if self.focused_interactor != id {
            self.focused_interactor = id;
            self.touch();
        }
        Ok(())
    }

    /// Collapses carets (interactors without a selection) that sit at the
    /// same position and share a status, keeping the oldest. Focus moves to
    /// the survivor. Returns the removed interactors.
    pub fn dedupe_interactors(&mut self) -> Vec<InteractorId> {
        let mut kept: Vec<(InteractorId, Anchor, bool)> = Vec::new();
        let mut duplicates = Vec::new();
        for interactor in self.interactors.values().filter(|i| !i.is_selection()) {
            let Some(main) = self.anchors.get(&interactor.main_anchor) else {
                continue;
            };
            match kept
                .iter()
                .find(|(_, a, active)| *active == interactor.is_active() && a.same_position_as(main))
            {
                Some((survivor, _, _)) => duplicates.push((interactor.id, *survivor)),
                None => kept.push((interactor.id, main.clone(), interactor.is_active())),
            }
        }
        let mut removed = Vec::new();
        for (duplicate, survivor) in duplicates {
            if self.delete_interactor(duplicate).is_ok() {
                if self.focused_interactor.is_none() {
                    self.focused_interactor = Some(survivor);
                }
                removed.push(duplicate);
            }
        }
        removed
    }
}

fn named(mut parameters: AnchorParameters, name: Option<&str>, suffix: &str) -> AnchorParameters {
    if let Some(name) = name {
        parameters.name = Some(format!("{name}-{suffix}"));
    }
    parameters
}
