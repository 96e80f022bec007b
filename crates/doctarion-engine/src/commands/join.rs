use std::collections::BTreeSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::caret::{enclosing_node, merge_adjacent_spans, selection_bounds};
use super::targets::{Target, resolve_targets};
use crate::cursor::{CursorNavigator, CursorPath};
use crate::editor::EditorOptions;
use crate::error::Result;
use crate::model::{NodeCategory, NodeChildrenType, NodeKind};
use crate::traversal::Range;
use crate::working::{FlowDirection, InteractorId, NodeId, WorkingDocument, WorkingNode};

/// What a join merges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinKind {
    #[default]
    Blocks,
    InlineText,
}

impl JoinKind {
    fn accepts(self, node: &WorkingNode) -> bool {
        match self {
            JoinKind::Blocks => node.kind().category() == Some(NodeCategory::Block),
            JoinKind::InlineText => node.kind() == NodeKind::Span,
        }
    }
}

/// Merges the block (or span) at each target into its neighbour.
///
/// Backward merges into the preceding sibling, which survives; forward
/// merges into the following one. A selection joins every block it touches
/// into one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JoinPayload {
    pub target: Target,
    #[serde(rename = "type")]
    pub kind: JoinKind,
    pub direction: FlowDirection,
    /// Convert the merged-in node to the survivor's kind when they differ.
    pub allow_node_type_coercion: bool,
}

pub(crate) fn join(
    doc: &mut WorkingDocument,
    options: &EditorOptions,
    payload: &JoinPayload,
) -> Result<()> {
    let mut sources = BTreeSet::new();
    for id in resolve_targets(doc, &payload.target)? {
        sources.extend(sources_for(doc, id, payload.kind, payload.direction)?);
    }

    let mut ordered = sources
        .into_iter()
        .map(|id| Ok((doc.get_node_path(id)?, id)))
        .collect::<Result<Vec<_>>>()?;
    ordered.sort_by(|(a, _), (b, _)| a.document_order(b));

    for (_, source) in ordered.into_iter().rev() {
        join_one(doc, options, source, payload)?;
    }
    doc.settle_interactor_anchors()?;
    doc.dedupe_interactors();
    Ok(())
}

/// The nodes whose content moves into a neighbour for this interactor.
fn sources_for(
    doc: &WorkingDocument,
    id: InteractorId,
    kind: JoinKind,
    direction: FlowDirection,
) -> Result<Vec<NodeId>> {
    let enclosing = |at: &CursorPath| {
        let mut cursor = CursorNavigator::new(doc);
        if !cursor.navigate_to_cursor_path(at) {
            return None;
        }
        enclosing_node(cursor.node_navigator(), |n| kind.accepts(n))
    };

    let Some((first, last)) = selection_bounds(doc, id)? else {
        let main = doc.cursor_path_for_anchor(doc.interactor(id)?.main_anchor())?;
        return Ok(enclosing(&main).into_iter().collect());
    };
    let (Some(start), Some(end)) = (enclosing(&first), enclosing(&last)) else {
        debug!("Selection of {id} is not inside a {kind:?} node");
        return Ok(Vec::new());
    };
    let skipped = if direction.is_backward() { start } else { end };
    let range = Range::new(doc.get_node_path(start)?, doc.get_node_path(end)?);
    Ok(range
        .walk(doc, |nav| nav.tip_node().is_some_and(|n| kind.accepts(n)), true)
        .iter()
        .filter_map(|chain| chain.tip_node())
        .filter(|n| *n != skipped)
        .collect())
}

fn join_one(
    doc: &mut WorkingDocument,
    options: &EditorOptions,
    source: NodeId,
    payload: &JoinPayload,
) -> Result<()> {
    let mut nav = doc.node_navigator();
    if !nav.navigate_to_node(source) {
        return Ok(());
    }
    let moved = match payload.direction {
        FlowDirection::Backward => nav.navigate_to_preceding_sibling(),
        FlowDirection::Forward => nav.navigate_to_next_sibling(),
    };
    let Some(survivor) = nav
        .tip_node()
        .filter(|n| moved && payload.kind.accepts(n))
        .map(|n| (n.id(), n.kind()))
    else {
        warn!("Node {source} has no {:?} neighbour to join", payload.direction);
        return Ok(());
    };
    let (survivor, survivor_kind) = survivor;

    let source_kind = doc.node(source)?.kind();
    if source_kind != survivor_kind {
        if !payload.allow_node_type_coercion
            || source_kind.children_type() != survivor_kind.children_type()
        {
            warn!("Not joining {source_kind} node {source} into {survivor_kind}");
            return Ok(());
        }
        doc.change_node_type(source, survivor_kind)?;
    }

    debug!("Joining {source} into {survivor}");
    doc.join_sibling_into_node(survivor, payload.direction.reversed())?;
    if options.merge_adjacent_spans
        && survivor_kind.children_type() == NodeChildrenType::Inlines
    {
        merge_adjacent_spans(doc, survivor)?;
    }
    Ok(())
}
