use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::caret::place_caret_at_path;
use super::delete::delete_selection;
use super::targets::{Target, resolve_targets};
use crate::cursor::{CursorNavigator, CursorOrientation, CursorPath};
use crate::error::{EditorError, Result};
use crate::model::builders::{paragraph, span};
use crate::model::{Node, NodeCategory, NodeChildrenType, NodeKind};
use crate::text::Text;
use crate::traversal::PathPart;
use crate::working::{InteractorId, NodeId, WorkingDocument};

/// What to insert: `{"text": "..."}` or `{"inline": <node>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsertContent {
    Text(String),
    /// An inline node such as a hyperlink.
    Inline(Node),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertPayload {
    #[serde(default)]
    pub target: Target,
    #[serde(flatten)]
    pub content: InsertContent,
}

/// Where new content goes for one caret.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Spot {
    /// Into the text of `node`, before the grapheme at `index`.
    Text { node: NodeId, index: usize },
    /// As a new child of `parent` at `index`.
    Child { parent: NodeId, index: usize },
}

/// Inserts the content at every target, replacing selections. Carets end
/// up after what they inserted.
pub(crate) fn insert(doc: &mut WorkingDocument, payload: &InsertPayload) -> Result<()> {
    if let InsertContent::Inline(node) = &payload.content
        && node.kind.category() != Some(NodeCategory::Inline)
    {
        return Err(EditorError::invalid_operation(format!(
            "{} is not an inline node",
            node.kind
        )));
    }
    if matches!(&payload.content, InsertContent::Text(text) if text.is_empty()) {
        debug!("Nothing to insert");
        return Ok(());
    }

    for id in resolve_targets(doc, &payload.target)?.into_iter().rev() {
        if doc.interactor(id).is_err() {
            continue;
        }
        if doc.interactor(id)?.is_selection() {
            delete_selection(doc, id)?;
        }
        insert_at_caret(doc, id, &payload.content)?;
    }
    doc.settle_interactor_anchors()?;
    doc.dedupe_interactors();
    Ok(())
}

fn insert_at_caret(doc: &mut WorkingDocument, id: InteractorId, content: &InsertContent) -> Result<()> {
    let spot = {
        let cursor = doc.cursor_navigator_for_anchor(doc.interactor(id)?.main_anchor())?;
        find_spot(&cursor)?
    };
    let Some(spot) = spot else {
        return Ok(());
    };
    debug!("Inserting at {spot:?} for interactor {id}");

    let end = match (content, spot) {
        (InsertContent::Text(text), Spot::Text { node, index }) => {
            let text = Text::from(text.as_str());
            let count = text.len();
            doc.insert_node_text(node, index, &text)?;
            let path = doc
                .get_node_path(node)?
                .child(PathPart::new(index + count - 1));
            CursorPath::new(path, CursorOrientation::After)
        }
        (InsertContent::Text(text), Spot::Child { parent, index }) => {
            let wrapped = wrap_for(doc.node(parent)?.kind(), span(text))?;
            let new = doc.insert_node(parent, wrapped, index, None)?;
            end_of(doc, new)?
        }
        (InsertContent::Inline(inline), Spot::Text { node, index }) => {
            let (block, at) = split_for_inline(doc, node, index)?;
            let new = doc.insert_node(block, inline.clone(), at, None)?;
            end_of(doc, new)?
        }
        (InsertContent::Inline(inline), Spot::Child { parent, index }) => {
            let wrapped = wrap_for(doc.node(parent)?.kind(), inline.clone())?;
            let new = doc.insert_node(parent, wrapped, index, None)?;
            end_of(doc, new)?
        }
    };
    place_caret_at_path(doc, id, &end)
}

/// `None` for positions nothing can be inserted at, such as on a media
/// block. Those carets are skipped.
fn find_spot(cursor: &CursorNavigator<'_>) -> Result<Option<Spot>> {
    let nav = cursor.node_navigator();
    let after = cursor.orientation() == CursorOrientation::After;

    if let Some(index) = nav.grapheme_index() {
        let parent = nav
            .parent_node()
            .ok_or_else(|| EditorError::invalid_path(cursor.cursor_path()))?;
        return Ok(Some(Spot::Text {
            node: parent.id(),
            index: index + usize::from(after),
        }));
    }

    let tip = nav
        .tip_node()
        .ok_or_else(|| EditorError::invalid_path(cursor.cursor_path()))?;
    match cursor.orientation() {
        CursorOrientation::On if tip.children().is_text() => Ok(Some(Spot::Text {
            node: tip.id(),
            index: 0,
        })),
        CursorOrientation::On if tip.kind().children_type().is_nodes() => {
            Ok(Some(Spot::Child {
                parent: tip.id(),
                index: 0,
            }))
        }
        _ if tip.kind().is_boundary_inline() => {
            let (Some(parent), Some(part)) = (tip.parent(), tip.path_part()) else {
                return Err(EditorError::invalid_path(cursor.cursor_path()));
            };
            Ok(Some(Spot::Child {
                parent,
                index: part.index + usize::from(after),
            }))
        }
        _ => {
            warn!("Cannot insert at a {} node, skipping {}", tip.kind(), cursor.cursor_path());
            Ok(None)
        }
    }
}

/// `inline` ready to go into a `parent` of this kind: as is into inline
/// containers, inside a new paragraph into block containers.
fn wrap_for(parent: NodeKind, inline: Node) -> Result<Node> {
    match parent.children_type() {
        NodeChildrenType::Inlines => Ok(inline),
        NodeChildrenType::Blocks | NodeChildrenType::BlocksAndSuperBlocks => {
            Ok(paragraph(vec![inline]))
        }
        _ => Err(EditorError::invalid_operation(format!(
            "cannot insert inline content into {parent}"
        ))),
    }
}

/// Makes room for an inline node at grapheme `index` of the inline `node`.
/// A span is split in two when the index falls inside it; a boundary inline
/// gets the new node right after it.
fn split_for_inline(doc: &mut WorkingDocument, node: NodeId, index: usize) -> Result<(NodeId, usize)> {
    let n = doc.node(node)?;
    if n.kind().category() != Some(NodeCategory::Inline) {
        return Err(EditorError::invalid_operation(format!(
            "cannot insert an inline node into the text of {}",
            n.kind()
        )));
    }
    let (Some(block), Some(part)) = (n.parent(), n.path_part()) else {
        return Err(EditorError::invalid_operation("inline node without a parent"));
    };
    let len = n.children().len();
    if index == 0 && len > 0 {
        return Ok((block, part.index));
    }
    if index >= len || n.kind() != NodeKind::Span {
        return Ok((block, part.index + 1));
    }
    doc.split_node(node, &[index])?;
    Ok((block, part.index + 1))
}

/// The last caret position inside `node`.
fn end_of(doc: &WorkingDocument, node: NodeId) -> Result<CursorPath> {
    let mut nav = doc.node_navigator();
    if !nav.navigate_to_node(node) {
        return Err(EditorError::unknown_id(node));
    }
    nav.navigate_to_last_descendant();
    let orientation = if nav.grapheme_index().is_some()
        || nav.tip_node().is_some_and(|n| n.kind().is_boundary_inline())
    {
        CursorOrientation::After
    } else {
        CursorOrientation::On
    };
    Ok(CursorPath::new(nav.path(), orientation))
}
