//! Helpers shared by the commands for reading and placing carets.

use crate::cursor::{CursorNavigator, CursorOrientation, CursorPath};
use crate::error::Result;
use crate::model::NodeChildrenType;
use crate::traversal::{NodeNavigator, Path};
use crate::working::{
    AnchorParameters, InteractorId, InteractorUpdate, NodeId, WorkingDocument, WorkingNode,
};

/// Both ends of the interactor's selection in document order, or `None`
/// for a caret or a selection that has collapsed onto one position.
pub(crate) fn selection_bounds(
    doc: &WorkingDocument,
    id: InteractorId,
) -> Result<Option<(CursorPath, CursorPath)>> {
    let interactor = doc.interactor(id)?;
    let Some(selection) = interactor.selection_anchor() else {
        return Ok(None);
    };
    let main = doc.cursor_path_for_anchor(interactor.main_anchor())?;
    let selection = doc.cursor_path_for_anchor(selection)?;
    Ok(match main.compare_to(&selection) {
        std::cmp::Ordering::Less => Some((main, selection)),
        std::cmp::Ordering::Greater => Some((selection, main)),
        std::cmp::Ordering::Equal => None,
    })
}

/// Moves the interactor's main anchor to `at` and drops its selection.
pub(crate) fn place_caret(
    doc: &mut WorkingDocument,
    id: InteractorId,
    at: AnchorParameters,
) -> Result<()> {
    doc.update_interactor(
        id,
        InteractorUpdate {
            main_anchor: Some(at),
            selection_anchor: Some(None),
            line_movement_horizontal_visual_position: Some(None),
            ..Default::default()
        },
    )
}

pub(crate) fn place_caret_at_path(
    doc: &mut WorkingDocument,
    id: InteractorId,
    at: &CursorPath,
) -> Result<()> {
    let parameters = doc.anchor_parameters_for_cursor_path(at)?;
    place_caret(doc, id, parameters)
}

/// Moves the main anchor to `to`. With `select`, the old main position
/// becomes the selection anchor unless a selection already exists.
pub(crate) fn move_main_anchor(
    doc: &mut WorkingDocument,
    id: InteractorId,
    to: AnchorParameters,
    select: bool,
    column: Option<f64>,
) -> Result<()> {
    let interactor = doc.interactor(id)?;
    let selection_anchor = match (select, interactor.selection_anchor()) {
        (false, _) => Some(None),
        (true, Some(_)) => None,
        (true, None) => Some(Some(doc.anchor(interactor.main_anchor())?.parameters())),
    };
    doc.update_interactor(
        id,
        InteractorUpdate {
            main_anchor: Some(to),
            selection_anchor,
            line_movement_horizontal_visual_position: Some(column),
            ..Default::default()
        },
    )
}

/// The nearest node at or above the navigator accepted by `predicate`.
pub(crate) fn enclosing_node(
    nav: &NodeNavigator<'_>,
    predicate: impl Fn(&WorkingNode) -> bool,
) -> Option<NodeId> {
    if let Some(tip) = nav.tip_node()
        && predicate(tip)
    {
        return Some(tip.id());
    }
    let mut up = nav.clone();
    up.navigate_to_ancestor_matching(predicate)
        .then(|| up.tip_node().map(|n| n.id()))
        .flatten()
}

/// The nearest node at or above the navigator whose children are inlines:
/// the paragraph, header or annotation a caret types into.
pub(crate) fn enclosing_text_block(nav: &NodeNavigator<'_>) -> Option<NodeId> {
    enclosing_node(nav, |n| n.kind().children_type() == NodeChildrenType::Inlines)
}

/// First and last path of the content between two carets, or `None` when
/// nothing lies between them.
///
/// A step onto `After` a grapheme crosses that grapheme; a step onto
/// `After` a boundary inline from outside of it crosses the whole inline.
pub(crate) fn content_between(
    doc: &WorkingDocument,
    start: &CursorPath,
    end: &CursorPath,
) -> Option<(Path, Path)> {
    let mut nav = CursorNavigator::new(doc);
    if !nav.navigate_to_cursor_path(start) {
        return None;
    }
    let from = loop {
        let before = nav.path();
        if !nav.navigate_to_next_cursor_position() {
            return None;
        }
        if nav.cursor_path().compare_to(end).is_gt() {
            return None;
        }
        let path = nav.path();
        if nav.orientation() == CursorOrientation::After && !path.is_ancestor_of(&before) {
            break path;
        }
    };

    let mut nav = CursorNavigator::new(doc);
    if !nav.navigate_to_cursor_path(end) {
        return None;
    }
    let to = loop {
        if nav.orientation() == CursorOrientation::After {
            break nav.path();
        }
        if !nav.navigate_to_preceding_cursor_position() {
            return None;
        }
    };
    to.document_order(&from).is_ge().then_some((from, to))
}

/// Merges every run of neighbouring spans in `block` into one span.
pub(crate) fn merge_adjacent_spans(doc: &mut WorkingDocument, block: NodeId) -> Result<()> {
    let mut index = 1;
    while index < doc.node(block)?.children().len() {
        if !doc.join_spans_at(block, index)? {
            index += 1;
        }
    }
    Ok(())
}
