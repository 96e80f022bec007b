use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::caret::{enclosing_text_block, place_caret_at_path};
use super::delete::delete_selection;
use super::targets::{Target, resolve_targets};
use crate::cursor::{CursorNavigator, CursorOrientation, CursorPath};
use crate::error::Result;
use crate::working::{InteractorId, NodeId, WorkingDocument};

/// Splits the block holding each target's caret in two at the caret, like
/// pressing enter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SplitPayload {
    pub target: Target,
}

pub(crate) fn split(doc: &mut WorkingDocument, payload: &SplitPayload) -> Result<()> {
    for id in resolve_targets(doc, &payload.target)?.into_iter().rev() {
        if doc.interactor(id).is_err() {
            continue;
        }
        if doc.interactor(id)?.is_selection() {
            delete_selection(doc, id)?;
        }
        split_at_caret(doc, id)?;
    }
    doc.settle_interactor_anchors()?;
    doc.dedupe_interactors();
    Ok(())
}

fn split_at_caret(doc: &mut WorkingDocument, id: InteractorId) -> Result<()> {
    let position = {
        let cursor = doc.cursor_navigator_for_anchor(doc.interactor(id)?.main_anchor())?;
        split_position(&cursor)
    };
    let Some((block, indices)) = position else {
        warn!("Interactor {id} is not inside a block that can be split");
        return Ok(());
    };
    debug!("Splitting node {block} at {indices:?} for interactor {id}");
    let new = doc.split_node(block, &indices)?;
    let start = CursorPath::new(doc.get_node_path(new)?, CursorOrientation::Before);
    place_caret_at_path(doc, id, &start)
}

/// The text block around the caret and the split position inside it.
///
/// A caret at either edge of an inline splits between inlines rather than
/// leaving an empty span behind.
fn split_position(cursor: &CursorNavigator<'_>) -> Option<(NodeId, Vec<usize>)> {
    let nav = cursor.node_navigator();
    let block = enclosing_text_block(nav)?;
    let after = usize::from(cursor.orientation() == CursorOrientation::After);

    if let Some(index) = nav.grapheme_index() {
        let inline = nav.parent_node()?;
        if inline.parent() != Some(block) {
            return None;
        }
        let at = inline.path_part()?.index;
        let offset = index + after;
        let indices = if offset == 0 {
            vec![at]
        } else if offset >= inline.children().len() {
            vec![at + 1]
        } else {
            vec![at, offset]
        };
        return Some((block, indices));
    }

    let tip = nav.tip_node()?;
    if tip.id() == block {
        return Some((block, vec![0]));
    }
    if tip.parent() != Some(block) {
        return None;
    }
    Some((block, vec![tip.path_part()?.index + after]))
}
