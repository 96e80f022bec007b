use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::caret::{move_main_anchor, selection_bounds};
use super::targets::{Target, resolve_targets};
use super::CommandServices;
use crate::cursor::{CursorNavigator, CursorPath};
use crate::error::Result;
use crate::layout::{LayoutService, Side};
use crate::working::{FlowDirection, InteractorId, WorkingDocument};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MovePayload {
    pub target: Target,
    /// Extend the selection instead of moving the caret.
    pub select: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpToPayload {
    #[serde(default)]
    pub target: Target,
    pub to: CursorPath,
    #[serde(default)]
    pub select: bool,
}

/// One caret step back or forward.
///
/// Without `select`, a selection collapses onto its near end instead of
/// moving.
pub(crate) fn move_horizontally(
    doc: &mut WorkingDocument,
    payload: &MovePayload,
    direction: FlowDirection,
) -> Result<()> {
    for id in resolve_targets(doc, &payload.target)? {
        if !payload.select
            && let Some((start, end)) = selection_bounds(doc, id)?
        {
            let edge = if direction.is_backward() { start } else { end };
            let at = doc.anchor_parameters_for_cursor_path(&edge)?;
            move_main_anchor(doc, id, at, false, None)?;
            continue;
        }
        let main = doc.interactor(id)?.main_anchor();
        let mut cursor = doc.cursor_navigator_for_anchor(main)?;
        if !step(&mut cursor, direction) {
            debug!("Interactor {id} is already at the document edge");
            continue;
        }
        let to = WorkingDocument::get_anchor_parameters_from_cursor_navigator(&cursor)?;
        move_main_anchor(doc, id, to, payload.select, None)?;
    }
    doc.dedupe_interactors();
    Ok(())
}

pub(crate) fn jump_to(doc: &mut WorkingDocument, payload: &JumpToPayload) -> Result<()> {
    let to = doc.anchor_parameters_for_cursor_path(&payload.to)?;
    for id in resolve_targets(doc, &payload.target)? {
        move_main_anchor(doc, id, to.clone(), payload.select, None)?;
    }
    doc.dedupe_interactors();
    Ok(())
}

/// Moves carets one visual line up or down, keeping to the column the run
/// of vertical moves started at.
pub(crate) fn move_visually(
    doc: &mut WorkingDocument,
    services: &CommandServices<'_>,
    payload: &MovePayload,
    direction: FlowDirection,
) -> Result<()> {
    let Some(layout) = services.layout else {
        warn!("Vertical caret movement needs a layout service; ignoring");
        return Ok(());
    };
    for id in resolve_targets(doc, &payload.target)? {
        let Some((to, column)) = visual_target(doc, layout, id, direction)? else {
            continue;
        };
        let to = doc.anchor_parameters_for_cursor_path(&to)?;
        move_main_anchor(doc, id, to, payload.select, Some(column))?;
    }
    doc.dedupe_interactors();
    Ok(())
}

/// The caret position on the neighbouring line closest to the interactor's
/// column, and that column.
fn visual_target(
    doc: &WorkingDocument,
    layout: &dyn LayoutService,
    id: InteractorId,
    direction: FlowDirection,
) -> Result<Option<(CursorPath, f64)>> {
    let interactor = doc.interactor(id)?;
    let mut cursor = doc.cursor_navigator_for_anchor(interactor.main_anchor())?;
    let start = cursor.cursor_path();
    let column = match interactor.line_movement_horizontal_visual_position() {
        Some(column) => column,
        None => {
            let side = Side::for_orientation(start.orientation);
            match layout.get_target_horizontal_anchor(doc, &start, side) {
                Some(column) => column,
                None => {
                    debug!("Layout has no column for {start}");
                    return Ok(None);
                }
            }
        }
    };

    let crosses_line = |a: &CursorPath, b: &CursorPath| match direction {
        FlowDirection::Backward => layout.detect_line_wrap_or_break_between_nodes(doc, b, a),
        FlowDirection::Forward => layout.detect_line_wrap_or_break_between_nodes(doc, a, b),
    };
    let distance = |at: &CursorPath| {
        layout
            .detect_horizontal_distance_from_target_horizontal_anchor(
                doc,
                at,
                Side::for_orientation(at.orientation),
                column,
            )
            .map(|d| d.magnitude())
    };

    // Find the first position on the neighbouring line.
    let mut previous = start.clone();
    loop {
        if !step(&mut cursor, direction) {
            return Ok((previous != start).then_some((previous, column)));
        }
        let current = cursor.cursor_path();
        if crosses_line(&previous, &current) {
            break;
        }
        previous = current;
    }

    // Walk along that line while the distance to the column shrinks.
    let mut best = cursor.cursor_path();
    let Some(mut best_distance) = distance(&best) else {
        return Ok(Some((best, column)));
    };
    loop {
        let previous = cursor.cursor_path();
        if !step(&mut cursor, direction) {
            break;
        }
        let current = cursor.cursor_path();
        if crosses_line(&previous, &current) {
            break;
        }
        match distance(&current) {
            Some(d) if d < best_distance => {
                best_distance = d;
                best = current;
            }
            _ => break,
        }
    }
    Ok(Some((best, column)))
}

fn step(cursor: &mut CursorNavigator<'_>, direction: FlowDirection) -> bool {
    match direction {
        FlowDirection::Backward => cursor.navigate_to_preceding_cursor_position(),
        FlowDirection::Forward => cursor.navigate_to_next_cursor_position(),
    }
}
