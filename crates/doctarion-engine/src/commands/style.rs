use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::caret::{content_between, selection_bounds};
use super::targets::{Target, resolve_targets};
use crate::error::Result;
use crate::model::NodeKind;
use crate::text::TextStyleModifier;
use crate::working::{InteractorId, NodeId, WorkingDocument};

/// Applies `modifier` to the selected text, or to the whole span under a
/// caret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StylePayload {
    pub target: Target,
    pub modifier: TextStyleModifier,
}

pub(crate) fn set_style(doc: &mut WorkingDocument, payload: &StylePayload) -> Result<()> {
    if payload.modifier.is_empty() {
        debug!("Empty style modifier");
        return Ok(());
    }
    for id in resolve_targets(doc, &payload.target)? {
        for (span, (start, end)) in styled_ranges(doc, id)? {
            doc.apply_text_style_to_range(span, start, end, &payload.modifier)?;
        }
    }
    Ok(())
}

/// Grapheme ranges of every span the interactor covers.
fn styled_ranges(
    doc: &WorkingDocument,
    id: InteractorId,
) -> Result<BTreeMap<NodeId, (usize, usize)>> {
    let mut ranges = BTreeMap::new();
    let Some((start, end)) = selection_bounds(doc, id)? else {
        let cursor = doc.cursor_navigator_for_anchor(doc.interactor(id)?.main_anchor())?;
        let nav = cursor.node_navigator();
        let span = if nav.grapheme_index().is_some() {
            nav.parent_node()
        } else {
            nav.tip_node()
        };
        if let Some(span) = span.filter(|n| n.kind() == NodeKind::Span)
            && !span.children().is_empty()
        {
            ranges.insert(span.id(), (0, span.children().len()));
        }
        return Ok(ranges);
    };

    let Some((from, to)) = content_between(doc, &start, &end) else {
        return Ok(ranges);
    };
    let mut nav = doc.node_navigator();
    if !nav.navigate_to(&from) {
        return Ok(ranges);
    }
    loop {
        if nav.path().document_order(&to).is_gt() {
            break;
        }
        if let (Some(index), Some(parent)) = (nav.grapheme_index(), nav.parent_node())
            && parent.kind() == NodeKind::Span
        {
            let range = ranges.entry(parent.id()).or_insert((index, index + 1));
            range.1 = index + 1;
        }
        if !nav.navigate_forwards_by_dfs(false) {
            break;
        }
    }
    Ok(ranges)
}
