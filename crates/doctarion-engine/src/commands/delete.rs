use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::caret::{
    content_between, enclosing_text_block, merge_adjacent_spans, selection_bounds,
};
use super::join::{JoinKind, JoinPayload, join};
use super::targets::{Target, resolve_targets};
use crate::cursor::{CursorNavigator, CursorOrientation};
use crate::editor::{BoundaryPolicy, EditorOptions};
use crate::error::Result;
use crate::model::{NodeCategory, NodeKind};
use crate::traversal::{NodeNavigator, Range};
use crate::working::{
    AnchorParameters, FlowDirection, InteractorId, InteractorUpdate, NodeId, WorkingDocument,
    WorkingNode,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeletePayload {
    pub target: Target,
    pub direction: FlowDirection,
    /// What to do at the edge of a block. Falls back to the editor's
    /// `delete_boundary_policy`.
    pub boundary_policy: Option<BoundaryPolicy>,
}

/// What a caret delete removes.
#[derive(Debug, Clone, PartialEq)]
enum Deletion {
    Grapheme { node: NodeId, index: usize },
    Node(NodeId),
    /// Nothing left to delete inside the block.
    Boundary,
    Nothing,
}

pub(crate) fn delete(
    doc: &mut WorkingDocument,
    options: &EditorOptions,
    payload: &DeletePayload,
) -> Result<()> {
    let policy = payload
        .boundary_policy
        .unwrap_or(options.delete_boundary_policy);
    for id in resolve_targets(doc, &payload.target)?.into_iter().rev() {
        if doc.interactor(id).is_err() {
            // Removed as a duplicate by an earlier join.
            continue;
        }
        if doc.interactor(id)?.is_selection() {
            delete_selection(doc, id)?;
        } else {
            delete_at_caret(doc, options, id, payload.direction, policy)?;
        }
        if options.merge_adjacent_spans {
            let main = doc.interactor(id)?.main_anchor();
            let block = enclosing_text_block(doc.cursor_navigator_for_anchor(main)?.node_navigator());
            if let Some(block) = block {
                merge_adjacent_spans(doc, block)?;
            }
        }
    }
    doc.settle_interactor_anchors()?;
    doc.dedupe_interactors();
    Ok(())
}

/// Removes everything between the selection's ends. Orphaned anchors are
/// pulled towards the main caret's side, then the selection ends.
pub(crate) fn delete_selection(doc: &mut WorkingDocument, id: InteractorId) -> Result<()> {
    let interactor = doc.interactor(id)?;
    let main_first = match interactor.selection_anchor() {
        Some(selection) => doc
            .cursor_path_for_anchor(interactor.main_anchor())?
            .compare_to(&doc.cursor_path_for_anchor(selection)?)
            .is_le(),
        None => true,
    };
    if let Some((start, end)) = selection_bounds(doc, id)?
        && let Some((from, to)) = content_between(doc, &start, &end)
    {
        let direction = if main_first {
            FlowDirection::Backward
        } else {
            FlowDirection::Forward
        };
        debug!("Deleting {from}..{to} for interactor {id}");
        doc.delete_nodes_in_range(&Range::new(from, to), direction)?;
    }
    doc.update_interactor(
        id,
        InteractorUpdate {
            selection_anchor: Some(None),
            line_movement_horizontal_visual_position: Some(None),
            ..Default::default()
        },
    )
}

fn delete_at_caret(
    doc: &mut WorkingDocument,
    options: &EditorOptions,
    id: InteractorId,
    direction: FlowDirection,
    policy: BoundaryPolicy,
) -> Result<()> {
    let main = doc.interactor(id)?.main_anchor();
    let cursor = doc.cursor_navigator_for_anchor(main)?;
    let deletion = find_deletion(&cursor, direction);
    let moved_to = match (&deletion, policy) {
        (Deletion::Boundary, BoundaryPolicy::Move) => step(cursor, direction)?,
        _ => None,
    };
    trace!("Delete {direction:?} for {id}: {deletion:?}");

    match deletion {
        Deletion::Grapheme { node, index } => doc.delete_node_grapheme(node, index, direction)?,
        Deletion::Node(node) => doc.delete_node(node, direction)?,
        Deletion::Boundary => match policy {
            BoundaryPolicy::NoOp => debug!("Interactor {id} is at a block boundary"),
            BoundaryPolicy::Move => {
                if let Some(to) = moved_to {
                    doc.update_interactor(
                        id,
                        InteractorUpdate {
                            main_anchor: Some(to),
                            line_movement_horizontal_visual_position: Some(None),
                            ..Default::default()
                        },
                    )?;
                }
            }
            BoundaryPolicy::Join => join(
                doc,
                options,
                &JoinPayload {
                    target: Target::Interactor(id),
                    kind: JoinKind::Blocks,
                    direction,
                    allow_node_type_coercion: true,
                },
            )?,
        },
        Deletion::Nothing => {}
    }
    Ok(())
}

fn step(
    mut cursor: CursorNavigator<'_>,
    direction: FlowDirection,
) -> Result<Option<AnchorParameters>> {
    let moved = match direction {
        FlowDirection::Backward => cursor.navigate_to_preceding_cursor_position(),
        FlowDirection::Forward => cursor.navigate_to_next_cursor_position(),
    };
    if !moved {
        return Ok(None);
    }
    WorkingDocument::get_anchor_parameters_from_cursor_navigator(&cursor).map(Some)
}

/// Classifies a caret delete.
///
/// A caret on a grapheme removes the grapheme on the `direction` side of it.
/// At the edge of an inline the neighbouring inline of the same block is
/// entered instead, so only the edge of the block itself is a boundary. A
/// span about to lose its last grapheme is removed whole. A caret `On` a
/// childless node removes that node, unless it is the document.
fn find_deletion(cursor: &CursorNavigator<'_>, direction: FlowDirection) -> Deletion {
    let nav = cursor.node_navigator();
    let backward = direction.is_backward();
    let orientation = cursor.orientation();

    if let Some(index) = nav.grapheme_index() {
        let Some(parent) = nav.parent_node() else {
            return Deletion::Nothing;
        };
        let len = parent.children().len();
        let victim = match (backward, orientation) {
            (true, CursorOrientation::Before) => index.checked_sub(1),
            (false, CursorOrientation::After) => Some(index + 1).filter(|i| *i < len),
            _ => Some(index),
        };
        return match victim {
            Some(index) => grapheme_or_span(parent, index),
            None => {
                let mut inline = nav.clone();
                inline.navigate_to_parent();
                beyond(&inline, direction)
            }
        };
    }

    let Some(tip) = nav.tip_node() else {
        return Deletion::Nothing;
    };
    match orientation {
        CursorOrientation::On if tip.parent().is_none() => Deletion::Nothing,
        CursorOrientation::On => Deletion::Node(tip.id()),
        CursorOrientation::After if backward => entering(tip, direction),
        CursorOrientation::Before if !backward => entering(tip, direction),
        CursorOrientation::Before | CursorOrientation::After => beyond(nav, direction),
    }
}

/// What deleting past the edge of the inline at `nav` removes.
fn beyond(nav: &NodeNavigator<'_>, direction: FlowDirection) -> Deletion {
    let mut sibling = nav.clone();
    let moved = match direction {
        FlowDirection::Backward => sibling.navigate_to_preceding_sibling(),
        FlowDirection::Forward => sibling.navigate_to_next_sibling(),
    };
    match sibling.tip_node() {
        Some(node) if moved && node.kind().category() == Some(NodeCategory::Inline) => {
            entering(node, direction)
        }
        _ => Deletion::Boundary,
    }
}

/// What deleting into `inline` from its near edge removes.
fn entering(inline: &WorkingNode, direction: FlowDirection) -> Deletion {
    let children = inline.children();
    if !children.is_text() {
        return Deletion::Boundary;
    }
    match children.len() {
        0 => Deletion::Node(inline.id()),
        len => grapheme_or_span(inline, if direction.is_backward() { len - 1 } else { 0 }),
    }
}

fn grapheme_or_span(parent: &WorkingNode, index: usize) -> Deletion {
    if parent.kind() == NodeKind::Span && parent.children().len() == 1 {
        Deletion::Node(parent.id())
    } else {
        Deletion::Grapheme {
            node: parent.id(),
            index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{basic_doc, caret, doc_with_caret, export, main_of};
    use crate::cursor::CursorOrientation::*;
    use crate::model::builders::*;
    use pretty_assertions::assert_eq;

    fn backward(policy: BoundaryPolicy) -> DeletePayload {
        DeletePayload {
            boundary_policy: Some(policy),
            ..Default::default()
        }
    }

    fn run(doc: &mut WorkingDocument, payload: &DeletePayload) {
        delete(doc, &EditorOptions::default(), payload).expect("Should delete");
    }

    // ============ Caret tests ============

    #[test]
    fn test_backspace_inside_text() {
        let (mut doc, id) =
            doc_with_caret(document(vec![paragraph(vec![span("ABC")])]), "0/0/1", After);
        run(&mut doc, &DeletePayload::default());
        assert_eq!(export(&doc), "<p> <s>AC</s> </p>\n");
        assert_eq!(main_of(&doc, id), caret("0/0/0", After));
    }

    #[test]
    fn test_forward_delete_removes_next_grapheme() {
        let (mut doc, id) =
            doc_with_caret(document(vec![paragraph(vec![span("ABC")])]), "0/0/0", After);
        run(
            &mut doc,
            &DeletePayload {
                direction: FlowDirection::Forward,
                ..Default::default()
            },
        );
        assert_eq!(export(&doc), "<p> <s>AC</s> </p>\n");
        assert_eq!(main_of(&doc, id), caret("0/0/0", After));
    }

    #[test]
    fn test_deleting_inside_a_link_keeps_the_link() {
        let (mut doc, id) = doc_with_caret(basic_doc(), "3/1/3", After);
        run(&mut doc, &DeletePayload::default());
        assert!(export(&doc).contains("<lnk url=g.com>GOOLE</lnk>"));
        assert_eq!(main_of(&doc, id), caret("3/1/2", After));
    }

    #[test]
    fn test_deleting_on_an_empty_paragraph_removes_it() {
        let (mut doc, id) = doc_with_caret(basic_doc(), "2", On);
        run(&mut doc, &DeletePayload::default());
        assert_eq!(doc.to_node().expect("Should export").child_nodes().len(), 3);
        assert_eq!(main_of(&doc, id), caret("1/0/7", After));
    }

    #[test]
    fn test_backspace_enters_the_neighbouring_inline() {
        let (mut doc, id) = doc_with_caret(
            document(vec![paragraph(vec![span("AB"), link("g.com", "GO"), span("CD")])]),
            "0/2/0",
            Before,
        );
        run(&mut doc, &DeletePayload::default());
        assert_eq!(export(&doc), "<p> <s>AB</s> <lnk url=g.com>G</lnk> <s>CD</s> </p>\n");
        assert_eq!(main_of(&doc, id), caret("0/2/0", Before));
    }

    #[test]
    fn test_backspace_removes_an_empty_neighbour_span() {
        let (mut doc, _) = doc_with_caret(
            document(vec![paragraph(vec![span("AB"), span(""), span("CD")])]),
            "0/2/0",
            Before,
        );
        let options = EditorOptions {
            merge_adjacent_spans: false,
            ..Default::default()
        };
        delete(&mut doc, &options, &DeletePayload::default()).expect("Should delete");
        assert_eq!(export(&doc), "<p> <s>AB</s> <s>CD</s> </p>\n");
    }

    #[test]
    fn test_last_grapheme_of_span_removes_the_span() {
        let (mut doc, _) = doc_with_caret(
            document(vec![paragraph(vec![span("A"), link("g.com", "GO")])]),
            "0/0/0",
            After,
        );
        run(&mut doc, &DeletePayload::default());
        assert_eq!(export(&doc), "<p> <lnk url=g.com>GO</lnk> </p>\n");
    }

    #[test]
    fn test_emptied_link_is_kept_then_removed() {
        let (mut doc, id) = doc_with_caret(
            document(vec![paragraph(vec![span("CC"), link("g.com", "E"), span("DD")])]),
            "0/1/0",
            After,
        );
        run(&mut doc, &DeletePayload::default());
        assert_eq!(export(&doc), "<p> <s>CC</s> <lnk url=g.com></lnk> <s>DD</s> </p>\n");
        assert_eq!(main_of(&doc, id), caret("0/1", On));

        run(&mut doc, &DeletePayload::default());
        assert_eq!(export(&doc), "<p> <s>CCDD</s> </p>\n");
        assert_eq!(main_of(&doc, id), caret("0/0/1", After));
    }

    // ============ Boundary tests ============

    #[test]
    fn test_block_start_is_a_no_op_by_default() {
        let (mut doc, id) = doc_with_caret(basic_doc(), "3/0/0", Before);
        let before = export(&doc);
        let version = doc.version();
        run(&mut doc, &DeletePayload::default());
        assert_eq!(export(&doc), before);
        assert_eq!(doc.version(), version);
        assert_eq!(main_of(&doc, id), caret("3/0/0", Before));
    }

    #[test]
    fn test_move_policy_steps_over_the_boundary() {
        let (mut doc, id) = doc_with_caret(basic_doc(), "3/0/0", Before);
        run(&mut doc, &backward(BoundaryPolicy::Move));
        assert_eq!(main_of(&doc, id), caret("2", On));
        assert_eq!(doc.to_node().expect("Should export").child_nodes().len(), 4);
    }

    #[test]
    fn test_join_policy_merges_blocks() {
        let (mut doc, id) = doc_with_caret(basic_doc(), "3/0/0", Before);
        run(&mut doc, &backward(BoundaryPolicy::Join));
        assert_eq!(main_of(&doc, id), caret("2/0/0", Before));

        run(&mut doc, &backward(BoundaryPolicy::Join));
        insta::assert_snapshot!(export(&doc).trim_end(), @r"
        <h level=ONE> <s>Header1</s> </h>
        <p> <s styles=6:+B,8:-B>MMNNAABBCC</s> <lnk url=g.com>GOOGLE</lnk> <s>DD</s> </p>
        ");
        assert_eq!(main_of(&doc, id), caret("1/0/7", After));
    }

    #[test]
    fn test_document_root_is_never_deleted() {
        let (mut doc, id) = doc_with_caret(document(vec![]), "", On);
        run(&mut doc, &backward(BoundaryPolicy::Join));
        assert_eq!(main_of(&doc, id), caret("", On));
    }

    // ============ Selection tests ============

    #[test]
    fn test_selection_delete_removes_covered_graphemes() {
        let (mut doc, id) = doc_with_caret(basic_doc(), "3/1/0", Before);
        let target = doc
            .anchor_parameters_for_cursor_path(&caret("3/1/4", After))
            .expect("Should resolve");
        crate::commands::caret::move_main_anchor(
            &mut doc,
            id,
            target,
            true,
            None,
        )
        .expect("Should select");
        assert!(doc.interactor(id).expect("Should exist").is_selection());

        run(&mut doc, &DeletePayload::default());
        assert!(export(&doc).contains("<lnk url=g.com>E</lnk>"));
        assert!(!doc.interactor(id).expect("Should exist").is_selection());
    }

    #[test]
    fn test_selection_across_blocks() {
        let (mut doc, id) = doc_with_caret(basic_doc(), "0/0/2", After);
        let target = doc
            .anchor_parameters_for_cursor_path(&caret("1/0/1", After))
            .expect("Should resolve");
        crate::commands::caret::move_main_anchor(
            &mut doc,
            id,
            target,
            true,
            None,
        )
        .expect("Should select");
        run(&mut doc, &DeletePayload::default());
        let dumped = export(&doc);
        assert!(dumped.starts_with(
            "<h level=ONE> <s>Hea</s> </h>\n<p> <s styles=4:+B>NNAABB</s> </p>\n"
        ));
        // The main caret came last, so it lands after the gap.
        assert_eq!(main_of(&doc, id), caret("1/0/0", Before));
    }
}
