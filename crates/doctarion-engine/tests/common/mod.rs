#![allow(dead_code)]

use doctarion_engine::model::builders::*;
use doctarion_engine::text::TextStyleModifier;
use doctarion_engine::working::{AnchorId, InteractorId};
use doctarion_engine::{
    Cmd, Command, CursorOrientation, CursorPath, Editor, EditorOptions, Node, WorkingDocument,
};
use serde_json::{Value, json};

/// Header, a paragraph bold from its seventh grapheme, an empty paragraph
/// and a paragraph with a link between two spans.
pub fn basic_doc() -> Node {
    document(vec![
        header(vec![span("Header1")]),
        paragraph(vec![styled_span("MMNNAABB", &[(6, TextStyleModifier::bold())])]),
        paragraph(vec![]),
        paragraph(vec![span("CC"), link("g.com", "GOOGLE"), span("DD")]),
    ])
}

pub fn at(path: &str, orientation: CursorOrientation) -> CursorPath {
    CursorPath::new(path.parse().unwrap(), orientation)
}

pub fn editor_without_interactors(root: Node) -> Editor {
    let options = EditorOptions {
        create_default_interactor: false,
        ..Default::default()
    };
    Editor::new(root, options).unwrap()
}

pub fn run(editor: &mut Editor, id: &str, payload: Value) {
    editor
        .update(&Command::new(id, payload))
        .unwrap_or_else(|e| panic!("{id} failed: {e}"));
}

pub fn run_cmd(editor: &mut Editor, cmd: Cmd) {
    editor.execute(&cmd).unwrap();
}

pub fn jump(editor: &mut Editor, path: &str, orientation: &str) {
    run(
        editor,
        "cursor/jumpTo",
        json!({"to": {"path": path, "orientation": orientation}}),
    );
}

pub fn xmlish(doc: &WorkingDocument) -> String {
    doctarion_engine::debug::document_to_xmlish(doc)
        .unwrap()
        .trim_end()
        .to_string()
}

pub fn anchors(doc: &WorkingDocument) -> String {
    doctarion_engine::debug::dump_anchors(doc).unwrap()
}

pub fn main_caret(doc: &WorkingDocument, id: InteractorId) -> String {
    let main: AnchorId = doc.interactor(id).unwrap().main_anchor();
    doc.cursor_path_for_anchor(main).unwrap().to_string()
}

pub fn focused_caret(editor: &Editor) -> String {
    let doc = editor.document();
    main_caret(doc, doc.focused_interactor_id().expect("Should have focus"))
}

/// Every anchor sits on a live node at a grapheme that exists, and every
/// interactor resolves to a caret position.
pub fn assert_anchors_live(doc: &WorkingDocument) {
    for anchor in doc.anchors() {
        let node = doc
            .node(anchor.node())
            .unwrap_or_else(|_| panic!("anchor {:?} points at a dead node", anchor.id()));
        doc.get_node_path(node.id()).unwrap();
        if let Some(index) = anchor.grapheme_index() {
            assert!(
                index <= node.children().len(),
                "anchor {:?} grapheme {index} out of bounds ({} graphemes)",
                anchor.id(),
                node.children().len()
            );
        }
    }
    for interactor in doc.interactors() {
        for anchor in interactor.anchor_ids() {
            doc.cursor_path_for_anchor(anchor).unwrap();
        }
    }
}
