//! Compact text dumps of documents and anchors, for tests and the CLI.
//!
//! A document dumps as one line per inline-holding block:
//! `<p> <s styles=6:+B>MMNN</s> <lnk url=g.com>GO</lnk> </p>`. Blocks that
//! hold other blocks open and close on their own lines with the children
//! indented.

use std::fmt::Write;

use crate::error::Result;
use crate::model::{AnchorSpec, FacetValue, Node, NodeChildren, NodeChildrenType, NodeKind};
use crate::working::{AnchorOrigin, WorkingDocument};

pub fn document_to_xmlish(doc: &WorkingDocument) -> Result<String> {
    Ok(node_to_xmlish(&doc.to_node()?))
}

/// Dumps `node`. A document root is not shown itself, only its contents.
pub fn node_to_xmlish(node: &Node) -> String {
    let mut out = String::new();
    if node.kind == NodeKind::Document {
        write_contents(&mut out, node, 0);
    } else {
        write_node(&mut out, node, 0);
    }
    out
}

fn write_node(out: &mut String, node: &Node, indent: usize) {
    let pad = " ".repeat(indent);
    let open = open_tag(node);
    let tag = tag_name(node.kind);
    match &node.children {
        NodeChildren::None => {
            let _ = writeln!(out, "{pad}{} />", open.trim_end_matches('>'));
        }
        NodeChildren::Text(_) | NodeChildren::FancyText(_) => {
            let _ = writeln!(out, "{pad}{}", inline(node));
        }
        NodeChildren::Nodes(children) if node.kind.children_type() == NodeChildrenType::Inlines => {
            out.push_str(&pad);
            out.push_str(&open);
            out.push(' ');
            for child in children {
                out.push_str(&inline(child));
                out.push(' ');
            }
            let _ = writeln!(out, "</{tag}>");
        }
        NodeChildren::Nodes(_) => {
            let _ = writeln!(out, "{pad}{open}");
            write_contents(out, node, indent + 2);
            let _ = writeln!(out, "{pad}</{tag}>");
        }
    }
}

/// Children, then each node-array facet as its own section.
fn write_contents(out: &mut String, node: &Node, indent: usize) {
    for child in node.child_nodes() {
        write_node(out, child, indent);
    }
    for (name, value) in &node.facets {
        if let FacetValue::NodeArray(nodes) = value {
            let pad = " ".repeat(indent);
            let _ = writeln!(out, "{pad}<{name}>");
            for child in nodes {
                write_node(out, child, indent + 2);
            }
            let _ = writeln!(out, "{pad}</{name}>");
        }
    }
}

fn inline(node: &Node) -> String {
    let tag = tag_name(node.kind);
    match &node.children {
        NodeChildren::Text(text) => format!("{}{text}</{tag}>", open_tag(node)),
        NodeChildren::FancyText(text) => format!("{}{text}</{tag}>", open_tag(node)),
        NodeChildren::None => format!("{}</{tag}>", open_tag(node)),
        NodeChildren::Nodes(children) => {
            let inner: Vec<String> = children.iter().map(inline).collect();
            format!("{}{}</{tag}>", open_tag(node), inner.join(" "))
        }
    }
}

fn open_tag(node: &Node) -> String {
    let mut tag = format!("<{}", tag_name(node.kind));
    for (name, value) in &node.facets {
        if let Some(value) = facet_text(value) {
            let _ = write!(tag, " {name}={value}");
        }
    }
    tag.push('>');
    tag
}

fn facet_text(value: &FacetValue) -> Option<String> {
    match value {
        FacetValue::Boolean(b) => Some(b.to_string()),
        FacetValue::Text(s) | FacetValue::Enum(s) | FacetValue::EntityId(s) => Some(s.clone()),
        FacetValue::TextStyleStrip(strip) if !strip.is_empty() => Some(strip.to_string()),
        FacetValue::Anchor(spec) => Some(anchor_spec_text(spec)),
        FacetValue::AnchorRange { from, to } => {
            Some(format!("{}..{}", anchor_spec_text(from), anchor_spec_text(to)))
        }
        FacetValue::TextStyleStrip(_) | FacetValue::NodeArray(_) => None,
    }
}

fn anchor_spec_text(spec: &AnchorSpec) -> String {
    match spec.grapheme_index {
        Some(index) => format!("{}:{}⁙{index}", spec.orientation.label(), spec.node),
        None => format!("{}:{}", spec.orientation.label(), spec.node),
    }
}

fn tag_name(kind: NodeKind) -> String {
    match kind {
        NodeKind::Paragraph => "p".to_string(),
        NodeKind::Header => "h".to_string(),
        NodeKind::Span => "s".to_string(),
        NodeKind::Hyperlink => "lnk".to_string(),
        other => {
            let mut tag = String::new();
            for (i, c) in other.name().chars().enumerate() {
                if c.is_ascii_uppercase() && i > 0 {
                    tag.push('-');
                }
                tag.push(c.to_ascii_lowercase());
            }
            tag
        }
    }
}

/// One line per anchor, in creation order:
/// `Anchor: α-MAIN AFTER (Span:d)0/0⁙3 intr: α`.
pub fn dump_anchors(doc: &WorkingDocument) -> Result<String> {
    let mut lines = Vec::new();
    for anchor in doc.anchors() {
        let node = doc.node(anchor.node())?;
        let mut line = format!(
            "Anchor: {} {} ({}",
            anchor.name().unwrap_or("∅"),
            anchor.orientation().label(),
            node.kind()
        );
        if let Some(grapheme) = anchor
            .grapheme_index()
            .and_then(|i| node.children().grapheme(i))
        {
            let _ = write!(line, ":{}", grapheme.as_str());
        }
        let _ = write!(line, "){}", doc.get_node_path(node.id())?);
        if let Some(index) = anchor.grapheme_index() {
            let _ = write!(line, "⁙{index}");
        }
        match anchor.origin() {
            Some(AnchorOrigin::Interactor(id)) => {
                let name = doc.interactor(id)?.name().unwrap_or("∅");
                let _ = write!(line, " intr: {name}");
            }
            Some(AnchorOrigin::Node(id)) => {
                let owner = doc.node(id)?;
                let _ = write!(line, " from: ({}){}", owner.kind(), doc.get_node_path(id)?);
            }
            None => {}
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{CursorOrientation, CursorPath};
    use crate::model::builders::*;
    use crate::working::InteractorParameters;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_xmlish_of_nested_blocks() {
        let root = document(vec![
            header(vec![span("Title")]),
            list(vec![list_item(vec![paragraph(vec![
                span("A"),
                link("g.com", "GO"),
            ])])]),
        ]);
        insta::assert_snapshot!(node_to_xmlish(&root).trim_end(), @r"
        <h level=ONE> <s>Title</s> </h>
        <list>
          <list-item>
            <p> <s>A</s> <lnk url=g.com>GO</lnk> </p>
          </list-item>
        </list>
        ");
    }

    #[test]
    fn test_xmlish_shows_non_empty_styles_only() {
        let root = document(vec![paragraph(vec![
            styled_span("AB", &[(1, crate::text::TextStyleModifier::bold())]),
            span(""),
        ])]);
        assert_eq!(node_to_xmlish(&root), "<p> <s styles=1:+B>AB</s> <s></s> </p>\n");
    }

    #[test]
    fn test_dump_anchors() {
        let mut doc = WorkingDocument::new(document(vec![paragraph(vec![
            span("Header"),
            link("g.com", "GO"),
        ])]))
        .expect("Should load document");
        let at = |path: &str, orientation| {
            CursorPath::new(path.parse().expect("Should parse path"), orientation)
        };
        let mut parameters = InteractorParameters::caret(
            doc.anchor_parameters_for_cursor_path(&at("0/0/3", CursorOrientation::After))
                .expect("Should resolve"),
        );
        parameters.name = Some("α".to_string());
        parameters.selection_anchor = Some(
            doc.anchor_parameters_for_cursor_path(&at("0/1/1", CursorOrientation::After))
                .expect("Should resolve"),
        );
        doc.add_interactor(parameters).expect("Should add interactor");
        doc.add_interactor(InteractorParameters::caret(
            doc.anchor_parameters_for_cursor_path(&at("0/0/0", CursorOrientation::Before))
                .expect("Should resolve"),
        ))
        .expect("Should add interactor");

        insta::assert_snapshot!(dump_anchors(&doc).expect("Should dump"), @r"
        Anchor: α-MAIN AFTER (Span:d)0/0⁙3 intr: α
        Anchor: α-SELECTION AFTER (Hyperlink:O)0/1⁙1 intr: α
        Anchor: ∅ BEFORE (Span:H)0/0⁙0 intr: ∅
        ");
    }
}
