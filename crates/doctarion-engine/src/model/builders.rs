//! Shorthand constructors for interchange trees.

use super::facet::FacetValue;
use super::node::{Node, NodeChildren};
use super::node_type::NodeKind;
use crate::text::{FancyText, Text, TextStyleModifier, TextStyleStrip};

fn with_children(kind: NodeKind, children: Vec<Node>) -> Node {
    Node {
        children: NodeChildren::Nodes(children),
        ..Node::new(kind)
    }
}

pub fn document(blocks: Vec<Node>) -> Node {
    with_children(NodeKind::Document, blocks)
}

pub fn paragraph(inlines: Vec<Node>) -> Node {
    with_children(NodeKind::Paragraph, inlines)
}

/// A level one header.
pub fn header(inlines: Vec<Node>) -> Node {
    with_children(NodeKind::Header, inlines)
        .with_facet("level", FacetValue::Enum("ONE".to_string()))
}

pub fn block_quote(inlines: Vec<Node>) -> Node {
    with_children(NodeKind::BlockQuote, inlines)
}

pub fn list(items: Vec<Node>) -> Node {
    with_children(NodeKind::List, items)
}

pub fn list_item(blocks: Vec<Node>) -> Node {
    with_children(NodeKind::ListItem, blocks)
}

pub fn span(text: &str) -> Node {
    Node {
        children: NodeChildren::Text(Text::from(text)),
        ..Node::new(NodeKind::Span)
    }
}

/// A span with `modifiers` applied at the given grapheme indices.
pub fn styled_span(text: &str, modifiers: &[(usize, TextStyleModifier)]) -> Node {
    let mut strip = TextStyleStrip::new();
    for (index, modifier) in modifiers {
        strip.set_modifier(*index, modifier.clone());
    }
    span(text).with_facet("styles", FacetValue::TextStyleStrip(strip))
}

pub fn link(url: &str, text: &str) -> Node {
    Node {
        children: NodeChildren::FancyText(FancyText::from(text)),
        ..Node::new(NodeKind::Hyperlink)
    }
    .with_facet("url", FacetValue::Text(url.to_string()))
}
