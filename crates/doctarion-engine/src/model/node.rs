use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::facet::FacetValue;
use super::node_type::{NodeChildrenType, NodeKind};
use crate::error::{EditorError, Result};
use crate::text::{FancyText, Text};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeChildren {
    #[default]
    None,
    Text(Text),
    FancyText(FancyText),
    Nodes(Vec<Node>),
}

impl NodeChildren {
    /// Number of child nodes or graphemes.
    pub fn len(&self) -> usize {
        match self {
            NodeChildren::None => 0,
            NodeChildren::Text(t) => t.len(),
            NodeChildren::FancyText(t) => t.len(),
            NodeChildren::Nodes(n) => n.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A document node in its plain, value-like interchange form.
///
/// This is the unit that is loaded into and exported from a
/// [`WorkingDocument`](crate::working::WorkingDocument).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default)]
    pub children: NodeChildren,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facets: BTreeMap<String, FacetValue>,
}

impl Node {
    /// An empty node of `kind` with the children shape its kind declares.
    pub fn new(kind: NodeKind) -> Self {
        let children = match kind.children_type() {
            NodeChildrenType::None => NodeChildren::None,
            NodeChildrenType::Text => NodeChildren::Text(Text::new()),
            NodeChildrenType::FancyText => NodeChildren::FancyText(FancyText::new()),
            _ => NodeChildren::Nodes(Vec::new()),
        };
        Node {
            kind,
            children,
            facets: BTreeMap::new(),
        }
    }

    pub fn with_facet(mut self, name: &str, value: FacetValue) -> Self {
        self.facets.insert(name.to_string(), value);
        self
    }

    pub fn child_nodes(&self) -> &[Node] {
        match &self.children {
            NodeChildren::Nodes(n) => n,
            _ => &[],
        }
    }

    /// Plain text of the node and all its descendants.
    pub fn text_content(&self) -> String {
        match &self.children {
            NodeChildren::None => String::new(),
            NodeChildren::Text(t) => t.to_string(),
            NodeChildren::FancyText(t) => t.to_string(),
            NodeChildren::Nodes(n) => n.iter().map(Node::text_content).collect(),
        }
    }

    /// Checks the whole subtree against the node kind tables: children shape,
    /// container rules, facet names, facet value types and required facets.
    pub fn validate(&self) -> Result<()> {
        let children_ok = match (&self.children, self.kind.children_type()) {
            (NodeChildren::None, NodeChildrenType::None)
            | (NodeChildren::Text(_), NodeChildrenType::Text)
            | (NodeChildren::FancyText(_), NodeChildrenType::FancyText) => true,
            (NodeChildren::Nodes(_), t) => t.is_nodes(),
            _ => false,
        };
        if !children_ok {
            return Err(EditorError::invalid_operation(format!(
                "{} nodes cannot hold {:?} children",
                self.kind,
                self.children
            )));
        }
        for child in self.child_nodes() {
            if !self.kind.can_contain_children_of_kind(child.kind) {
                return Err(EditorError::invalid_operation(format!(
                    "{} cannot contain {}",
                    self.kind, child.kind
                )));
            }
            child.validate()?;
        }
        for facet in self.kind.facets() {
            if !facet.optional && !self.facets.contains_key(facet.name) {
                return Err(EditorError::invalid_operation(format!(
                    "{} is missing required facet {}",
                    self.kind, facet.name
                )));
            }
        }
        for (name, value) in &self.facets {
            let facet = self
                .kind
                .facet(name)
                .ok_or_else(|| EditorError::unknown_id(format!("facet {name} on {}", self.kind)))?;
            if !facet.accepts(value) {
                return Err(EditorError::type_mismatch(format!(
                    "facet {name} on {} cannot hold a {} value",
                    self.kind,
                    value.type_name()
                )));
            }
            if let FacetValue::NodeArray(nodes) = value {
                for n in nodes {
                    n.validate()?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::builders::*;

    #[test]
    fn test_new_node_has_declared_children_shape() {
        assert_eq!(Node::new(NodeKind::Span).children, NodeChildren::Text(Text::new()));
        assert_eq!(Node::new(NodeKind::Media).children, NodeChildren::None);
        assert_eq!(Node::new(NodeKind::Paragraph).children, NodeChildren::Nodes(vec![]));
    }

    #[test]
    fn test_validate_accepts_well_formed_tree() {
        let doc = document(vec![
            header(vec![span("Title")]),
            paragraph(vec![span("Hi "), link("g.com", "there")]),
        ]);
        doc.validate().expect("Should be valid");
        assert_eq!(doc.text_content(), "TitleHi there");
    }

    #[test]
    fn test_validate_rejects_bad_container() {
        let doc = document(vec![span("loose")]);
        assert!(matches!(doc.validate(), Err(EditorError::InvalidOperation(_))));
    }

    #[test]
    fn test_validate_rejects_missing_required_facet() {
        let doc = document(vec![Node::new(NodeKind::Header)]);
        assert!(matches!(doc.validate(), Err(EditorError::InvalidOperation(_))));
    }

    #[test]
    fn test_validate_rejects_wrong_facet_type() {
        let doc = document(vec![paragraph(vec![
            span("x").with_facet("styles", FacetValue::Text("bold".into())),
        ])]);
        assert!(matches!(doc.validate(), Err(EditorError::TypeMismatch(_))));
    }

    #[test]
    fn test_validate_rejects_bad_enum_option() {
        let doc = document(vec![
            Node::new(NodeKind::Header).with_facet("level", FacetValue::Enum("SEVEN".into())),
        ]);
        assert!(matches!(doc.validate(), Err(EditorError::TypeMismatch(_))));
    }

    #[test]
    fn test_node_json_round_trip() {
        let doc = document(vec![paragraph(vec![span("ab")])]);
        let json = serde_json::to_string(&doc).expect("Should serialize");
        let back: Node = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(back, doc);
    }
}
