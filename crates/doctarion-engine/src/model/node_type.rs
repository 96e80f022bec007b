use std::fmt;

use serde::{Deserialize, Serialize};

use super::facet::{FLOATER_PLACEMENTS, Facet, FacetValueType, HEADER_LEVELS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeCategory {
    Block,
    Inline,
    Annotation,
    Lateral,
    SuperBlock,
    Intermediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeChildrenType {
    None,
    Text,
    FancyText,
    Inlines,
    Blocks,
    Intermediates,
    BlocksAndSuperBlocks,
}

impl NodeChildrenType {
    pub fn is_text(self) -> bool {
        matches!(self, NodeChildrenType::Text | NodeChildrenType::FancyText)
    }

    pub fn is_nodes(self) -> bool {
        !matches!(
            self,
            NodeChildrenType::None | NodeChildrenType::Text | NodeChildrenType::FancyText
        )
    }
}

/// Every kind of node a document can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Document,
    // Blocks
    Paragraph,
    Header,
    BlockQuote,
    Hero,
    CodeBlock,
    Media,
    // Inlines
    Span,
    Hyperlink,
    // Annotations
    Floater,
    Footnote,
    Comment,
    // Laterals
    Sidebar,
    // Super blocks and their intermediates
    List,
    ListItem,
    Grid,
    GridCell,
    Columns,
    Column,
}

const DOCUMENT_FACETS: &[Facet] = &[
    Facet::optional("annotations", FacetValueType::NodeArray(NodeCategory::Annotation)),
    Facet::optional("laterals", FacetValueType::NodeArray(NodeCategory::Lateral)),
];
const HEADER_FACETS: &[Facet] = &[Facet::required("level", FacetValueType::Enum(HEADER_LEVELS))];
const CODE_BLOCK_FACETS: &[Facet] = &[Facet::optional("language", FacetValueType::Text)];
const SPAN_FACETS: &[Facet] = &[Facet::optional("styles", FacetValueType::TextStyleStrip)];
const HYPERLINK_FACETS: &[Facet] = &[
    Facet::optional("url", FacetValueType::Text),
    Facet::optional("entityId", FacetValueType::EntityId),
];
const FLOATER_FACETS: &[Facet] = &[
    Facet::required("anchor", FacetValueType::Anchor),
    Facet::optional("placement", FacetValueType::Enum(FLOATER_PLACEMENTS)),
];
const ANCHORED_FACETS: &[Facet] = &[Facet::required("anchor", FacetValueType::Anchor)];
const COMMENT_FACETS: &[Facet] = &[Facet::required("range", FacetValueType::AnchorRange)];

pub const ALL_NODE_KINDS: &[NodeKind] = &[
    NodeKind::Document,
    NodeKind::Paragraph,
    NodeKind::Header,
    NodeKind::BlockQuote,
    NodeKind::Hero,
    NodeKind::CodeBlock,
    NodeKind::Media,
    NodeKind::Span,
    NodeKind::Hyperlink,
    NodeKind::Floater,
    NodeKind::Footnote,
    NodeKind::Comment,
    NodeKind::Sidebar,
    NodeKind::List,
    NodeKind::ListItem,
    NodeKind::Grid,
    NodeKind::GridCell,
    NodeKind::Columns,
    NodeKind::Column,
];

impl NodeKind {
    /// `None` only for the document root.
    pub fn category(self) -> Option<NodeCategory> {
        use NodeKind::*;
        Some(match self {
            Document => return None,
            Paragraph | Header | BlockQuote | Hero | CodeBlock | Media => NodeCategory::Block,
            Span | Hyperlink => NodeCategory::Inline,
            Floater | Footnote | Comment => NodeCategory::Annotation,
            Sidebar => NodeCategory::Lateral,
            List | Grid | Columns => NodeCategory::SuperBlock,
            ListItem | GridCell | Column => NodeCategory::Intermediate,
        })
    }

    pub fn children_type(self) -> NodeChildrenType {
        use NodeKind::*;
        match self {
            Document | ListItem | GridCell | Column => NodeChildrenType::BlocksAndSuperBlocks,
            Paragraph | Header | BlockQuote | Hero | CodeBlock => NodeChildrenType::Inlines,
            Floater | Footnote | Comment => NodeChildrenType::Inlines,
            Media => NodeChildrenType::None,
            Span => NodeChildrenType::Text,
            Hyperlink => NodeChildrenType::FancyText,
            Sidebar => NodeChildrenType::Blocks,
            List | Grid | Columns => NodeChildrenType::Intermediates,
        }
    }

    pub fn facets(self) -> &'static [Facet] {
        use NodeKind::*;
        match self {
            Document => DOCUMENT_FACETS,
            Header => HEADER_FACETS,
            CodeBlock => CODE_BLOCK_FACETS,
            Span => SPAN_FACETS,
            Hyperlink => HYPERLINK_FACETS,
            Floater => FLOATER_FACETS,
            Footnote | Sidebar => ANCHORED_FACETS,
            Comment => COMMENT_FACETS,
            _ => &[],
        }
    }

    pub fn facet(self, name: &str) -> Option<&'static Facet> {
        self.facets().iter().find(|f| f.name == name)
    }

    pub fn specific_intermediate_child_type(self) -> Option<NodeKind> {
        match self {
            NodeKind::List => Some(NodeKind::ListItem),
            NodeKind::Grid => Some(NodeKind::GridCell),
            NodeKind::Columns => Some(NodeKind::Column),
            _ => None,
        }
    }

    /// Whether a node of this kind may sit in this kind's regular children.
    pub fn can_contain_children_of_kind(self, child: NodeKind) -> bool {
        let category = child.category();
        match self.children_type() {
            NodeChildrenType::None | NodeChildrenType::Text | NodeChildrenType::FancyText => false,
            NodeChildrenType::Inlines => category == Some(NodeCategory::Inline),
            NodeChildrenType::Blocks => category == Some(NodeCategory::Block),
            NodeChildrenType::BlocksAndSuperBlocks => matches!(
                category,
                Some(NodeCategory::Block) | Some(NodeCategory::SuperBlock)
            ),
            NodeChildrenType::Intermediates => {
                category == Some(NodeCategory::Intermediate)
                    && self
                        .specific_intermediate_child_type()
                        .is_none_or(|specific| specific == child)
            }
        }
    }

    /// Whether a node of this kind may sit in the named node-array facet.
    pub fn can_contain_facet_children_of_kind(self, facet: &str, child: NodeKind) -> bool {
        match self.facet(facet).map(|f| f.value_type) {
            Some(FacetValueType::NodeArray(category)) => child.category() == Some(category),
            _ => false,
        }
    }

    /// Inlines with a caret position on each side of them, as opposed to
    /// spans whose edges fold into their neighbours' text.
    pub fn is_boundary_inline(self) -> bool {
        self.category() == Some(NodeCategory::Inline) && self != NodeKind::Span
    }

    pub fn name(self) -> &'static str {
        use NodeKind::*;
        match self {
            Document => "Document",
            Paragraph => "Paragraph",
            Header => "Header",
            BlockQuote => "BlockQuote",
            Hero => "Hero",
            CodeBlock => "CodeBlock",
            Media => "Media",
            Span => "Span",
            Hyperlink => "Hyperlink",
            Floater => "Floater",
            Footnote => "Footnote",
            Comment => "Comment",
            Sidebar => "Sidebar",
            List => "List",
            ListItem => "ListItem",
            Grid => "Grid",
            GridCell => "GridCell",
            Columns => "Columns",
            Column => "Column",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interns a facet name declared by any node kind.
pub(crate) fn known_facet_name(name: &str) -> Option<&'static str> {
    ALL_NODE_KINDS
        .iter()
        .flat_map(|k| k.facets())
        .map(|f| f.name)
        .find(|n| *n == name)
}
