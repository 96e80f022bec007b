use serde::{Deserialize, Serialize};

use super::node::Node;
use super::node_type::NodeCategory;
use crate::cursor::CursorOrientation;
use crate::text::TextStyleStrip;
use crate::traversal::Path;

/// The kind of value a facet slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetValueType {
    Boolean,
    Text,
    /// One of a fixed set of option strings.
    Enum(&'static [&'static str]),
    EntityId,
    Anchor,
    AnchorRange,
    /// An additional child collection holding nodes of the given category.
    NodeArray(NodeCategory),
    TextStyleStrip,
}

/// A named, typed extension slot declared by a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Facet {
    pub name: &'static str,
    pub value_type: FacetValueType,
    pub optional: bool,
}

impl Facet {
    pub(crate) const fn required(name: &'static str, value_type: FacetValueType) -> Self {
        Facet {
            name,
            value_type,
            optional: false,
        }
    }

    pub(crate) const fn optional(name: &'static str, value_type: FacetValueType) -> Self {
        Facet {
            name,
            value_type,
            optional: true,
        }
    }

    /// Checks the runtime shape of `value` against this facet's declared kind.
    pub fn accepts(&self, value: &FacetValue) -> bool {
        match (self.value_type, value) {
            (FacetValueType::Boolean, FacetValue::Boolean(_))
            | (FacetValueType::Text, FacetValue::Text(_))
            | (FacetValueType::EntityId, FacetValue::EntityId(_))
            | (FacetValueType::Anchor, FacetValue::Anchor(_))
            | (FacetValueType::AnchorRange, FacetValue::AnchorRange { .. })
            | (FacetValueType::TextStyleStrip, FacetValue::TextStyleStrip(_)) => true,
            (FacetValueType::Enum(options), FacetValue::Enum(v)) => options.contains(&v.as_str()),
            (FacetValueType::NodeArray(category), FacetValue::NodeArray(nodes)) => nodes
                .iter()
                .all(|n| n.kind.category() == Some(category)),
            _ => false,
        }
    }
}

pub const HEADER_LEVELS: &[&str] = &["ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX"];
pub const FLOATER_PLACEMENTS: &[&str] = &["ABOVE", "BELOW", "LEFT", "RIGHT"];

/// Position of an anchor expressed against an interchange tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorSpec {
    pub node: Path,
    pub orientation: CursorOrientation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grapheme_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The value held by a facet slot of an interchange [`Node`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum FacetValue {
    Boolean(bool),
    Text(String),
    Enum(String),
    EntityId(String),
    Anchor(AnchorSpec),
    AnchorRange { from: AnchorSpec, to: AnchorSpec },
    NodeArray(Vec<Node>),
    TextStyleStrip(TextStyleStrip),
}

impl FacetValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FacetValue::Boolean(_) => "boolean",
            FacetValue::Text(_) => "text",
            FacetValue::Enum(_) => "enum",
            FacetValue::EntityId(_) => "entity-id",
            FacetValue::Anchor(_) => "anchor",
            FacetValue::AnchorRange { .. } => "anchor-range",
            FacetValue::NodeArray(_) => "node-array",
            FacetValue::TextStyleStrip(_) => "text-style-strip",
        }
    }
}
