use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EditorError;
use crate::model::node_type::known_facet_name;

/// One step from a node to one of its children, or to a child in one of its
/// node-array facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathPart {
    pub index: usize,
    pub facet: Option<&'static str>,
}

impl PathPart {
    pub fn new(index: usize) -> Self {
        PathPart { index, facet: None }
    }

    pub fn in_facet(facet: &'static str, index: usize) -> Self {
        PathPart {
            index,
            facet: Some(facet),
        }
    }

    pub fn with_index(self, index: usize) -> Self {
        PathPart { index, ..self }
    }
}

impl PartialOrd for PathPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Regular children come before any facet children.
impl Ord for PathPart {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.facet.is_some(), self.facet, self.index).cmp(&(
            other.facet.is_some(),
            other.facet,
            other.index,
        ))
    }
}

impl fmt::Display for PathPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.facet {
            Some(facet) => write!(f, "{facet}:{}", self.index),
            None => write!(f, "{}", self.index),
        }
    }
}

impl FromStr for PathPart {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_index = |v: &str| {
            v.parse::<usize>()
                .map_err(|_| EditorError::invalid_path(format!("bad path index {v:?}")))
        };
        match s.split_once(':') {
            Some((facet, index)) => {
                let facet = known_facet_name(facet)
                    .ok_or_else(|| EditorError::invalid_path(format!("unknown facet {facet:?}")))?;
                Ok(PathPart::in_facet(facet, parse_index(index)?))
            }
            None => Ok(PathPart::new(parse_index(s)?)),
        }
    }
}

/// Root-relative address of a node or grapheme.
///
/// A path holds no references into any tree; it is only meaningful against
/// the snapshot it was taken from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    parts: Vec<PathPart>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(parts: Vec<PathPart>) -> Self {
        Path { parts }
    }

    /// A path made only of regular child indices.
    pub fn from_indices(indices: &[usize]) -> Self {
        Path {
            parts: indices.iter().copied().map(PathPart::new).collect(),
        }
    }

    pub fn parts(&self) -> &[PathPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_root(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn last(&self) -> Option<PathPart> {
        self.parts.last().copied()
    }

    pub fn parent(&self) -> Option<Path> {
        let (_, rest) = self.parts.split_last()?;
        Some(Path {
            parts: rest.to_vec(),
        })
    }

    pub fn child(&self, part: PathPart) -> Path {
        let mut parts = self.parts.clone();
        parts.push(part);
        Path { parts }
    }

    pub fn push(&mut self, part: PathPart) {
        self.parts.push(part);
    }

    pub fn pop(&mut self) -> Option<PathPart> {
        self.parts.pop()
    }

    /// True when `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.parts.len() < other.parts.len() && other.parts.starts_with(&self.parts)
    }

    pub fn is_equal_or_ancestor_of(&self, other: &Path) -> bool {
        other.parts.starts_with(&self.parts)
    }

    pub fn common_ancestor(&self, other: &Path) -> Path {
        Path {
            parts: self
                .parts
                .iter()
                .zip(other.parts.iter())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| *a)
                .collect(),
        }
    }

    /// Document (pre-order) order: an ancestor sorts before its descendants.
    pub fn document_order(&self, other: &Path) -> Ordering {
        for (a, b) in self.parts.iter().zip(other.parts.iter()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        self.parts.len().cmp(&other.parts.len())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Path::root());
        }
        s.split('/')
            .map(str::parse::<PathPart>)
            .collect::<Result<Vec<_>, _>>()
            .map(Path::new)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn p(s: &str) -> Path {
        s.parse().expect("Should parse path")
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(p("3/1/0").to_string(), "3/1/0");
        assert_eq!(p("").to_string(), "");
        assert!(p("").is_root());
        assert_eq!(p("annotations:0/2").parts()[0], PathPart::in_facet("annotations", 0));
        assert_eq!(p("annotations:0/2").to_string(), "annotations:0/2");
    }

    #[rstest]
    #[case("a/1")]
    #[case("1//2")]
    #[case("bogus:1")]
    fn test_parse_rejects_bad_paths(#[case] input: &str) {
        assert!(matches!(input.parse::<Path>(), Err(EditorError::InvalidPath(_))));
    }

    #[rstest]
    #[case("0", "0/1", Ordering::Less)]
    #[case("0/1", "0", Ordering::Greater)]
    #[case("0/2", "1", Ordering::Less)]
    #[case("3/1", "3/0/5", Ordering::Greater)]
    #[case("2", "2", Ordering::Equal)]
    #[case("9", "annotations:0", Ordering::Less)]
    fn test_document_order(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(p(a).document_order(&p(b)), expected);
    }

    #[test]
    fn test_ancestry() {
        assert!(p("").is_ancestor_of(&p("0")));
        assert!(p("1").is_ancestor_of(&p("1/0/2")));
        assert!(!p("1").is_ancestor_of(&p("1")));
        assert!(p("1").is_equal_or_ancestor_of(&p("1")));
        assert!(!p("1").is_ancestor_of(&p("10")));
        assert_eq!(p("1/2/3").common_ancestor(&p("1/2/0/4")), p("1/2"));
        assert_eq!(p("1/2").parent(), Some(p("1")));
        assert_eq!(p("").parent(), None);
    }

    #[test]
    fn test_path_serializes_as_string() {
        let json = serde_json::to_string(&p("0/4")).expect("Should serialize");
        assert_eq!(json, "\"0/4\"");
    }
}
