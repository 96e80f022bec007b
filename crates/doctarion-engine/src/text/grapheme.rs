use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use unicode_segmentation::UnicodeSegmentation;

/// One user-perceived character (an extended grapheme cluster).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grapheme(String);

impl Grapheme {
    /// Builds a grapheme from a string that must hold exactly one cluster.
    pub fn new(cluster: &str) -> Option<Self> {
        let mut clusters = cluster.graphemes(true);
        match (clusters.next(), clusters.next()) {
            (Some(g), None) => Some(Grapheme(g.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Grapheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered, index-stable run of graphemes.
///
/// All positions into text are grapheme indices, never byte or UTF-16
/// offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Text(Vec<Grapheme>);

impl Text {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Grapheme> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Grapheme> {
        self.0.iter()
    }

    /// Splices `other` in so that its first grapheme lands at `index`.
    pub fn insert_text(&mut self, index: usize, other: &Text) {
        let index = index.min(self.0.len());
        self.0.splice(index..index, other.0.iter().cloned());
    }

    pub fn remove(&mut self, index: usize) -> Option<Grapheme> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    /// Keeps `[0, at)` and returns `[at, len)`.
    pub fn split_off(&mut self, at: usize) -> Text {
        let at = at.min(self.0.len());
        Text(self.0.split_off(at))
    }

    pub fn append(&mut self, other: &mut Text) {
        self.0.append(&mut other.0);
    }

    pub fn prepend(&mut self, mut other: Text) {
        other.0.append(&mut self.0);
        self.0 = other.0;
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Text(value.graphemes(true).map(|g| Grapheme(g.to_string())).collect())
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Text::from(value.as_str())
    }
}

impl FromIterator<Grapheme> for Text {
    fn from_iter<I: IntoIterator<Item = Grapheme>>(iter: I) -> Self {
        Text(iter.into_iter().collect())
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for g in &self.0 {
            f.write_str(g.as_str())?;
        }
        Ok(())
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Text::from(s.as_str()))
    }
}

/// A grapheme that may additionally carry inline structural marks (for
/// example the ids of comments that cover it) while keeping the same integer
/// addressing as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FancyGrapheme {
    pub grapheme: Grapheme,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<String>,
}

impl FancyGrapheme {
    pub fn plain(grapheme: Grapheme) -> Self {
        Self {
            grapheme,
            marks: Vec::new(),
        }
    }
}

impl Serialize for Grapheme {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Grapheme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Grapheme::new(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("not a single grapheme: {s:?}")))
    }
}

/// Text whose graphemes may carry marks. Addressed exactly like [`Text`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FancyText(Vec<FancyGrapheme>);

impl FancyText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FancyGrapheme> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FancyGrapheme> {
        self.0.iter()
    }

    /// Splices plain text in; the inserted graphemes carry no marks.
    pub fn insert_text(&mut self, index: usize, other: &Text) {
        let index = index.min(self.0.len());
        self.0.splice(
            index..index,
            other.iter().cloned().map(FancyGrapheme::plain),
        );
    }

    pub fn remove(&mut self, index: usize) -> Option<FancyGrapheme> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    pub fn split_off(&mut self, at: usize) -> FancyText {
        let at = at.min(self.0.len());
        FancyText(self.0.split_off(at))
    }

    pub fn append(&mut self, other: &mut FancyText) {
        self.0.append(&mut other.0);
    }

    pub fn prepend(&mut self, mut other: FancyText) {
        other.0.append(&mut self.0);
        self.0 = other.0;
    }

    /// The text with marks stripped.
    pub fn to_text(&self) -> Text {
        self.0.iter().map(|g| g.grapheme.clone()).collect()
    }
}

impl From<&str> for FancyText {
    fn from(value: &str) -> Self {
        FancyText(Text::from(value).iter().cloned().map(FancyGrapheme::plain).collect())
    }
}

impl From<Text> for FancyText {
    fn from(value: Text) -> Self {
        FancyText(value.iter().cloned().map(FancyGrapheme::plain).collect())
    }
}

impl fmt::Display for FancyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for g in &self.0 {
            f.write_str(g.grapheme.as_str())?;
        }
        Ok(())
    }
}
