use std::fmt;

use serde::{Deserialize, Serialize};

use super::style::{TextStyle, TextStyleModifier};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyleStripEntry {
    pub grapheme_index: usize,
    pub modifier: TextStyleModifier,
}

/// Sparse per-grapheme styling for a text run.
///
/// Entries are kept sorted by `grapheme_index` with at most one entry per
/// index, and no entry holds an empty modifier. The effective style of a
/// grapheme is the default style with every entry at or before it applied in
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextStyleStrip {
    entries: Vec<TextStyleStripEntry>,
}

impl TextStyleStrip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TextStyleStripEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn position_of(&self, grapheme_index: usize) -> Result<usize, usize> {
        self.entries
            .binary_search_by_key(&grapheme_index, |e| e.grapheme_index)
    }

    /// Replaces the entry at `grapheme_index`. An empty modifier removes it.
    pub fn set_modifier(&mut self, grapheme_index: usize, modifier: TextStyleModifier) {
        match (self.position_of(grapheme_index), modifier.is_empty()) {
            (Ok(pos), true) => {
                self.entries.remove(pos);
            }
            (Ok(pos), false) => self.entries[pos].modifier = modifier,
            (Err(_), true) => {}
            (Err(pos), false) => self.entries.insert(
                pos,
                TextStyleStripEntry {
                    grapheme_index,
                    modifier,
                },
            ),
        }
    }

    pub fn modifier_at_exactly(&self, grapheme_index: usize) -> Option<&TextStyleModifier> {
        self.position_of(grapheme_index)
            .ok()
            .map(|pos| &self.entries[pos].modifier)
    }

    pub fn resolve_style_at(&self, grapheme_index: usize) -> TextStyle {
        let mut style = TextStyle::default();
        for entry in self
            .entries
            .iter()
            .take_while(|e| e.grapheme_index <= grapheme_index)
        {
            style.apply_modifier(&entry.modifier);
        }
        style
    }

    /// Shifts every entry at or after `grapheme_index` right by `count`, so
    /// inserted graphemes take the style of the grapheme before them.
    pub fn update_due_to_grapheme_insertion(&mut self, grapheme_index: usize, count: usize) {
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.grapheme_index >= grapheme_index)
        {
            entry.grapheme_index += count;
        }
    }

    /// Removes `count` graphemes starting at `grapheme_index`.
    ///
    /// Entries inside the deleted range are folded into the entry that lands
    /// on `grapheme_index`, so the first surviving grapheme after the range
    /// keeps its effective style.
    pub fn update_due_to_grapheme_deletion(&mut self, grapheme_index: usize, count: usize) {
        if count == 0 {
            return;
        }
        let end = grapheme_index + count;
        let mut folded: Option<TextStyleModifier> = None;
        let mut kept = Vec::with_capacity(self.entries.len());
        for mut entry in self.entries.drain(..) {
            if entry.grapheme_index < grapheme_index {
                kept.push(entry);
            } else if entry.grapheme_index < end {
                folded = Some(match folded {
                    Some(f) => f.merged_with(&entry.modifier),
                    None => entry.modifier,
                });
            } else {
                if entry.grapheme_index == end {
                    if let Some(f) = folded.take() {
                        entry.modifier = f.merged_with(&entry.modifier);
                    }
                }
                entry.grapheme_index -= count;
                kept.push(entry);
            }
        }
        self.entries = kept;
        if let Some(f) = folded {
            self.set_modifier(grapheme_index, f);
        }
        self.drop_if_redundant(grapheme_index);
    }

    /// Drops entries that address graphemes at or beyond `len`.
    pub fn truncate(&mut self, len: usize) {
        self.entries.retain(|e| e.grapheme_index < len);
    }

    /// Keeps `[0, at)` and returns the strip for `[at, ..)` rebased to zero.
    ///
    /// The returned strip opens with an entry holding the full resolved style
    /// at `at`, so both halves resolve exactly as before.
    pub fn split_at(&mut self, at: usize) -> TextStyleStrip {
        let opening = self.resolve_style_at(at).to_modifier();
        let split = self.entries.partition_point(|e| e.grapheme_index < at);
        let mut right = TextStyleStrip {
            entries: self
                .entries
                .split_off(split)
                .into_iter()
                .map(|mut e| {
                    e.grapheme_index -= at;
                    e
                })
                .collect(),
        };
        right.set_modifier(0, opening);
        right
    }

    /// Appends `other` (styling a run of `other_len` graphemes) after this
    /// strip's run of `own_len` graphemes.
    ///
    /// A boundary entry is synthesised at the seam so the appended graphemes
    /// do not inherit styling from the end of this run.
    pub fn append(&mut self, own_len: usize, other: TextStyleStrip, other_len: usize) {
        self.truncate(own_len);
        let seam_modifier = other.modifier_at_exactly(0).cloned();
        for entry in other.entries {
            if entry.grapheme_index < other_len {
                self.entries.push(TextStyleStripEntry {
                    grapheme_index: entry.grapheme_index + own_len,
                    modifier: entry.modifier,
                });
            }
        }
        if own_len == 0 || other_len == 0 {
            return;
        }
        let reset = self.resolve_style_at(own_len - 1).modifier_to_reset_to_defaults();
        let boundary = match seam_modifier {
            Some(m) => reset.merged_with(&m),
            None => reset,
        };
        self.set_modifier(own_len, boundary);
        self.drop_if_redundant(own_len);
    }

    /// Removes the entry at `grapheme_index` when it does not change the
    /// effective style of that grapheme.
    fn drop_if_redundant(&mut self, grapheme_index: usize) {
        let Some(modifier) = self.modifier_at_exactly(grapheme_index) else {
            return;
        };
        let before = match grapheme_index {
            0 => TextStyle::default(),
            i => self.resolve_style_at(i - 1),
        };
        let mut after = before.clone();
        after.apply_modifier(modifier);
        if after == before {
            self.set_modifier(grapheme_index, TextStyleModifier::default());
        }
    }
}

/// `6:+B,8:-B`
impl fmt::Display for TextStyleStrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", entry.grapheme_index, entry.modifier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strip(entries: &[(usize, TextStyleModifier)]) -> TextStyleStrip {
        let mut s = TextStyleStrip::new();
        for (i, m) in entries {
            s.set_modifier(*i, m.clone());
        }
        s
    }

    fn unbold() -> TextStyleModifier {
        TextStyleModifier {
            bold: Some(false),
            ..Default::default()
        }
    }

    // ============ Entry management tests ============

    #[test]
    fn test_set_modifier_keeps_entries_sorted() {
        let s = strip(&[(4, unbold()), (1, TextStyleModifier::bold())]);
        assert_eq!(s.to_string(), "1:+B,4:-B");
    }

    #[test]
    fn test_empty_modifier_removes_entry() {
        let mut s = strip(&[(1, TextStyleModifier::bold())]);
        s.set_modifier(1, TextStyleModifier::default());
        assert!(s.is_empty());
    }

    #[test]
    fn test_resolve_style_applies_entries_in_order() {
        let s = strip(&[(1, TextStyleModifier::bold()), (3, unbold())]);
        assert!(!s.resolve_style_at(0).bold);
        assert!(s.resolve_style_at(2).bold);
        assert!(!s.resolve_style_at(3).bold);
    }

    // ============ Insertion and deletion tests ============

    #[test]
    fn test_insertion_shifts_entries_at_or_after_index() {
        let mut s = strip(&[(1, TextStyleModifier::bold()), (3, unbold())]);
        s.update_due_to_grapheme_insertion(3, 2);
        assert_eq!(s.to_string(), "1:+B,5:-B");
    }

    #[test]
    fn test_deletion_folds_entries_into_first_survivor() {
        // "abcdef" with bold on c..d and italic from e
        let mut s = strip(&[
            (2, TextStyleModifier::bold()),
            (4, unbold().merged_with(&TextStyleModifier::italic())),
        ]);
        s.update_due_to_grapheme_deletion(1, 2);
        // "adef": d was bold, e onwards italic
        assert!(s.resolve_style_at(1).bold);
        assert!(s.resolve_style_at(2).italic);
        assert!(!s.resolve_style_at(2).bold);
        assert_eq!(s.to_string(), "1:+B,2:-B,+I");
    }

    #[test]
    fn test_deletion_drops_redundant_entry() {
        let mut s = strip(&[(1, TextStyleModifier::bold()), (2, unbold())]);
        s.update_due_to_grapheme_deletion(1, 1);
        assert!(s.is_empty());
    }

    // ============ Split and append tests ============

    #[test]
    fn test_split_synthesises_boundary_entry() {
        let mut s = strip(&[(1, TextStyleModifier::bold()), (5, unbold())]);
        let right = s.split_at(3);
        assert_eq!(s.to_string(), "1:+B");
        assert_eq!(right.to_string(), "0:+B,2:-B");
    }

    #[test]
    fn test_split_of_unstyled_text_is_empty() {
        let mut s = TextStyleStrip::new();
        assert!(s.split_at(2).is_empty());
    }

    #[test]
    fn test_append_resets_style_at_seam() {
        let mut left = TextStyleStrip::new();
        left.append(6, strip(&[(0, TextStyleModifier::bold())]), 2);
        assert_eq!(left.to_string(), "6:+B");
        left.append(8, TextStyleStrip::new(), 2);
        assert_eq!(left.to_string(), "6:+B,8:-B");
    }

    #[test]
    fn test_append_skips_redundant_seam_entry() {
        let mut left = strip(&[(0, TextStyleModifier::bold())]);
        left.append(2, strip(&[(0, TextStyleModifier::bold())]), 2);
        assert_eq!(left.to_string(), "0:+B");
    }

    #[test]
    fn test_split_then_append_restores_effective_styles() {
        let original = strip(&[(1, TextStyleModifier::bold()), (4, unbold())]);
        let mut left = original.clone();
        let right = left.split_at(2);
        left.append(2, right, 4);
        for i in 0..6 {
            assert_eq!(left.resolve_style_at(i), original.resolve_style_at(i));
        }
    }
}
