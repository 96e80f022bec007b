//! The boundary to whatever renders the document.
//!
//! Vertical caret movement needs to know where carets land on screen, which
//! the engine cannot work out by itself. A renderer implements
//! [`LayoutService`] and hands it to the editor; without one, vertical moves
//! do nothing.

use crate::cursor::{CursorOrientation, CursorPath};
use crate::working::WorkingDocument;

/// Which edge of the thing at a caret position is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// The edge a caret with `orientation` is drawn at.
    pub fn for_orientation(orientation: CursorOrientation) -> Side {
        match orientation {
            CursorOrientation::After => Side::Right,
            CursorOrientation::Before | CursorOrientation::On => Side::Left,
        }
    }
}

/// How far a caret position is from a target column, in the renderer's
/// units. Only the magnitude is compared.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct HorizontalDistance(pub f64);

impl HorizontalDistance {
    pub fn magnitude(self) -> f64 {
        self.0.abs()
    }
}

/// Screen geometry consumed by vertical caret movement.
///
/// Every method may answer `None`/`false` for positions it has not laid out;
/// the movement code treats that as "unknown" and stops.
pub trait LayoutService {
    /// The column a caret at `position` is drawn at.
    fn get_target_horizontal_anchor(
        &self,
        doc: &WorkingDocument,
        position: &CursorPath,
        side: Side,
    ) -> Option<f64>;

    /// Distance between the caret at `position` and `column`.
    fn detect_horizontal_distance_from_target_horizontal_anchor(
        &self,
        doc: &WorkingDocument,
        position: &CursorPath,
        side: Side,
        column: f64,
    ) -> Option<HorizontalDistance>;

    /// Whether two caret positions, `a` before `b`, sit on different lines.
    fn detect_line_wrap_or_break_between_nodes(
        &self,
        doc: &WorkingDocument,
        a: &CursorPath,
        b: &CursorPath,
    ) -> bool;
}
