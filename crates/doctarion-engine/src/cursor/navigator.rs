use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::CursorOrientation;
use crate::model::NodeKind;
use crate::traversal::{NodeNavigator, Path};
use crate::working::{WorkingDocument, WorkingNode};

use CursorOrientation::{After, Before, On};

/// A caret position expressed as a path plus orientation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorPath {
    pub path: Path,
    pub orientation: CursorOrientation,
}

impl CursorPath {
    pub fn new(path: Path, orientation: CursorOrientation) -> Self {
        CursorPath { path, orientation }
    }

    /// Document order of two carets. A caret `After` a node sorts after
    /// every caret inside that node; `Before` and `On` sort before them.
    pub fn compare_to(&self, other: &CursorPath) -> Ordering {
        if self.path == other.path {
            return self.orientation.cmp(&other.orientation);
        }
        if self.path.is_ancestor_of(&other.path) {
            return if self.orientation == After {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        if other.path.is_ancestor_of(&self.path) {
            return if other.orientation == After {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        self.path.document_order(&other.path)
    }
}

/// `0/1/2<`, `0/1N`, `0/1/2>`
impl fmt::Display for CursorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.orientation {
            Before => "<",
            On => "N",
            After => ">",
        };
        write!(f, "{}{suffix}", self.path)
    }
}

/// A [`NodeNavigator`] plus an orientation, restricted to canonical caret
/// positions.
#[derive(Debug, Clone)]
pub struct CursorNavigator<'a> {
    nav: NodeNavigator<'a>,
    orientation: CursorOrientation,
}

impl<'a> CursorNavigator<'a> {
    /// A navigator at the first caret position of the document.
    pub fn new(doc: &'a WorkingDocument) -> Self {
        let mut cursor = CursorNavigator {
            nav: NodeNavigator::new(doc),
            orientation: On,
        };
        cursor.navigate_to_document_start();
        cursor
    }

    pub fn orientation(&self) -> CursorOrientation {
        self.orientation
    }

    pub fn node_navigator(&self) -> &NodeNavigator<'a> {
        &self.nav
    }

    pub fn into_node_navigator(self) -> NodeNavigator<'a> {
        self.nav
    }

    pub fn document(&self) -> &'a WorkingDocument {
        self.nav.document()
    }

    pub fn path(&self) -> Path {
        self.nav.path()
    }

    pub fn cursor_path(&self) -> CursorPath {
        CursorPath::new(self.nav.path(), self.orientation)
    }

    pub fn tip_node(&self) -> Option<&'a WorkingNode> {
        self.nav.tip_node()
    }

    pub fn grapheme_index(&self) -> Option<usize> {
        self.nav.grapheme_index()
    }

    pub fn compare_to(&self, other: &CursorNavigator<'_>) -> Ordering {
        self.cursor_path().compare_to(&other.cursor_path())
    }

    /// Whether the current position is one a caret may rest at.
    pub fn is_valid(&self) -> bool {
        is_valid(&self.nav, self.orientation)
    }

    pub fn navigate_to_document_start(&mut self) -> bool {
        self.navigate_to(&Path::root(), Before)
    }

    pub fn navigate_to_document_end(&mut self) -> bool {
        self.navigate_to(&Path::root(), After)
    }

    /// Moves to `path` and corrects `orientation` onto the nearest canonical
    /// position. Returns `false` without moving when `path` does not resolve.
    pub fn navigate_to(&mut self, path: &Path, orientation: CursorOrientation) -> bool {
        let mut nav = self.nav.clone();
        if !nav.navigate_to(path) {
            return false;
        }
        let orientation = autocorrect(&mut nav, orientation);
        self.settle(nav, orientation);
        true
    }

    pub fn navigate_to_cursor_path(&mut self, cursor: &CursorPath) -> bool {
        self.navigate_to(&cursor.path, cursor.orientation)
    }

    pub fn navigate_to_relative_sibling(
        &mut self,
        offset: isize,
        orientation: CursorOrientation,
    ) -> bool {
        let mut nav = self.nav.clone();
        if !nav.navigate_to_relative_sibling(offset) {
            return false;
        }
        let orientation = autocorrect(&mut nav, orientation);
        self.settle(nav, orientation);
        true
    }

    /// Deepest, last caret position within the current node.
    pub fn navigate_to_last_descendant_cursor_position(&mut self) {
        let mut nav = self.nav.clone();
        nav.navigate_to_last_descendant();
        let orientation = if nav.grapheme_index().is_some() || is_boundary(&nav) {
            After
        } else {
            On
        };
        self.settle(nav, orientation);
    }

    /// Deepest, first caret position within the current node.
    pub fn navigate_to_first_descendant_cursor_position(&mut self) {
        let mut nav = self.nav.clone();
        nav.navigate_to_first_descendant();
        let orientation = if nav.grapheme_index().is_some() || is_boundary(&nav) {
            Before
        } else {
            On
        };
        self.settle(nav, orientation);
    }

    pub fn navigate_to_next_cursor_position(&mut self) -> bool {
        match next_valid(&self.nav, self.orientation) {
            Some((nav, orientation)) => {
                self.nav = nav;
                self.orientation = orientation;
                true
            }
            None => false,
        }
    }

    pub fn navigate_to_preceding_cursor_position(&mut self) -> bool {
        match preceding_valid(&self.nav, self.orientation) {
            Some((nav, orientation)) => {
                self.nav = nav;
                self.orientation = orientation;
                true
            }
            None => false,
        }
    }

    /// Adopts `(nav, orientation)`, moving onto the closest valid position
    /// if it is not one itself. `After` positions prefer moving forwards,
    /// the others backwards.
    fn settle(&mut self, nav: NodeNavigator<'a>, orientation: CursorOrientation) {
        let settled = if is_valid(&nav, orientation) {
            Some((nav, orientation))
        } else if orientation == After {
            next_valid(&nav, orientation).or_else(|| preceding_valid(&nav, orientation))
        } else {
            preceding_valid(&nav, orientation).or_else(|| next_valid(&nav, orientation))
        };
        if let Some((nav, orientation)) = settled {
            self.nav = nav;
            self.orientation = orientation;
        }
    }
}

fn is_boundary(nav: &NodeNavigator<'_>) -> bool {
    nav.tip_node()
        .is_some_and(|n| n.kind().is_boundary_inline())
}

fn is_childless_node(nav: &NodeNavigator<'_>) -> bool {
    nav.tip_node().is_some_and(|n| n.children().is_empty())
}

/// Folds an arbitrary orientation onto the raw position it denotes.
fn autocorrect(nav: &mut NodeNavigator<'_>, orientation: CursorOrientation) -> CursorOrientation {
    if nav.grapheme_index().is_some() {
        return if orientation == On { Before } else { orientation };
    }
    if is_childless_node(nav) {
        return if is_boundary(nav) { orientation } else { On };
    }
    if is_boundary(nav) {
        return if orientation == On { Before } else { orientation };
    }
    match orientation {
        After => last_exit(nav),
        Before | On => first_entry(nav),
    }
}

fn first_entry(nav: &mut NodeNavigator<'_>) -> CursorOrientation {
    loop {
        if nav.grapheme_index().is_some() || is_boundary(nav) {
            return Before;
        }
        if !nav.navigate_to_first_child() {
            return On;
        }
    }
}

fn last_exit(nav: &mut NodeNavigator<'_>) -> CursorOrientation {
    loop {
        if nav.grapheme_index().is_some() || is_boundary(nav) {
            return After;
        }
        if !nav.navigate_to_last_child() {
            return On;
        }
    }
}

fn next_after_exit(nav: &mut NodeNavigator<'_>) -> Option<CursorOrientation> {
    loop {
        if nav.navigate_to_next_sibling() {
            return Some(first_entry(nav));
        }
        if !nav.navigate_to_parent() {
            return None;
        }
        if is_boundary(nav) {
            return Some(After);
        }
    }
}

fn preceding_before_entry(nav: &mut NodeNavigator<'_>) -> Option<CursorOrientation> {
    loop {
        if nav.navigate_to_preceding_sibling() {
            return Some(last_exit(nav));
        }
        if !nav.navigate_to_parent() {
            return None;
        }
        if is_boundary(nav) {
            return Some(Before);
        }
    }
}

fn raw_next<'a>(
    nav: &NodeNavigator<'a>,
    orientation: CursorOrientation,
) -> Option<(NodeNavigator<'a>, CursorOrientation)> {
    let mut nav = nav.clone();
    let orientation = match orientation {
        Before => {
            if nav.grapheme_index().is_some() {
                After
            } else if nav.navigate_to_first_child() {
                first_entry(&mut nav)
            } else {
                On
            }
        }
        On if is_boundary(&nav) => After,
        On | After => next_after_exit(&mut nav)?,
    };
    Some((nav, orientation))
}

fn raw_preceding<'a>(
    nav: &NodeNavigator<'a>,
    orientation: CursorOrientation,
) -> Option<(NodeNavigator<'a>, CursorOrientation)> {
    let mut nav = nav.clone();
    let orientation = match orientation {
        After => {
            if nav.grapheme_index().is_some() {
                Before
            } else if nav.navigate_to_last_child() {
                last_exit(&mut nav)
            } else {
                On
            }
        }
        On if is_boundary(&nav) => Before,
        On | Before => preceding_before_entry(&mut nav)?,
    };
    Some((nav, orientation))
}

fn next_valid<'a>(
    nav: &NodeNavigator<'a>,
    orientation: CursorOrientation,
) -> Option<(NodeNavigator<'a>, CursorOrientation)> {
    let mut current = raw_next(nav, orientation)?;
    while !is_valid(&current.0, current.1) {
        current = raw_next(&current.0, current.1)?;
    }
    Some(current)
}

fn preceding_valid<'a>(
    nav: &NodeNavigator<'a>,
    orientation: CursorOrientation,
) -> Option<(NodeNavigator<'a>, CursorOrientation)> {
    let mut current = raw_preceding(nav, orientation)?;
    while !is_valid(&current.0, current.1) {
        current = raw_preceding(&current.0, current.1)?;
    }
    Some(current)
}

fn is_non_empty_span(node: Option<&WorkingNode>) -> bool {
    node.is_some_and(|n| n.kind() == NodeKind::Span && !n.children().is_empty())
}

fn is_valid(nav: &NodeNavigator<'_>, orientation: CursorOrientation) -> bool {
    if let Some(index) = nav.grapheme_index() {
        return match orientation {
            After => true,
            On => false,
            Before => {
                if index != 0 {
                    return false;
                }
                let mut parent = nav.clone();
                parent.navigate_to_parent();
                let in_span = parent.tip_node().is_some_and(|n| n.kind() == NodeKind::Span);
                !(in_span
                    && parent.navigate_to_preceding_sibling()
                    && is_non_empty_span(parent.tip_node()))
            }
        };
    }
    match orientation {
        On => is_childless_node(nav),
        Before => is_boundary(nav) && !nav.has_preceding_sibling(),
        After => {
            if !is_boundary(nav) {
                return false;
            }
            let mut next = nav.clone();
            !next.navigate_to_next_sibling() || is_boundary(&next)
        }
    }
}
