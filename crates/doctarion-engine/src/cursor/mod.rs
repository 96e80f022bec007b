/*!
 * # Cursor Positions
 *
 * A caret is a tree position plus a [`CursorOrientation`]. Not every pair is
 * a position a user can reach: positions that render at the same visual
 * spot as another one are folded onto a single canonical representative.
 *
 * The raw order of positions inside a node is:
 *
 * 1. `Before` the node, if it is a boundary inline (e.g. a hyperlink)
 * 2. `On` the node, if it has no children at all
 * 3. `Before`/`After` each grapheme, or the positions of each child node
 * 4. `After` the node, if it is a boundary inline
 *
 * [`CursorNavigator`] steps through that order and skips the positions that
 * are not canonical:
 *
 * - `Before` a grapheme is only kept at the start of a text run that does not
 *   directly follow another non-empty span (otherwise it equals `After` the
 *   previous grapheme).
 * - `Before` a boundary inline is only kept when it is the first child.
 * - `After` a boundary inline is only kept when it is the last child or is
 *   followed by another boundary inline.
 */

mod navigator;

pub use navigator::{CursorNavigator, CursorPath};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CursorOrientation {
    Before,
    On,
    After,
}

impl CursorOrientation {
    pub fn label(self) -> &'static str {
        match self {
            CursorOrientation::Before => "BEFORE",
            CursorOrientation::On => "ON",
            CursorOrientation::After => "AFTER",
        }
    }
}
