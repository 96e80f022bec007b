/*!
 * # Addressing and Traversal
 *
 * - **`path`**: `Path`/`PathPart`, a root-relative address that holds no
 *   references into any tree. Parts may step into a node-array facet
 *   (`annotations:0`).
 * - **`chain`**: a path resolved against one snapshot, root first, with the
 *   id of every ancestor on it.
 * - **`node_navigator`**: a walker that moves a chain around the tree
 *   (parent, children, siblings, forward and backward DFS).
 * - **`range`**: inclusive ranges between two paths, the minimal set of
 *   subtrees covering them, and filtered walks over them.
 *
 * Graphemes are leaves of the tree: a node with text children has one child
 * position per grapheme. Depth-first walks only follow regular children;
 * facet arrays are reached by navigating to a facet path explicitly.
 */

pub mod chain;
pub mod node_navigator;
pub mod path;
pub mod range;

pub use chain::{Chain, ChainLink, ChainTarget};
pub use node_navigator::NodeNavigator;
pub use path::{Path, PathPart};
pub use range::Range;
