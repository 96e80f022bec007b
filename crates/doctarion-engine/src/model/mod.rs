/*!
 * # Document Model
 *
 * The immutable, value-like form of a document.
 *
 * - **`node_type`**: the closed catalog of node kinds, with each kind's
 *   category, children shape, facet slots and container rules.
 * - **`facet`**: typed facet slots and the values they hold.
 * - **`node`**: the interchange `Node` tree, validated against the catalog.
 * - **`builders`**: terse constructors for building trees by hand.
 *
 * A `Node` tree is what gets loaded into a `WorkingDocument` for editing and
 * what comes back out of `WorkingDocument::to_node`.
 */

pub mod builders;
pub mod facet;
pub mod node;
pub mod node_type;

pub use facet::{AnchorSpec, Facet, FacetValue, FacetValueType};
pub use node::{Node, NodeChildren};
pub use node_type::{NodeCategory, NodeChildrenType, NodeKind};
