use super::chain::{Chain, ChainLink, ChainTarget};
use super::path::{Path, PathPart};
use crate::text::Grapheme;
use crate::working::{NodeId, WorkingDocument, WorkingNode};

/// A stateful walker over one document snapshot.
///
/// Every `navigate_*` method either moves the navigator and returns `true`,
/// or leaves it exactly where it was and returns `false`.
#[derive(Debug, Clone)]
pub struct NodeNavigator<'a> {
    doc: &'a WorkingDocument,
    chain: Chain,
}

impl<'a> NodeNavigator<'a> {
    /// A navigator positioned at the document root.
    pub fn new(doc: &'a WorkingDocument) -> Self {
        NodeNavigator {
            doc,
            chain: Chain::from_root(doc.root_id()),
        }
    }

    pub fn document(&self) -> &'a WorkingDocument {
        self.doc
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn path(&self) -> Path {
        self.chain.path()
    }

    /// The node at the tip, or `None` when the tip is a grapheme.
    pub fn tip_node(&self) -> Option<&'a WorkingNode> {
        self.chain.tip_node().and_then(|id| self.doc.get_node(id))
    }

    /// The tip node, or the node whose text holds the tip grapheme.
    pub fn tip_or_parent_node(&self) -> Option<&'a WorkingNode> {
        self.tip_node().or_else(|| self.parent_node())
    }

    pub fn parent_node(&self) -> Option<&'a WorkingNode> {
        self.chain.parent_node().and_then(|id| self.doc.get_node(id))
    }

    pub fn grand_parent_node(&self) -> Option<&'a WorkingNode> {
        match self.chain.grand_parent()?.target {
            ChainTarget::Node(id) => self.doc.get_node(id),
            ChainTarget::Grapheme(_) => None,
        }
    }

    pub fn grapheme_index(&self) -> Option<usize> {
        self.chain.grapheme_index()
    }

    pub fn grapheme(&self) -> Option<&'a Grapheme> {
        let index = self.chain.grapheme_index()?;
        self.parent_node()?.children.grapheme(index)
    }

    pub fn is_at_root(&self) -> bool {
        self.chain.is_at_root()
    }

    /// Number of regular children (nodes or graphemes) of the tip.
    pub fn child_count(&self) -> usize {
        self.tip_node().map_or(0, |n| n.children.len())
    }

    /// The collection the tip sits in and its length.
    fn sibling_count(&self) -> Option<usize> {
        let part = self.chain.tip().path_part?;
        let parent = self.parent_node()?;
        match part.facet {
            None => Some(parent.children.len()),
            Some(_) => parent.child_ids(part.facet).map(<[NodeId]>::len),
        }
    }

    fn link_for(&self, parent: &WorkingNode, part: PathPart) -> Option<ChainLink> {
        let target = match part.facet {
            None if parent.children.is_text() => {
                (part.index < parent.children.len()).then_some(ChainTarget::Grapheme(part.index))?
            }
            facet => ChainTarget::Node(*parent.child_ids(facet)?.get(part.index)?),
        };
        Some(ChainLink {
            target,
            path_part: Some(part),
        })
    }

    /// Resolves `path` from the root.
    pub fn navigate_to(&mut self, path: &Path) -> bool {
        let mut chain = Chain::from_root(self.doc.root_id());
        for part in path.parts() {
            let Some(parent) = chain.tip_node().and_then(|id| self.doc.get_node(id)) else {
                return false;
            };
            let Some(link) = self.link_for(parent, *part) else {
                return false;
            };
            chain.push(link);
        }
        self.chain = chain;
        true
    }

    pub fn navigate_to_node(&mut self, id: NodeId) -> bool {
        match self.doc.get_node_path(id) {
            Ok(path) => self.navigate_to(&path),
            Err(_) => false,
        }
    }

    pub fn navigate_to_child(&mut self, index: usize) -> bool {
        self.navigate_to_child_part(PathPart::new(index))
    }

    pub fn navigate_to_child_part(&mut self, part: PathPart) -> bool {
        let Some(parent) = self.tip_node() else {
            return false;
        };
        match self.link_for(parent, part) {
            Some(link) => {
                self.chain.push(link);
                true
            }
            None => false,
        }
    }

    pub fn navigate_to_first_child(&mut self) -> bool {
        self.navigate_to_child(0)
    }

    pub fn navigate_to_last_child(&mut self) -> bool {
        match self.child_count() {
            0 => false,
            n => self.navigate_to_child(n - 1),
        }
    }

    /// Moves to the parent; the root has none.
    pub fn navigate_to_parent(&mut self) -> bool {
        self.chain.pop().is_some()
    }

    pub fn navigate_to_relative_sibling(&mut self, offset: isize) -> bool {
        let (Some(part), Some(count), Some(parent)) = (
            self.chain.tip().path_part,
            self.sibling_count(),
            self.parent_node(),
        ) else {
            return false;
        };
        let Some(index) = part.index.checked_add_signed(offset) else {
            return false;
        };
        if index >= count {
            return false;
        }
        match self.link_for(parent, part.with_index(index)) {
            Some(link) => {
                self.chain.replace_tip(link);
                true
            }
            None => false,
        }
    }

    pub fn navigate_to_next_sibling(&mut self) -> bool {
        self.navigate_to_relative_sibling(1)
    }

    pub fn navigate_to_preceding_sibling(&mut self) -> bool {
        self.navigate_to_relative_sibling(-1)
    }

    pub fn navigate_to_first_sibling(&mut self) -> bool {
        match self.chain.tip().path_part {
            Some(part) => self.navigate_to_relative_sibling(-(part.index as isize)),
            None => false,
        }
    }

    pub fn navigate_to_last_sibling(&mut self) -> bool {
        match (self.chain.tip().path_part, self.sibling_count()) {
            (Some(part), Some(count)) if count > 0 => {
                self.navigate_to_relative_sibling((count - 1) as isize - part.index as isize)
            }
            _ => false,
        }
    }

    pub fn has_next_sibling(&self) -> bool {
        self.clone().navigate_to_next_sibling()
    }

    pub fn has_preceding_sibling(&self) -> bool {
        self.clone().navigate_to_preceding_sibling()
    }

    /// Descends through last children as far as possible. Always succeeds,
    /// possibly without moving.
    pub fn navigate_to_last_descendant(&mut self) -> bool {
        while self.navigate_to_last_child() {}
        true
    }

    pub fn navigate_to_first_descendant(&mut self) -> bool {
        while self.navigate_to_first_child() {}
        true
    }

    pub fn navigate_to_start_of_dfs(&mut self) -> bool {
        self.chain = Chain::from_root(self.doc.root_id());
        true
    }

    pub fn navigate_to_end_of_dfs(&mut self) -> bool {
        self.navigate_to_start_of_dfs();
        self.navigate_to_last_descendant()
    }

    /// Pre-order step: first child, else the next sibling of the nearest
    /// ancestor-or-self that has one.
    pub fn navigate_forwards_by_dfs(&mut self, skip_descendants: bool) -> bool {
        if !skip_descendants && self.navigate_to_first_child() {
            return true;
        }
        let backup = self.chain.clone();
        loop {
            if self.navigate_to_next_sibling() {
                return true;
            }
            if !self.navigate_to_parent() {
                self.chain = backup;
                return false;
            }
        }
    }

    /// Parent-before-children backwards step: last child, else the preceding
    /// sibling of the nearest ancestor-or-self that has one.
    pub fn navigate_backwards_by_dfs(&mut self, skip_descendants: bool) -> bool {
        if !skip_descendants && self.navigate_to_last_child() {
            return true;
        }
        let backup = self.chain.clone();
        loop {
            if self.navigate_to_preceding_sibling() {
                return true;
            }
            if !self.navigate_to_parent() {
                self.chain = backup;
                return false;
            }
        }
    }

    /// Exact inverse of [`navigate_forwards_by_dfs`](Self::navigate_forwards_by_dfs).
    pub fn navigate_reverse_of_forwards_by_dfs(&mut self) -> bool {
        if self.navigate_to_preceding_sibling() {
            return self.navigate_to_last_descendant();
        }
        self.navigate_to_parent()
    }

    /// Moves to the nearest strict ancestor accepted by `predicate`.
    pub fn navigate_to_ancestor_matching(
        &mut self,
        predicate: impl Fn(&WorkingNode) -> bool,
    ) -> bool {
        let backup = self.chain.clone();
        while self.navigate_to_parent() {
            if self.tip_node().is_some_and(&predicate) {
                return true;
            }
        }
        self.chain = backup;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::builders::*;
    use pretty_assertions::assert_eq;

    fn doc() -> WorkingDocument {
        WorkingDocument::new(document(vec![
            header(vec![span("H1")]),
            paragraph(vec![span("MM"), span(""), span("NN")]),
        ]))
        .expect("Should load document")
    }

    fn path(s: &str) -> Path {
        s.parse().expect("Should parse path")
    }

    fn walk(doc: &WorkingDocument, start: &str, step: impl Fn(&mut NodeNavigator) -> bool) -> Vec<String> {
        let mut nav = NodeNavigator::new(doc);
        assert!(nav.navigate_to(&path(start)));
        let mut seen = vec![nav.path().to_string()];
        while step(&mut nav) {
            seen.push(nav.path().to_string());
        }
        seen
    }

    // ============ Basic navigation tests ============

    #[test]
    fn test_navigate_to_resolves_nodes_and_graphemes() {
        let doc = doc();
        let mut nav = NodeNavigator::new(&doc);
        assert!(nav.navigate_to(&path("1/2/1")));
        assert_eq!(nav.grapheme().map(Grapheme::as_str), Some("N"));
        assert_eq!(nav.parent_node().map(WorkingNode::kind), Some(crate::model::NodeKind::Span));
    }

    #[test]
    fn test_failed_navigation_leaves_state_unchanged() {
        let doc = doc();
        let mut nav = NodeNavigator::new(&doc);
        assert!(nav.navigate_to(&path("1/0")));
        assert!(!nav.navigate_to(&path("1/5")));
        assert!(!nav.navigate_to(&path("0/0/0/0")));
        assert!(!nav.navigate_to_preceding_sibling());
        assert_eq!(nav.path(), path("1/0"));
        assert!(nav.navigate_to_next_sibling());
        assert!(nav.navigate_to_next_sibling());
        assert!(!nav.navigate_to_next_sibling());
        assert_eq!(nav.path(), path("1/2"));
    }

    #[test]
    fn test_parent_never_leaves_root() {
        let doc = doc();
        let mut nav = NodeNavigator::new(&doc);
        assert!(!nav.navigate_to_parent());
        assert!(nav.is_at_root());
    }

    // ============ DFS tests ============

    #[test]
    fn test_forwards_dfs_is_pre_order() {
        let doc = doc();
        assert_eq!(
            walk(&doc, "", |n| n.navigate_forwards_by_dfs(false)),
            vec!["", "0", "0/0", "0/0/0", "0/0/1", "1", "1/0", "1/0/0", "1/0/1", "1/1", "1/2", "1/2/0", "1/2/1"]
        );
    }

    #[test]
    fn test_forwards_dfs_can_skip_descendants() {
        let doc = doc();
        assert_eq!(walk(&doc, "0", |n| n.navigate_forwards_by_dfs(true)), vec!["0", "1"]);
    }

    #[test]
    fn test_backwards_dfs_visits_parents_before_children() {
        let doc = doc();
        assert_eq!(
            walk(&doc, "", |n| n.navigate_backwards_by_dfs(false)),
            vec!["", "1", "1/2", "1/2/1", "1/2/0", "1/1", "1/0", "1/0/1", "1/0/0", "0", "0/0", "0/0/1", "0/0/0"]
        );
    }

    #[test]
    fn test_reverse_of_forwards_dfs() {
        let doc = doc();
        let mut forwards = walk(&doc, "", |n| n.navigate_forwards_by_dfs(false));
        forwards.reverse();
        assert_eq!(walk(&doc, "1/2/1", |n| n.navigate_reverse_of_forwards_by_dfs()), forwards);
    }

    #[test]
    fn test_ancestor_matching() {
        let doc = doc();
        let mut nav = NodeNavigator::new(&doc);
        assert!(nav.navigate_to(&path("1/2/0")));
        assert!(nav.navigate_to_ancestor_matching(|n| n.kind() == crate::model::NodeKind::Paragraph));
        assert_eq!(nav.path(), path("1"));
        assert!(!nav.navigate_to_ancestor_matching(|n| n.kind() == crate::model::NodeKind::Media));
        assert_eq!(nav.path(), path("1"));
    }

    #[test]
    fn test_first_and_last_sibling() {
        let doc = doc();
        let mut nav = NodeNavigator::new(&doc);
        assert!(nav.navigate_to(&path("1/1")));
        assert!(nav.navigate_to_last_sibling());
        assert_eq!(nav.path(), path("1/2"));
        assert!(nav.navigate_to_first_sibling());
        assert_eq!(nav.path(), path("1/0"));
        assert!(nav.navigate_to_end_of_dfs());
        assert_eq!(nav.path(), path("1/2/1"));
    }
}
