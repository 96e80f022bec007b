use super::path::{Path, PathPart};
use crate::working::NodeId;

/// What a chain link resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainTarget {
    Node(NodeId),
    /// A grapheme at this index in the parent link's text.
    Grapheme(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainLink {
    pub target: ChainTarget,
    /// How this link was reached from the previous one; `None` for the root.
    pub path_part: Option<PathPart>,
}

/// A path resolved against one document snapshot, root first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chain {
    links: Vec<ChainLink>,
}

impl Chain {
    pub(crate) fn from_root(root: NodeId) -> Self {
        Chain {
            links: vec![ChainLink {
                target: ChainTarget::Node(root),
                path_part: None,
            }],
        }
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn tip(&self) -> &ChainLink {
        // A chain always holds at least the root link.
        &self.links[self.links.len() - 1]
    }

    pub fn parent(&self) -> Option<&ChainLink> {
        self.links.len().checked_sub(2).map(|i| &self.links[i])
    }

    pub fn grand_parent(&self) -> Option<&ChainLink> {
        self.links.len().checked_sub(3).map(|i| &self.links[i])
    }

    pub fn tip_node(&self) -> Option<NodeId> {
        match self.tip().target {
            ChainTarget::Node(id) => Some(id),
            ChainTarget::Grapheme(_) => None,
        }
    }

    pub fn parent_node(&self) -> Option<NodeId> {
        match self.parent()?.target {
            ChainTarget::Node(id) => Some(id),
            ChainTarget::Grapheme(_) => None,
        }
    }

    pub fn grapheme_index(&self) -> Option<usize> {
        match self.tip().target {
            ChainTarget::Grapheme(index) => Some(index),
            ChainTarget::Node(_) => None,
        }
    }

    pub fn is_at_root(&self) -> bool {
        self.links.len() == 1
    }

    pub fn path(&self) -> Path {
        Path::new(self.links.iter().filter_map(|l| l.path_part).collect())
    }

    pub(crate) fn push(&mut self, link: ChainLink) {
        self.links.push(link);
    }

    /// Drops the tip; the root link is never removed.
    pub(crate) fn pop(&mut self) -> Option<ChainLink> {
        if self.links.len() > 1 {
            self.links.pop()
        } else {
            None
        }
    }

    pub(crate) fn replace_tip(&mut self, link: ChainLink) {
        if let Some(tip) = self.links.last_mut() {
            *tip = link;
        }
    }
}
