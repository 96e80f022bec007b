use serde::{Deserialize, Serialize};

use super::chain::Chain;
use super::node_navigator::NodeNavigator;
use super::path::Path;
use crate::working::WorkingDocument;

/// An inclusive span of the tree between two paths. Both ends include their
/// whole subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub from: Path,
    pub to: Path,
}

enum Coverage {
    Full,
    Partial(Vec<Path>),
    Outside,
}

impl Range {
    pub fn new(from: Path, to: Path) -> Self {
        Range { from, to }
    }

    /// The smallest set of subtrees that together cover the range, in
    /// document order. A parent whose children are all covered is returned
    /// in place of its children.
    pub fn chains_covering_range(&self, doc: &WorkingDocument) -> Vec<Chain> {
        let mut nav = NodeNavigator::new(doc);
        if !nav.navigate_to(&self.to) {
            return Vec::new();
        }
        nav.navigate_to_last_descendant();
        let to_end = nav.path();

        nav.navigate_to_start_of_dfs();
        let paths = match self.coverage(&mut nav, &to_end) {
            Coverage::Full => vec![Path::root()],
            Coverage::Partial(paths) => paths,
            Coverage::Outside => Vec::new(),
        };
        paths
            .iter()
            .filter_map(|p| {
                let mut nav = NodeNavigator::new(doc);
                nav.navigate_to(p).then(|| nav.chain().clone())
            })
            .collect()
    }

    fn coverage(&self, nav: &mut NodeNavigator<'_>, to_end: &Path) -> Coverage {
        let path = nav.path();
        let mut last = nav.clone();
        last.navigate_to_last_descendant();
        let last = last.path();

        if last.document_order(&self.from).is_lt() || path.document_order(to_end).is_gt() {
            return Coverage::Outside;
        }
        if path.document_order(&self.from).is_ge() && last.document_order(to_end).is_le() {
            return Coverage::Full;
        }

        let mut covered = Vec::new();
        let mut all_full = true;
        if nav.navigate_to_first_child() {
            loop {
                match self.coverage(nav, to_end) {
                    Coverage::Full => covered.push(nav.path()),
                    Coverage::Partial(paths) => {
                        all_full = false;
                        covered.extend(paths);
                    }
                    Coverage::Outside => all_full = false,
                }
                if !nav.navigate_to_next_sibling() {
                    break;
                }
            }
            nav.navigate_to_parent();
        } else {
            all_full = false;
        }
        if all_full {
            Coverage::Full
        } else {
            Coverage::Partial(covered)
        }
    }

    /// Visits nodes in forward DFS order from `from` while they do not come
    /// after `to`, returning the chains accepted by `filter`. With
    /// `skip_descendants`, the subtree of an accepted node is not entered.
    pub fn walk(
        &self,
        doc: &WorkingDocument,
        filter: impl Fn(&NodeNavigator<'_>) -> bool,
        skip_descendants: bool,
    ) -> Vec<Chain> {
        let mut nav = NodeNavigator::new(doc);
        if !nav.navigate_to(&self.from) {
            return Vec::new();
        }
        let mut found = Vec::new();
        loop {
            if nav.path().document_order(&self.to).is_gt() {
                break;
            }
            let accepted = filter(&nav);
            if accepted {
                found.push(nav.chain().clone());
            }
            if !nav.navigate_forwards_by_dfs(accepted && skip_descendants) {
                break;
            }
        }
        found
    }
}
