//! Arena-backed combination tree.
//!
//! A `ComboTree` enumerates every combination of one item from each of several
//! category lists. Each root-to-leaf path (excluding the valueless root) is one
//! combination. Pruning never mutates a tree in place: it produces a new arena.

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::entities::CategoryList;

/// Tree node in the arena. The root is the only node without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComboNode {
    /// Category item, None for the root sentinel
    pub value: Option<String>,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in insertion order
    pub children: Vec<Index>,
}

/// Arena-based tree over the Cartesian product of category lists.
///
/// `Clone` is a deep copy: the arena is duplicated and indices stay valid.
#[derive(Debug, Clone)]
pub struct ComboTree {
    arena: Arena<ComboNode>,
    root: Index,
}

impl ComboTree {
    /// Tree holding only the root sentinel.
    pub fn root_only() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(ComboNode {
            value: None,
            parent: None,
            children: Vec::new(),
        });
        Self { arena, root }
    }

    /// Build the full combination tree.
    ///
    /// Lists are sorted by length (shortest first, stable) before construction so
    /// that pruning an item near the root discards the largest subtrees first.
    #[instrument(level = "debug", skip(lists), fields(lists = lists.len()))]
    pub fn build(lists: &[CategoryList]) -> DomainResult<Self> {
        if lists.is_empty() {
            return Err(DomainError::EmptyCategories);
        }

        let mut lists: Vec<&CategoryList> = lists.iter().collect();
        lists.sort_by_key(|l| l.len());

        let mut tree = Self::root_only();
        let mut stack = vec![(tree.root, 0usize)];

        while let Some((parent_idx, level)) = stack.pop() {
            let Some(items) = lists.get(level) else {
                continue;
            };
            for item in items.iter() {
                let child = tree.insert_node(Some(item.clone()), parent_idx);
                stack.push((child, level + 1));
            }
        }

        debug!(nodes = tree.arena.len(), "built combination tree");
        Ok(tree)
    }

    fn insert_node(&mut self, value: Option<String>, parent: Index) -> Index {
        let node_idx = self.arena.insert(ComboNode {
            value,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent) = self.arena.get_mut(parent) {
            parent.children.push(node_idx);
        }
        node_idx
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn get_node(&self, idx: Index) -> Option<&ComboNode> {
        self.arena.get(idx)
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Pre-order iterator over all nodes, root first.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Number of leaves. A childless root counts as one leaf.
    #[instrument(level = "trace", skip(self))]
    pub fn leaf_count(&self) -> usize {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .count()
    }

    /// Longest root-to-leaf path counted in nodes, root included.
    /// A childless root has depth 1.
    #[instrument(level = "trace", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Number of category levels below the root.
    /// Equals the number of lists the tree was built from until pruning shortens it.
    pub fn levels(&self) -> usize {
        self.depth() - 1
    }

    /// Returns a new tree with every node valued `target` removed together with its subtree.
    ///
    /// The root is never removed. `self` is left untouched.
    #[instrument(level = "trace", skip(self))]
    pub fn without_value(&self, target: &str) -> ComboTree {
        let mut pruned = Self::root_only();
        let mut stack = vec![(self.root, pruned.root)];

        while let Some((old_idx, new_idx)) = stack.pop() {
            let Some(node) = self.get_node(old_idx) else {
                continue;
            };
            for &child_idx in &node.children {
                let Some(child) = self.get_node(child_idx) else {
                    continue;
                };
                if child.value.as_deref() == Some(target) {
                    continue;
                }
                let copied = pruned.insert_node(child.value.clone(), new_idx);
                stack.push((child_idx, copied));
            }
        }
        pruned
    }

    /// All root-to-leaf value paths, excluding the root sentinel.
    pub fn paths(&self) -> Vec<Vec<String>> {
        self.iter_paths().collect()
    }

    /// Lazy, restartable path enumeration in left-to-right order.
    pub fn iter_paths(&self) -> PathIterator<'_> {
        PathIterator {
            tree: self,
            stack: vec![(self.root, Vec::new())],
        }
    }
}

/// Structural equality: same values in the same shape, regardless of arena layout.
impl PartialEq for ComboTree {
    fn eq(&self, other: &Self) -> bool {
        fn same(a: &ComboTree, ai: Index, b: &ComboTree, bi: Index) -> bool {
            match (a.get_node(ai), b.get_node(bi)) {
                (Some(x), Some(y)) => {
                    x.value == y.value
                        && x.children.len() == y.children.len()
                        && x.children
                            .iter()
                            .zip(&y.children)
                            .all(|(&xc, &yc)| same(a, xc, b, yc))
                }
                (None, None) => true,
                _ => false,
            }
        }
        same(self, self.root, other, other.root)
    }
}

impl Eq for ComboTree {}

pub struct TreeIterator<'a> {
    tree: &'a ComboTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a ComboTree) -> Self {
        Self {
            tree,
            stack: vec![tree.root],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a ComboNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PathIterator<'a> {
    tree: &'a ComboTree,
    stack: Vec<(Index, Vec<String>)>,
}

impl<'a> Iterator for PathIterator<'a> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((idx, mut path)) = self.stack.pop() {
            let Some(node) = self.tree.get_node(idx) else {
                continue;
            };
            if let Some(value) = &node.value {
                path.push(value.clone());
            }
            if node.children.is_empty() {
                return Some(path);
            }
            for &child in node.children.iter().rev() {
                self.stack.push((child, path.clone()));
            }
        }
        None
    }
}
