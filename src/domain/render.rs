//! Terminal rendering of combination trees.

use generational_arena::Index;
use termtree::Tree;

use crate::domain::arena::ComboTree;

/// Label used for the valueless root.
pub const ROOT_LABEL: &str = "*";

pub trait ToTermTree {
    fn to_tree_string(&self) -> Tree<String>;
}

impl ToTermTree for ComboTree {
    fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(combo: &ComboTree, node_idx: Index, parent_tree: &mut Tree<String>) {
            if let Some(node) = combo.get_node(node_idx) {
                for &child_idx in &node.children {
                    if let Some(child) = combo.get_node(child_idx) {
                        let label = child.value.clone().unwrap_or_default();
                        let mut child_tree = Tree::new(label);
                        build_tree(combo, child_idx, &mut child_tree);
                        parent_tree.push(child_tree);
                    }
                }
            }
        }

        let mut tree = Tree::new(ROOT_LABEL.to_string());
        build_tree(self, self.root(), &mut tree);
        tree
    }
}
