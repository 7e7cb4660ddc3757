use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use termtree::Tree;
use tracing::instrument;

use crate::domain::entities::Participant;

/// Terminal follower entry attached to a multiplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerLeaf {
    pub participant: Participant,
}

impl fmt::Display for FollowerLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.participant)
    }
}

/// Multiplier node in the arena-based hierarchy.
#[derive(Debug)]
pub struct HierarchyNode {
    pub participant: Participant,
    /// Index of the parent multiplier, None for roots
    pub parent: Option<Index>,
    /// Multiplier children, in input order
    pub children: Vec<Index>,
    /// Followers recruited by this multiplier, in input order
    pub followers: Vec<FollowerLeaf>,
    /// 1 for top multipliers; the campaign root sits at depth 0
    pub depth: usize,
}

impl HierarchyNode {
    pub fn id(&self) -> &str {
        &self.participant.id
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && self.followers.is_empty()
    }
}

/// Arena-based forest of multiplier trees.
///
/// Nodes are addressed by generational index; an id lookup maps participant
/// ids back to their node.
#[derive(Debug, Default)]
pub struct HierarchyForest {
    arena: Arena<HierarchyNode>,
    roots: Vec<Index>,
    by_id: HashMap<String, Index>,
}

impl HierarchyForest {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip(self, participant), fields(id = %participant.id))]
    pub fn insert_node(&mut self, participant: Participant, parent: Option<Index>) -> Index {
        let depth = parent
            .and_then(|p| self.arena.get(p))
            .map(|p| p.depth + 1)
            .unwrap_or(1);
        let id = participant.id.clone();
        let node_idx = self.arena.insert(HierarchyNode {
            participant,
            parent,
            children: Vec::new(),
            followers: Vec::new(),
            depth,
        });

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent) => parent.children.push(node_idx),
            None => self.roots.push(node_idx),
        }
        self.by_id.insert(id, node_idx);

        node_idx
    }

    /// Attach a follower to a placed multiplier. Returns false for unknown leaders.
    pub fn add_follower(&mut self, leader: Index, participant: Participant) -> bool {
        match self.arena.get_mut(leader) {
            Some(node) => {
                node.followers.push(FollowerLeaf { participant });
                true
            }
            None => false,
        }
    }

    pub fn get_node(&self, idx: Index) -> Option<&HierarchyNode> {
        self.arena.get(idx)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    /// Index of the multiplier with the given participant id.
    pub fn find(&self, id: &str) -> Option<Index> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Participant ids of the multiplier children of `id`.
    pub fn children_of(&self, id: &str) -> Vec<&str> {
        self.find(id)
            .and_then(|idx| self.get_node(idx))
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|&c| self.get_node(c))
                    .map(HierarchyNode::id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Participant ids of the followers of `id`.
    pub fn followers_of(&self, id: &str) -> Vec<&str> {
        self.find(id)
            .and_then(|idx| self.get_node(idx))
            .map(|node| {
                node.followers
                    .iter()
                    .map(|f| f.participant.id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Participant ids of the roots, in first-seen order.
    pub fn root_ids(&self) -> Vec<&str> {
        self.roots
            .iter()
            .filter_map(|&r| self.get_node(r))
            .map(HierarchyNode::id)
            .collect()
    }

    /// Number of multipliers in the forest.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn follower_count(&self) -> usize {
        self.arena.iter().map(|(_, n)| n.followers.len()).sum()
    }

    pub fn iter(&self) -> ForestIterator<'_> {
        ForestIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Deepest multiplier level; 0 for an empty forest.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(_, node)| node.depth).max().unwrap_or(0)
    }

    /// Multipliers without multiplier children.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.participant.id.clone())
            .collect()
    }

    /// All multipliers and followers below `idx`, excluding the node itself.
    pub fn team_size(&self, idx: Index) -> usize {
        let mut size = 0;
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.get_node(current) {
                size += node.followers.len();
                if current != idx {
                    size += 1;
                }
                stack.extend(node.children.iter().copied());
            }
        }
        size
    }
}

/// Pre-order traversal over all trees, roots in order, children left to right.
pub struct ForestIterator<'a> {
    forest: &'a HierarchyForest,
    stack: Vec<Index>,
}

impl<'a> ForestIterator<'a> {
    fn new(forest: &'a HierarchyForest) -> Self {
        let stack = forest.roots.iter().rev().copied().collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for ForestIterator<'a> {
    type Item = (Index, &'a HierarchyNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                // reverse push keeps left-to-right order
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    forest: &'a HierarchyForest,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(forest: &'a HierarchyForest) -> Self {
        let stack = forest.roots.iter().rev().map(|&r| (r, false)).collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a HierarchyNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

/// Every root-to-leaf multiplier path, as participant ids.
pub fn create_branches(forest: &HierarchyForest) -> Vec<Vec<String>> {
    let mut branches = Vec::new();
    for &root in forest.roots() {
        let mut stack = vec![(root, Vec::new())];
        while let Some((idx, mut path)) = stack.pop() {
            let Some(node) = forest.get_node(idx) else {
                continue;
            };
            path.push(node.participant.id.clone());
            if node.children.is_empty() {
                branches.push(path);
            } else {
                for &child in node.children.iter().rev() {
                    stack.push((child, path.clone()));
                }
            }
        }
    }
    branches
}

/// Conversion into a printable `termtree` rendering.
pub trait TreeNodeConvert {
    fn to_tree_string(&self, root_label: &str) -> Tree<String>;
}

impl TreeNodeConvert for HierarchyForest {
    fn to_tree_string(&self, root_label: &str) -> Tree<String> {
        fn build_tree(forest: &HierarchyForest, node_idx: Index) -> Option<Tree<String>> {
            let node = forest.get_node(node_idx)?;
            let mut tree = Tree::new(format!(
                "{} [team {}]",
                node.participant,
                forest.team_size(node_idx)
            ));
            for &child_idx in &node.children {
                if let Some(child) = build_tree(forest, child_idx) {
                    tree.push(child);
                }
            }
            for follower in &node.followers {
                tree.push(Tree::new(format!("· {}", follower)));
            }
            Some(tree)
        }

        let leaves = self
            .roots()
            .iter()
            .filter_map(|&root| build_tree(self, root))
            .collect::<Vec<_>>();
        Tree::new(root_label.to_string()).with_leaves(leaves)
    }
}
