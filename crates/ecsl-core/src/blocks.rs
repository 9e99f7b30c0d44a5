use crate::ast::Node;
use std::collections::HashMap;

/// Named node sequences captured by `block_finish` and spliced by `block`.
///
/// One store lives for exactly one top-level parse and is visible to every
/// nesting level within it.
#[derive(Debug, Default)]
pub struct BlockStore {
    blocks: HashMap<String, Block>,
}

/// A captured node run and the total node count of its subtrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub nodes: Vec<Node>,
    pub node_count: usize,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `nodes` under `label`, replacing any earlier capture.
    pub fn capture(&mut self, label: impl Into<String>, nodes: Vec<Node>) {
        let node_count = nodes.iter().map(Node::subtree_len).sum();
        self.blocks.insert(label.into(), Block { nodes, node_count });
    }

    pub fn get(&self, label: &str) -> Option<&Block> {
        self.blocks.get(label)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Split a section's accumulated nodes at a `block_start` offset.
///
/// The captured run is `nodes[..=offset]` and the live section keeps
/// `nodes[..offset]`; both ends are clamped to the section length.
pub fn split_block(nodes: &[Node], offset: usize) -> (Vec<Node>, Vec<Node>) {
    let captured_end = offset.saturating_add(1).min(nodes.len());
    let kept_end = offset.min(nodes.len());
    (nodes[..captured_end].to_vec(), nodes[..kept_end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    fn section(names: &[&str]) -> Vec<Node> {
        names.iter().map(|n| Node::new(*n)).collect()
    }

    #[test]
    fn test_split_includes_boundary_node() {
        let nodes = section(&["p", "q", "r", "s", "t"]);
        let (captured, kept) = split_block(&nodes, 4);
        assert_eq!(names(&captured), vec!["p", "q", "r", "s", "t"]);
        assert_eq!(names(&kept), vec!["p", "q", "r", "s"]);
    }

    #[test]
    fn test_split_mid_section() {
        let nodes = section(&["x", "y", "z", "w"]);
        let (captured, kept) = split_block(&nodes, 2);
        assert_eq!(names(&captured), vec!["x", "y", "z"]);
        assert_eq!(names(&kept), vec!["x", "y"]);
    }

    #[test]
    fn test_split_offset_past_end_is_clamped() {
        let nodes = section(&["x", "y"]);
        let (captured, kept) = split_block(&nodes, 2);
        assert_eq!(names(&captured), vec!["x", "y"]);
        assert_eq!(names(&kept), vec!["x", "y"]);
    }

    #[test]
    fn test_store_reuse_does_not_consume() {
        let mut store = BlockStore::new();
        store.capture("m", section(&["a", "b"]));
        assert_eq!(names(&store.get("m").unwrap().nodes), vec!["a", "b"]);
        assert_eq!(names(&store.get("m").unwrap().nodes), vec!["a", "b"]);
        assert!(store.get("other").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_capture_counts_nested_nodes() {
        let mut parent = Node::new("p");
        parent
            .sections
            .insert(crate::ast::SectionLabel::Default, section(&["q", "r"]));
        let mut store = BlockStore::new();
        store.capture("m", vec![parent, Node::new("s")]);
        assert_eq!(store.get("m").unwrap().node_count, 4);
    }
}
