use std::sync::Mutex;

/// The position of a node in a tree's node arena
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature="serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn get(self) -> usize {
        let Self(index) = self;
        index
    }
}

/// Node storage shared by concurrent build tasks
///
/// The lock is held only while a node is pushed, never across recursion, so contention is bounded by the
/// number of tasks rather than the number of nodes.
#[derive(Debug)]
pub(crate) struct NodeArena<Node> {
    nodes: Mutex<Vec<Node>>
}

impl<Node> NodeArena<Node> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self{nodes: Mutex::new(Vec::with_capacity(capacity))}
    }

    pub(crate) fn allocate(&self, node: Node) -> NodeIndex {
        let mut nodes = self.nodes.lock().expect("node arena lock poisoned");
        nodes.push(node);
        NodeIndex(nodes.len() - 1)
    }

    pub(crate) fn into_nodes(self) -> Vec<Node> {
        self.nodes.into_inner().expect("node arena lock poisoned")
    }
}
