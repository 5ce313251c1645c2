//! Document-order union of node streams.

use crate::index::types::DbNode;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Lazy, single-pass stream of nodes in document order
pub type NodeIter = Box<dyn Iterator<Item = DbNode>>;

/// Merges document-ordered streams into one document-ordered stream
/// without duplicates. Zero inputs give an empty stream; a single input is
/// returned as is.
pub fn union(mut iters: Vec<NodeIter>) -> NodeIter {
    match iters.len() {
        0 => Box::new(std::iter::empty()),
        1 => iters.pop().unwrap_or_else(|| Box::new(std::iter::empty())),
        _ => Box::new(Union::new(iters)),
    }
}

/// k-way merge over a min-heap keyed by the head node of each input
struct Union {
    iters: Vec<NodeIter>,
    heap: Option<BinaryHeap<Reverse<(DbNode, usize)>>>,
    last: Option<DbNode>,
}

impl Union {
    fn new(iters: Vec<NodeIter>) -> Self {
        Self {
            iters,
            heap: None,
            last: None,
        }
    }

    fn init(&mut self) -> BinaryHeap<Reverse<(DbNode, usize)>> {
        let mut heap = BinaryHeap::with_capacity(self.iters.len());
        for (i, iter) in self.iters.iter_mut().enumerate() {
            if let Some(node) = iter.next() {
                heap.push(Reverse((node, i)));
            }
        }
        heap
    }
}

impl Iterator for Union {
    type Item = DbNode;

    fn next(&mut self) -> Option<DbNode> {
        // Inputs are only touched once the first node is requested
        if self.heap.is_none() {
            self.heap = Some(self.init());
        }
        let heap = self.heap.as_mut()?;
        while let Some(Reverse((node, i))) = heap.pop() {
            if let Some(next) = self.iters[i].next() {
                heap.push(Reverse((next, i)));
            }
            if self.last != Some(node) {
                self.last = Some(node);
                return Some(node);
            }
        }
        None
    }
}
