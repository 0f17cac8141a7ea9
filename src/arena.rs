//! Node storage shared by every phase of a triangulation run.
//!
//! Nodes live in one `Vec` and refer to each other by `u32` position. A node is
//! never freed during a run: removing it only splices it out of the ring and
//! z-order adjacencies, so stale indices held by the caller stay valid.

use alloc::vec::Vec;
use core::ops::{Index, IndexMut};
use num_traits::float::Float;

pub(crate) type NodeIndex = u32;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Node<T: Float> {
    /// vertex index in the input coordinates
    pub(crate) i: u32,
    /// z-order curve value
    pub(crate) z: u32,
    pub(crate) x: T,
    pub(crate) y: T,
    /// previous node in the ring
    pub(crate) prev: NodeIndex,
    /// next node in the ring
    pub(crate) next: NodeIndex,
    /// previous node in z-order
    pub(crate) prev_z: Option<NodeIndex>,
    /// next node in z-order
    pub(crate) next_z: Option<NodeIndex>,
}

impl<T: Float> Node<T> {
    fn new(i: u32, x: T, y: T, at: NodeIndex) -> Self {
        Self {
            i,
            z: 0,
            x,
            y,
            prev: at,
            next: at,
            prev_z: None,
            next_z: None,
        }
    }
}

pub(crate) struct Arena<T: Float> {
    nodes: Vec<Node<T>>,
}

impl<T: Float> Index<NodeIndex> for Arena<T> {
    type Output = Node<T>;

    #[inline]
    fn index(&self, index: NodeIndex) -> &Node<T> {
        &self.nodes[index as usize]
    }
}

impl<T: Float> IndexMut<NodeIndex> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, index: NodeIndex) -> &mut Node<T> {
        &mut self.nodes[index as usize]
    }
}

impl<T: Float> Arena<T> {
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub(crate) fn reset(&mut self, capacity: usize) {
        self.nodes.clear();
        self.nodes.reserve(capacity);
    }

    fn next_index(&self) -> NodeIndex {
        self.nodes.len() as NodeIndex
    }

    /// Creates a node for input vertex `i` and links it right after `last`,
    /// or as a ring of one when `last` is `None`.
    pub(crate) fn insert(&mut self, i: u32, x: T, y: T, last: Option<NodeIndex>) -> NodeIndex {
        let at = self.next_index();
        let mut node = Node::new(i, x, y, at);
        if let Some(last) = last {
            let after = self[last].next;
            node.prev = last;
            node.next = after;
            self[last].next = at;
            self[after].prev = at;
        }
        self.nodes.push(node);
        at
    }

    /// Splices `p` out of both adjacencies and returns its former ring neighbours.
    pub(crate) fn remove(&mut self, p: NodeIndex) -> (NodeIndex, NodeIndex) {
        let Node {
            prev,
            next,
            prev_z,
            next_z,
            ..
        } = self[p];

        self[next].prev = prev;
        self[prev].next = next;

        if let Some(pz) = prev_z {
            self[pz].next_z = next_z;
        }
        if let Some(nz) = next_z {
            self[nz].prev_z = prev_z;
        }
        let removed = &mut self[p];
        removed.prev_z = None;
        removed.next_z = None;

        (prev, next)
    }

    /// Connects `a` and `b` with a bridge pair.
    ///
    /// If both belong to the same ring the ring is split in two: one continues
    /// from `a` straight to `b`, the other runs through the duplicates. If `b`
    /// belongs to another ring (a hole) the two rings become one. Returns the
    /// duplicate of `b`.
    pub(crate) fn split(&mut self, a: NodeIndex, b: NodeIndex) -> NodeIndex {
        let a2 = self.next_index();
        let b2 = a2 + 1;
        let after_a = self[a].next;
        let before_b = self[b].prev;

        let mut a_dup = Node::new(self[a].i, self[a].x, self[a].y, a2);
        a_dup.z = self[a].z;
        a_dup.prev = b2;
        a_dup.next = after_a;

        let mut b_dup = Node::new(self[b].i, self[b].x, self[b].y, b2);
        b_dup.z = self[b].z;
        b_dup.prev = before_b;
        b_dup.next = a2;

        self[a].next = b;
        self[b].prev = a;
        self[after_a].prev = a2;
        self[before_b].next = b2;

        self.nodes.extend([a_dup, b_dup]);
        b2
    }

    /// Number of live nodes on the ring through `start`.
    pub(crate) fn ring_len(&self, start: NodeIndex) -> usize {
        let mut len = 1;
        let mut p = self[start].next;
        while p != start {
            len += 1;
            p = self[p].next;
        }
        len
    }
}
