//! Ear clipping over the merged ring.
//!
//! The clipper walks the ring testing one node per step. A node whose triangle
//! with its neighbours is convex and empty is cut off; otherwise the walk moves
//! on. When a full turn finds nothing the ring is degenerate and the recovery
//! ladder runs: drop a duplicate vertex, else split the ring along a valid
//! diagonal, else clip the current node regardless.
//!
//! Split rings go onto an explicit stack rather than being handled
//! recursively.

use alloc::vec::Vec;

use num_traits::float::Float;
use tracing::{debug, trace, warn};

use crate::arena::{Arena, Node, NodeIndex};
use crate::assemble::{Assembler, Clip};
use crate::geom::{blocks_ear, equals, is_valid_diagonal, orient};
use crate::zorder::{is_ear_indexed, ZOrder};
use crate::Index;

/// Scratch buffers reused across runs.
#[derive(Default)]
pub(crate) struct Work {
    stack: Vec<NodeIndex>,
    order: Vec<NodeIndex>,
}

/// Triangulates the ring through `start` and every ring split off from it.
pub(crate) fn clip<T: Float, N: Index>(
    nodes: &mut Arena<T>,
    start: NodeIndex,
    zorder: Option<&ZOrder<T>>,
    work: &mut Work,
    out: &mut Assembler<'_, N>,
) {
    work.stack.clear();
    work.stack.push(start);
    while let Some(ring) = work.stack.pop() {
        if let Some(zorder) = zorder {
            zorder.link(nodes, ring, &mut work.order);
        }
        clip_ring(nodes, ring, zorder, &mut work.stack, out);
    }
}

fn clip_ring<T: Float, N: Index>(
    nodes: &mut Arena<T>,
    start: NodeIndex,
    zorder: Option<&ZOrder<T>>,
    stack: &mut Vec<NodeIndex>,
    out: &mut Assembler<'_, N>,
) {
    let mut live = nodes.ring_len(start);
    if live < 3 {
        return;
    }

    let mut ear = start;
    let mut stall = 0;
    while live > 3 {
        let Node { prev, next, .. } = nodes[ear];
        let found = match zorder {
            Some(zorder) => is_ear_indexed(nodes, ear, zorder),
            None => is_ear(nodes, ear),
        };
        if found {
            out.emit(nodes, [prev, ear, next], Clip::Ear);
            nodes.remove(ear);
            live -= 1;
            stall = 0;
            ear = next;
            continue;
        }

        ear = next;
        stall += 1;
        if stall < live {
            continue;
        }

        // a full turn without an ear
        stall = 0;
        if let Some(dup) = find_duplicate(nodes, ear) {
            trace!(vertex = nodes[dup].i, "dropping duplicate vertex");
            let (_, next) = nodes.remove(dup);
            out.stats.dropped += 1;
            live -= 1;
            ear = next;
        } else if let Some((a, b)) = find_diagonal(nodes, ear) {
            debug!(from = nodes[a].i, to = nodes[b].i, live, "splitting ring");
            let b2 = nodes.split(a, b);
            out.stats.splits += 1;
            stack.push(a);
            stack.push(b2);
            return;
        } else {
            let Node { prev, next, .. } = nodes[ear];
            warn!(vertex = nodes[ear].i, live, "no ear left, clipping anyway");
            out.emit(nodes, [prev, ear, next], Clip::Forced);
            nodes.remove(ear);
            live -= 1;
            ear = next;
        }
    }

    let Node { prev, next, .. } = nodes[ear];
    let clip = if orient(&nodes[prev], &nodes[ear], &nodes[next]) < T::zero() {
        // an inverted remainder only comes from malformed input
        Clip::Forced
    } else {
        Clip::Ear
    };
    out.emit(nodes, [prev, ear, next], clip);
}

/// Ear test scanning every other live node of the ring.
fn is_ear<T: Float>(nodes: &Arena<T>, ear: NodeIndex) -> bool {
    let b = &nodes[ear];
    let (a, c) = (&nodes[b.prev], &nodes[b.next]);

    if orient(a, b, c) < T::zero() {
        // reflex
        return false;
    }

    let x0 = a.x.min(b.x.min(c.x));
    let y0 = a.y.min(b.y.min(c.y));
    let x1 = a.x.max(b.x.max(c.x));
    let y1 = a.y.max(b.y.max(c.y));

    let mut p = c.next;
    while p != b.prev {
        let n = &nodes[p];
        if n.x >= x0
            && n.x <= x1
            && n.y >= y0
            && n.y <= y1
            && blocks_ear([a, b, c], &nodes[n.prev], n, &nodes[n.next])
        {
            return false;
        }
        p = n.next;
    }
    true
}

/// A node sitting on the same coordinates as its successor.
fn find_duplicate<T: Float>(nodes: &Arena<T>, start: NodeIndex) -> Option<NodeIndex> {
    let mut p = start;
    loop {
        let node = &nodes[p];
        if equals(node, &nodes[node.next]) {
            return Some(p);
        }
        p = node.next;
        if p == start {
            return None;
        }
    }
}

/// The first valid diagonal between two non-adjacent nodes, scanning from `start`.
fn find_diagonal<T: Float>(nodes: &Arena<T>, start: NodeIndex) -> Option<(NodeIndex, NodeIndex)> {
    let mut a = start;
    loop {
        let na = &nodes[a];
        let mut b = nodes[na.next].next;
        while b != na.prev {
            if na.i != nodes[b].i && is_valid_diagonal(nodes, a, b) {
                return Some((a, b));
            }
            b = nodes[b].next;
        }
        a = na.next;
        if a == start {
            return None;
        }
    }
}
