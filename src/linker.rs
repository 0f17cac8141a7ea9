//! Builds the single ring the clipper works on.
//!
//! The outer boundary is linked counter-clockwise and every hole clockwise.
//! Holes are then spliced in from left to right, each through a bridge to a
//! vertex of the ring built so far that can see the hole's leftmost vertex.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::ops::Range;

use num_traits::float::Float;
use tracing::{debug, warn};

use crate::arena::{Arena, NodeIndex};
use crate::geom::{equals, is_straight, locally_inside, orient, point_in_triangle, signed_area};

/// Which vertices a cleanup pass may drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Cleanup {
    /// Coordinate duplicates of the following vertex.
    Duplicates,
    /// Duplicates, plus vertices strictly between two collinear neighbours.
    Straight,
}

impl Cleanup {
    fn is_redundant<T: Float>(self, nodes: &Arena<T>, p: NodeIndex) -> bool {
        let node = &nodes[p];
        let next = &nodes[node.next];
        equals(node, next)
            || (self == Cleanup::Straight && is_straight(&nodes[node.prev], node, next))
    }
}

/// Outcome of linking one polygon.
pub(crate) struct Linked {
    pub(crate) start: NodeIndex,
    pub(crate) merged_holes: usize,
    pub(crate) skipped_holes: usize,
}

/// Links the outer ring and every hole into one ring.
///
/// Returns `None` when the outer ring has fewer than three distinct vertices.
pub(crate) fn link<T: Float>(
    nodes: &mut Arena<T>,
    data: &[[T; 2]],
    outer: Range<usize>,
    holes: impl Iterator<Item = Range<usize>>,
    queue: &mut Vec<NodeIndex>,
    cleanup: Cleanup,
) -> Option<Linked> {
    let mut start = link_ring(nodes, data, outer, true, cleanup)?;
    if nodes.ring_len(start) < 3 {
        return None;
    }

    let mut skipped_holes = 0;
    queue.clear();
    for range in holes {
        let ring = link_ring(nodes, data, range.clone(), false, cleanup);
        match ring {
            Some(ring) if nodes.ring_len(ring) >= 3 => queue.push(leftmost(nodes, ring)),
            _ => {
                debug!(start = range.start, end = range.end, "skipping degenerate hole");
                skipped_holes += 1;
            }
        }
    }

    queue.sort_unstable_by(|&a, &b| {
        let (a, b) = (&nodes[a], &nodes[b]);
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then(a.i.cmp(&b.i))
    });

    let mut merged_holes = 0;
    for &hole in queue.iter() {
        match eliminate_hole(nodes, hole, start, cleanup) {
            Some(merged) => {
                start = merged;
                merged_holes += 1;
            }
            None => {
                warn!(vertex = nodes[hole].i, "no bridge to hole, leaving it out");
                skipped_holes += 1;
            }
        }
    }

    Some(Linked {
        start,
        merged_holes,
        skipped_holes,
    })
}

/// Creates a ring from `data[range]` with the requested winding and drops
/// redundant vertices. Returns `None` for an empty range.
fn link_ring<T: Float>(
    nodes: &mut Arena<T>,
    data: &[[T; 2]],
    range: Range<usize>,
    counter_clockwise: bool,
    cleanup: Cleanup,
) -> Option<NodeIndex> {
    let forward = counter_clockwise == (signed_area(data, range.start, range.end) > T::zero());
    let mut last = None;
    let mut push = |i: usize| {
        let [x, y] = data[i];
        last = Some(nodes.insert(i as u32, x, y, last));
    };
    if forward {
        range.for_each(&mut push);
    } else {
        range.rev().for_each(&mut push);
    }
    last.map(|last| filter_ring(nodes, last, None, cleanup))
}

/// Drops redundant vertices from the ring, walking from `start` until `end`
/// (a full turn when `end` is `None`). Returns a node still on the ring.
pub(crate) fn filter_ring<T: Float>(
    nodes: &mut Arena<T>,
    start: NodeIndex,
    end: Option<NodeIndex>,
    cleanup: Cleanup,
) -> NodeIndex {
    let mut end = end.unwrap_or(start);
    let mut p = start;
    loop {
        let next = nodes[p].next;
        if next == p {
            return p;
        }
        if cleanup.is_redundant(nodes, p) {
            let (prev, next) = nodes.remove(p);
            p = prev;
            end = prev;
            if p == next {
                return p;
            }
        } else {
            p = next;
            if p == end {
                return end;
            }
        }
    }
}

/// The vertex with the smallest x, then the smallest y.
fn leftmost<T: Float>(nodes: &Arena<T>, start: NodeIndex) -> NodeIndex {
    let mut best = start;
    let mut p = nodes[start].next;
    while p != start {
        let (node, b) = (&nodes[p], &nodes[best]);
        if node.x < b.x || (node.x == b.x && node.y < b.y) {
            best = p;
        }
        p = node.next;
    }
    best
}

/// Bridges `hole` into the ring through `outer`. Returns a node on the merged
/// ring, or `None` if no vertex of the ring can see the hole.
fn eliminate_hole<T: Float>(
    nodes: &mut Arena<T>,
    hole: NodeIndex,
    outer: NodeIndex,
    cleanup: Cleanup,
) -> Option<NodeIndex> {
    let bridge = find_bridge(nodes, hole, outer)?;
    let hole_dup = nodes.split(bridge, hole);

    // zero-length bridges leave duplicates at the cuts
    let end = nodes[hole_dup].next;
    filter_ring(nodes, hole_dup, Some(end), cleanup);
    let end = nodes[bridge].next;
    Some(filter_ring(nodes, bridge, Some(end), cleanup))
}

/// David Eberly's visibility search for the vertex to bridge a hole to.
fn find_bridge<T: Float>(nodes: &Arena<T>, hole: NodeIndex, outer: NodeIndex) -> Option<NodeIndex> {
    let (hx, hy) = (nodes[hole].x, nodes[hole].y);

    // cast a ray from the hole to the left and keep the nearest edge it hits;
    // that edge's endpoint with the smaller x is the first candidate
    let mut qx = T::neg_infinity();
    let mut candidate = None;
    let mut p = outer;
    loop {
        let node = &nodes[p];
        let next = &nodes[node.next];
        if hy <= node.y && hy >= next.y && next.y != node.y {
            let x = node.x + (hy - node.y) * (next.x - node.x) / (next.y - node.y);
            if x <= hx && x > qx {
                qx = x;
                let m = if node.x < next.x { p } else { node.next };
                if x == hx {
                    // the hole touches this edge
                    return Some(m);
                }
                candidate = Some(m);
            }
        }
        p = node.next;
        if p == outer {
            break;
        }
    }

    // vertices inside the triangle (hole, ray hit, candidate) would block the
    // bridge; the one closest in angle to the ray is visible instead
    let mut m = candidate?;
    let (mx, my) = (nodes[m].x, nodes[m].y);
    let stop = m;
    let mut tan_min = T::infinity();
    let mut p = m;
    loop {
        let node = &nodes[p];
        if hx >= node.x && node.x >= mx && hx != node.x {
            let inside = if hy < my {
                point_in_triangle(hx, hy, mx, my, qx, hy, node.x, node.y)
            } else {
                point_in_triangle(qx, hy, mx, my, hx, hy, node.x, node.y)
            };
            if inside && locally_inside(nodes, p, hole) {
                let tan = (hy - node.y).abs() / (hx - node.x);
                let best = &nodes[m];
                if tan < tan_min
                    || (tan == tan_min
                        && (node.x > best.x
                            || (node.x == best.x && sector_contains_sector(nodes, m, p))))
                {
                    m = p;
                    tan_min = tan;
                }
            }
        }
        p = node.next;
        if p == stop {
            return Some(m);
        }
    }
}

/// Whether the sector at `m` contains the sector at `p`, both at the same position.
fn sector_contains_sector<T: Float>(nodes: &Arena<T>, m: NodeIndex, p: NodeIndex) -> bool {
    let (nm, np) = (&nodes[m], &nodes[p]);
    orient(&nodes[nm.prev], nm, &nodes[np.prev]) > T::zero()
        && orient(&nodes[np.next], nm, &nodes[nm.next]) > T::zero()
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::vec;

    fn indices(nodes: &Arena<f64>, start: NodeIndex) -> Vec<u32> {
        let mut out = vec![nodes[start].i];
        let mut p = nodes[start].next;
        while p != start {
            out.push(nodes[p].i);
            p = nodes[p].next;
        }
        out
    }

    fn link_all(data: &[[f64; 2]], holes: &[usize]) -> (Arena<f64>, Option<Linked>) {
        let mut nodes = Arena::new();
        let mut queue = Vec::new();
        let outer_end = holes.first().copied().unwrap_or(data.len());
        let ranges = holes.iter().enumerate().map(|(k, &s)| {
            let e = holes.get(k + 1).copied().unwrap_or(data.len());
            s..e
        });
        let linked = link(
            &mut nodes,
            data,
            0..outer_end,
            ranges,
            &mut queue,
            Cleanup::Duplicates,
        );
        (nodes, linked)
    }

    #[test]
    fn clockwise_outer_is_reversed() {
        let data = [[0., 0.], [0., 1.], [1., 1.], [1., 0.]];
        let (nodes, linked) = link_all(&data, &[]);
        let start = linked.unwrap().start;
        let mut ring = indices(&nodes, start);
        let first = ring.iter().position(|&i| i == 0).unwrap();
        ring.rotate_left(first);
        assert_eq!(ring, vec![0, 3, 2, 1]);
    }

    #[test]
    fn duplicates_are_dropped() {
        let data = [[0., 0.], [1., 0.], [1., 0.], [1., 1.], [0., 0.]];
        let (nodes, linked) = link_all(&data, &[]);
        assert_eq!(nodes.ring_len(linked.unwrap().start), 3);
    }

    #[test]
    fn collapsed_outer_ring() {
        let data = [[0., 0.], [1., 1.], [1., 1.]];
        let (_, linked) = link_all(&data, &[]);
        assert!(linked.is_none());
    }

    #[test]
    fn hole_is_bridged_to_the_left() {
        let data = [
            [0., 0.],
            [10., 0.],
            [10., 10.],
            [0., 10.],
            [4., 4.],
            [6., 4.],
            [6., 6.],
            [4., 6.],
        ];
        let (nodes, linked) = link_all(&data, &[4]);
        let linked = linked.unwrap();
        assert_eq!(linked.merged_holes, 1);
        assert_eq!(linked.skipped_holes, 0);
        assert_eq!(nodes.ring_len(linked.start), 10);

        let ring = indices(&nodes, linked.start);
        // the hole's leftmost-lowest vertex is 4 and it is entered twice
        assert_eq!(ring.iter().filter(|&&i| i == 4).count(), 2);
        // holes are walked clockwise: 4 -> 7 -> 6 -> 5
        let at = ring.iter().position(|&i| i == 4).unwrap();
        let mut walk = ring.clone();
        walk.rotate_left(at);
        assert_eq!(&walk[..5], &[4, 7, 6, 5, 4]);
        // and bridged to the left edge
        assert!(walk[5] == 0 || walk[5] == 3);
    }

    #[test]
    fn holes_are_merged_left_to_right() {
        let data = [
            [0., 0.],
            [20., 0.],
            [20., 10.],
            [0., 10.],
            // right hole first in the input
            [12., 4.],
            [14., 4.],
            [14., 6.],
            [12., 6.],
            [2., 4.],
            [4., 4.],
            [4., 6.],
            [2., 6.],
        ];
        let (nodes, linked) = link_all(&data, &[4, 8]);
        let linked = linked.unwrap();
        assert_eq!(linked.merged_holes, 2);
        assert_eq!(nodes.ring_len(linked.start), 16);
    }

    #[test]
    fn hole_outside_is_skipped() {
        let data = [
            [0., 0.],
            [4., 0.],
            [4., 4.],
            [0., 4.],
            [-6., 1.],
            [-5., 1.],
            [-5., 2.],
        ];
        let (nodes, linked) = link_all(&data, &[4]);
        let linked = linked.unwrap();
        assert_eq!(linked.skipped_holes, 1);
        assert_eq!(nodes.ring_len(linked.start), 4);
    }

    #[test]
    fn degenerate_hole_is_skipped() {
        let data = [[0., 0.], [4., 0.], [4., 4.], [1., 1.], [2., 1.]];
        let (nodes, linked) = link_all(&data, &[3]);
        let linked = linked.unwrap();
        assert_eq!(linked.skipped_holes, 1);
        assert_eq!(nodes.ring_len(linked.start), 3);
    }

    #[test]
    fn straight_cleanup_keeps_corners() {
        let mut nodes = Arena::new();
        let mut last = None;
        for (i, &[x, y]) in [[0., 0.], [1., 0.], [2., 0.], [2., 2.], [0., 2.]]
            .iter()
            .enumerate()
        {
            last = Some(nodes.insert(i as u32, x, y, last));
        }
        let start = filter_ring(&mut nodes, last.unwrap(), None, Cleanup::Straight);
        let mut ring = indices(&nodes, start);
        ring.sort();
        assert_eq!(ring, vec![0, 2, 3, 4]);
    }
}
