//! Z-order (Morton) index over ring nodes.
//!
//! Each node gets a 32-bit key built from its coordinates quantized to 16 bits
//! inside the input's bounding box. Nodes are threaded in key order through
//! `prev_z`/`next_z`, so every point inside an axis-aligned box lies between
//! the keys of the box's lower-left and upper-right corners.

use alloc::vec::Vec;

use num_traits::float::Float;

use crate::arena::{Arena, NodeIndex};
use crate::geom::{blocks_ear, orient};

const KEY_SCALE: f64 = 65535.0;

/// Maps coordinates onto the z-order curve of one input's bounding box.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ZOrder<T: Float> {
    min_x: T,
    min_y: T,
    inv_size: T,
}

impl<T: Float> ZOrder<T> {
    /// Returns `None` when the input is small enough to scan directly or its
    /// bounding box has no extent.
    pub(crate) fn new(data: &[[T; 2]], threshold: usize) -> Option<Self> {
        if data.len() <= threshold {
            return None;
        }
        let (&first, rest) = data.split_first()?;
        let ([min_x, min_y], [max_x, max_y]) =
            rest.iter()
                .fold((first, first), |([x0, y0], [x1, y1]), &[x, y]| {
                    ([x0.min(x), y0.min(y)], [x1.max(x), y1.max(y)])
                });
        let size = (max_x - min_x).max(max_y - min_y);
        if size == T::zero() {
            return None;
        }
        Some(Self {
            min_x,
            min_y,
            inv_size: T::from(KEY_SCALE)? / size,
        })
    }

    pub(crate) fn key(&self, x: T, y: T) -> u32 {
        let scale = |v: T| v.to_u32().unwrap_or(0).min(0xFFFF);
        let qx = scale((x - self.min_x) * self.inv_size);
        let qy = scale((y - self.min_y) * self.inv_size);
        spread(qx) | (spread(qy) << 1)
    }

    /// Assigns keys to every node of the ring through `start` and links them
    /// in key order. Nodes off the ring are left out of the list.
    pub(crate) fn link(&self, nodes: &mut Arena<T>, start: NodeIndex, order: &mut Vec<NodeIndex>) {
        order.clear();
        let mut p = start;
        loop {
            let node = &mut nodes[p];
            node.z = self.key(node.x, node.y);
            order.push(p);
            p = node.next;
            if p == start {
                break;
            }
        }

        order.sort_unstable_by_key(|&p| (nodes[p].z, p));

        let mut prev: Option<NodeIndex> = None;
        for &p in order.iter() {
            nodes[p].prev_z = prev;
            nodes[p].next_z = None;
            if let Some(prev) = prev {
                nodes[prev].next_z = Some(p);
            }
            prev = Some(p);
        }
    }
}

/// Moves the low 16 bits of `v` to the even bit positions.
fn spread(v: u32) -> u32 {
    let mut v = v & 0x0000_FFFF;
    v = (v | (v << 8)) & 0x00FF_00FF;
    v = (v | (v << 4)) & 0x0F0F_0F0F;
    v = (v | (v << 2)) & 0x3333_3333;
    (v | (v << 1)) & 0x5555_5555
}

/// Ear test that only visits nodes whose key falls in the ear's bounding box.
pub(crate) fn is_ear_indexed<T: Float>(nodes: &Arena<T>, ear: NodeIndex, zorder: &ZOrder<T>) -> bool {
    let b = &nodes[ear];
    let (a_i, c_i) = (b.prev, b.next);
    let (a, c) = (&nodes[a_i], &nodes[c_i]);

    if orient(a, b, c) < T::zero() {
        return false;
    }

    let x0 = a.x.min(b.x.min(c.x));
    let y0 = a.y.min(b.y.min(c.y));
    let x1 = a.x.max(b.x.max(c.x));
    let y1 = a.y.max(b.y.max(c.y));
    let min_z = zorder.key(x0, y0);
    let max_z = zorder.key(x1, y1);

    let blocks = |p: NodeIndex| {
        let n = &nodes[p];
        p != a_i
            && p != c_i
            && n.x >= x0
            && n.x <= x1
            && n.y >= y0
            && n.y <= y1
            && blocks_ear([a, b, c], &nodes[n.prev], n, &nodes[n.next])
    };

    // walk down and up from the ear at the same time so a blocker close to it
    // is found early
    let mut down = b.prev_z.filter(|&p| nodes[p].z >= min_z);
    let mut up = b.next_z.filter(|&p| nodes[p].z <= max_z);
    while down.is_some() || up.is_some() {
        if let Some(p) = down {
            if blocks(p) {
                return false;
            }
            down = nodes[p].prev_z.filter(|&p| nodes[p].z >= min_z);
        }
        if let Some(p) = up {
            if blocks(p) {
                return false;
            }
            up = nodes[p].next_z.filter(|&p| nodes[p].z <= max_z);
        }
    }
    true
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn spread_interleaves() {
        assert_eq!(spread(0), 0);
        assert_eq!(spread(1), 1);
        assert_eq!(spread(0b11), 0b101);
        assert_eq!(spread(0xFFFF), 0x5555_5555);
    }

    #[test]
    fn small_inputs_skip_the_index() {
        let data = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];
        assert!(ZOrder::new(&data, 80).is_none());
        assert!(ZOrder::new(&data, 2).is_some());
        let flat = [[3.0, 3.0]; 4];
        assert!(ZOrder::new(&flat, 0).is_none());
    }

    #[test]
    fn keys_are_monotonic_per_axis() {
        let data = [[0.0, 0.0], [100.0, 50.0]];
        let z = ZOrder::new(&data, 0).unwrap();
        assert_eq!(z.key(0.0, 0.0), 0);
        assert_eq!(z.key(100.0, 100.0), u32::MAX);
        assert!(z.key(10.0, 10.0) < z.key(20.0, 10.0));
        assert!(z.key(10.0, 10.0) < z.key(10.0, 20.0));
        // corners bound everything inside the box
        let (lo, hi) = (z.key(10.0, 10.0), z.key(30.0, 40.0));
        for (x, y) in [(10.0, 40.0), (30.0, 10.0), (20.0, 25.0)] {
            let k = z.key(x, y);
            assert!(lo <= k && k <= hi);
        }
    }

    #[test]
    fn link_sorts_the_ring() {
        let data = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [5.0, 5.0]];
        let z = ZOrder::new(&data, 0).unwrap();
        let mut nodes = Arena::new();
        let mut last = None;
        for (i, &[x, y]) in data.iter().enumerate() {
            last = Some(nodes.insert(i as u32, x, y, last));
        }
        let mut order = Vec::new();
        z.link(&mut nodes, last.unwrap(), &mut order);

        // walk from the smallest key
        let mut p = order[0];
        assert_eq!(nodes[p].prev_z, None);
        let mut seen = 1;
        while let Some(next) = nodes[p].next_z {
            assert!(nodes[p].z <= nodes[next].z);
            assert_eq!(nodes[next].prev_z, Some(p));
            p = next;
            seen += 1;
        }
        assert_eq!(seen, 5);
        assert_eq!(nodes[order[0]].i, 0);
        assert_eq!(nodes[order[4]].i, 2);
    }

    #[test]
    fn indexed_ear_test_sees_blockers() {
        // counter-clockwise square with a reflex dent reaching into the ear at 0
        let data = [
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [2.0, 2.0],
            [0.0, 10.0],
        ];
        let z = ZOrder::new(&data, 0).unwrap();
        let mut nodes = Arena::new();
        let mut last = None;
        for (i, &[x, y]) in data.iter().enumerate() {
            last = Some(nodes.insert(i as u32, x, y, last));
        }
        let mut order = Vec::new();
        z.link(&mut nodes, last.unwrap(), &mut order);

        // (4, 0, 1) contains the dent at (2, 2)
        assert!(!is_ear_indexed(&nodes, 0, &z));
        // (0, 1, 2) has the dent on its diagonal
        assert!(!is_ear_indexed(&nodes, 1, &z));
        // (1, 2, 3) and (3, 4, 0) are empty
        assert!(is_ear_indexed(&nodes, 2, &z));
        assert!(is_ear_indexed(&nodes, 4, &z));
        // the dent itself is reflex
        assert!(!is_ear_indexed(&nodes, 3, &z));
    }
}
