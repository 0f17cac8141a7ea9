//! Orientation predicates and ring queries.
//!
//! Everything here assumes a y-up plane where counter-clockwise turns have a
//! positive orientation. The outer ring is kept counter-clockwise, so the
//! polygon interior is always to the left of an edge.

use num_traits::float::Float;

use crate::arena::{Arena, Node, NodeIndex};

/// Twice the signed area of the ring stored in `data[start..end]`, positive when
/// the ring runs counter-clockwise.
pub(crate) fn signed_area<T: Float>(data: &[[T; 2]], start: usize, end: usize) -> T {
    let ring = &data[start..end];
    let Some(&[mut px, mut py]) = ring.last() else {
        return T::zero();
    };
    ring.iter().fold(T::zero(), |sum, &[x, y]| {
        let term = px * y - x * py;
        (px, py) = (x, y);
        sum + term
    })
}

/// Twice the signed area of triangle `p, q, r`.
#[inline]
pub(crate) fn orient<T: Float>(p: &Node<T>, q: &Node<T>, r: &Node<T>) -> T {
    (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
}

#[inline]
pub(crate) fn equals<T: Float>(p: &Node<T>, q: &Node<T>) -> bool {
    p.x == q.x && p.y == q.y
}

/// Whether `p` lies in the open interior of the counter-clockwise triangle `a, b, c`.
#[inline]
pub(crate) fn strictly_inside<T: Float>(a: &Node<T>, b: &Node<T>, c: &Node<T>, p: &Node<T>) -> bool {
    orient(a, b, p) > T::zero() && orient(b, c, p) > T::zero() && orient(c, a, p) > T::zero()
}

/// Closed point-in-triangle test on raw coordinates, for counter-clockwise `a, b, c`.
#[allow(clippy::too_many_arguments)]
#[inline]
pub(crate) fn point_in_triangle<T: Float>(
    ax: T,
    ay: T,
    bx: T,
    by: T,
    cx: T,
    cy: T,
    px: T,
    py: T,
) -> bool {
    (bx - ax) * (py - ay) >= (by - ay) * (px - ax)
        && (cx - bx) * (py - by) >= (cy - by) * (px - bx)
        && (ax - cx) * (py - cy) >= (ay - cy) * (px - cx)
}

/// Whether `p`, with ring neighbours `prev` and `next`, keeps `a, b, c` from
/// being clipped. A vertex strictly inside always does. One on the triangle's
/// boundary does only when its own corner is reflex or straight, since ring
/// edges then leave it into the triangle.
#[inline]
pub(crate) fn blocks_ear<T: Float>(
    [a, b, c]: [&Node<T>; 3],
    prev: &Node<T>,
    p: &Node<T>,
    next: &Node<T>,
) -> bool {
    strictly_inside(a, b, c, p)
        || (point_in_triangle(a.x, a.y, b.x, b.y, c.x, c.y, p.x, p.y)
            && orient(prev, p, next) <= T::zero())
}

/// Removing `p` would not change the covered region: it sits strictly between
/// two collinear neighbours.
pub(crate) fn is_straight<T: Float>(prev: &Node<T>, p: &Node<T>, next: &Node<T>) -> bool {
    orient(prev, p, next) == T::zero()
        && (prev.x - p.x) * (next.x - p.x) + (prev.y - p.y) * (next.y - p.y) < T::zero()
}

fn sign<T: Float>(v: T) -> i8 {
    (v > T::zero()) as i8 - (v < T::zero()) as i8
}

/// For collinear `p, q, r`, whether `q` lies on segment `pr`.
fn on_segment<T: Float>(p: &Node<T>, q: &Node<T>, r: &Node<T>) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Whether segments `p1 q1` and `p2 q2` intersect, touching included.
pub(crate) fn intersects<T: Float>(p1: &Node<T>, q1: &Node<T>, p2: &Node<T>, q2: &Node<T>) -> bool {
    let o1 = sign(orient(p1, q1, p2));
    let o2 = sign(orient(p1, q1, q2));
    let o3 = sign(orient(p2, q2, p1));
    let o4 = sign(orient(p2, q2, q1));

    (o1 != o2 && o3 != o4)
        || (o1 == 0 && on_segment(p1, p2, q1))
        || (o2 == 0 && on_segment(p1, q2, q1))
        || (o3 == 0 && on_segment(p2, p1, q2))
        || (o4 == 0 && on_segment(p2, q1, q2))
}

/// Whether segment `a b` crosses an edge of the ring through `a` that does not
/// share an input vertex with it.
pub(crate) fn intersects_ring<T: Float>(nodes: &Arena<T>, a: NodeIndex, b: NodeIndex) -> bool {
    let (na, nb) = (&nodes[a], &nodes[b]);
    let mut p = a;
    loop {
        let (node, next) = (&nodes[p], &nodes[nodes[p].next]);
        if node.i != na.i
            && node.i != nb.i
            && next.i != na.i
            && next.i != nb.i
            && intersects(node, next, na, nb)
        {
            return true;
        }
        p = node.next;
        if p == a {
            return false;
        }
    }
}

/// Whether the segment from `a` towards `b` starts into the ring's interior.
pub(crate) fn locally_inside<T: Float>(nodes: &Arena<T>, a: NodeIndex, b: NodeIndex) -> bool {
    let na = &nodes[a];
    let (prev, next, nb) = (&nodes[na.prev], &nodes[na.next], &nodes[b]);
    if orient(prev, na, next) > T::zero() {
        orient(na, nb, next) <= T::zero() && orient(na, prev, nb) <= T::zero()
    } else {
        orient(na, nb, prev) > T::zero() || orient(na, next, nb) > T::zero()
    }
}

/// Even-odd test of the midpoint of `a b` against the ring through `a`.
pub(crate) fn middle_inside<T: Float>(nodes: &Arena<T>, a: NodeIndex, b: NodeIndex) -> bool {
    let two = T::one() + T::one();
    let (px, py) = (
        (nodes[a].x + nodes[b].x) / two,
        (nodes[a].y + nodes[b].y) / two,
    );
    let mut inside = false;
    let mut p = a;
    loop {
        let (node, next) = (&nodes[p], &nodes[nodes[p].next]);
        if (node.y > py) != (next.y > py)
            && next.y != node.y
            && px < (next.x - node.x) * (py - node.y) / (next.y - node.y) + node.x
        {
            inside = !inside;
        }
        p = node.next;
        if p == a {
            return inside;
        }
    }
}

/// Whether `a b` is a diagonal that splits the ring into two valid rings.
pub(crate) fn is_valid_diagonal<T: Float>(nodes: &Arena<T>, a: NodeIndex, b: NodeIndex) -> bool {
    let (na, nb) = (&nodes[a], &nodes[b]);
    let (a_prev, a_next) = (&nodes[na.prev], &nodes[na.next]);
    let (b_prev, b_next) = (&nodes[nb.prev], &nodes[nb.next]);

    if a_next.i == nb.i || a_prev.i == nb.i || intersects_ring(nodes, a, b) {
        return false;
    }

    let visible = locally_inside(nodes, a, b)
        && locally_inside(nodes, b, a)
        && middle_inside(nodes, a, b)
        // no opposite-facing sectors
        && (orient(a_prev, na, b_prev) != T::zero() || orient(na, b_prev, nb) != T::zero());

    // zero-length diagonal between two reflex duplicates
    let touching = equals(na, nb)
        && orient(a_prev, na, a_next) < T::zero()
        && orient(b_prev, nb, b_next) < T::zero();

    visible || touching
}
