//! Collects clipped triangles into the caller's index buffer.

use alloc::vec::Vec;

use num_traits::float::Float;

use crate::arena::{Arena, NodeIndex};
use crate::Index;

/// Summary of one triangulation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    /// Triangles written to the output.
    pub triangles: usize,
    /// Triangles clipped without passing the ear test. Only malformed input
    /// (self-intersections, overlapping holes) produces them.
    pub forced: usize,
    /// Rings split along a diagonal after no ear could be found.
    pub splits: usize,
    /// Duplicate vertices dropped while recovering from a stalled ring.
    pub dropped: usize,
    /// Holes bridged into the outer ring.
    pub merged_holes: usize,
    /// Holes left out: fewer than three distinct vertices, or no vertex of the
    /// outer ring could see them.
    pub skipped_holes: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Clip {
    Ear,
    Forced,
}

pub(crate) struct Assembler<'a, N: Index> {
    triangles: &'a mut Vec<N>,
    forced: &'a mut Vec<usize>,
    pub(crate) stats: Stats,
}

impl<'a, N: Index> Assembler<'a, N> {
    pub(crate) fn new(triangles: &'a mut Vec<N>, forced: &'a mut Vec<usize>) -> Self {
        Self {
            triangles,
            forced,
            stats: Stats::default(),
        }
    }

    /// Appends triangle `a, b, c`. Bridge duplicates carry the input index of
    /// the vertex they copy, so only input positions are written.
    pub(crate) fn emit<T: Float>(
        &mut self,
        nodes: &Arena<T>,
        [a, b, c]: [NodeIndex; 3],
        clip: Clip,
    ) {
        if clip == Clip::Forced {
            self.forced.push(self.stats.triangles);
            self.stats.forced += 1;
        }
        self.triangles.extend([
            N::from_usize(nodes[a].i as usize),
            N::from_usize(nodes[b].i as usize),
            N::from_usize(nodes[c].i as usize),
        ]);
        self.stats.triangles += 1;
    }

    pub(crate) fn finish(self) -> Stats {
        self.stats
    }
}
