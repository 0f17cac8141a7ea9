//! Ear-clipping triangulation of polygons with holes, in the manner of
//! [Earcut](https://github.com/mapbox/earcut).
//!
//! Input is a flat list of 2D points plus the offsets at which hole rings
//! start. Output is a flat list of indices into that list, three per triangle,
//! every triangle counter-clockwise (positive area with y pointing up). No
//! points are added, and every input edge ends up as a triangle edge.
//!
//! ```
//! use earclip::Earcut;
//!
//! let mut earcut = Earcut::new();
//! let square = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];
//! let mut triangles: Vec<u32> = Vec::new();
//! let stats = earcut.earcut(square, &[], &mut triangles).unwrap();
//! assert_eq!(stats.triangles, 2);
//! assert_eq!(triangles.len(), 6);
//! ```
//!
//! Malformed input (self-intersections, holes outside the boundary) never
//! fails: the clipper falls back to splitting the remaining ring or, as a last
//! resort, clipping an invalid ear, and reports how often it had to do so in
//! [`Stats`].

#![no_std]

extern crate alloc;

mod arena;
mod assemble;
mod clipper;
mod geom;
mod linker;
mod zorder;

use alloc::vec::Vec;
use core::ops::Range;

use num_traits::float::Float;
use tracing::{debug, debug_span};

pub use assemble::Stats;

use arena::{Arena, NodeIndex};
use assemble::Assembler;
use clipper::Work;
use linker::Cleanup;
use zorder::ZOrder;

/// Index of a vertex
pub trait Index: Copy {
    /// Largest vertex position the type can hold.
    const MAX: usize;
    fn into_usize(self) -> usize;
    fn from_usize(v: usize) -> Self;
}

impl Index for u32 {
    const MAX: usize = u32::MAX as usize;
    fn into_usize(self) -> usize {
        self as usize
    }
    fn from_usize(v: usize) -> Self {
        v as Self
    }
}

impl Index for u16 {
    const MAX: usize = u16::MAX as usize;
    fn into_usize(self) -> usize {
        self as usize
    }
    fn from_usize(v: usize) -> Self {
        v as Self
    }
}

impl Index for usize {
    const MAX: usize = usize::MAX;
    fn into_usize(self) -> usize {
        self
    }
    fn from_usize(v: usize) -> Self {
        v
    }
}

/// Input the triangulator cannot make sense of.
///
/// Bad geometry is not an error; these are all mistakes in how the input was
/// put together.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriangulationError {
    #[error("hole {hole} starts at {offset}, past the end of {len} vertices")]
    HoleOutOfBounds {
        hole: usize,
        offset: usize,
        len: usize,
    },
    #[error("hole {hole} starts at {offset}, before the previous hole at {previous}")]
    HolesOutOfOrder {
        hole: usize,
        offset: usize,
        previous: usize,
    },
    #[error("vertex {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
    #[error("{len} vertices cannot be addressed by indices up to {max}")]
    IndexOverflow { len: usize, max: usize },
}

/// Tuning knobs for [`Earcut`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Options {
    /// Inputs with more vertices than this use the z-order index for ear
    /// tests; smaller ones scan the ring directly.
    pub index_threshold: usize,
    /// Also drop vertices lying strictly between two collinear neighbours
    /// before clipping. Off by default, since those vertices would then be
    /// missing from the output.
    pub drop_collinear: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            index_threshold: 80,
            drop_collinear: false,
        }
    }
}

/// Instance of the earcut algorithm.
pub struct Earcut<T: Float> {
    data: Vec<[T; 2]>,
    nodes: Arena<T>,
    queue: Vec<NodeIndex>,
    work: Work,
    forced: Vec<usize>,
    options: Options,
}

impl<T: Float> Default for Earcut<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> Earcut<T> {
    /// Creates a new instance of the earcut algorithm.
    ///
    /// You can reuse a single instance for multiple triangulations to reduce memory allocations.
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            data: Vec::new(),
            nodes: Arena::new(),
            queue: Vec::new(),
            work: Work::default(),
            forced: Vec::new(),
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Positions (in triangles, not indices) of the triangles the last run had
    /// to clip without a valid ear.
    pub fn forced_triangles(&self) -> &[usize] {
        &self.forced
    }

    /// Performs the earcut triangulation on a polygon.
    ///
    /// `hole_indices` holds the position of the first vertex of each hole; the
    /// outer ring runs from 0 to the first hole. `triangles_out` is cleared and
    /// filled with three indices per triangle.
    pub fn earcut<N: Index>(
        &mut self,
        data: impl IntoIterator<Item = [T; 2]>,
        hole_indices: &[N],
        triangles_out: &mut Vec<N>,
    ) -> Result<Stats, TriangulationError> {
        self.data.clear();
        self.data.extend(data);
        triangles_out.clear();
        self.forced.clear();

        validate(&self.data, hole_indices)?;

        let _span = debug_span!(
            "earcut",
            vertices = self.data.len(),
            holes = hole_indices.len()
        )
        .entered();

        let len = self.data.len();
        let outer_len = hole_indices.first().map_or(len, |h| h.into_usize());
        if outer_len < 3 {
            return Ok(Stats::default());
        }
        triangles_out.reserve(len * 3);
        self.nodes.reset(len + 2 * hole_indices.len() + 8);

        let cleanup = if self.options.drop_collinear {
            Cleanup::Straight
        } else {
            Cleanup::Duplicates
        };
        let Some(linked) = linker::link(
            &mut self.nodes,
            &self.data,
            0..outer_len,
            hole_ranges(hole_indices, len),
            &mut self.queue,
            cleanup,
        ) else {
            debug!("outer ring has fewer than three distinct vertices");
            return Ok(Stats::default());
        };

        let zorder = ZOrder::new(&self.data, self.options.index_threshold);

        let mut out = Assembler::new(triangles_out, &mut self.forced);
        out.stats.merged_holes = linked.merged_holes;
        out.stats.skipped_holes = linked.skipped_holes;
        clipper::clip(
            &mut self.nodes,
            linked.start,
            zorder.as_ref(),
            &mut self.work,
            &mut out,
        );
        let stats = out.finish();

        debug!(
            triangles = stats.triangles,
            forced = stats.forced,
            splits = stats.splits,
            indexed = zorder.is_some(),
            "triangulated"
        );
        Ok(stats)
    }
}

/// Triangulates a polygon with a throwaway [`Earcut`] instance.
pub fn earcut<T: Float, N: Index>(
    data: impl IntoIterator<Item = [T; 2]>,
    hole_indices: &[N],
) -> Result<Vec<N>, TriangulationError> {
    let mut triangles = Vec::new();
    Earcut::new().earcut(data, hole_indices, &mut triangles)?;
    Ok(triangles)
}

fn hole_ranges<N: Index>(
    hole_indices: &[N],
    len: usize,
) -> impl Iterator<Item = Range<usize>> + '_ {
    hole_indices.iter().enumerate().map(move |(k, start)| {
        let end = hole_indices.get(k + 1).map_or(len, |next| next.into_usize());
        start.into_usize()..end
    })
}

fn validate<T: Float, N: Index>(data: &[[T; 2]], hole_indices: &[N]) -> Result<(), TriangulationError> {
    let len = data.len();
    let max = N::MAX.min(u32::MAX as usize);
    if len > 0 && len - 1 > max {
        return Err(TriangulationError::IndexOverflow { len, max });
    }

    let mut previous = 0;
    for (hole, start) in hole_indices.iter().enumerate() {
        let offset = start.into_usize();
        if offset > len {
            return Err(TriangulationError::HoleOutOfBounds { hole, offset, len });
        }
        if offset < previous {
            return Err(TriangulationError::HolesOutOfOrder {
                hole,
                offset,
                previous,
            });
        }
        previous = offset;
    }

    match data.iter().position(|[x, y]| !x.is_finite() || !y.is_finite()) {
        Some(index) => Err(TriangulationError::NonFiniteCoordinate { index }),
        None => Ok(()),
    }
}

/// Returns a percentage difference between the polygon area and its triangulation area;
/// used to verify correctness of triangulation
pub fn deviation<T: Float, N: Index>(
    data: impl IntoIterator<Item = [T; 2]>,
    hole_indices: &[N],
    triangles: &[N],
) -> T {
    let data = data.into_iter().collect::<Vec<[T; 2]>>();
    let len = data.len();
    let outer_len = hole_indices
        .first()
        .map_or(len, |h| h.into_usize().min(len));

    let polygon_area = hole_ranges(hole_indices, len)
        .filter(|range| range.end <= len && range.len() >= 3)
        .fold(geom::signed_area(&data, 0, outer_len).abs(), |area, range| {
            area - geom::signed_area(&data, range.start, range.end).abs()
        });

    let triangles_area = triangles.chunks_exact(3).fold(T::zero(), |area, t| {
        let [a, b, c] = [t[0], t[1], t[2]].map(|i| data[i.into_usize()]);
        area + ((b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])).abs()
    });

    if polygon_area == T::zero() && triangles_area == T::zero() {
        T::zero()
    } else {
        ((polygon_area - triangles_area) / polygon_area).abs()
    }
}
