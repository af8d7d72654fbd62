//! Shape, range and strided-view metadata for ndgrid arrays.
//!
//! # Core Types
//!
//! - [`Shape`]: immutable per-dimension extents
//! - [`Range`] / [`CompiledRange`]: user sub-selections and their resolved
//!   (offset, stride, count) form
//! - [`Order`]: storage-order classification of a stride vector
//! - [`BoundaryCondition`]: index extension past array edges
//! - [`Array`]: generic typed array over one of three backing [`Layout`]s
//!
//! # Metadata Transformations
//!
//! These operate only on shape/strides/offset and never copy elements:
//! - `view`: sub-select each dimension with a [`Range`]
//! - `slice`: fix one index and drop that dimension
//! - `permute`: reorder dimensions
//!
//! # Aliasing
//!
//! Views share their backing buffer through reference counting. Each access
//! locks the buffer for its own duration, so there is no data race, but
//! nothing orders writes made through different views of the same buffer.
//! Callers that write through overlapping views from several threads must
//! coordinate themselves. Kernels that keep a buffer locked while running a
//! caller closure say so under `# Deadlocks`; such a closure must not touch
//! any array sharing that buffer.

pub mod array;
pub mod boundary;
pub mod buffer;
pub mod layout;
pub mod range;
pub mod shape;

pub use array::{Array, Layout, Storage};
pub use boundary::{build_index, BoundaryCondition};
pub use buffer::{Shared, SharedBuffer, SharedRows};
pub use layout::{
    classify_order, col_major_strides, index_order, row_major_strides, validate_view, Order,
};
pub use range::{CompiledRange, Range};
pub use shape::Shape;

pub use ndgrid_traits::{Element, ElementKind, Scalar};

// ============================================================================
// Error types
// ============================================================================

/// Errors raised while building or using shapes, ranges and views.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// A dimension has a non-positive extent, or rank 0 where rank > 0 is required.
    #[error("invalid shape: {dims:?}")]
    InvalidShape { dims: Vec<usize> },

    /// A compiled range bound falls outside `[0, length)`.
    #[error("range {first}..={last} out of bounds for length {length}")]
    RangeOutOfBounds {
        first: isize,
        last: isize,
        length: usize,
    },

    /// A half-open range selects no index at all.
    #[error("empty range {start}..{end}")]
    EmptyRange { start: usize, end: usize },

    /// The step sign disagrees with the order of the bounds.
    #[error("illegal step {step} for range {first}..={last}")]
    IllegalRangeDirection {
        first: isize,
        last: isize,
        step: isize,
    },

    /// The reachable index interval of a strided view leaves the buffer.
    #[error("view touches [{min}, {max}] outside buffer of length {len}")]
    ViewOutOfBounds { min: isize, max: isize, len: usize },

    /// Two arrays taking part in one elementwise operation differ in shape.
    #[error("non-conformable shapes: {0:?} vs {1:?}")]
    NonConformableShape(Vec<usize>, Vec<usize>),

    /// A conversion has no defined meaning between the two element kinds.
    #[error("cannot convert {from} elements to {to}")]
    UnsupportedElementKind { from: ElementKind, to: ElementKind },

    /// Ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Invalid axis index for the given array rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// Stride array length doesn't match dimensions.
    #[error("stride and dims length mismatch")]
    StrideLengthMismatch,

    /// Integer overflow while computing a buffer offset.
    #[error("offset overflow while computing view bounds")]
    OffsetOverflow,

    /// A multi-index falls outside the array.
    #[error("index {index:?} out of bounds for dims {dims:?}")]
    IndexOutOfBounds { index: Vec<usize>, dims: Vec<usize> },

    /// The operation cannot be expressed over this backing layout.
    #[error("{operation} is not supported on {layout:?} arrays")]
    UnsupportedLayout {
        layout: Layout,
        operation: &'static str,
    },
}

/// Result type for ndgrid operations.
pub type Result<T> = std::result::Result<T, GridError>;
