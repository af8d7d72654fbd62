//! Shape, range and strided-view engine for multi-dimensional typed arrays.
//!
//! # Core Types
//!
//! - [`Shape`]: per-dimension extents, each at least 1
//! - [`Range`] / [`CompiledRange`]: sub-selections with negative-index
//!   wraparound and inferred step direction
//! - [`Order`]: column-major, row-major or non-specific classification of a
//!   stride vector, produced by [`validate_view`]
//! - [`BoundaryCondition`]: clamp / periodic / mirror index extension
//! - [`Array`]: generic typed array over a flat, strided or nested [`Layout`]
//! - [`TypedArray`]: an [`Array`] whose [`ElementKind`] is chosen at runtime
//!
//! # Bulk Operations
//!
//! - [`fill`], [`fill_with`], [`fill_from_fn`], [`map_inplace`], [`increment`],
//!   [`scale`], [`map_into`], [`copy_into`]
//! - [`scan`], [`reduce`], [`sum`]
//! - [`flatten`], [`to_flat`], [`to_nested`], [`convert`], [`shifted`]
//!
//! # Example
//!
//! ```rust
//! use ndgrid::{flatten, scale, Array, Range, Shape};
//!
//! let shape = Shape::new(vec![4, 3]).unwrap();
//! let a = Array::from_fn(shape, |idx| (idx[0] + 4 * idx[1]) as f64);
//!
//! // every other row, columns reversed; shares the buffer of `a`
//! let v = a.view(&[Range::new(0, -1, 2), Range::reversed()]).unwrap();
//! assert_eq!(v.dims(), &[2, 3]);
//! assert_eq!(v.get(&[1, 0]), 10.0);
//!
//! scale(&v, 10.0);
//! assert_eq!(a.get(&[2, 2]), 100.0);
//!
//! let data = flatten(&v, false).into_vec();
//! assert_eq!(data, vec![80.0, 100.0, 40.0, 60.0, 0.0, 20.0]);
//! ```

mod typed_array;

pub use typed_array::TypedArray;

pub use ndgrid_kernel::{
    convert, copy_into, fill, fill_from_fn, fill_with, flatten, increment, map_inplace, map_into,
    reduce, scale, scan, shifted, sum, to_flat, to_nested, to_vec, FlatData, MaybeSendSync,
    MaybeSync,
};
pub use ndgrid_view::{
    build_index, classify_order, col_major_strides, index_order, row_major_strides,
    validate_view, Array, BoundaryCondition, CompiledRange, Element, ElementKind, GridError,
    Layout, Order, Range, Result, Scalar, Shape, Shared, SharedBuffer, SharedRows, Storage,
};
