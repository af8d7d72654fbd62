//! Bulk kernels over ndgrid arrays.
//!
//! Every kernel accepts any of the three backing layouts. Traversal follows
//! the array's [`Order`]: column-major walks the first index fastest,
//! row-major the last, and a non-specific view is walked by increasing
//! stride magnitude. The order is a performance hint only; visited elements
//! and final values do not depend on it.
//!
//! # Fill and map
//!
//! - [`fill`], [`fill_with`], [`fill_from_fn`]
//! - [`map_inplace`], [`increment`], [`scale`]
//! - [`map_into`], [`copy_into`]: elementwise between two arrays of one shape
//!
//! # Reductions
//!
//! - [`scan`]: left fold seeded by the first element
//! - [`reduce`], [`sum`]
//!
//! # Copies
//!
//! - [`flatten`]: contiguous column-major data, shared when possible
//! - [`to_vec`], [`to_flat`], [`to_nested`]
//! - [`convert`]: elementwise cast to another element type
//! - [`shifted`]: boundary-aware shift
//!
//! # Features
//!
//! - `parallel`: flat buffers longer than `1 << 15` elements are filled,
//!   mapped and reduced on the rayon pool.

mod kernel;
pub mod maybe_sync;
mod map;
mod ops;
mod reduce;

pub use map::{fill, fill_from_fn, fill_with, increment, map_inplace, map_into, scale};
pub use maybe_sync::{MaybeSendSync, MaybeSync};
pub use ops::{convert, copy_into, flatten, shifted, to_flat, to_nested, to_vec, FlatData};
pub use reduce::{reduce, scan, sum};

pub use ndgrid_view::{
    Array, BoundaryCondition, Element, ElementKind, GridError, Layout, Order, Range, Result, Shape,
    SharedBuffer, Storage,
};
