//! Shared traits for the ndgrid crates.
//!
//! This crate defines the element kinds an ndgrid array may hold and the
//! conversions between them. `ndgrid-view` and `ndgrid-kernel` are generic
//! over [`Element`]; nothing in them is written per scalar type.

pub mod element;

pub use element::{Element, ElementKind, Scalar};
