//! Array shapes.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::layout::{col_major_strides, row_major_strides};
use crate::{GridError, Result};

/// Immutable list of per-dimension extents.
///
/// Every extent is at least 1. A rank-0 shape describes a scalar and holds a
/// single element. Clones share the extent storage, so views derived from one
/// array carry the same allocation.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Shape {
    dims: Arc<[usize]>,
}

impl Shape {
    /// Build a shape, rejecting any extent below 1 and element counts that
    /// do not fit a signed buffer offset.
    pub fn new(dims: impl Into<Vec<usize>>) -> Result<Self> {
        let dims = dims.into();
        if dims.iter().any(|&d| d < 1) {
            return Err(GridError::InvalidShape { dims });
        }
        let len = dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
        if !matches!(len, Some(n) if isize::try_from(n).is_ok()) {
            return Err(GridError::InvalidShape { dims });
        }
        Ok(Self {
            dims: Arc::from(dims),
        })
    }

    /// Build a shape of rank at least 1.
    pub fn nonscalar(dims: impl Into<Vec<usize>>) -> Result<Self> {
        let dims = dims.into();
        if dims.is_empty() {
            return Err(GridError::InvalidShape { dims });
        }
        Self::new(dims)
    }

    /// The rank-0 shape.
    pub fn scalar() -> Self {
        Self {
            dims: Arc::from(Vec::new()),
        }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    /// Always false: every extent is at least 1.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Extent of dimension `k`, 1 past the rank.
    #[inline]
    pub fn dim(&self, k: usize) -> usize {
        self.dims.get(k).copied().unwrap_or(1)
    }

    pub fn col_major_strides(&self) -> Vec<isize> {
        col_major_strides(&self.dims)
    }

    pub fn row_major_strides(&self) -> Vec<isize> {
        row_major_strides(&self.dims)
    }

    /// Whether `index` addresses an element of this shape.
    pub fn contains(&self, index: &[usize]) -> bool {
        index.len() == self.rank() && index.iter().zip(self.dims.iter()).all(|(&i, &d)| i < d)
    }

    /// Fail with `NonConformableShape` unless both shapes are equal.
    pub fn ensure_same(&self, other: &Shape) -> Result<()> {
        if self != other {
            return Err(GridError::NonConformableShape(
                self.dims.to_vec(),
                other.dims.to_vec(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<Vec<usize>> for Shape {
    type Error = GridError;

    fn try_from(dims: Vec<usize>) -> Result<Self> {
        Shape::new(dims)
    }
}

impl TryFrom<&[usize]> for Shape {
    type Error = GridError;

    fn try_from(dims: &[usize]) -> Result<Self> {
        Shape::new(dims.to_vec())
    }
}

impl From<Shape> for Vec<usize> {
    fn from(shape: Shape) -> Self {
        shape.dims.to_vec()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape{}", self)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", d)?;
        }
        f.write_str(")")
    }
}
