//! Generic typed arrays over three backing layouts.
//!
//! An [`Array`] pairs a [`Shape`] with one of:
//!
//! - [`Storage::Flat`]: one contiguous column-major buffer
//! - [`Storage::Strided`]: an offset + stride vector into a shared buffer
//! - [`Storage::Nested`]: one contiguous row per combination of outer indices
//!
//! All three answer `get`/`set` identically. Cloning an array clones the
//! handle, not the elements; views built with [`Array::view`],
//! [`Array::slice`] and [`Array::permute`] share the buffer too.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::buffer::{SharedBuffer, SharedRows};
use crate::layout::{classify_order, col_major_strides, validate_view, Order};
use crate::range::Range;
use crate::shape::Shape;
use crate::{Element, GridError, Result};

/// The closed set of backing layouts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Flat,
    Strided,
    Nested,
}

/// Backing storage of an [`Array`].
pub enum Storage<T> {
    /// Contiguous column-major buffer holding exactly the array's elements.
    Flat(SharedBuffer<T>),
    /// Validated view into a shared buffer.
    Strided {
        buffer: SharedBuffer<T>,
        offset: isize,
        strides: Arc<[isize]>,
        order: Order,
    },
    /// `dims[1..].product()` rows of `dims[0]` elements, rows enumerated
    /// column-major over the outer dimensions.
    Nested(SharedRows<T>),
}

impl<T> Clone for Storage<T> {
    fn clone(&self) -> Self {
        match self {
            Storage::Flat(buffer) => Storage::Flat(buffer.clone()),
            Storage::Strided {
                buffer,
                offset,
                strides,
                order,
            } => Storage::Strided {
                buffer: buffer.clone(),
                offset: *offset,
                strides: strides.clone(),
                order: *order,
            },
            Storage::Nested(rows) => Storage::Nested(rows.clone()),
        }
    }
}

/// Multi-dimensional array of `T`.
pub struct Array<T> {
    shape: Shape,
    storage: Storage<T>,
}

impl<T> Clone for Array<T> {
    fn clone(&self) -> Self {
        Self {
            shape: self.shape.clone(),
            storage: self.storage.clone(),
        }
    }
}

impl<T> fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Array");
        s.field("shape", &self.shape)
            .field("layout", &self.layout())
            .field("order", &self.order());
        if let Storage::Strided {
            offset, strides, ..
        } = &self.storage
        {
            s.field("offset", offset).field("strides", strides);
        }
        s.finish()
    }
}

// ============================================================================
// Construction
// ============================================================================

impl<T: Element> Array<T> {
    /// Flat array of zeros.
    pub fn zeros(shape: Shape) -> Self {
        Self::filled(shape, T::zero())
    }

    /// Flat array with every element set to `value`.
    pub fn filled(shape: Shape, value: T) -> Self {
        let data = vec![value; shape.len()];
        Self {
            shape,
            storage: Storage::Flat(SharedBuffer::new(data)),
        }
    }

    /// Rank-0 array holding `value`.
    pub fn scalar(value: T) -> Self {
        Self::filled(Shape::scalar(), value)
    }

    /// Flat array with values produced by `f`, called in column-major order.
    pub fn from_fn(shape: Shape, mut f: impl FnMut(&[usize]) -> T) -> Self {
        let dims = shape.dims();
        let total = shape.len();
        let rank = dims.len();
        let mut data = Vec::with_capacity(total);
        let mut idx = vec![0usize; rank];
        for _ in 0..total {
            data.push(f(&idx));
            for d in 0..rank {
                idx[d] += 1;
                if idx[d] < dims[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        Self {
            shape,
            storage: Storage::Flat(SharedBuffer::new(data)),
        }
    }

    /// Nested array of zeros.
    ///
    /// # Errors
    /// `InvalidShape` for a rank-0 shape.
    pub fn zeros_nested(shape: Shape) -> Result<Self> {
        let (row_len, row_count) = nested_extents(&shape)?;
        let rows = vec![vec![T::zero(); row_len]; row_count];
        Ok(Self {
            shape,
            storage: Storage::Nested(SharedRows::new(rows)),
        })
    }
}

impl<T> Array<T> {
    /// Wrap caller storage holding the elements in column-major order.
    ///
    /// # Errors
    /// `NonConformableShape` if `data.len()` is not the shape's element count.
    pub fn from_vec(shape: Shape, data: Vec<T>) -> Result<Self> {
        if data.len() != shape.len() {
            return Err(GridError::NonConformableShape(
                shape.dims().to_vec(),
                vec![data.len()],
            ));
        }
        Ok(Self {
            shape,
            storage: Storage::Flat(SharedBuffer::new(data)),
        })
    }

    /// Flat array sharing an existing buffer.
    ///
    /// # Errors
    /// `NonConformableShape` if the buffer does not hold exactly the shape's
    /// element count.
    pub fn from_buffer(shape: Shape, buffer: SharedBuffer<T>) -> Result<Self> {
        let len = buffer.len();
        if len != shape.len() {
            return Err(GridError::NonConformableShape(
                shape.dims().to_vec(),
                vec![len],
            ));
        }
        Ok(Self {
            shape,
            storage: Storage::Flat(buffer),
        })
    }

    /// Strided view into `buffer`.
    ///
    /// # Errors
    /// - `StrideLengthMismatch` if `strides.len() != shape.rank()`
    /// - `ViewOutOfBounds` if some index would leave the buffer
    pub fn wrap_strided(
        buffer: SharedBuffer<T>,
        shape: Shape,
        offset: isize,
        strides: &[isize],
    ) -> Result<Self> {
        let len = buffer.len();
        let order = validate_view(len, shape.dims(), strides, offset)?;
        tracing::trace!(
            dims = ?shape.dims(),
            ?strides,
            offset,
            ?order,
            "strided view"
        );
        Ok(Self {
            shape,
            storage: Storage::Strided {
                buffer,
                offset,
                strides: Arc::from(strides),
                order,
            },
        })
    }

    /// Nested array over caller rows, `rows[r][i0]` holding the element whose
    /// outer indices enumerate to `r` in column-major order.
    ///
    /// # Errors
    /// - `InvalidShape` for a rank-0 shape
    /// - `NonConformableShape` if the row count or a row length is wrong
    pub fn from_rows(shape: Shape, rows: Vec<Vec<T>>) -> Result<Self> {
        let (row_len, row_count) = nested_extents(&shape)?;
        if rows.len() != row_count {
            return Err(GridError::NonConformableShape(
                shape.dims().to_vec(),
                vec![row_len, rows.len()],
            ));
        }
        if let Some(bad) = rows.iter().find(|row| row.len() != row_len) {
            return Err(GridError::NonConformableShape(
                shape.dims().to_vec(),
                vec![bad.len(), row_count],
            ));
        }
        Ok(Self {
            shape,
            storage: Storage::Nested(SharedRows::new(rows)),
        })
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shape.len()
    }

    /// Always false: every shape holds at least one element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn storage(&self) -> &Storage<T> {
        &self.storage
    }

    pub fn layout(&self) -> Layout {
        match self.storage {
            Storage::Flat(_) => Layout::Flat,
            Storage::Strided { .. } => Layout::Strided,
            Storage::Nested(_) => Layout::Nested,
        }
    }

    /// Storage order used to nest bulk traversals.
    pub fn order(&self) -> Order {
        match &self.storage {
            Storage::Flat(_) | Storage::Nested(_) => Order::ColumnMajor,
            Storage::Strided { order, .. } => *order,
        }
    }

    /// Whether the elements occupy a whole buffer in column-major order.
    pub fn is_contiguous(&self) -> bool {
        match &self.storage {
            Storage::Flat(_) => true,
            Storage::Strided {
                buffer,
                offset,
                strides,
                ..
            } => {
                *offset == 0
                    && buffer.len() == self.len()
                    && dense_col_major(self.dims(), strides)
            }
            Storage::Nested(_) => false,
        }
    }

    /// Whether both arrays are backed by the same storage.
    pub fn shares_buffer(&self, other: &Array<T>) -> bool {
        match (&self.storage, &other.storage) {
            (Storage::Nested(a), Storage::Nested(b)) => a.ptr_eq(b),
            (Storage::Nested(_), _) | (_, Storage::Nested(_)) => false,
            (a, b) => match (buffer_of(a), buffer_of(b)) {
                (Some(a), Some(b)) => a.ptr_eq(b),
                _ => false,
            },
        }
    }

    /// `(buffer, offset, strides)` describing this array as a strided view,
    /// `None` for nested storage.
    pub fn descriptor(&self) -> Option<(SharedBuffer<T>, isize, Vec<isize>)> {
        match &self.storage {
            Storage::Flat(buffer) => Some((buffer.clone(), 0, col_major_strides(self.dims()))),
            Storage::Strided {
                buffer,
                offset,
                strides,
                ..
            } => Some((buffer.clone(), *offset, strides.to_vec())),
            Storage::Nested(_) => None,
        }
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Sub-select every dimension with a [`Range`].
    ///
    /// The result shares this array's buffer. When every range is trivial the
    /// array itself is returned (as a new handle).
    ///
    /// # Errors
    /// - `RankMismatch` if `ranges.len() != rank`
    /// - range compilation errors
    /// - `UnsupportedLayout` for nested storage
    pub fn view(&self, ranges: &[Range]) -> Result<Array<T>> {
        let rank = self.rank();
        if ranges.len() != rank {
            return Err(GridError::RankMismatch(ranges.len(), rank));
        }
        let compiled = ranges
            .iter()
            .zip(self.dims())
            .map(|(r, &len)| r.compile(len))
            .collect::<Result<Vec<_>>>()?;
        if compiled.iter().all(|c| c.is_trivial()) {
            return Ok(self.clone());
        }
        let (buffer, mut offset, strides) = self.strided_parts("view")?;
        let mut dims = Vec::with_capacity(rank);
        let mut new_strides = Vec::with_capacity(rank);
        for (c, &stride) in compiled.iter().zip(strides.iter()) {
            let (o, s) = c.compose(offset, stride);
            offset = o;
            dims.push(c.count());
            new_strides.push(s);
        }
        Array::wrap_strided(buffer, Shape::new(dims)?, offset, &new_strides)
    }

    /// Fix dimension `dim` at `index` (negative counts from the end) and drop it.
    ///
    /// # Errors
    /// - `InvalidAxis` if `dim >= rank`
    /// - `RangeOutOfBounds` if `index` is outside the dimension
    /// - `UnsupportedLayout` for nested storage
    pub fn slice(&self, dim: usize, index: isize) -> Result<Array<T>> {
        let rank = self.rank();
        if dim >= rank {
            return Err(GridError::InvalidAxis { axis: dim, rank });
        }
        let at = Range::at(index).compile(self.dims()[dim])?;
        let (buffer, offset, strides) = self.strided_parts("slice")?;
        let (offset, _) = at.compose(offset, strides[dim]);
        let mut dims = self.dims().to_vec();
        let mut strides = strides;
        dims.remove(dim);
        strides.remove(dim);
        Array::wrap_strided(buffer, Shape::new(dims)?, offset, &strides)
    }

    /// Reorder dimensions: dimension `k` of the result is dimension `perm[k]`.
    ///
    /// # Errors
    /// - `RankMismatch` if `perm.len() != rank`
    /// - `InvalidAxis` if `perm` is not a permutation
    /// - `UnsupportedLayout` for nested storage
    pub fn permute(&self, perm: &[usize]) -> Result<Array<T>> {
        let rank = self.rank();
        if perm.len() != rank {
            return Err(GridError::RankMismatch(perm.len(), rank));
        }
        let mut seen = vec![false; rank];
        for &p in perm {
            if p >= rank || seen[p] {
                return Err(GridError::InvalidAxis { axis: p, rank });
            }
            seen[p] = true;
        }
        if perm.iter().enumerate().all(|(k, &p)| k == p) {
            return Ok(self.clone());
        }
        let (buffer, offset, strides) = self.strided_parts("permute")?;
        let dims: Vec<usize> = perm.iter().map(|&p| self.dims()[p]).collect();
        let strides: Vec<isize> = perm.iter().map(|&p| strides[p]).collect();
        Array::wrap_strided(buffer, Shape::new(dims)?, offset, &strides)
    }

    fn strided_parts(&self, operation: &'static str) -> Result<(SharedBuffer<T>, isize, Vec<isize>)> {
        self.descriptor().ok_or(GridError::UnsupportedLayout {
            layout: self.layout(),
            operation,
        })
    }
}

// ============================================================================
// Element access
// ============================================================================

impl<T: Copy> Array<T> {
    /// Get an element.
    ///
    /// # Panics
    /// Panics if `index` has the wrong length or lies outside the shape.
    pub fn get(&self, index: &[usize]) -> T {
        self.check_index(index);
        match &self.storage {
            Storage::Flat(buffer) => buffer.read()[flat_position(self.dims(), index)],
            Storage::Strided {
                buffer,
                offset,
                strides,
                ..
            } => buffer.read()[strided_position(*offset, strides, index)],
            Storage::Nested(rows) => {
                let (row, col) = nested_position(self.dims(), index);
                rows.read()[row][col]
            }
        }
    }

    /// Set an element.
    ///
    /// # Panics
    /// Panics if `index` has the wrong length or lies outside the shape.
    pub fn set(&self, index: &[usize], value: T) {
        self.check_index(index);
        match &self.storage {
            Storage::Flat(buffer) => buffer.write()[flat_position(self.dims(), index)] = value,
            Storage::Strided {
                buffer,
                offset,
                strides,
                ..
            } => buffer.write()[strided_position(*offset, strides, index)] = value,
            Storage::Nested(rows) => {
                let (row, col) = nested_position(self.dims(), index);
                rows.write()[row][col] = value;
            }
        }
    }

    /// Get an element, or `IndexOutOfBounds`.
    pub fn try_get(&self, index: &[usize]) -> Result<T> {
        self.ensure_index(index)?;
        Ok(self.get(index))
    }

    /// Set an element, or fail with `IndexOutOfBounds`.
    pub fn try_set(&self, index: &[usize], value: T) -> Result<()> {
        self.ensure_index(index)?;
        self.set(index, value);
        Ok(())
    }

    fn ensure_index(&self, index: &[usize]) -> Result<()> {
        if !self.shape.contains(index) {
            return Err(GridError::IndexOutOfBounds {
                index: index.to_vec(),
                dims: self.dims().to_vec(),
            });
        }
        Ok(())
    }

    fn check_index(&self, index: &[usize]) {
        assert_eq!(index.len(), self.rank(), "wrong number of indices");
        for (k, (&i, &d)) in index.iter().zip(self.dims()).enumerate() {
            assert!(i < d, "index {} out of bounds for dim {} of extent {}", i, k, d);
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn nested_extents(shape: &Shape) -> Result<(usize, usize)> {
    match shape.dims().split_first() {
        Some((&row_len, outer)) => Ok((row_len, outer.iter().product())),
        None => Err(GridError::InvalidShape { dims: Vec::new() }),
    }
}

fn buffer_of<T>(storage: &Storage<T>) -> Option<&SharedBuffer<T>> {
    match storage {
        Storage::Flat(buffer) | Storage::Strided { buffer, .. } => Some(buffer),
        Storage::Nested(_) => None,
    }
}

/// Column-major linear position of `index`.
#[inline]
fn flat_position(dims: &[usize], index: &[usize]) -> usize {
    index
        .iter()
        .zip(dims)
        .rev()
        .fold(0usize, |pos, (&i, &d)| pos * d + i)
}

#[inline]
fn strided_position(offset: isize, strides: &[isize], index: &[usize]) -> usize {
    let mut pos = offset;
    for (&i, &s) in index.iter().zip(strides) {
        pos += i as isize * s;
    }
    pos as usize
}

/// `(row, column)` of `index` in nested storage.
#[inline]
fn nested_position(dims: &[usize], index: &[usize]) -> (usize, usize) {
    (flat_position(&dims[1..], &index[1..]), index[0])
}

fn dense_col_major(dims: &[usize], strides: &[isize]) -> bool {
    let mut expected = 1isize;
    for (&dim, &stride) in dims.iter().zip(strides) {
        if dim <= 1 {
            continue;
        }
        if stride != expected {
            return false;
        }
        expected *= dim as isize;
    }
    classify_order(dims, strides) == Order::ColumnMajor
}

// ============================================================================
// Tests
// ============================================================================
