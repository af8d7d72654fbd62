//! Copying operations: flatten, layout changes, kind conversion and shifts.

use std::any::Any;

use ndgrid_view::{
    Array, BoundaryCondition, Element, GridError, Order, Result, Shape, SharedBuffer, Storage,
};

use crate::kernel::{for_each_index_col_major, loop_order};
use crate::map::map_into;

/// Contiguous column-major element data returned by [`flatten`].
#[derive(Debug, Clone)]
pub enum FlatData<T> {
    /// The array's own buffer; writes through it are visible in the array.
    Shared(SharedBuffer<T>),
    /// A fresh copy.
    Owned(Vec<T>),
}

impl<T: Clone> FlatData<T> {
    pub fn is_shared(&self) -> bool {
        matches!(self, FlatData::Shared(_))
    }

    pub fn len(&self) -> usize {
        match self {
            FlatData::Shared(buffer) => buffer.len(),
            FlatData::Owned(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the elements, copying only if the buffer is still shared.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            FlatData::Shared(buffer) => match buffer.try_unwrap() {
                Ok(data) => data,
                Err(buffer) => buffer.to_vec(),
            },
            FlatData::Owned(data) => data,
        }
    }

    /// Wrap as a flat array of `shape`, sharing the buffer when there is one.
    ///
    /// # Errors
    /// `NonConformableShape` if the element count does not match.
    pub fn into_array(self, shape: Shape) -> Result<Array<T>> {
        match self {
            FlatData::Shared(buffer) => Array::from_buffer(shape, buffer),
            FlatData::Owned(data) => Array::from_vec(shape, data),
        }
    }
}

/// Copy out every element in column-major order.
pub fn to_vec<T: Element>(a: &Array<T>) -> Vec<T> {
    match a.storage() {
        Storage::Flat(buffer) => buffer.to_vec(),
        Storage::Strided {
            buffer,
            offset,
            strides,
            ..
        } => {
            let data = buffer.read();
            let mut out = Vec::with_capacity(a.len());
            for_each_index_col_major(a.dims(), strides, *offset, |_, pos| {
                out.push(data[pos as usize]);
            });
            out
        }
        Storage::Nested(rows) => rows.read().iter().flatten().copied().collect(),
    }
}

/// Contiguous column-major data of `a`.
///
/// A contiguous array hands out its own buffer unless `force_copy` is set;
/// anything else is copied.
pub fn flatten<T: Element>(a: &Array<T>, force_copy: bool) -> FlatData<T> {
    if !force_copy && a.is_contiguous() {
        if let Some((buffer, _, _)) = a.descriptor() {
            return FlatData::Shared(buffer);
        }
    }
    tracing::debug!(
        dims = ?a.dims(),
        layout = ?a.layout(),
        force_copy,
        "flatten copies elements"
    );
    FlatData::Owned(to_vec(a))
}

/// Fresh flat array holding a copy of `a`.
pub fn to_flat<T: Element>(a: &Array<T>) -> Result<Array<T>> {
    Array::from_vec(a.shape().clone(), to_vec(a))
}

/// Fresh nested array holding a copy of `a`.
///
/// # Errors
/// `InvalidShape` for a rank-0 array.
pub fn to_nested<T: Element>(a: &Array<T>) -> Result<Array<T>> {
    let row_len = a.dims().first().copied().ok_or(GridError::InvalidShape {
        dims: Vec::new(),
    })?;
    let rows = to_vec(a)
        .chunks(row_len)
        .map(<[T]>::to_vec)
        .collect();
    Array::from_rows(a.shape().clone(), rows)
}

/// Copy `src` into `dest`.
///
/// # Errors
/// `NonConformableShape` if the shapes differ.
pub fn copy_into<T: Element>(dest: &Array<T>, src: &Array<T>) -> Result<()> {
    map_into(dest, src, |x| x)
}

/// Cast every element of `a` to `U`.
///
/// Converting to the element type `a` already has returns `a` itself (a new
/// handle on the same storage). Otherwise the result is a fresh array in the
/// same layout family: flat and column-major input give a flat array,
/// nested input a nested one, and other strided input a dense strided array
/// whose strides grow in the same dimension order as the source's.
///
/// # Errors
/// `UnsupportedElementKind` for complex to real.
pub fn convert<T: Element, U: Element>(a: &Array<T>) -> Result<Array<U>> {
    if let Some(same) = (a as &dyn Any).downcast_ref::<Array<U>>() {
        return Ok(same.clone());
    }
    if !T::KIND.can_cast_to(U::KIND) {
        return Err(GridError::UnsupportedElementKind {
            from: T::KIND,
            to: U::KIND,
        });
    }
    tracing::debug!(
        from = %T::KIND,
        to = %U::KIND,
        layout = ?a.layout(),
        len = a.len(),
        "converting elements"
    );

    // `can_cast_to` rules out the only failing direction
    let cast = |x: T| x.cast::<U>().unwrap_or_default();
    match a.storage() {
        Storage::Flat(buffer) => {
            let data = buffer.read().iter().map(|&x| cast(x)).collect();
            Array::from_vec(a.shape().clone(), data)
        }
        Storage::Nested(rows) => {
            let rows = rows
                .read()
                .iter()
                .map(|row| row.iter().map(|&x| cast(x)).collect())
                .collect();
            Array::from_rows(a.shape().clone(), rows)
        }
        Storage::Strided { order, .. } if *order == Order::ColumnMajor => {
            Array::from_vec(a.shape().clone(), to_vec(a).into_iter().map(cast).collect())
        }
        Storage::Strided { strides, order, .. } => {
            let dims = a.dims();
            let mut dense = vec![0isize; dims.len()];
            let mut step = 1isize;
            for &d in loop_order(dims, strides, *order).iter() {
                dense[d] = step;
                step *= dims[d] as isize;
            }
            let buffer = SharedBuffer::new(vec![U::zero(); a.len()]);
            let out = Array::wrap_strided(buffer, a.shape().clone(), 0, &dense)?;
            map_into(&out, a, cast)?;
            Ok(out)
        }
    }
}

/// Copy of `a` shifted by `offsets`: `out[i] = a[resolve(i + offsets)]` per
/// dimension, indices past an edge resolved by `condition`.
///
/// # Errors
/// `RankMismatch` if `offsets.len()` differs from the rank of `a`.
pub fn shifted<T: Element>(
    a: &Array<T>,
    offsets: &[isize],
    condition: BoundaryCondition,
) -> Result<Array<T>> {
    let dims = a.dims();
    if offsets.len() != dims.len() {
        return Err(GridError::RankMismatch(offsets.len(), dims.len()));
    }
    let tables: Vec<Vec<usize>> = dims
        .iter()
        .zip(offsets)
        .map(|(&len, &offset)| condition.build_index(len, offset))
        .collect();
    let strides = a.shape().col_major_strides();
    let values = to_vec(a);
    Ok(Array::from_fn(a.shape().clone(), |idx| {
        let pos: isize = idx
            .iter()
            .zip(&tables)
            .zip(&strides)
            .map(|((&i, table), &s)| table[i] as isize * s)
            .sum();
        values[pos as usize]
    }))
}
