//! Elementwise fill and map kernels.
//!
//! Single-array kernels walk the array in its storage order. Flat buffers and
//! unit-stride runs are handled as slices, which the `parallel` feature hands
//! to rayon once they are long enough.

use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use ndgrid_view::{col_major_strides, Array, Element, Result, SharedBuffer, Storage};

use crate::kernel::{for_each_index_col_major, use_parallel, LoopNest};
use crate::maybe_sync::MaybeSync;
use crate::ops::to_vec;

/// `x = f(x)` over a contiguous slice.
#[inline]
fn update_slice<T: Element, F: Fn(T) -> T + MaybeSync>(data: &mut [T], f: &F) {
    if use_parallel(data.len()) {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            data.par_iter_mut().for_each(|x| *x = f(*x));
            return;
        }
    }
    for x in data.iter_mut() {
        *x = f(*x);
    }
}

/// Apply `f` to every element in place.
///
/// # Deadlocks
/// The buffer stays write-locked while `f` runs, so `f` must not touch any
/// array sharing storage with `a`. Read such arrays through
/// [`map_into`](crate::map_into) or [`fill_from_fn`] instead.
pub fn map_inplace<T: Element, F>(a: &Array<T>, f: F)
where
    F: Fn(T) -> T + MaybeSync,
{
    match a.storage() {
        Storage::Flat(buffer) => update_slice(&mut buffer.write(), &f),
        Storage::Strided {
            buffer,
            offset,
            strides,
            order,
        } => {
            let nest = LoopNest::new(a.dims(), *order, &[(*offset, &strides[..])]);
            let mut data = buffer.write();
            nest.for_each_run(|offsets, len, inner| {
                let start = offsets[0] as usize;
                if inner[0] == 1 {
                    update_slice(&mut data[start..start + len], &f);
                } else {
                    let mut p = offsets[0];
                    for _ in 0..len {
                        let i = p as usize;
                        data[i] = f(data[i]);
                        p += inner[0];
                    }
                }
            });
        }
        Storage::Nested(rows) => {
            for row in rows.write().iter_mut() {
                update_slice(row, &f);
            }
        }
    }
}

/// Set every element to `value`.
pub fn fill<T: Element>(a: &Array<T>, value: T) {
    map_inplace(a, move |_| value);
}

/// Set every element from successive calls of `generator`, in traversal order.
///
/// All values are generated before the array is written, so `generator` may
/// read `a` or any other view of its storage and sees the old contents.
pub fn fill_with<T: Element, G>(a: &Array<T>, mut generator: G)
where
    G: FnMut() -> T,
{
    let values: Vec<T> = (0..a.len()).map(|_| generator()).collect();
    let mut values = values.into_iter();
    match a.storage() {
        Storage::Flat(buffer) => {
            for (x, v) in buffer.write().iter_mut().zip(values) {
                *x = v;
            }
        }
        Storage::Strided {
            buffer,
            offset,
            strides,
            order,
        } => {
            let nest = LoopNest::new(a.dims(), *order, &[(*offset, &strides[..])]);
            let mut data = buffer.write();
            nest.for_each_position(|p| {
                if let Some(v) = values.next() {
                    data[p[0] as usize] = v;
                }
            });
        }
        Storage::Nested(rows) => {
            for (x, v) in rows.write().iter_mut().flat_map(|row| row.iter_mut()).zip(values) {
                *x = v;
            }
        }
    }
}

/// Set every element to `f(index)`, visiting indices in column-major order.
///
/// Like [`fill_with`], every value is computed before the first write, so a
/// neighbour-dependent `f` reading `a` sees the contents from before the call.
pub fn fill_from_fn<T: Element, F>(a: &Array<T>, mut f: F)
where
    F: FnMut(&[usize]) -> T,
{
    let dims = a.dims();
    let mut values = Vec::with_capacity(a.len());
    for_each_index_col_major(dims, &col_major_strides(dims), 0, |idx, _| values.push(f(idx)));
    assign_col_major(a, values);
}

/// Add `value` to every element. Integer elements wrap on overflow.
pub fn increment<T: Element>(a: &Array<T>, value: T) {
    map_inplace(a, move |x| x.wrapping_add(value));
}

/// Multiply every element by `value`. Integer elements wrap on overflow.
pub fn scale<T: Element>(a: &Array<T>, value: T) {
    map_inplace(a, move |x| x.wrapping_mul(value));
}

/// `dest[i] = f(src[i])` for every index.
///
/// The walk follows the storage order of `dest`. When both arrays view
/// distinct buffers the two locks are held together, taken in buffer `id`
/// order; otherwise `src` is read out first and its lock released before
/// `dest` is written, so aliasing views never deadlock.
///
/// # Deadlocks
/// `f` runs while the locks are held and must not touch either array.
///
/// # Errors
/// `NonConformableShape` if the shapes differ.
pub fn map_into<D: Element, S: Element, F>(dest: &Array<D>, src: &Array<S>, f: F) -> Result<()>
where
    F: Fn(S) -> D + MaybeSync,
{
    dest.shape().ensure_same(src.shape())?;

    if let (Some((db, doff, dstr)), Some((sb, soff, sstr))) = (dest.descriptor(), src.descriptor())
    {
        if db.id() != sb.id() {
            let operands = [(doff, dstr.as_slice()), (soff, sstr.as_slice())];
            let nest = LoopNest::new(dest.dims(), dest.order(), &operands);
            let (mut out, input) = lock_pair(&db, &sb);
            nest.for_each_run(|offsets, len, inner| {
                if inner[0] == 1 && inner[1] == 1 {
                    let (d, s) = (offsets[0] as usize, offsets[1] as usize);
                    for (x, &y) in out[d..d + len].iter_mut().zip(&input[s..s + len]) {
                        *x = f(y);
                    }
                } else {
                    let (mut d, mut s) = (offsets[0], offsets[1]);
                    for _ in 0..len {
                        out[d as usize] = f(input[s as usize]);
                        d += inner[0];
                        s += inner[1];
                    }
                }
            });
            return Ok(());
        }
    }

    assign_col_major(dest, to_vec(src).into_iter().map(f));
    Ok(())
}

/// Write `values`, given in column-major order, into `dest`.
fn assign_col_major<T: Element>(dest: &Array<T>, values: impl IntoIterator<Item = T>) {
    let mut values = values.into_iter();
    let dims = dest.dims();
    match dest.storage() {
        Storage::Flat(buffer) => {
            for (x, v) in buffer.write().iter_mut().zip(values) {
                *x = v;
            }
        }
        Storage::Strided {
            buffer,
            offset,
            strides,
            ..
        } => {
            let mut data = buffer.write();
            for_each_index_col_major(dims, strides, *offset, |_, pos| {
                if let Some(v) = values.next() {
                    data[pos as usize] = v;
                }
            });
        }
        Storage::Nested(rows) => {
            for (x, v) in rows.write().iter_mut().flat_map(|r| r.iter_mut()).zip(values) {
                *x = v;
            }
        }
    }
}

fn lock_pair<'a, D, S>(
    dest: &'a SharedBuffer<D>,
    src: &'a SharedBuffer<S>,
) -> (RwLockWriteGuard<'a, Vec<D>>, RwLockReadGuard<'a, Vec<S>>) {
    if dest.id() < src.id() {
        let d = dest.write();
        let s = src.read();
        (d, s)
    } else {
        let s = src.read();
        let d = dest.write();
        (d, s)
    }
}
