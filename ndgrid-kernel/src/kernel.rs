//! Loop nests over strided buffers.
//!
//! A [`LoopNest`] walks one or more operands that share a shape but not
//! necessarily a stride vector. Dimensions are put in loop order (innermost
//! first) according to the storage order of the leading operand, extent-1
//! dimensions are dropped and neighbouring dimensions that are contiguous for
//! every operand are fused. The walk then hands out innermost runs: the buffer
//! offset of each operand, the run length and the per-operand inner stride.

use smallvec::{smallvec, SmallVec};

use ndgrid_view::{index_order, Order};

/// Stack-allocated Vec for dims/strides; 8 covers every practical rank.
pub(crate) type SVec<T> = SmallVec<[T; 8]>;

/// Per-operand values, one or two operands in practice.
pub(crate) type PerOperand<T> = SmallVec<[T; 2]>;

/// Minimum number of elements to justify multi-threaded execution.
#[cfg(feature = "parallel")]
pub(crate) const MINTHREADLENGTH: usize = 1 << 15;

/// Whether a contiguous slice of `len` elements goes to the rayon pool.
#[inline]
pub(crate) fn use_parallel(len: usize) -> bool {
    #[cfg(feature = "parallel")]
    {
        len > MINTHREADLENGTH
    }
    #[cfg(not(feature = "parallel"))]
    {
        let _ = len;
        false
    }
}

/// Dimension permutation, innermost loop first, for a view of the given order.
///
/// Column-major keeps the first index innermost, row-major the last. A
/// non-specific view is walked by increasing stride magnitude; ties keep
/// the lower dimension inside.
pub(crate) fn loop_order(dims: &[usize], strides: &[isize], order: Order) -> SVec<usize> {
    let rank = dims.len();
    match order {
        Order::ColumnMajor => (0..rank).collect(),
        Order::RowMajor => (0..rank).rev().collect(),
        Order::NonSpecific => {
            let ranks = index_order(strides);
            let mut perm: SVec<usize> = (0..rank).collect();
            perm.sort_by_key(|&d| ranks[d]);
            perm
        }
    }
}

/// Planned walk over strided operands of one shape.
#[derive(Debug, Clone)]
pub(crate) struct LoopNest {
    /// Loop extents, innermost first.
    dims: SVec<usize>,
    /// `strides[k][d]`: stride of operand `k` along loop `d`.
    strides: PerOperand<SVec<isize>>,
    offsets: PerOperand<isize>,
}

impl LoopNest {
    /// Plan a walk over `operands`, each given as `(offset, strides)`.
    ///
    /// The loop order follows `order`, the storage order of the first operand.
    pub(crate) fn new(dims: &[usize], order: Order, operands: &[(isize, &[isize])]) -> Self {
        let lead = operands.first().map_or(&[][..], |&(_, s)| s);
        let perm = loop_order(dims, lead, order);

        let mut nest_dims: SVec<usize> = SmallVec::new();
        let mut strides: PerOperand<SVec<isize>> =
            operands.iter().map(|_| SmallVec::new()).collect();
        for &d in perm.iter().filter(|&&d| dims[d] > 1) {
            let fused = match nest_dims.last() {
                Some(&inner) => operands
                    .iter()
                    .zip(strides.iter())
                    .all(|(&(_, s), acc)| acc.last().map(|&t| t * inner as isize) == Some(s[d])),
                None => false,
            };
            if fused {
                if let Some(inner) = nest_dims.last_mut() {
                    *inner *= dims[d];
                }
            } else {
                nest_dims.push(dims[d]);
                for (acc, &(_, s)) in strides.iter_mut().zip(operands.iter()) {
                    acc.push(s[d]);
                }
            }
        }

        Self {
            dims: nest_dims,
            strides,
            offsets: operands.iter().map(|&(o, _)| o).collect(),
        }
    }

    /// Number of loops left after dropping and fusing dimensions.
    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.dims.len()
    }

    /// Visit every innermost run.
    ///
    /// `f` receives the starting offset of each operand, the run length and
    /// the inner stride of each operand.
    pub(crate) fn for_each_run<F>(&self, mut f: F)
    where
        F: FnMut(&[isize], usize, &[isize]),
    {
        let depth = self.dims.len();
        if depth == 0 {
            let unit: PerOperand<isize> = smallvec![1; self.offsets.len()];
            f(&self.offsets, 1, &unit);
            return;
        }

        let inner_len = self.dims[0];
        let inner: PerOperand<isize> = self.strides.iter().map(|s| s[0]).collect();
        let mut offsets = self.offsets.clone();
        let mut idx: SVec<usize> = smallvec![0; depth];

        loop {
            f(&offsets, inner_len, &inner);

            let mut d = 1;
            loop {
                if d == depth {
                    return;
                }
                idx[d] += 1;
                for (o, s) in offsets.iter_mut().zip(self.strides.iter()) {
                    *o += s[d];
                }
                if idx[d] < self.dims[d] {
                    break;
                }
                for (o, s) in offsets.iter_mut().zip(self.strides.iter()) {
                    *o -= s[d] * self.dims[d] as isize;
                }
                idx[d] = 0;
                d += 1;
            }
        }
    }

    /// Visit every element, passing the buffer position of each operand.
    #[inline]
    pub(crate) fn for_each_position<F>(&self, mut f: F)
    where
        F: FnMut(&[isize]),
    {
        let mut pos: PerOperand<isize> = SmallVec::new();
        self.for_each_run(|offsets, len, inner| {
            pos.clear();
            pos.extend_from_slice(offsets);
            for _ in 0..len {
                f(&pos);
                for (p, &s) in pos.iter_mut().zip(inner.iter()) {
                    *p += s;
                }
            }
        });
    }
}

/// Visit every index of `dims` in column-major order, passing the index and
/// the matching strided buffer position.
pub(crate) fn for_each_index_col_major<F>(dims: &[usize], strides: &[isize], offset: isize, mut f: F)
where
    F: FnMut(&[usize], isize),
{
    let rank = dims.len();
    let total: usize = dims.iter().product();
    let mut idx: SVec<usize> = smallvec![0; rank];
    let mut pos = offset;
    for _ in 0..total {
        f(&idx, pos);
        for d in 0..rank {
            idx[d] += 1;
            pos += strides[d];
            if idx[d] < dims[d] {
                break;
            }
            pos -= strides[d] * dims[d] as isize;
            idx[d] = 0;
        }
    }
}
