//! Sub-selection ranges and their compiled form.
//!
//! A [`Range`] is a shape-independent literal: its bounds may be negative
//! (counted from the end) and its step may be zero (direction inferred from
//! the bounds). [`Range::compile`] resolves it against a concrete dimension
//! length into a [`CompiledRange`] giving the absolute offset, stride and
//! element count.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{GridError, Result};

/// Inclusive range `first..=last` taken with `step`.
///
/// Negative bounds mean `length + value`; a zero step selects +1 when
/// `first <= last` and -1 otherwise.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub first: isize,
    pub last: isize,
    #[serde(default)]
    pub step: isize,
}

impl Range {
    pub const fn new(first: isize, last: isize, step: isize) -> Self {
        Self { first, last, step }
    }

    /// Every index of the dimension, in order.
    pub const fn all() -> Self {
        Self::new(0, -1, 0)
    }

    /// Every index of the dimension, last to first.
    pub const fn reversed() -> Self {
        Self::new(-1, 0, 0)
    }

    /// The single index `index`.
    pub const fn at(index: isize) -> Self {
        Self::new(index, index, 0)
    }

    /// Resolve against a dimension of `length` elements.
    pub fn compile(&self, length: usize) -> Result<CompiledRange> {
        CompiledRange::new(self, length)
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::all()
    }
}

impl TryFrom<std::ops::Range<usize>> for Range {
    type Error = GridError;

    /// Half-open `start..end`.
    ///
    /// # Errors
    /// `EmptyRange` when `start >= end`, since every compiled range selects
    /// at least one element.
    fn try_from(r: std::ops::Range<usize>) -> Result<Self> {
        if r.start >= r.end {
            return Err(GridError::EmptyRange {
                start: r.start,
                end: r.end,
            });
        }
        Ok(Self::new(to_bound(r.start)?, to_bound(r.end - 1)?, 1))
    }
}

impl TryFrom<std::ops::RangeInclusive<usize>> for Range {
    type Error = GridError;

    /// # Errors
    /// `EmptyRange` when `start > end`.
    fn try_from(r: std::ops::RangeInclusive<usize>) -> Result<Self> {
        let (start, end) = r.into_inner();
        if start > end {
            return Err(GridError::EmptyRange {
                start,
                end: end.saturating_add(1),
            });
        }
        Ok(Self::new(to_bound(start)?, to_bound(end)?, 1))
    }
}

fn to_bound(v: usize) -> Result<isize> {
    isize::try_from(v).map_err(|_| GridError::OffsetOverflow)
}

impl From<std::ops::RangeFull> for Range {
    fn from(_: std::ops::RangeFull) -> Self {
        Self::all()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.first, self.last, self.step)
    }
}

/// A [`Range`] resolved against a concrete dimension length.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompiledRange {
    offset: usize,
    stride: isize,
    count: usize,
    trivial: bool,
}

impl CompiledRange {
    /// Compile `range` against `length`.
    ///
    /// # Errors
    /// - `RangeOutOfBounds` if a resolved bound lies outside `[0, length)`
    /// - `IllegalRangeDirection` if a non-zero step points away from `last`
    /// - `OffsetOverflow` if `length` exceeds `isize::MAX`
    ///
    /// `first == last` selects exactly one element whatever the step sign.
    pub fn new(range: &Range, length: usize) -> Result<Self> {
        let len = to_bound(length)?;
        let resolve = |v: isize| if v < 0 { len + v } else { v };
        let first = resolve(range.first);
        let last = resolve(range.last);
        let out_of_bounds = || GridError::RangeOutOfBounds {
            first: range.first,
            last: range.last,
            length,
        };
        let illegal = || GridError::IllegalRangeDirection {
            first: range.first,
            last: range.last,
            step: range.step,
        };

        let (stride, count) = if first == last {
            if first < 0 || first >= len {
                return Err(out_of_bounds());
            }
            (if range.step == 0 { 1 } else { range.step }, 1usize)
        } else if first < last {
            if first < 0 || last >= len {
                return Err(out_of_bounds());
            }
            let step = match range.step {
                0 => 1,
                s if s < 0 => return Err(illegal()),
                s => s,
            };
            (step, ((last - first) / step + 1) as usize)
        } else {
            if first >= len || last < 0 {
                return Err(out_of_bounds());
            }
            let step = match range.step {
                0 => -1,
                s if s > 0 => return Err(illegal()),
                s => s,
            };
            (step, ((first - last) / (-step) + 1) as usize)
        };

        let offset = first as usize;
        Ok(Self {
            offset,
            stride,
            count,
            trivial: offset == 0 && count == length && (stride == 1 || length == 1),
        })
    }

    /// Absolute index of the first selected element.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Index increment between consecutive selected elements.
    #[inline]
    pub fn stride(&self) -> isize {
        self.stride
    }

    /// Number of selected elements.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// True when the range reproduces its dimension unchanged.
    #[inline]
    pub fn is_trivial(&self) -> bool {
        self.trivial
    }

    /// Absolute index of the `k`-th selected element.
    #[inline]
    pub fn index(&self, k: usize) -> usize {
        (self.offset as isize + k as isize * self.stride) as usize
    }

    /// Compose with an outer view dimension described by `(outer_offset, outer_stride)`.
    ///
    /// Returns the `(offset, stride)` of the sub-selection in buffer space.
    #[inline]
    pub fn compose(&self, outer_offset: isize, outer_stride: isize) -> (isize, isize) {
        (
            outer_offset + self.offset as isize * outer_stride,
            self.stride * outer_stride,
        )
    }
}
