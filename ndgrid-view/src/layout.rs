//! View-stride validation and storage-order inference.

use serde::{Deserialize, Serialize};

use crate::{GridError, Result};

/// Storage order of a strided view.
///
/// Purely advisory: it selects the loop nesting of bulk traversals, not the
/// meaning of any index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// First index varies fastest.
    ColumnMajor,
    /// Last index varies fastest.
    RowMajor,
    NonSpecific,
}

/// Compute column-major strides (first index varies fastest).
pub fn col_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in 1..rank {
        strides[i] = strides[i - 1] * dims[i - 1] as isize;
    }
    strides
}

/// Compute row-major strides (last index varies fastest).
pub fn row_major_strides(dims: &[usize]) -> Vec<isize> {
    let rank = dims.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * dims[i + 1] as isize;
    }
    strides
}

/// Check that a view fits its buffer and classify its order.
///
/// Starting from `[offset, offset]`, each dimension widens the max bound by
/// `(dim - 1) * stride` when the stride is positive and the min bound when it
/// is negative.
///
/// # Errors
/// - `StrideLengthMismatch` if `dims` and `strides` differ in length
/// - `OffsetOverflow` if the bounds do not fit in `isize`
/// - `ViewOutOfBounds` if the touched interval leaves `[0, buffer_len)`
pub fn validate_view(
    buffer_len: usize,
    dims: &[usize],
    strides: &[isize],
    offset: isize,
) -> Result<Order> {
    if dims.len() != strides.len() {
        return Err(GridError::StrideLengthMismatch);
    }
    let mut min_offset = offset;
    let mut max_offset = offset;
    for (&dim, &stride) in dims.iter().zip(strides.iter()) {
        if dim > 1 {
            let end = stride
                .checked_mul(dim as isize - 1)
                .ok_or(GridError::OffsetOverflow)?;
            if end >= 0 {
                max_offset = max_offset
                    .checked_add(end)
                    .ok_or(GridError::OffsetOverflow)?;
            } else {
                min_offset = min_offset
                    .checked_add(end)
                    .ok_or(GridError::OffsetOverflow)?;
            }
        }
    }
    if min_offset < 0 || max_offset < 0 || max_offset as usize >= buffer_len {
        tracing::debug!(
            ?dims,
            ?strides,
            offset,
            buffer_len,
            "strided view leaves its buffer"
        );
        return Err(GridError::ViewOutOfBounds {
            min: min_offset,
            max: max_offset,
            len: buffer_len,
        });
    }
    Ok(classify_order(dims, strides))
}

/// Classify the storage order of a stride vector.
///
/// Dimensions of extent 1 are ignored. The remaining ones are column-major
/// when each stride is non-zero and at least the span of the previous
/// dimension (`|s[k+1]| >= |s[k]| * dims[k]`), so the magnitudes are
/// non-decreasing and a first-index-fastest traversal never revisits a buffer
/// position. Row-major is the mirrored condition. When both hold (at most one
/// non-singleton dimension) column-major is reported.
pub fn classify_order(dims: &[usize], strides: &[isize]) -> Order {
    let active: Vec<(usize, usize)> = dims
        .iter()
        .zip(strides.iter())
        .filter(|&(&d, _)| d > 1)
        .map(|(&d, &s)| (d, s.unsigned_abs()))
        .collect();

    if active.iter().any(|&(_, s)| s == 0) {
        return Order::NonSpecific;
    }
    let nested = |inner: (usize, usize), outer: (usize, usize)| {
        inner.1.checked_mul(inner.0).is_some_and(|span| outer.1 >= span)
    };
    if active.windows(2).all(|w| nested(w[0], w[1])) {
        return Order::ColumnMajor;
    }
    if active.windows(2).all(|w| nested(w[1], w[0])) {
        return Order::RowMajor;
    }
    Order::NonSpecific
}

/// Compute the relative order of strides.
///
/// Returns a vector where `result[i]` is the rank of `strides[i]` among all
/// non-zero strides. Zero strides have order 1.
pub fn index_order(strides: &[isize]) -> Vec<usize> {
    let n = strides.len();
    let mut result = vec![1usize; n];

    for i in 0..n {
        let si = strides[i].unsigned_abs();
        if si == 0 {
            continue;
        }
        let mut k = 1usize;
        for &s in strides {
            if s != 0 && s.unsigned_abs() < si {
                k += 1;
            }
        }
        result[i] = k;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_col_major_strides() {
        assert_eq!(col_major_strides(&[3, 4]), vec![1, 3]);
        assert_eq!(col_major_strides(&[2, 3, 4]), vec![1, 2, 6]);
        assert!(col_major_strides(&[]).is_empty());
    }

    #[test]
    fn test_row_major_strides() {
        assert_eq!(row_major_strides(&[3, 4]), vec![4, 1]);
        assert_eq!(row_major_strides(&[2, 3, 4]), vec![12, 4, 1]);
    }

    #[test]
    fn test_validate_classifies_orders() {
        assert_eq!(
            validate_view(12, &[3, 4], &[1, 3], 0).unwrap(),
            Order::ColumnMajor
        );
        assert_eq!(
            validate_view(12, &[3, 4], &[4, 1], 0).unwrap(),
            Order::RowMajor
        );
        assert_eq!(classify_order(&[3, 4], &[2, 3]), Order::NonSpecific);
    }

    #[test]
    fn test_validate_out_of_bounds() {
        assert_eq!(
            validate_view(12, &[3, 4], &[2, 3], 0).unwrap_err(),
            GridError::ViewOutOfBounds {
                min: 0,
                max: 13,
                len: 12
            }
        );
        assert!(validate_view(5, &[2, 3], &[3, 1], 0).is_err());
        assert!(validate_view(6, &[2, 3], &[3, 1], 1).is_err());
        assert!(validate_view(7, &[2, 3], &[3, 1], 1).is_ok());
    }

    #[test]
    fn test_validate_negative_strides() {
        // reversed columns of a 3x4 column-major buffer
        assert_eq!(
            validate_view(12, &[3, 4], &[1, -3], 9).unwrap(),
            Order::ColumnMajor
        );
        let err = validate_view(12, &[3, 4], &[-1, 3], 1).unwrap_err();
        assert!(matches!(err, GridError::ViewOutOfBounds { min: -1, .. }));
    }

    #[test]
    fn test_validate_mismatch_and_overflow() {
        assert_eq!(
            validate_view(12, &[3, 4], &[1], 0),
            Err(GridError::StrideLengthMismatch)
        );
        assert_eq!(
            validate_view(12, &[3], &[isize::MAX], 0),
            Err(GridError::OffsetOverflow)
        );
    }

    #[test]
    fn test_classify_degenerate() {
        assert_eq!(classify_order(&[], &[]), Order::ColumnMajor);
        assert_eq!(classify_order(&[5], &[-7]), Order::ColumnMajor);
        // singleton dims carry arbitrary strides
        assert_eq!(classify_order(&[1, 4, 1], &[100, 3, 0]), Order::ColumnMajor);
        assert_eq!(classify_order(&[4, 1, 2], &[2, 9, 1]), Order::RowMajor);
        // aliasing strides are never ordered
        assert_eq!(classify_order(&[3, 4], &[1, 1]), Order::NonSpecific);
        assert_eq!(classify_order(&[3, 4], &[0, 1]), Order::NonSpecific);
    }

    #[test]
    fn test_classify_gapped_views() {
        // every other column of a 4x6 column-major buffer
        assert_eq!(classify_order(&[4, 3], &[1, 8]), Order::ColumnMajor);
        // 2x2x2 block of a row-major 4x4x4 buffer
        assert_eq!(classify_order(&[2, 2, 2], &[16, 4, 1]), Order::RowMajor);
    }

    #[test]
    fn test_column_major_traversal_visits_each_position_once() {
        let cases: [(&[usize], &[isize], isize); 3] = [
            (&[3, 4], &[1, 3], 0),
            (&[2, 3, 2], &[2, 6, -18], 18),
            (&[4, 3], &[-1, 8], 3),
        ];
        for (dims, strides, offset) in cases {
            assert_eq!(classify_order(dims, strides), Order::ColumnMajor);
            let mut seen = HashSet::new();
            let total: usize = dims.iter().product();
            let mut idx = vec![0usize; dims.len()];
            for _ in 0..total {
                let pos: isize = offset
                    + idx
                        .iter()
                        .zip(strides.iter())
                        .map(|(&i, &s)| i as isize * s)
                        .sum::<isize>();
                assert!(seen.insert(pos), "position {pos} visited twice");
                for d in 0..dims.len() {
                    idx[d] += 1;
                    if idx[d] < dims[d] {
                        break;
                    }
                    idx[d] = 0;
                }
            }
            assert_eq!(seen.len(), total);
        }
    }

    #[test]
    fn test_index_order() {
        assert_eq!(index_order(&[4, 1, 2]), vec![3, 1, 2]);
        assert_eq!(index_order(&[4, 0, 2]), vec![2, 1, 1]);
        assert_eq!(index_order(&[-4, 1, -2]), vec![3, 1, 2]);
        assert_eq!(index_order(&[3, 3, 3]), vec![1, 1, 1]);
    }
}
