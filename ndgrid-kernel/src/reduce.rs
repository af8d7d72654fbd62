//! Folds over every element of an array.

use ndgrid_view::{Array, Element, Storage};

use crate::kernel::{use_parallel, LoopNest};
use crate::maybe_sync::{MaybeSendSync, MaybeSync};

/// Call `f` on every element, in the array's traversal order.
pub(crate) fn for_each_value<T: Element, F>(a: &Array<T>, mut f: F)
where
    F: FnMut(T),
{
    match a.storage() {
        Storage::Flat(buffer) => buffer.read().iter().for_each(|&x| f(x)),
        Storage::Strided {
            buffer,
            offset,
            strides,
            order,
        } => {
            let nest = LoopNest::new(a.dims(), *order, &[(*offset, &strides[..])]);
            let data = buffer.read();
            nest.for_each_position(|p| f(data[p[0] as usize]));
        }
        Storage::Nested(rows) => rows
            .read()
            .iter()
            .flat_map(|row| row.iter())
            .for_each(|&x| f(x)),
    }
}

/// Left fold seeded by the first element in traversal order.
///
/// For a single-element array the element itself is returned and `reducer`
/// is never called.
///
/// # Deadlocks
/// The buffer is read-locked while `reducer` runs; `reducer` must not lock
/// an array sharing it.
pub fn scan<T: Element, F>(a: &Array<T>, mut reducer: F) -> T
where
    F: FnMut(T, T) -> T,
{
    let mut acc: Option<T> = None;
    for_each_value(a, |x| {
        acc = Some(match acc {
            None => x,
            Some(prev) => reducer(prev, x),
        });
    });
    // every shape holds at least one element
    acc.unwrap_or_default()
}

/// Full reduction with map function: `reduce(init, op, map.(a))`.
///
/// With the `parallel` feature a large flat array is split into chunks that
/// each start from `init`, so `init` must be an identity of `reduce_fn`.
///
/// # Deadlocks
/// As for [`scan`], neither closure may lock an array sharing the buffer.
pub fn reduce<T: Element, U, M, R>(a: &Array<T>, map_fn: M, reduce_fn: R, init: U) -> U
where
    M: Fn(T) -> U + MaybeSync,
    R: Fn(U, U) -> U + MaybeSync,
    U: Clone + MaybeSendSync,
{
    if let Storage::Flat(buffer) = a.storage() {
        let data = buffer.read();
        if use_parallel(data.len()) {
            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;
                let nthreads = rayon::current_num_threads();
                let chunk_size = data.len().div_ceil(nthreads);
                return data
                    .par_chunks(chunk_size)
                    .map(|chunk| {
                        chunk
                            .iter()
                            .fold(init.clone(), |acc, &x| reduce_fn(acc, map_fn(x)))
                    })
                    .reduce(|| init.clone(), |x, y| reduce_fn(x, y));
            }
        }
        return data
            .iter()
            .fold(init, |acc, &x| reduce_fn(acc, map_fn(x)));
    }

    let fallback = init.clone();
    let mut acc = Some(init);
    for_each_value(a, |x| {
        acc = acc.take().map(|prev| reduce_fn(prev, map_fn(x)));
    });
    acc.unwrap_or(fallback)
}

/// Sum of all elements. Integer sums wrap on overflow.
pub fn sum<T: Element>(a: &Array<T>) -> T {
    reduce(a, |x| x, T::wrapping_add, T::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndgrid_view::{Range, Shape, SharedBuffer};

    fn shape(dims: &[usize]) -> Shape {
        Shape::new(dims.to_vec()).unwrap()
    }

    #[test]
    fn test_scan_visits_traversal_order() {
        let col = Array::from_vec(shape(&[2, 2]), vec![1, 2, 3, 4]).unwrap();
        let mut seen = Vec::new();
        let last = scan(&col, |_, x| {
            seen.push(x);
            x
        });
        assert_eq!(seen, vec![2, 3, 4]);
        assert_eq!(last, 4);

        // same logical contents, row-major storage
        let row =
            Array::wrap_strided(SharedBuffer::from(vec![1, 3, 2, 4]), shape(&[2, 2]), 0, &[2, 1])
                .unwrap();
        let mut seen = Vec::new();
        scan(&row, |_, x| {
            seen.push(x);
            x
        });
        assert_eq!(seen, vec![3, 2, 4]);
    }

    #[test]
    fn test_scan_max_is_order_independent() {
        let col = Array::from_fn(shape(&[3, 4]), |idx| ((idx[0] * 7 + idx[1] * 5) % 11) as i32);
        let row = col.permute(&[1, 0]).unwrap();
        assert_eq!(scan(&col, |a, b| a.max(b)), 10);
        assert_eq!(scan(&row, |a, b| a.max(b)), 10);
    }

    #[test]
    fn test_scan_single_element() {
        let a = Array::scalar(42u8);
        assert_eq!(scan(&a, |_, _| panic!("no second element")), 42);
    }

    #[test]
    fn test_sum_all_layouts() {
        let flat = Array::from_fn(shape(&[3, 4]), |idx| (idx[0] + 3 * idx[1]) as i64);
        let strided = flat.view(&[Range::reversed(), Range::all()]).unwrap();
        let rows: Vec<Vec<i64>> = (0..4)
            .map(|j| (0..3).map(|i| (i + 3 * j) as i64).collect())
            .collect();
        let nested = Array::from_rows(shape(&[3, 4]), rows).unwrap();
        assert_eq!(sum(&flat), 66);
        assert_eq!(sum(&strided), 66);
        assert_eq!(sum(&nested), 66);
    }

    #[test]
    fn test_sum_wraps_integers() {
        let a = Array::from_vec(shape(&[3]), vec![120i8, 10, 2]).unwrap();
        assert_eq!(sum(&a), -124);
    }

    #[test]
    fn test_reduce_with_map() {
        let a = Array::from_fn(shape(&[2, 3]), |idx| (idx[0] + idx[1]) as f32);
        let sq = reduce(&a, |x| (x * x) as f64, |x, y| x + y, 0.0);
        approx::assert_relative_eq!(sq, 19.0);
        let v = a.view(&[Range::at(1), Range::all()]).unwrap();
        let count = reduce(&v, |_| 1usize, |x, y| x + y, 0);
        assert_eq!(count, 3);
    }
}
