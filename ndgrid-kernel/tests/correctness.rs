use approx::assert_relative_eq;
use num_complex::Complex64;
use ndgrid_kernel::{
    convert, copy_into, fill, flatten, map_inplace, map_into, reduce, scale, shifted, sum,
    to_nested, to_vec, Array, BoundaryCondition, GridError, Layout, Order, Range, Shape,
    SharedBuffer,
};

fn shape(dims: &[usize]) -> Shape {
    Shape::new(dims.to_vec()).unwrap()
}

fn make_row_major(rows: usize, cols: usize) -> Array<f64> {
    let s = shape(&[rows, cols]);
    let data = (0..rows * cols).map(|i| i as f64).collect();
    let strides = s.row_major_strides();
    Array::wrap_strided(SharedBuffer::new(data), s, 0, &strides).unwrap()
}

#[test]
fn test_map_into_transposed() {
    let a = make_row_major(8, 5);
    let a_t = a.permute(&[1, 0]).unwrap();
    assert_eq!(a_t.order(), Order::ColumnMajor);

    let out = Array::<f64>::zeros(shape(&[5, 8]));
    map_into(&out, &a_t, |x| x * 2.0).unwrap();

    for i in 0..5 {
        for j in 0..8 {
            assert_relative_eq!(out.get(&[i, j]), a.get(&[j, i]) * 2.0, epsilon = 1e-10);
        }
    }
}

#[test]
fn test_map_into_between_views_of_one_buffer() {
    let a = Array::from_fn(shape(&[6]), |idx| idx[0] as f64);
    let front = a.view(&[Range::new(0, 2, 1)]).unwrap();
    let back = a.view(&[Range::new(5, 3, -1)]).unwrap();
    copy_into(&front, &back).unwrap();
    assert_eq!(to_vec(&a), vec![5.0, 4.0, 3.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_map_into_shape_mismatch() {
    let a = Array::<f64>::zeros(shape(&[3, 4]));
    let b = Array::<f64>::zeros(shape(&[4, 3]));
    assert!(matches!(
        map_into(&a, &b, |x| x),
        Err(GridError::NonConformableShape(..))
    ));
}

#[test]
fn test_map_into_nested_from_strided() {
    let src = make_row_major(3, 4);
    let dest = Array::<f64>::zeros_nested(shape(&[3, 4])).unwrap();
    copy_into(&dest, &src).unwrap();
    assert_eq!(dest.layout(), Layout::Nested);
    assert_eq!(to_vec(&dest), to_vec(&src));
}

#[test]
fn test_scale_reversed_view_touches_only_selection() {
    let a = make_row_major(4, 4);
    let v = a.view(&[Range::new(3, 0, -2), Range::all()]).unwrap();
    assert_eq!(v.dims(), &[2, 4]);
    scale(&v, -1.0);
    for i in 0..4 {
        for j in 0..4 {
            let base = (i * 4 + j) as f64;
            let expected = if i % 2 == 1 { -base } else { base };
            assert_relative_eq!(a.get(&[i, j]), expected);
        }
    }
}

#[test]
fn test_fill_non_specific_view() {
    let data = vec![0i32; 20];
    let a = Array::wrap_strided(SharedBuffer::new(data), shape(&[3, 4]), 1, &[2, 3]).unwrap();
    assert_eq!(a.order(), Order::NonSpecific);
    fill(&a, 7);
    let (buffer, _, _) = a.descriptor().unwrap();
    let touched = buffer.to_vec().iter().filter(|&&x| x == 7).count();
    assert_eq!(touched, 12);
    assert_eq!(sum(&a), 84);
}

#[test]
fn test_reduce_permuted_rank3() {
    let a = Array::from_fn(shape(&[3, 4, 5]), |idx| {
        (idx[0] * 100 + idx[1] * 10 + idx[2]) as f64
    });
    let p = a.permute(&[2, 0, 1]).unwrap();
    let total = reduce(&p, |x| x, |acc, x| acc + x, 0.0);
    assert_relative_eq!(total, sum(&a), epsilon = 1e-9);

    let max = reduce(&p, |x| x, f64::max, f64::MIN);
    assert_relative_eq!(max, 234.0);
}

#[test]
fn test_flatten_shares_dense_buffer() {
    let a = Array::from_fn(shape(&[3, 2]), |idx| (idx[0] + 3 * idx[1]) as f32);
    let data = flatten(&a, false);
    assert!(data.is_shared());
    let copied = flatten(&a, true);
    assert!(!copied.is_shared());
    assert_eq!(copied.into_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_flatten_row_major_copies_column_major() {
    let a = make_row_major(2, 3);
    let data = flatten(&a, false);
    assert!(!data.is_shared());
    assert_eq!(data.into_vec(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
}

#[test]
fn test_convert_across_layouts() {
    let rm = make_row_major(2, 3);
    let as_f32 = convert::<f64, f32>(&rm).unwrap();
    assert_eq!(as_f32.layout(), Layout::Strided);
    assert_eq!(as_f32.order(), Order::RowMajor);
    assert_eq!(to_vec(&as_f32), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);

    let nested = to_nested(&rm).unwrap();
    let as_c = convert::<f64, Complex64>(&nested).unwrap();
    assert_eq!(as_c.layout(), Layout::Nested);
    assert_eq!(as_c.get(&[1, 2]), Complex64::new(5.0, 0.0));

    assert!(matches!(
        convert::<Complex64, f64>(&as_c),
        Err(GridError::UnsupportedElementKind { .. })
    ));
}

#[test]
fn test_convert_same_type_shares_storage() {
    let a = Array::<i32>::zeros(shape(&[4]));
    let b = convert::<i32, i32>(&a).unwrap();
    assert!(a.shares_buffer(&b));
    map_inplace(&b, |x| x + 1);
    assert_eq!(to_vec(&a), vec![1; 4]);
}

#[test]
fn test_shifted_each_boundary() {
    let a = Array::from_fn(shape(&[5, 2]), |idx| (idx[0] + 10 * idx[1]) as i32);
    let clamp = shifted(&a, &[-2, 0], BoundaryCondition::Clamp).unwrap();
    assert_eq!(to_vec(&clamp), vec![0, 0, 0, 1, 2, 10, 10, 10, 11, 12]);

    let periodic = shifted(&a, &[1, 1], BoundaryCondition::Periodic).unwrap();
    assert_eq!(to_vec(&periodic), vec![11, 12, 13, 14, 10, 1, 2, 3, 4, 0]);

    let mirror = shifted(&a, &[2, 0], BoundaryCondition::Mirror).unwrap();
    assert_eq!(to_vec(&mirror), vec![2, 3, 4, 4, 3, 12, 13, 14, 14, 13]);

    assert!(matches!(
        shifted(&a, &[1], BoundaryCondition::Clamp),
        Err(GridError::RankMismatch(1, 2))
    ));
}
