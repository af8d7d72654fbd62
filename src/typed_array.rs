use num_complex::{Complex32, Complex64};

use ndgrid_kernel::{convert, to_vec};
use ndgrid_view::{Array, Element, ElementKind, Layout, Result, Shape};

/// An array whose element kind is only known at runtime.
#[derive(Debug, Clone)]
pub enum TypedArray {
    I8(Array<i8>),
    I16(Array<i16>),
    I32(Array<i32>),
    I64(Array<i64>),
    U8(Array<u8>),
    F32(Array<f32>),
    F64(Array<f64>),
    C32(Array<Complex32>),
    C64(Array<Complex64>),
}

macro_rules! dispatch {
    ($value:expr, $a:ident => $body:expr) => {
        match $value {
            TypedArray::I8($a) => $body,
            TypedArray::I16($a) => $body,
            TypedArray::I32($a) => $body,
            TypedArray::I64($a) => $body,
            TypedArray::U8($a) => $body,
            TypedArray::F32($a) => $body,
            TypedArray::F64($a) => $body,
            TypedArray::C32($a) => $body,
            TypedArray::C64($a) => $body,
        }
    };
}

macro_rules! impl_from_array {
    ($($t:ty => $variant:ident),*) => {
        $(
            impl From<Array<$t>> for TypedArray {
                fn from(a: Array<$t>) -> Self {
                    TypedArray::$variant(a)
                }
            }
        )*
    };
}

impl_from_array!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    f32 => F32,
    f64 => F64,
    Complex32 => C32,
    Complex64 => C64
);

/// Cast `a` into an array of `kind`.
fn convert_to<T: Element>(a: &Array<T>, kind: ElementKind) -> Result<TypedArray> {
    Ok(match kind {
        ElementKind::I8 => TypedArray::I8(convert(a)?),
        ElementKind::I16 => TypedArray::I16(convert(a)?),
        ElementKind::I32 => TypedArray::I32(convert(a)?),
        ElementKind::I64 => TypedArray::I64(convert(a)?),
        ElementKind::U8 => TypedArray::U8(convert(a)?),
        ElementKind::F32 => TypedArray::F32(convert(a)?),
        ElementKind::F64 => TypedArray::F64(convert(a)?),
        ElementKind::C32 => TypedArray::C32(convert(a)?),
        ElementKind::C64 => TypedArray::C64(convert(a)?),
    })
}

impl TypedArray {
    /// Flat zero-filled array of `kind`.
    pub fn zeros(kind: ElementKind, shape: Shape) -> Self {
        match kind {
            ElementKind::I8 => Array::<i8>::zeros(shape).into(),
            ElementKind::I16 => Array::<i16>::zeros(shape).into(),
            ElementKind::I32 => Array::<i32>::zeros(shape).into(),
            ElementKind::I64 => Array::<i64>::zeros(shape).into(),
            ElementKind::U8 => Array::<u8>::zeros(shape).into(),
            ElementKind::F32 => Array::<f32>::zeros(shape).into(),
            ElementKind::F64 => Array::<f64>::zeros(shape).into(),
            ElementKind::C32 => Array::<Complex32>::zeros(shape).into(),
            ElementKind::C64 => Array::<Complex64>::zeros(shape).into(),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            TypedArray::I8(_) => ElementKind::I8,
            TypedArray::I16(_) => ElementKind::I16,
            TypedArray::I32(_) => ElementKind::I32,
            TypedArray::I64(_) => ElementKind::I64,
            TypedArray::U8(_) => ElementKind::U8,
            TypedArray::F32(_) => ElementKind::F32,
            TypedArray::F64(_) => ElementKind::F64,
            TypedArray::C32(_) => ElementKind::C32,
            TypedArray::C64(_) => ElementKind::C64,
        }
    }

    pub fn shape(&self) -> &Shape {
        dispatch!(self, a => a.shape())
    }

    pub fn dims(&self) -> &[usize] {
        dispatch!(self, a => a.dims())
    }

    pub fn layout(&self) -> Layout {
        dispatch!(self, a => a.layout())
    }

    /// Cast to `kind`. Converting to the current kind returns a new handle on
    /// the same storage.
    ///
    /// # Errors
    /// `UnsupportedElementKind` for complex to real.
    pub fn convert(&self, kind: ElementKind) -> Result<TypedArray> {
        dispatch!(self, a => convert_to(a, kind))
    }

    /// Column-major copy of the elements as `f64`, for serialization layers.
    ///
    /// # Errors
    /// `UnsupportedElementKind` for complex arrays.
    pub fn flatten_f64(&self) -> Result<Vec<f64>> {
        dispatch!(self, a => Ok(to_vec(&convert::<_, f64>(a)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndgrid_view::GridError;

    fn shape(dims: &[usize]) -> Shape {
        Shape::new(dims.to_vec()).unwrap()
    }

    #[test]
    fn test_zeros_every_kind() {
        for kind in ElementKind::ALL {
            let t = TypedArray::zeros(kind, shape(&[2, 3]));
            assert_eq!(t.kind(), kind);
            assert_eq!(t.dims(), &[2, 3]);
            assert_eq!(t.layout(), Layout::Flat);
        }
    }

    #[test]
    fn test_convert_between_kinds() {
        let a = Array::from_fn(shape(&[2, 2]), |idx| (idx[0] * 2 + idx[1]) as i16 - 1);
        let t = TypedArray::from(a);
        let f = t.convert(ElementKind::F32).unwrap();
        assert_eq!(f.kind(), ElementKind::F32);
        let u = t.convert(ElementKind::U8).unwrap();
        match u {
            TypedArray::U8(u) => assert_eq!(u.get(&[0, 0]), 255),
            other => panic!("unexpected kind {}", other.kind()),
        }
    }

    #[test]
    fn test_convert_same_kind_shares() {
        let a = Array::from_fn(shape(&[3]), |idx| idx[0] as f64);
        let t = TypedArray::from(a.clone());
        match t.convert(ElementKind::F64).unwrap() {
            TypedArray::F64(b) => assert!(b.shares_buffer(&a)),
            other => panic!("unexpected kind {}", other.kind()),
        }
    }

    #[test]
    fn test_flatten_f64() {
        let a = Array::from_fn(shape(&[2, 2]), |idx| (idx[0] + 2 * idx[1]) as u8);
        let t = TypedArray::from(a.permute(&[1, 0]).unwrap());
        let values = t.flatten_f64().unwrap();
        let expected = [0.0, 2.0, 1.0, 3.0];
        for (v, e) in values.iter().zip(expected) {
            assert_relative_eq!(*v, e);
        }

        let c = TypedArray::zeros(ElementKind::C32, shape(&[2]));
        assert!(matches!(
            c.flatten_f64(),
            Err(GridError::UnsupportedElementKind { .. })
        ));
    }
}
