//! Element kinds stored in ndgrid arrays.
//!
//! Every scalar kind the array layer supports implements [`Element`]. The
//! trait carries the runtime [`ElementKind`] tag and the two conversions used
//! by kind-changing bulk casts: widening into a [`Scalar`] carrier and
//! narrowing back out of it.
//!
//! Casting follows Rust `as` semantics on the carrier value:
//! - integer narrowing wraps (two's complement truncation)
//! - float to integer saturates, NaN becomes 0
//! - real to complex sets the imaginary part to zero
//! - complex to real has no defined meaning and yields `None`

use std::fmt;
use std::ops::{Add, Mul, Sub};

use num_complex::{Complex, Complex64};
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

/// Runtime tag naming one of the supported element types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    F32,
    F64,
    C32,
    C64,
}

impl ElementKind {
    /// All supported kinds, integers first.
    pub const ALL: [ElementKind; 9] = [
        ElementKind::I8,
        ElementKind::I16,
        ElementKind::I32,
        ElementKind::I64,
        ElementKind::U8,
        ElementKind::F32,
        ElementKind::F64,
        ElementKind::C32,
        ElementKind::C64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ElementKind::I8 => "i8",
            ElementKind::I16 => "i16",
            ElementKind::I32 => "i32",
            ElementKind::I64 => "i64",
            ElementKind::U8 => "u8",
            ElementKind::F32 => "f32",
            ElementKind::F64 => "f64",
            ElementKind::C32 => "c32",
            ElementKind::C64 => "c64",
        }
    }

    #[inline]
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ElementKind::I8 | ElementKind::I16 | ElementKind::I32 | ElementKind::I64 | ElementKind::U8
        )
    }

    #[inline]
    pub fn is_complex(self) -> bool {
        matches!(self, ElementKind::C32 | ElementKind::C64)
    }

    /// Size of one element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            ElementKind::I8 | ElementKind::U8 => 1,
            ElementKind::I16 => 2,
            ElementKind::I32 | ElementKind::F32 => 4,
            ElementKind::I64 | ElementKind::F64 | ElementKind::C32 => 8,
            ElementKind::C64 => 16,
        }
    }

    /// Whether values of this kind can be cast into `to`.
    ///
    /// The only refused direction is complex to real.
    pub fn can_cast_to(self, to: ElementKind) -> bool {
        !self.is_complex() || to.is_complex()
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Widest representation of a single element, used as the carrier for casts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Complex(Complex64),
}

/// Element types storable in an ndgrid array.
pub trait Element:
    Copy
    + Send
    + Sync
    + fmt::Debug
    + PartialEq
    + Default
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Zero
    + One
    + 'static
{
    /// Runtime tag for this type.
    const KIND: ElementKind;

    /// Widen into the cast carrier.
    fn to_scalar(self) -> Scalar;

    /// Narrow out of the cast carrier, `None` when the carrier kind has no
    /// meaning for `Self` (complex into real).
    fn from_scalar(value: Scalar) -> Option<Self>;

    /// Cast to another element type.
    #[inline]
    fn cast<U: Element>(self) -> Option<U> {
        U::from_scalar(self.to_scalar())
    }

    /// Sum that wraps around on integer overflow.
    #[inline]
    fn wrapping_add(self, rhs: Self) -> Self {
        self + rhs
    }

    /// Product that wraps around on integer overflow.
    #[inline]
    fn wrapping_mul(self, rhs: Self) -> Self {
        self * rhs
    }
}

macro_rules! impl_element_integer {
    ($($t:ty => $kind:ident),*) => {
        $(
            impl Element for $t {
                const KIND: ElementKind = ElementKind::$kind;

                #[inline]
                fn to_scalar(self) -> Scalar {
                    Scalar::Int(self as i64)
                }

                #[inline]
                fn from_scalar(value: Scalar) -> Option<Self> {
                    match value {
                        Scalar::Int(v) => Some(v as $t),
                        Scalar::Float(v) => Some(v as $t),
                        Scalar::Complex(_) => None,
                    }
                }

                #[inline]
                fn wrapping_add(self, rhs: Self) -> Self {
                    <$t>::wrapping_add(self, rhs)
                }

                #[inline]
                fn wrapping_mul(self, rhs: Self) -> Self {
                    <$t>::wrapping_mul(self, rhs)
                }
            }
        )*
    };
}

macro_rules! impl_element_float {
    ($($t:ty => $kind:ident),*) => {
        $(
            impl Element for $t {
                const KIND: ElementKind = ElementKind::$kind;

                #[inline]
                fn to_scalar(self) -> Scalar {
                    Scalar::Float(self as f64)
                }

                #[inline]
                fn from_scalar(value: Scalar) -> Option<Self> {
                    match value {
                        Scalar::Int(v) => Some(v as $t),
                        Scalar::Float(v) => Some(v as $t),
                        Scalar::Complex(_) => None,
                    }
                }
            }
        )*
    };
}

macro_rules! impl_element_complex {
    ($($r:ty => $kind:ident),*) => {
        $(
            impl Element for Complex<$r> {
                const KIND: ElementKind = ElementKind::$kind;

                #[inline]
                fn to_scalar(self) -> Scalar {
                    Scalar::Complex(Complex64::new(self.re as f64, self.im as f64))
                }

                #[inline]
                fn from_scalar(value: Scalar) -> Option<Self> {
                    Some(match value {
                        Scalar::Int(v) => Complex::new(v as $r, 0.0),
                        Scalar::Float(v) => Complex::new(v as $r, 0.0),
                        Scalar::Complex(c) => Complex::new(c.re as $r, c.im as $r),
                    })
                }
            }
        )*
    };
}

impl_element_integer!(i8 => I8, i16 => I16, i32 => I32, i64 => I64, u8 => U8);
impl_element_float!(f32 => F32, f64 => F64);
impl_element_complex!(f32 => C32, f64 => C64);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex32;

    fn kind_of<T: Element>() -> ElementKind {
        T::KIND
    }

    #[test]
    fn test_kinds() {
        assert_eq!(kind_of::<i8>(), ElementKind::I8);
        assert_eq!(kind_of::<u8>(), ElementKind::U8);
        assert_eq!(kind_of::<f64>(), ElementKind::F64);
        assert_eq!(kind_of::<Complex32>(), ElementKind::C32);
        assert_eq!(kind_of::<Complex64>(), ElementKind::C64);
    }

    #[test]
    fn test_size_of_matches_layout() {
        assert_eq!(ElementKind::I16.size_of(), std::mem::size_of::<i16>());
        assert_eq!(ElementKind::F32.size_of(), std::mem::size_of::<f32>());
        assert_eq!(ElementKind::C64.size_of(), std::mem::size_of::<Complex64>());
    }

    #[test]
    fn test_integer_narrowing_wraps() {
        assert_eq!(300i32.cast::<u8>(), Some(44));
        assert_eq!(200i32.cast::<i8>(), Some(-56));
        assert_eq!((-1i16).cast::<u8>(), Some(255));
    }

    #[test]
    fn test_float_to_integer_saturates() {
        assert_eq!(1e10f64.cast::<i32>(), Some(i32::MAX));
        assert_eq!((-3.7f32).cast::<i16>(), Some(-3));
        assert_eq!(f64::NAN.cast::<i64>(), Some(0));
    }

    #[test]
    fn test_widening() {
        assert_eq!(7u8.cast::<i64>(), Some(7));
        assert_relative_eq!(3i32.cast::<f64>().unwrap(), 3.0);
        assert_relative_eq!(0.5f32.cast::<f64>().unwrap(), 0.5);
    }

    #[test]
    fn test_complex_casts() {
        assert_eq!(2.5f64.cast::<Complex32>(), Some(Complex32::new(2.5, 0.0)));
        assert_eq!(
            Complex64::new(1.0, -2.0).cast::<Complex32>(),
            Some(Complex32::new(1.0, -2.0))
        );
        assert_eq!(Complex64::new(1.0, 0.0).cast::<f64>(), None);
        assert_eq!(Complex32::new(1.0, 0.0).cast::<i32>(), None);
    }

    fn add_mul<T: Element>(x: T, y: T) -> (T, T) {
        (Element::wrapping_add(x, y), Element::wrapping_mul(x, y))
    }

    #[test]
    fn test_integer_arithmetic_wraps() {
        assert_eq!(add_mul(100i8, 100i8), (-56, 16));
        assert_eq!(add_mul(200u8, 100u8), (44, 32));
        assert_eq!(add_mul(i64::MAX, 2), (i64::MIN + 1, -2));
        let (s, p) = add_mul(1.5f64, 2.0);
        assert_relative_eq!(s, 3.5);
        assert_relative_eq!(p, 3.0);
        assert_eq!(
            add_mul(Complex32::new(0.0, 1.0), Complex32::new(0.0, 1.0)),
            (Complex32::new(0.0, 2.0), Complex32::new(-1.0, 0.0))
        );
    }

    #[test]
    fn test_can_cast_to() {
        for from in ElementKind::ALL {
            for to in ElementKind::ALL {
                assert_eq!(from.can_cast_to(to), !(from.is_complex() && !to.is_complex()));
            }
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ElementKind::C64).unwrap();
        assert_eq!(json, "\"c64\"");
        let kind: ElementKind = serde_json::from_str("\"i16\"").unwrap();
        assert_eq!(kind, ElementKind::I16);
        assert_eq!(kind.to_string(), "i16");
    }
}
