//! Thread-safety bounds that only bind with the `parallel` feature.
//!
//! Closures handed to the bulk kernels may run on the rayon pool when
//! `parallel` is enabled, so they must be [`Sync`] there. Without the feature
//! the bounds below hold for every type and single-threaded callers can pass
//! closures capturing `Rc` or `Cell` state.
//!
//! [`MaybeSync`] binds the element closures of `map_inplace`, `map_into` and
//! `reduce`. [`MaybeSendSync`] binds the accumulator type of `reduce`, whose
//! per-chunk partial results cross threads.

#[cfg(feature = "parallel")]
pub trait MaybeSync: Sync {}
#[cfg(feature = "parallel")]
impl<T: Sync> MaybeSync for T {}

#[cfg(feature = "parallel")]
pub trait MaybeSendSync: Send + Sync {}
#[cfg(feature = "parallel")]
impl<T: Send + Sync> MaybeSendSync for T {}

#[cfg(not(feature = "parallel"))]
pub trait MaybeSync {}
#[cfg(not(feature = "parallel"))]
impl<T> MaybeSync for T {}

#[cfg(not(feature = "parallel"))]
pub trait MaybeSendSync {}
#[cfg(not(feature = "parallel"))]
impl<T> MaybeSendSync for T {}
