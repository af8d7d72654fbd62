//! Reference-counted element storage shared between an array and its views.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared handle on a container of elements.
///
/// Cloning the handle shares the storage; the storage is dropped with the last
/// handle. Every access takes the lock for its own duration only. A poisoned
/// lock is entered anyway since the container holds plain values.
pub struct Shared<C> {
    inner: Arc<RwLock<C>>,
}

/// One flat buffer, indexed by linear offset.
pub type SharedBuffer<T> = Shared<Vec<T>>;

/// Contiguous rows of a nested array.
pub type SharedRows<T> = Shared<Vec<Vec<T>>>;

impl<C> Shared<C> {
    pub fn new(container: C) -> Self {
        Self {
            inner: Arc::new(RwLock::new(container)),
        }
    }

    /// Lock for reading.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, C> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock for writing.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, C> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles refer to the same storage.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address of the storage. Code locking two buffers at once takes the
    /// locks in increasing `id` order.
    #[inline]
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Number of live handles on this storage.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Take the container back if this is the last handle.
    pub fn try_unwrap(self) -> std::result::Result<C, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(lock) => Ok(lock.into_inner().unwrap_or_else(PoisonError::into_inner)),
            Err(inner) => Err(Self { inner }),
        }
    }
}

impl<T> Shared<Vec<T>> {
    /// Number of elements in the buffer.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl<T: Clone> Shared<Vec<T>> {
    /// Copy the buffer contents out.
    pub fn to_vec(&self) -> Vec<T> {
        self.read().clone()
    }
}

impl<C> Clone for Shared<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> fmt::Debug for Shared<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish_non_exhaustive()
    }
}

impl<T> From<Vec<T>> for Shared<Vec<T>> {
    fn from(data: Vec<T>) -> Self {
        Shared::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_handles() {
        let a = SharedBuffer::from(vec![1, 2, 3]);
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.handle_count(), 2);
        b.write()[1] = 20;
        assert_eq!(a.to_vec(), vec![1, 20, 3]);

        let a = match a.try_unwrap() {
            Err(a) => a,
            Ok(_) => panic!("storage still shared"),
        };
        drop(b);
        assert_eq!(a.try_unwrap().unwrap(), vec![1, 20, 3]);
    }

    #[test]
    fn test_distinct_buffers() {
        let a = SharedBuffer::from(vec![0.0f64; 4]);
        let b = SharedBuffer::from(vec![0.0f64; 4]);
        assert!(!a.ptr_eq(&b));
        assert_eq!(a.len(), 4);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_rows() {
        let rows: SharedRows<i32> = Shared::new(vec![vec![1, 2], vec![3, 4]]);
        assert_eq!(rows.read()[1][0], 3);
        rows.write()[0][1] = 9;
        assert_eq!(rows.read()[0], vec![1, 9]);
    }
}
