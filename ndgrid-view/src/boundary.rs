//! Boundary conditions for indices past the edge of a dimension.

use serde::{Deserialize, Serialize};

/// Policy mapping an out-of-range index back into `[0, length)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryCondition {
    /// Repeat the nearest edge element.
    #[default]
    #[serde(alias = "normal")]
    Clamp,
    /// Wrap around.
    Periodic,
    /// Fold back at the edges.
    Mirror,
}

impl BoundaryCondition {
    /// Map `index` into `[0, length)`.
    ///
    /// # Panics
    /// Panics if `length` is 0.
    #[inline]
    pub fn resolve(self, index: isize, length: usize) -> usize {
        assert!(length > 0, "boundary resolution on an empty dimension");
        let len = length as isize;
        match self {
            BoundaryCondition::Clamp => index.clamp(0, len - 1) as usize,
            BoundaryCondition::Periodic => index.rem_euclid(len) as usize,
            BoundaryCondition::Mirror => {
                let period = 2 * length;
                let k = index.unsigned_abs() % period;
                if k >= length {
                    period - 1 - k
                } else {
                    k
                }
            }
        }
    }

    /// Index table for a window of `length` elements shifted by `offset`.
    ///
    /// Entry `i` is `self.resolve(i + offset, length)`; stencil kernels read
    /// neighbor `i + offset` of element `i` through it.
    pub fn build_index(self, length: usize, offset: isize) -> Vec<usize> {
        (0..length)
            .map(|i| self.resolve(i as isize + offset, length))
            .collect()
    }
}

/// Free-function form of [`BoundaryCondition::build_index`].
pub fn build_index(length: usize, offset: isize, condition: BoundaryCondition) -> Vec<usize> {
    condition.build_index(length, offset)
}
