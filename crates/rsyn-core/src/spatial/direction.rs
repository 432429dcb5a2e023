//! Direction type for image orientation.

use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

use super::Vector;

/// Direction matrix representing image orientation.
///
/// A D×D matrix whose column i is the direction of the i-th spatial axis in
/// physical space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction<const D: usize>(pub SMatrix<f64, D, D>);

impl<const D: usize> Direction<D> {
    /// The identity orientation (no rotation).
    pub fn identity() -> Self {
        Self(SMatrix::identity())
    }

    /// Build from a nalgebra matrix.
    pub fn from_matrix(matrix: SMatrix<f64, D, D>) -> Self {
        Self(matrix)
    }

    /// Whether the matrix is orthogonal (a rotation, possibly with flips).
    pub fn is_orthogonal(&self) -> bool {
        let product = self.0 * self.0.transpose();
        let identity = SMatrix::<f64, D, D>::identity();
        (0..D).all(|i| (0..D).all(|j| (product[(i, j)] - identity[(i, j)]).abs() < 1e-9))
    }

    /// Matrix inverse, if the matrix is invertible.
    pub fn try_inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    /// The inner nalgebra matrix.
    pub fn inner(&self) -> &SMatrix<f64, D, D> {
        &self.0
    }

    /// Mutable access to the inner nalgebra matrix.
    pub fn inner_mut(&mut self) -> &mut SMatrix<f64, D, D> {
        &mut self.0
    }
}

impl<const D: usize> std::ops::Index<(usize, usize)> for Direction<D> {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::Mul<Vector<D>> for Direction<D> {
    type Output = Vector<D>;

    fn mul(self, vector: Vector<D>) -> Self::Output {
        Vector(self.0 * vector.0)
    }
}

impl<const D: usize> std::ops::Mul<Direction<D>> for Direction<D> {
    type Output = Direction<D>;

    fn mul(self, other: Direction<D>) -> Self::Output {
        Direction(self.0 * other.0)
    }
}
