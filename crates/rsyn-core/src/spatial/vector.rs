//! Vector type for displacements and other directed quantities.

use nalgebra::SVector;
use serde::{Deserialize, Serialize};

/// A vector in D-dimensional space.
///
/// Represents displacements, offsets and per-axis quantities such as spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector<const D: usize>(pub SVector<f64, D>);

impl<const D: usize> Vector<D> {
    /// Create a new vector from components.
    pub fn new(components: [f64; D]) -> Self {
        Self(SVector::from(components))
    }

    /// The zero vector.
    pub fn zeros() -> Self {
        Self(SVector::zeros())
    }

    /// Create a vector from a component slice.
    ///
    /// # Panics
    /// Panics if the slice length does not equal `D`.
    pub fn from_slice(components: &[f64]) -> Self {
        assert!(components.len() == D, "component slice length must match dimension");
        let mut vector = Self::zeros();
        for i in 0..D {
            vector.0[i] = components[i];
        }
        vector
    }

    /// Components as a `Vec`.
    pub fn to_vec(&self) -> Vec<f64> {
        (0..D).map(|i| self.0[i]).collect()
    }

    /// Euclidean length.
    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    /// The inner nalgebra vector.
    pub fn inner(&self) -> &SVector<f64, D> {
        &self.0
    }

    /// Mutable access to the inner nalgebra vector.
    pub fn inner_mut(&mut self) -> &mut SVector<f64, D> {
        &mut self.0
    }
}

impl<const D: usize> std::ops::Index<usize> for Vector<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Vector<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const D: usize> std::ops::Add for Vector<D> {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl<const D: usize> std::ops::Sub for Vector<D> {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self(self.0 - other.0)
    }
}

impl<const D: usize> std::ops::Mul<f64> for Vector<D> {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self(self.0 * scalar)
    }
}

impl<const D: usize> std::ops::Div<f64> for Vector<D> {
    type Output = Self;

    fn div(self, scalar: f64) -> Self::Output {
        Self(self.0 / scalar)
    }
}

impl<const D: usize> std::ops::Neg for Vector<D> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Vector3 = Vector<3>;

    #[test]
    fn test_vector_creation() {
        let v = Vector3::new([1.0, 2.0, 3.0]);
        assert_eq!(v.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_vector_arithmetic() {
        let v1 = Vector3::new([1.0, 2.0, 3.0]);
        let v2 = Vector3::new([4.0, 5.0, 6.0]);

        assert_eq!(v1 + v2, Vector3::new([5.0, 7.0, 9.0]));
        assert_eq!(v2 - v1, Vector3::new([3.0, 3.0, 3.0]));
        assert_eq!(v1 * 2.0, Vector3::new([2.0, 4.0, 6.0]));
        assert_eq!(v2 / 2.0, Vector3::new([2.0, 2.5, 3.0]));
        assert_eq!(-v1, Vector3::new([-1.0, -2.0, -3.0]));
    }

    #[test]
    fn test_vector_norm() {
        let v = Vector3::new([3.0, 4.0, 0.0]);
        assert!((v.norm() - 5.0).abs() < 1e-12);
    }
}
