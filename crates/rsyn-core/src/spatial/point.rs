//! Point type for positions in physical space.

use nalgebra::Point as NaPoint;
use serde::{Deserialize, Serialize};

use super::Vector;

/// A position in D-dimensional physical space.
///
/// Used for image origins and for continuous indices (which share the same
/// algebra even though their units are voxels rather than millimetres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point<const D: usize>(pub NaPoint<f64, D>);

impl<const D: usize> Point<D> {
    /// Create a new point from coordinates.
    pub fn new(coords: [f64; D]) -> Self {
        Self(NaPoint::from(coords))
    }

    /// The origin (all coordinates zero).
    pub fn origin() -> Self {
        Self(NaPoint::origin())
    }

    /// Create a point from a coordinate slice.
    ///
    /// # Panics
    /// Panics if the slice length does not equal `D`.
    pub fn from_slice(coords: &[f64]) -> Self {
        assert!(coords.len() == D, "coordinate slice length must match dimension");
        let mut point = Self::origin();
        for i in 0..D {
            point.0.coords[i] = coords[i];
        }
        point
    }

    /// Coordinates as a `Vec`.
    pub fn to_vec(&self) -> Vec<f64> {
        (0..D).map(|i| self.0.coords[i]).collect()
    }

    /// The inner nalgebra point.
    pub fn inner(&self) -> &NaPoint<f64, D> {
        &self.0
    }

    /// Mutable access to the inner nalgebra point.
    pub fn inner_mut(&mut self) -> &mut NaPoint<f64, D> {
        &mut self.0
    }
}

impl<const D: usize> std::ops::Index<usize> for Point<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0.coords[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Point<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0.coords[index]
    }
}

impl<const D: usize> std::ops::Sub for Point<D> {
    type Output = Vector<D>;

    fn sub(self, other: Self) -> Self::Output {
        Vector(self.0.coords - other.0.coords)
    }
}

impl<const D: usize> std::ops::Add<Vector<D>> for Point<D> {
    type Output = Self;

    fn add(self, vector: Vector<D>) -> Self::Output {
        Self(self.0 + vector.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Point3 = Point<3>;
    type Vector3 = Vector<3>;

    #[test]
    fn test_point_creation() {
        let p = Point3::new([1.0, 2.0, 3.0]);
        assert_eq!(p[0], 1.0);
        assert_eq!(p[1], 2.0);
        assert_eq!(p[2], 3.0);
    }

    #[test]
    fn test_point_origin() {
        let p = Point3::origin();
        assert_eq!(p.to_vec(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_point_subtraction() {
        let p1 = Point3::new([5.0, 5.0, 5.0]);
        let p2 = Point3::new([2.0, 3.0, 4.0]);
        assert_eq!(p1 - p2, Vector3::new([3.0, 2.0, 1.0]));
    }

    #[test]
    fn test_point_vector_addition() {
        let p = Point3::new([1.0, 2.0, 3.0]);
        let v = Vector3::new([4.0, 5.0, 6.0]);
        assert_eq!(p + v, Point3::new([5.0, 7.0, 9.0]));
    }
}
