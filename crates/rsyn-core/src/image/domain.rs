//! Sampling domain of an image or displacement field.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};

use crate::spatial::{Direction, Point, Spacing, Vector};

/// The regular sampling grid of an image or field in physical space.
///
/// Combines grid size with origin, spacing and direction so that continuous
/// indices can be mapped to physical points and back. Sizes follow the tensor
/// layout (`[Y, X]` in 2-D, `[Z, Y, X]` in 3-D) while origin, spacing and
/// direction follow the spatial axis order `(x, y[, z])`. Continuous index
/// coordinates are in axis order as well.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDomain<const D: usize> {
    size: [usize; D],
    origin: Point<D>,
    spacing: Spacing<D>,
    direction: Direction<D>,
}

impl<const D: usize> ImageDomain<D> {
    /// Create a new domain.
    pub fn new(
        size: [usize; D],
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
    ) -> Self {
        Self {
            size,
            origin,
            spacing,
            direction,
        }
    }

    /// A domain of the given size with unit spacing at the physical origin.
    pub fn unit(size: [usize; D]) -> Self {
        Self::new(
            size,
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
        )
    }

    /// Grid size in tensor layout order.
    pub fn size(&self) -> [usize; D] {
        self.size
    }

    /// Grid extent along a spatial axis (`0` = x).
    pub fn axis_size(&self, axis: usize) -> usize {
        self.size[D - 1 - axis]
    }

    /// Physical coordinate of the voxel at index zero.
    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    /// Physical distance between adjacent voxels, per axis.
    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    /// Orientation of the grid axes.
    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    /// Total number of voxels.
    pub fn num_voxels(&self) -> usize {
        self.size.iter().product()
    }

    /// Map a physical point to a continuous index.
    ///
    /// `index = (Direction⁻¹ * (point − origin)) / spacing`
    pub fn point_to_continuous_index(&self, point: &Point<D>) -> Point<D> {
        let diff = *point - self.origin;
        let inv_dir = self
            .direction
            .try_inverse()
            .expect("direction matrix must be invertible");
        let rotated = inv_dir * diff;

        let mut index = Point::<D>::origin();
        for i in 0..D {
            index[i] = rotated[i] / self.spacing[i];
        }
        index
    }

    /// Map a continuous index to a physical point.
    ///
    /// `point = origin + Direction * (index * spacing)`
    pub fn continuous_index_to_point(&self, index: &Point<D>) -> Point<D> {
        let mut scaled = Vector::<D>::zeros();
        for i in 0..D {
            scaled[i] = index[i] * self.spacing[i];
        }
        let rotated = self.direction * scaled;
        self.origin + rotated
    }

    /// Batch map physical points `[N, D]` to continuous indices `[N, D]`.
    pub fn world_to_index_tensor<B: Backend>(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();

        let origin_vec: Vec<f32> = (0..D).map(|i| self.origin[i] as f32).collect();
        let origin_tensor = Tensor::<B, 1>::from_data(TensorData::new(origin_vec, [D]), &device)
            .reshape([1, D]);

        // I = (P - O) @ T with T_rc = (Direction⁻¹)_cr / spacing_c
        let inv_dir = self
            .direction
            .try_inverse()
            .expect("direction matrix must be invertible");

        let mut t_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                t_data.push((inv_dir[(c, r)] / self.spacing[c]) as f32);
            }
        }
        let t_tensor = Tensor::<B, 2>::from_data(TensorData::new(t_data, [D, D]), &device);

        (points - origin_tensor).matmul(t_tensor)
    }

    /// Batch map continuous indices `[N, D]` to physical points `[N, D]`.
    pub fn index_to_world_tensor<B: Backend>(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = indices.device();

        let origin_vec: Vec<f32> = (0..D).map(|i| self.origin[i] as f32).collect();
        let origin_tensor = Tensor::<B, 1>::from_data(TensorData::new(origin_vec, [D]), &device)
            .reshape([1, D]);

        // P = O + I @ M with M_rc = spacing_r * Direction_cr
        let mut m_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                m_data.push((self.spacing[r] * self.direction[(c, r)]) as f32);
            }
        }
        let m_tensor = Tensor::<B, 2>::from_data(TensorData::new(m_data, [D, D]), &device);

        indices.matmul(m_tensor) + origin_tensor
    }

    /// Physical coordinates of the 2^D grid corners.
    pub fn corners(&self) -> Vec<Point<D>> {
        (0..(1usize << D))
            .map(|mask| {
                let mut index = Point::<D>::origin();
                for axis in 0..D {
                    if mask & (1 << axis) != 0 {
                        index[axis] = (self.axis_size(axis).saturating_sub(1)) as f64;
                    }
                }
                self.continuous_index_to_point(&index)
            })
            .collect()
    }

    /// Axis-aligned physical bounding box as (min, max) corners.
    pub fn bounds(&self) -> (Point<D>, Point<D>) {
        let corners = self.corners();
        let mut min = corners[0];
        let mut max = corners[0];
        for corner in &corners[1..] {
            for i in 0..D {
                min[i] = min[i].min(corner[i]);
                max[i] = max[i].max(corner[i]);
            }
        }
        (min, max)
    }

    /// Whether the physical bounding boxes of two domains intersect.
    pub fn overlaps(&self, other: &Self) -> bool {
        let (a_min, a_max) = self.bounds();
        let (b_min, b_max) = other.bounds();
        (0..D).all(|i| a_min[i] <= b_max[i] && b_min[i] <= a_max[i])
    }
}
