//! Image type pairing tensor data with physical geometry.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::domain::ImageDomain;
use crate::spatial::{Direction, Point, Spacing};

/// A scalar image over a regular grid in physical space.
///
/// Pixel data lives in a rank-`D` tensor (layout `[Y, X]` / `[Z, Y, X]`);
/// the [`ImageDomain`] maps grid indices to physical coordinates.
///
/// # Type Parameters
/// * `B` - The tensor backend
/// * `D` - The spatial dimensionality (2 or 3)
#[derive(Debug, Clone)]
pub struct Image<B: Backend, const D: usize> {
    data: Tensor<B, D>,
    domain: ImageDomain<D>,
}

impl<B: Backend, const D: usize> Image<B, D> {
    /// Create an image from data and its sampling domain.
    ///
    /// # Panics
    /// Panics if the tensor shape does not match the domain size.
    pub fn new(data: Tensor<B, D>, domain: ImageDomain<D>) -> Self {
        assert_eq!(
            data.dims(),
            domain.size(),
            "image data shape must match its domain size"
        );
        Self { data, domain }
    }

    /// Create an image from data and explicit geometry.
    pub fn with_geometry(
        data: Tensor<B, D>,
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
    ) -> Self {
        let domain = ImageDomain::new(data.dims(), origin, spacing, direction);
        Self { data, domain }
    }

    /// The pixel data.
    pub fn data(&self) -> &Tensor<B, D> {
        &self.data
    }

    /// The sampling domain.
    pub fn domain(&self) -> &ImageDomain<D> {
        &self.domain
    }

    /// Grid size in tensor layout order.
    pub fn shape(&self) -> [usize; D] {
        self.domain.size()
    }

    /// Physical coordinate of the first voxel.
    pub fn origin(&self) -> &Point<D> {
        self.domain.origin()
    }

    /// Physical distance between adjacent voxels.
    pub fn spacing(&self) -> &Spacing<D> {
        self.domain.spacing()
    }

    /// Orientation of the grid axes.
    pub fn direction(&self) -> &Direction<D> {
        self.domain.direction()
    }

    /// The device holding the pixel data.
    pub fn device(&self) -> B::Device {
        self.data.device()
    }
}
