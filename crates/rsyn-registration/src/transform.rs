//! Displacement-field transforms with maintained inverses.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use rsyn_core::field::DisplacementField;
use rsyn_core::image::ImageDomain;
use rsyn_core::interpolation::LinearInterpolator;

use crate::inversion::inverse_consistency_residual;

/// A dense transform `T(x) = x + D(x)` paired with its approximate inverse
/// field.
///
/// The inverse is not derived lazily: whoever mutates the forward field is
/// responsible for re-deriving the inverse (the driver does this after every
/// iteration), so both fields are always safe to read.
#[derive(Debug, Clone)]
pub struct DiffeomorphicTransform<B: Backend, const D: usize> {
    field: DisplacementField<B, D>,
    inverse_field: DisplacementField<B, D>,
}

impl<B: Backend, const D: usize> DiffeomorphicTransform<B, D> {
    /// Pair a forward field with its inverse.
    pub fn new(field: DisplacementField<B, D>, inverse_field: DisplacementField<B, D>) -> Self {
        Self {
            field,
            inverse_field,
        }
    }

    /// The identity transform on a domain.
    pub fn identity(domain: ImageDomain<D>, device: &B::Device) -> Self {
        Self {
            field: DisplacementField::zeros(domain.clone(), device),
            inverse_field: DisplacementField::zeros(domain, device),
        }
    }

    /// The forward displacement field.
    pub fn field(&self) -> &DisplacementField<B, D> {
        &self.field
    }

    /// The inverse displacement field.
    pub fn inverse_field(&self) -> &DisplacementField<B, D> {
        &self.inverse_field
    }

    /// The sampling domain of both fields.
    pub fn domain(&self) -> &ImageDomain<D> {
        self.field.domain()
    }

    /// Apply the forward transform to physical points `[N, D]`.
    pub fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let indices = self.domain().world_to_index_tensor(points.clone());
        let vectors = self.field.sample(indices, &LinearInterpolator::new());
        points + vectors
    }

    /// Apply the inverse transform to physical points `[N, D]`.
    pub fn inverse_transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let indices = self
            .inverse_field
            .domain()
            .world_to_index_tensor(points.clone());
        let vectors = self.inverse_field.sample(indices, &LinearInterpolator::new());
        points + vectors
    }

    /// Largest voxelwise violation of `D(x + D⁻¹(x)) + D⁻¹(x) = 0`.
    pub fn inverse_consistency_residual(&self) -> f64 {
        inverse_consistency_residual(&self.field, &self.inverse_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_identity_transform() {
        let device = Default::default();
        let transform = DiffeomorphicTransform::<B, 2>::identity(ImageDomain::unit([8, 8]), &device);

        let points = Tensor::<B, 2>::from_floats([[2.5, 3.5], [0.0, 7.0]], &device);
        let mapped = transform.transform_points(points.clone());

        let before = points.into_data();
        let after = mapped.into_data();
        assert_eq!(
            before.as_slice::<f32>().unwrap(),
            after.as_slice::<f32>().unwrap()
        );
        assert_eq!(transform.inverse_consistency_residual(), 0.0);
    }
}
