//! Dense displacement fields over a sampling domain.

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};

use crate::image::ImageDomain;
use crate::interpolation::Interpolator;

/// A dense vector field attached to a sampling domain.
///
/// One rank-`D` tensor per spatial axis holds that axis' displacement
/// component in physical units, so the deformation is `x ↦ x + D(x)`.
/// `components[0]` displaces along x, `components[1]` along y, and so on.
///
/// Arithmetic is voxelwise; fields combined together must live on the same
/// domain.
#[derive(Debug, Clone)]
pub struct DisplacementField<B: Backend, const D: usize> {
    components: Vec<Tensor<B, D>>,
    domain: ImageDomain<D>,
}

impl<B: Backend, const D: usize> DisplacementField<B, D> {
    /// Create a field from per-axis component tensors.
    ///
    /// # Panics
    /// Panics if the component count is not `D` or a component shape does not
    /// match the domain size.
    pub fn new(components: Vec<Tensor<B, D>>, domain: ImageDomain<D>) -> Self {
        assert_eq!(components.len(), D, "one component tensor per spatial axis");
        for component in &components {
            assert_eq!(
                component.dims(),
                domain.size(),
                "component shape must match the domain size"
            );
        }
        Self { components, domain }
    }

    /// The zero field on a domain.
    pub fn zeros(domain: ImageDomain<D>, device: &B::Device) -> Self {
        let components = (0..D)
            .map(|_| Tensor::zeros(domain.size(), device))
            .collect();
        Self { components, domain }
    }

    /// Rebuild a field from an `[N, D]` vector view over a domain.
    pub fn from_vectors(vectors: Tensor<B, 2>, domain: ImageDomain<D>) -> Self {
        let components = (0..D)
            .map(|axis| {
                vectors
                    .clone()
                    .narrow(1, axis, 1)
                    .squeeze::<1>(1)
                    .reshape(domain.size())
            })
            .collect();
        Self { components, domain }
    }

    /// Per-axis component tensors.
    pub fn components(&self) -> &[Tensor<B, D>] {
        &self.components
    }

    /// The component tensor for a spatial axis (`0` = x).
    pub fn component(&self, axis: usize) -> &Tensor<B, D> {
        &self.components[axis]
    }

    /// Replace the component tensors, keeping the domain.
    pub fn with_components(&self, components: Vec<Tensor<B, D>>) -> Self {
        Self::new(components, self.domain.clone())
    }

    /// The sampling domain.
    pub fn domain(&self) -> &ImageDomain<D> {
        &self.domain
    }

    /// The device holding the components.
    pub fn device(&self) -> B::Device {
        self.components[0].device()
    }

    /// All displacement vectors as an `[N, D]` tensor in grid order.
    pub fn vectors(&self) -> Tensor<B, 2> {
        let n = self.domain.num_voxels();
        let columns: Vec<Tensor<B, 2>> = self
            .components
            .iter()
            .map(|component| component.clone().reshape([n, 1]))
            .collect();
        Tensor::cat(columns, 1)
    }

    /// Sample the field at continuous indices, one vector per row.
    pub fn sample<I: Interpolator<B>>(
        &self,
        indices: Tensor<B, 2>,
        interpolator: &I,
    ) -> Tensor<B, 2> {
        let n = indices.dims()[0];
        let columns: Vec<Tensor<B, 2>> = self
            .components
            .iter()
            .map(|component| {
                interpolator
                    .interpolate(component, indices.clone())
                    .reshape([n, 1])
            })
            .collect();
        Tensor::cat(columns, 1)
    }

    /// Voxelwise sum of two fields on the same domain.
    ///
    /// # Panics
    /// Panics if the domains differ.
    pub fn add(&self, other: &Self) -> Self {
        assert_eq!(self.domain, other.domain, "fields must share a domain");
        let components = self
            .components
            .iter()
            .zip(&other.components)
            .map(|(a, b)| a.clone() + b.clone())
            .collect();
        self.with_components(components)
    }

    /// Voxelwise scaling by a scalar.
    pub fn scaled(&self, factor: f64) -> Self {
        let components = self
            .components
            .iter()
            .map(|component| component.clone().mul_scalar(factor))
            .collect();
        self.with_components(components)
    }

    /// The largest vector magnitude over the grid.
    pub fn max_magnitude(&self) -> f64 {
        let mut squared = self.components[0].clone().powf_scalar(2.0);
        for component in &self.components[1..] {
            squared = squared + component.clone().powf_scalar(2.0);
        }
        let max: f64 = squared.max().into_scalar().elem();
        max.max(0.0).sqrt()
    }

    /// Whether every component value is finite.
    pub fn is_finite(&self) -> bool {
        self.components.iter().all(|component| {
            component
                .clone()
                .into_data()
                .as_slice::<f32>()
                .map(|values| values.iter().all(|v| v.is_finite()))
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::LinearInterpolator;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    fn constant_field(value: [f32; 2], size: [usize; 2]) -> DisplacementField<B, 2> {
        let device = Default::default();
        let n = size[0] * size[1];
        let components = value
            .iter()
            .map(|&v| Tensor::<B, 2>::from_data(TensorData::new(vec![v; n], size), &device))
            .collect();
        DisplacementField::new(components, ImageDomain::unit(size))
    }

    #[test]
    fn test_zeros_field() {
        let device = Default::default();
        let field = DisplacementField::<B, 2>::zeros(ImageDomain::unit([4, 4]), &device);
        assert_eq!(field.max_magnitude(), 0.0);
        assert!(field.is_finite());
    }

    #[test]
    fn test_add_and_scale() {
        let a = constant_field([1.0, 0.0], [4, 4]);
        let b = constant_field([0.5, 2.0], [4, 4]);

        let sum = a.add(&b);
        let sum_data = sum.component(1).clone().into_data();
        assert_eq!(sum_data.as_slice::<f32>().unwrap()[0], 2.0);

        let scaled = sum.scaled(2.0);
        let scaled_data = scaled.component(0).clone().into_data();
        assert_eq!(scaled_data.as_slice::<f32>().unwrap()[0], 3.0);
    }

    #[test]
    fn test_max_magnitude() {
        let field = constant_field([3.0, 4.0], [4, 4]);
        assert!((field.max_magnitude() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_vectors_roundtrip() {
        let field = constant_field([1.0, -2.0], [3, 5]);
        let rebuilt = DisplacementField::from_vectors(field.vectors(), field.domain().clone());
        let diff = rebuilt.add(&field.scaled(-1.0));
        assert_eq!(diff.max_magnitude(), 0.0);
    }

    #[test]
    fn test_sample_constant_field() {
        let field = constant_field([1.5, -0.5], [4, 4]);
        let device = Default::default();
        let indices = Tensor::<B, 2>::from_floats([[0.25, 2.75], [1.5, 1.5]], &device);
        let sampled = field.sample(indices, &LinearInterpolator::new());
        let data = sampled.into_data();
        let values = data.as_slice::<f32>().unwrap();
        assert!((values[0] - 1.5).abs() < 1e-6);
        assert!((values[1] + 0.5).abs() < 1e-6);
        assert!((values[2] - 1.5).abs() < 1e-6);
    }
}
