//! Warping images through displacement fields.

use burn::tensor::backend::Backend;

use crate::field::DisplacementField;
use crate::image::grid::generate_grid;
use crate::image::{Image, ImageDomain};
use crate::interpolation::Interpolator;

/// Resamples an image onto an output domain through a displacement field.
///
/// Every output voxel x is mapped to the input physical point `x + D(x)`
/// and the input is sampled there, so the field deforms the *sampling*
/// of the input (a pull-back warp).
pub struct WarpImageFilter<B: Backend, I: Interpolator<B>> {
    interpolator: I,
    _backend: std::marker::PhantomData<B>,
}

impl<B: Backend, I: Interpolator<B>> WarpImageFilter<B, I> {
    /// Create a warp filter with the given interpolator.
    pub fn new(interpolator: I) -> Self {
        Self {
            interpolator,
            _backend: std::marker::PhantomData,
        }
    }

    /// Warp `input` through `field` onto `output_domain`.
    pub fn apply<const D: usize>(
        &self,
        input: &Image<B, D>,
        field: &DisplacementField<B, D>,
        output_domain: &ImageDomain<D>,
    ) -> Image<B, D> {
        let device = input.device();

        let indices = generate_grid::<B, D>(output_domain.size(), &device);
        let points = output_domain.index_to_world_tensor(indices);

        let field_indices = field.domain().world_to_index_tensor(points.clone());
        let vectors = field.sample(field_indices, &self.interpolator);
        let warped_points = points + vectors;

        let input_indices = input.domain().world_to_index_tensor(warped_points);
        let values = self.interpolator.interpolate(input.data(), input_indices);

        let data = values.reshape(output_domain.size());
        Image::new(data, output_domain.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::LinearInterpolator;
    use burn::tensor::{Tensor, TensorData};
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_translation_warp_2d() {
        let device = Default::default();

        // 2x2 bright square at (4,4)..(5,5).
        let mut data = vec![0.0f32; 100];
        for (y, x) in [(4, 4), (4, 5), (5, 4), (5, 5)] {
            data[y * 10 + x] = 1.0;
        }
        let tensor = Tensor::<B, 2>::from_data(TensorData::new(data, [10, 10]), &device);
        let domain = ImageDomain::unit([10, 10]);
        let image = Image::new(tensor, domain.clone());

        // Constant field pointing at (-2, -1): output (x, y) samples the
        // input at (x-2, y-1), shifting content by (+2, +1).
        let comp_x = Tensor::<B, 2>::zeros([10, 10], &device).add_scalar(-2.0);
        let comp_y = Tensor::<B, 2>::zeros([10, 10], &device).add_scalar(-1.0);
        let field = DisplacementField::new(vec![comp_x, comp_y], domain.clone());

        let warped = WarpImageFilter::new(LinearInterpolator::new()).apply(&image, &field, &domain);

        let values = warped.data().clone().into_data();
        let values = values.as_slice::<f32>().unwrap();
        assert!(values[5 * 10 + 6] > 0.9);
        assert!(values[6 * 10 + 7] > 0.9);
        assert!(values[4 * 10 + 4] < 0.1);
    }

    #[test]
    fn test_zero_field_is_identity() {
        let device = Default::default();
        let data: Vec<f32> = (0..36).map(|i| i as f32).collect();
        let tensor = Tensor::<B, 2>::from_data(TensorData::new(data.clone(), [6, 6]), &device);
        let domain = ImageDomain::unit([6, 6]);
        let image = Image::new(tensor, domain.clone());

        let field = DisplacementField::zeros(domain.clone(), &device);
        let warped = WarpImageFilter::new(LinearInterpolator::new()).apply(&image, &field, &domain);

        let values = warped.data().clone().into_data();
        let values = values.as_slice::<f32>().unwrap();
        for (a, b) in values.iter().zip(data.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
