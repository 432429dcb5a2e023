//! Integer shrinking of images.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use crate::image::Image;

/// Shrink filter.
///
/// Keeps every N-th voxel along each axis and scales the spacing so the
/// physical extent is preserved. The origin is unchanged since sampling
/// starts at index zero.
pub struct ShrinkImageFilter<B: Backend> {
    factors: Vec<usize>,
    _backend: std::marker::PhantomData<B>,
}

impl<B: Backend> ShrinkImageFilter<B> {
    /// Create a filter with per-axis shrink factors (axis order, `>= 1`).
    pub fn new(factors: Vec<usize>) -> Self {
        Self {
            factors,
            _backend: std::marker::PhantomData,
        }
    }

    /// Create a filter with the same factor on every axis.
    pub fn uniform(factor: usize) -> Self {
        Self::new(vec![factor])
    }

    /// Apply the filter to an image.
    pub fn apply<const D: usize>(&self, image: &Image<B, D>) -> Image<B, D> {
        let mut data = image.data().clone();
        let device = data.device();
        let dims = data.dims();

        let mut new_spacing = *image.spacing();
        for dim in 0..D {
            let axis = D - 1 - dim;
            let factor = self
                .factors
                .get(axis)
                .copied()
                .unwrap_or_else(|| self.factors[0]);
            if factor <= 1 {
                continue;
            }

            let kept: Vec<i32> = (0..dims[dim]).step_by(factor).map(|i| i as i32).collect();
            let indices = Tensor::<B, 1, Int>::from_ints(kept.as_slice(), &device);
            data = data.select(dim, indices);

            new_spacing[axis] *= factor as f64;
        }

        Image::with_geometry(data, *image.origin(), new_spacing, *image.direction())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageDomain;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_shrink_by_two() {
        let device = Default::default();
        let data: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let tensor = Tensor::<B, 2>::from_data(TensorData::new(data, [10, 10]), &device);
        let image = Image::new(tensor, ImageDomain::unit([10, 10]));

        let shrunk = ShrinkImageFilter::uniform(2).apply(&image);

        assert_eq!(shrunk.shape(), [5, 5]);
        assert_eq!(shrunk.spacing()[0], 2.0);
        assert_eq!(shrunk.spacing()[1], 2.0);
        assert_eq!(shrunk.origin(), image.origin());

        // Row 1 of the shrunk image is row 2 of the input.
        let values = shrunk.data().clone().into_data();
        let values = values.as_slice::<f32>().unwrap();
        assert_eq!(values[5], 20.0);
        assert_eq!(values[6], 22.0);
    }

    #[test]
    fn test_factor_one_is_identity() {
        let device = Default::default();
        let tensor = Tensor::<B, 2>::zeros([7, 9], &device);
        let image = Image::new(tensor, ImageDomain::unit([7, 9]));

        let shrunk = ShrinkImageFilter::uniform(1).apply(&image);
        assert_eq!(shrunk.shape(), [7, 9]);
        assert_eq!(shrunk.spacing()[0], 1.0);
    }
}
