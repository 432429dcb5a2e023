//! Multi-resolution image pyramids.

use burn::tensor::backend::Backend;

use super::gaussian::GaussianSmoothing;
use super::shrink::ShrinkImageFilter;
use crate::image::Image;

/// Coarse-to-fine sequence of smoothed, shrunk images.
///
/// Level 0 is the coarsest. Each level smooths the input with the level's
/// Gaussian sigma (physical units) and then keeps every N-th voxel.
pub struct ImagePyramid<B: Backend, const D: usize> {
    levels: Vec<Image<B, D>>,
}

impl<B: Backend, const D: usize> ImagePyramid<B, D> {
    /// Build a pyramid from per-level shrink factors and smoothing sigmas.
    ///
    /// # Panics
    /// Panics if the schedule lengths differ.
    pub fn new(input: &Image<B, D>, shrink_factors: &[usize], smoothing_sigmas: &[f64]) -> Self {
        assert_eq!(
            shrink_factors.len(),
            smoothing_sigmas.len(),
            "schedule lengths must match"
        );

        let mut levels = Vec::with_capacity(shrink_factors.len());
        for (&factor, &sigma) in shrink_factors.iter().zip(smoothing_sigmas.iter()) {
            let no_shrink = factor <= 1;
            let no_smooth = sigma <= 1e-6;

            if no_shrink && no_smooth {
                levels.push(input.clone());
                continue;
            }

            let smoothed = if no_smooth {
                input.clone()
            } else {
                GaussianSmoothing::uniform(sigma).apply(input)
            };

            let level = if no_shrink {
                smoothed
            } else {
                ShrinkImageFilter::uniform(factor).apply(&smoothed)
            };
            levels.push(level);
        }

        Self { levels }
    }

    /// The image at a level (0 = coarsest).
    pub fn level(&self, level: usize) -> &Image<B, D> {
        &self.levels[level]
    }

    /// Number of levels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// A power-of-two schedule, coarsest first.
    ///
    /// `levels = 3` gives factors `[4, 2, 1]` and sigmas `[2.0, 1.0, 0.0]`.
    pub fn default_schedule(levels: usize) -> (Vec<usize>, Vec<f64>) {
        let mut shrink_factors = Vec::with_capacity(levels);
        let mut smoothing_sigmas = Vec::with_capacity(levels);
        for i in 0..levels {
            let factor = 2usize.pow((levels - 1 - i) as u32);
            let sigma = if factor > 1 { 0.5 * factor as f64 } else { 0.0 };
            shrink_factors.push(factor);
            smoothing_sigmas.push(sigma);
        }
        (shrink_factors, smoothing_sigmas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageDomain;
    use burn::tensor::Tensor;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_pyramid_shapes_and_spacing() {
        let device = Default::default();
        let tensor = Tensor::<B, 2>::zeros([32, 32], &device);
        let image = Image::new(tensor, ImageDomain::unit([32, 32]));

        let pyramid = ImagePyramid::new(&image, &[4, 2, 1], &[2.0, 1.0, 0.0]);

        assert_eq!(pyramid.num_levels(), 3);
        assert_eq!(pyramid.level(0).shape(), [8, 8]);
        assert_eq!(pyramid.level(1).shape(), [16, 16]);
        assert_eq!(pyramid.level(2).shape(), [32, 32]);
        assert_eq!(pyramid.level(0).spacing()[0], 4.0);
        assert_eq!(pyramid.level(2).spacing()[0], 1.0);
    }

    #[test]
    fn test_default_schedule() {
        let (factors, sigmas) = ImagePyramid::<B, 2>::default_schedule(3);
        assert_eq!(factors, vec![4, 2, 1]);
        assert_eq!(sigmas, vec![2.0, 1.0, 0.0]);
    }
}
