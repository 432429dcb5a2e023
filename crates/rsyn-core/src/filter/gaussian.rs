//! Separable Gaussian smoothing.

use burn::tensor::backend::Backend;
use burn::tensor::ops::ConvOptions;
use burn::tensor::Tensor;

use crate::image::Image;

/// Default cap on the 1-D kernel radius, in samples.
const DEFAULT_MAX_KERNEL_WIDTH: usize = 32;

/// Smooth a tensor with a separable Gaussian, one 1-D pass per dimension.
///
/// `pixel_sigmas` are standard deviations in voxel units, in spatial axis
/// order `(x, y[, z])`. Axes with near-zero sigma are passed through
/// untouched, so an all-zero sigma vector is an exact identity.
pub fn smooth_separable<B: Backend, const D: usize>(
    input: Tensor<B, D>,
    pixel_sigmas: [f64; D],
    max_kernel_width: usize,
) -> Tensor<B, D> {
    let mut data = input;
    let device = data.device();

    for dim in 0..D {
        let sigma = pixel_sigmas[D - 1 - dim];
        if sigma <= 1e-6 {
            continue;
        }

        let mut radius = (3.0 * sigma).ceil() as usize;
        let max_radius = (max_kernel_width.max(3) - 1) / 2;
        radius = radius.clamp(1, max_radius);

        let kernel = gaussian_kernel(sigma, radius);
        let kernel_tensor = Tensor::<B, 1>::from_floats(kernel.as_slice(), &device);

        data = convolve_1d::<B, D>(data, kernel_tensor, dim);
    }
    data
}

/// Gaussian smoothing filter for images.
///
/// Standard deviations are given in physical units and divided by the image
/// spacing before convolution.
pub struct GaussianSmoothing<B: Backend> {
    sigmas: Vec<f64>,
    max_kernel_width: usize,
    _backend: std::marker::PhantomData<B>,
}

impl<B: Backend> GaussianSmoothing<B> {
    /// Create a filter with per-axis standard deviations in physical units.
    pub fn new(sigmas: Vec<f64>) -> Self {
        Self {
            sigmas,
            max_kernel_width: DEFAULT_MAX_KERNEL_WIDTH,
            _backend: std::marker::PhantomData,
        }
    }

    /// Create a filter with the same standard deviation on every axis.
    pub fn uniform(sigma: f64) -> Self {
        Self::new(vec![sigma])
    }

    /// Cap the kernel width (diameter in samples).
    pub fn with_max_kernel_width(mut self, width: usize) -> Self {
        self.max_kernel_width = width;
        self
    }

    /// Apply the filter to an image.
    pub fn apply<const D: usize>(&self, image: &Image<B, D>) -> Image<B, D> {
        let spacing = image.spacing();
        let mut pixel_sigmas = [0.0; D];
        for axis in 0..D {
            let sigma = self
                .sigmas
                .get(axis)
                .copied()
                .unwrap_or_else(|| self.sigmas[0]);
            pixel_sigmas[axis] = sigma / spacing[axis];
        }

        let data = smooth_separable(image.data().clone(), pixel_sigmas, self.max_kernel_width);
        Image::new(data, image.domain().clone())
    }
}

fn gaussian_kernel(sigma: f64, radius: usize) -> Vec<f32> {
    let mut kernel = Vec::with_capacity(2 * radius + 1);
    let two_sigma2 = 2.0 * sigma * sigma;
    let mut sum = 0.0;

    for i in 0..=(2 * radius) {
        let x = i as f64 - radius as f64;
        let value = (-x * x / two_sigma2).exp();
        kernel.push(value as f32);
        sum += value;
    }
    for value in &mut kernel {
        *value /= sum as f32;
    }
    kernel
}

/// Convolve along one tensor dimension by permuting it last, flattening the
/// rest into a batch, and running a padded `conv1d`.
fn convolve_1d<B: Backend, const D: usize>(
    input: Tensor<B, D>,
    kernel: Tensor<B, 1>,
    dim: usize,
) -> Tensor<B, D> {
    let dims = input.dims();

    // Permute the target dimension to the last position.
    let mut permutation = [0isize; D];
    let mut slot = 0;
    for i in 0..D {
        if i != dim {
            permutation[slot] = i as isize;
            slot += 1;
        }
    }
    permutation[D - 1] = dim as isize;
    let permuted = input.permute(permutation);

    let length = dims[dim];
    let batch: usize = (0..D).filter(|&i| i != dim).map(|i| dims[i]).product();

    // [Batch, Channels=1, Length] against a [1, 1, K] kernel; padding K/2
    // with an odd kernel preserves the length.
    let reshaped = permuted.reshape([batch, 1, length]);
    let kernel_size = kernel.dims()[0];
    let kernel = kernel.reshape([1, 1, kernel_size]);

    let options = ConvOptions::new([1], [kernel_size / 2], [1], 1);
    let convolved = burn::tensor::module::conv1d(reshaped, kernel, None, options);

    let mut permuted_dims = [0usize; D];
    let mut slot = 0;
    for i in 0..D {
        if i != dim {
            permuted_dims[slot] = dims[i];
            slot += 1;
        }
    }
    permuted_dims[D - 1] = length;
    let output = convolved.reshape(permuted_dims);

    let mut inverse = [0isize; D];
    for (new_pos, &old_pos) in permutation.iter().enumerate() {
        inverse[old_pos as usize] = new_pos as isize;
    }
    output.permute(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageDomain;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    fn impulse_image(size: usize) -> Image<B, 2> {
        let device = Default::default();
        let mut data = vec![0.0f32; size * size];
        data[(size / 2) * size + size / 2] = 1.0;
        let tensor = Tensor::<B, 2>::from_data(TensorData::new(data, [size, size]), &device);
        Image::new(tensor, ImageDomain::unit([size, size]))
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let image = impulse_image(9);
        let smoothed = GaussianSmoothing::uniform(0.0).apply(&image);
        let before = image.data().clone().into_data();
        let after = smoothed.data().clone().into_data();
        assert_eq!(
            before.as_slice::<f32>().unwrap(),
            after.as_slice::<f32>().unwrap()
        );
    }

    #[test]
    fn test_smoothing_preserves_mass() {
        let image = impulse_image(17);
        let smoothed = GaussianSmoothing::uniform(1.5).apply(&image);

        let total: f32 = smoothed.data().clone().sum().into_scalar();
        assert!((total - 1.0).abs() < 1e-3, "kernel should be normalized, sum {total}");

        let peak: f32 = smoothed.data().clone().max().into_scalar();
        assert!(peak < 1.0, "impulse must spread out");
    }

    #[test]
    fn test_smoothing_respects_spacing() {
        // Physical sigma 2.0 over spacing 2.0 equals one voxel of smoothing.
        let device = Default::default();
        let mut data = vec![0.0f32; 15 * 15];
        data[7 * 15 + 7] = 1.0;
        let tensor = Tensor::<B, 2>::from_data(TensorData::new(data, [15, 15]), &device);
        let image = Image::with_geometry(
            tensor,
            crate::spatial::Point::origin(),
            crate::spatial::Spacing::uniform(2.0),
            crate::spatial::Direction::identity(),
        );

        let wide = GaussianSmoothing::uniform(2.0).apply(&image);
        let narrow = smooth_separable(image.data().clone(), [1.0, 1.0], 32);

        let a = wide.data().clone().into_data();
        let b = narrow.into_data();
        let a = a.as_slice::<f32>().unwrap();
        let b = b.as_slice::<f32>().unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }
}
