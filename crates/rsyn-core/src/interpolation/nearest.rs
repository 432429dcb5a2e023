//! Nearest-neighbor interpolation.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use super::trait_::Interpolator;

/// Nearest-neighbor interpolator.
///
/// Rounds each coordinate to the closest grid index.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborInterpolator;

impl NearestNeighborInterpolator {
    /// Create a new nearest-neighbor interpolator.
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Interpolator<B> for NearestNeighborInterpolator {
    fn interpolate<const D: usize>(
        &self,
        data: &Tensor<B, D>,
        indices: Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        let dims = data.dims();
        let n = indices.dims()[0];
        let device = indices.device();

        let total: usize = dims.iter().product();
        let flat = data.clone().reshape([total]);

        let mut flat_idx = Tensor::<B, 1, Int>::zeros([n], &device);
        for axis in 0..D {
            let dim = D - 1 - axis;
            let stride: usize = dims[dim + 1..].iter().product();
            let limit = (dims[dim] - 1) as f64;
            let coord = indices.clone().narrow(1, axis, 1).squeeze::<1>(1);
            let rounded = coord.round().clamp(0.0, limit).int();
            flat_idx = flat_idx + rounded.mul_scalar(stride as i32);
        }
        flat.gather(0, flat_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_nearest_rounds() {
        let device = Default::default();
        let data = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.0f32, 1.0, 10.0, 11.0], [2, 2]),
            &device,
        );

        let interpolator = NearestNeighborInterpolator::new();
        let indices =
            Tensor::<TestBackend, 2>::from_floats([[0.4, 0.4], [0.6, 0.6], [9.0, 9.0]], &device);
        let result = interpolator.interpolate(&data, indices).into_data();
        let values = result.as_slice::<f32>().unwrap();

        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], 11.0);
        assert_eq!(values[2], 11.0); // clamped
    }
}
