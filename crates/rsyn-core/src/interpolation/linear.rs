//! Linear interpolation (bilinear in 2-D, trilinear in 3-D).

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use serde::{Deserialize, Serialize};

use super::trait_::Interpolator;

/// Linear interpolator.
///
/// Gathers the 2^D surrounding grid values of every query point and blends
/// them with the product of per-axis fractional weights.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LinearInterpolator;

impl LinearInterpolator {
    /// Create a new linear interpolator.
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Interpolator<B> for LinearInterpolator {
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

        // Flat stride of each spatial axis; x (last tensor dim) has stride 1.
        let mut strides = [0usize; D];
        for axis in 0..D {
            let dim = D - 1 - axis;
            strides[axis] = dims[dim + 1..].iter().product();
        }

        let mut lo = Vec::with_capacity(D);
        let mut hi = Vec::with_capacity(D);
        let mut frac = Vec::with_capacity(D);
        for axis in 0..D {
            let limit = (dims[D - 1 - axis] - 1) as f64;
            let coord = indices.clone().narrow(1, axis, 1).squeeze::<1>(1);
            let floor = coord.clone().floor();
            frac.push(coord - floor.clone());
            lo.push(floor.clone().clamp(0.0, limit).int());
            hi.push((floor + 1.0).clamp(0.0, limit).int());
        }

        let one = Tensor::<B, 1>::ones([n], &device);
        let mut acc = Tensor::<B, 1>::zeros([n], &device);
        for corner in 0..(1usize << D) {
            let mut flat_idx = Tensor::<B, 1, Int>::zeros([n], &device);
            let mut weight = one.clone();
            for axis in 0..D {
                let upper = corner & (1 << axis) != 0;
                let sel = if upper { &hi[axis] } else { &lo[axis] };
                flat_idx = flat_idx + sel.clone().mul_scalar(strides[axis] as i32);
                weight = weight
                    * if upper {
                        frac[axis].clone()
                    } else {
                        one.clone() - frac[axis].clone()
                    };
            }
            acc = acc + flat.clone().gather(0, flat_idx) * weight;
        }
        acc
    }
}
