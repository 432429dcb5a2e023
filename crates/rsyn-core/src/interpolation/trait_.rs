//! Interpolator trait for sampling gridded data at continuous indices.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Samples a rank-`D` tensor at a batch of continuous indices.
///
/// Indices are `[N, D]` in spatial axis order `(x, y[, z])` against data in
/// tensor layout (`[Y, X]` / `[Z, Y, X]`). Out-of-bounds coordinates are
/// clamped to the grid edge.
pub trait Interpolator<B: Backend> {
    /// Sample `data` at `indices`, returning one value per row.
    fn interpolate<const D: usize>(&self, data: &Tensor<B, D>, indices: Tensor<B, 2>)
        -> Tensor<B, 1>;
}
