//! Mean squared intensity difference metric.

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};

use rsyn_core::field::DisplacementField;
use rsyn_core::filter::WarpImageFilter;
use rsyn_core::image::{Image, ImageDomain};
use rsyn_core::interpolation::LinearInterpolator;

use super::trait_::SimilarityMetric;
use crate::error::{RegistrationError, Result};

/// Mean squared error between the two warped sources:
/// `MSE = mean((F∘T_F − M∘T_M)²)` over the virtual domain.
///
/// The derivative is the demons-style force
/// `2 (M∘T_M − F∘T_F) ∇(F∘T_F)`, the negative gradient of the MSE with
/// respect to the fixed-side displacement under the usual small-deformation
/// approximation.
pub struct MeanSquaresMetric<B: Backend, const D: usize> {
    interpolator: LinearInterpolator,
    state: Option<State<B, D>>,
}

struct State<B: Backend, const D: usize> {
    domain: ImageDomain<D>,
    warped_fixed: Tensor<B, D>,
    warped_moving: Tensor<B, D>,
}

impl<B: Backend, const D: usize> MeanSquaresMetric<B, D> {
    /// Create an unconfigured metric.
    pub fn new() -> Self {
        Self {
            interpolator: LinearInterpolator::new(),
            state: None,
        }
    }

    fn state(&self) -> Result<&State<B, D>> {
        self.state
            .as_ref()
            .ok_or_else(|| RegistrationError::metric("metric queried before configure"))
    }
}

impl<B: Backend, const D: usize> Default for MeanSquaresMetric<B, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend, const D: usize> SimilarityMetric<B, D> for MeanSquaresMetric<B, D> {
    fn configure(
        &mut self,
        virtual_domain: &ImageDomain<D>,
        fixed: &Image<B, D>,
        moving: &Image<B, D>,
        fixed_transform: &DisplacementField<B, D>,
        moving_transform: &DisplacementField<B, D>,
    ) -> Result<()> {
        let warp = WarpImageFilter::new(self.interpolator);
        let warped_fixed = warp.apply(fixed, fixed_transform, virtual_domain);
        let warped_moving = warp.apply(moving, moving_transform, virtual_domain);

        self.state = Some(State {
            domain: virtual_domain.clone(),
            warped_fixed: warped_fixed.data().clone(),
            warped_moving: warped_moving.data().clone(),
        });
        Ok(())
    }

    fn value(&self) -> Result<f64> {
        let state = self.state()?;
        let diff = state.warped_fixed.clone() - state.warped_moving.clone();
        let value: f64 = diff.powf_scalar(2.0).mean().into_scalar().elem();
        if !value.is_finite() {
            return Err(RegistrationError::metric("metric value is not finite"));
        }
        Ok(value)
    }

    fn derivative(&self) -> Result<DisplacementField<B, D>> {
        let state = self.state()?;
        let diff = state.warped_moving.clone() - state.warped_fixed.clone();
        let spacing = state.domain.spacing();

        let components = (0..D)
            .map(|axis| {
                let gradient = central_difference(&state.warped_fixed, D - 1 - axis)
                    .mul_scalar(1.0 / spacing[axis]);
                diff.clone() * gradient.mul_scalar(2.0)
            })
            .collect();

        Ok(DisplacementField::new(components, state.domain.clone()))
    }

    fn name(&self) -> &'static str {
        "MeanSquares"
    }
}

/// Central difference along one tensor dimension with replicated edges.
fn central_difference<B: Backend, const D: usize>(
    tensor: &Tensor<B, D>,
    dim: usize,
) -> Tensor<B, D> {
    let dims = tensor.dims();
    let n = dims[dim];
    if n < 2 {
        return Tensor::zeros(dims, &tensor.device());
    }

    let forward = Tensor::cat(
        vec![
            tensor.clone().narrow(dim, 1, n - 1),
            tensor.clone().narrow(dim, n - 1, 1),
        ],
        dim,
    );
    let backward = Tensor::cat(
        vec![
            tensor.clone().narrow(dim, 0, 1),
            tensor.clone().narrow(dim, 0, n - 1),
        ],
        dim,
    );
    (forward - backward).mul_scalar(0.5)
}
