//! Gaussian regularization of displacement fields.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use rsyn_core::field::DisplacementField;
use rsyn_core::filter::smooth_separable;

use crate::error::{RegistrationError, Result};

/// Smooths displacement fields with a separable Gaussian.
///
/// The variance is in voxel units and applies identically to every axis and
/// component. A variance of zero is an exact identity. After a smoothing
/// pass the displacement component normal to each image boundary plane is
/// zeroed, so deformations never push mass through the edge of the domain.
#[derive(Debug, Clone)]
pub struct FieldSmoother {
    variance: f64,
    max_kernel_width: usize,
}

impl FieldSmoother {
    /// Create a smoother with the given variance (voxel units, ≥ 0).
    pub fn new(variance: f64) -> Self {
        Self {
            variance,
            max_kernel_width: 32,
        }
    }

    /// Cap the kernel width (diameter in samples).
    pub fn with_max_kernel_width(mut self, width: usize) -> Self {
        self.max_kernel_width = width;
        self
    }

    /// The configured variance.
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Smooth a field, returning `Numeric` if the result is not finite.
    pub fn apply<B: Backend, const D: usize>(
        &self,
        field: &DisplacementField<B, D>,
    ) -> Result<DisplacementField<B, D>> {
        if self.variance <= 0.0 {
            // Identity pass: values are untouched, but non-finite input is
            // still surfaced here rather than deeper in the pipeline.
            if !field.is_finite() {
                return Err(RegistrationError::numeric(
                    "displacement field contains non-finite values",
                ));
            }
            return Ok(field.clone());
        }

        let sigma = self.variance.sqrt();
        let pixel_sigmas = [sigma; D];

        let components = field
            .components()
            .iter()
            .enumerate()
            .map(|(axis, component)| {
                let smoothed =
                    smooth_separable(component.clone(), pixel_sigmas, self.max_kernel_width);
                // Component `axis` is normal to the boundary planes of that axis.
                zero_boundary_planes(smoothed, D - 1 - axis)
            })
            .collect();

        let smoothed = field.with_components(components);
        if !smoothed.is_finite() {
            return Err(RegistrationError::numeric(
                "displacement field contains non-finite values after smoothing",
            ));
        }
        Ok(smoothed)
    }
}

/// Zero the first and last slice of a tensor along one dimension.
fn zero_boundary_planes<B: Backend, const D: usize>(
    tensor: Tensor<B, D>,
    dim: usize,
) -> Tensor<B, D> {
    let dims = tensor.dims();
    let n = dims[dim];
    let device = tensor.device();

    if n < 3 {
        return Tensor::zeros(dims, &device);
    }

    let mut cap_dims = dims;
    cap_dims[dim] = 1;
    let cap = Tensor::<B, D>::zeros(cap_dims, &device);

    Tensor::cat(vec![cap.clone(), tensor.narrow(dim, 1, n - 2), cap], dim)
}
