//! Fixed-point inversion of displacement fields.

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};

use rsyn_core::field::DisplacementField;
use rsyn_core::image::grid::generate_grid;
use rsyn_core::interpolation::LinearInterpolator;

use crate::error::{RegistrationError, Result};

/// Compute the approximate inverse of a displacement field.
///
/// Iterates `D⁻¹ ← −D(x + D⁻¹(x))` from a zero initial guess until the
/// largest per-voxel change of any component drops below `tolerance`
/// (physical units). The fixed point satisfies
/// `D(x + D⁻¹(x)) + D⁻¹(x) ≈ 0`, i.e. composing the two fields is close to
/// the identity. Exhausting `max_iterations` without reaching the tolerance
/// is a `Numeric` error.
pub fn invert_field<B: Backend, const D: usize>(
    field: &DisplacementField<B, D>,
    tolerance: f64,
    max_iterations: usize,
) -> Result<DisplacementField<B, D>> {
    let domain = field.domain().clone();
    let device = field.device();
    let interpolator = LinearInterpolator::new();

    let indices = generate_grid::<B, D>(domain.size(), &device);
    let points = domain.index_to_world_tensor(indices);

    let n = domain.num_voxels();
    let mut inverse: Tensor<B, 2> = Tensor::zeros([n, D], &device);

    for _ in 0..max_iterations {
        let probes = points.clone() + inverse.clone();
        let probe_indices = domain.world_to_index_tensor(probes);
        let sampled = field.sample(probe_indices, &interpolator);
        let next = sampled.mul_scalar(-1.0);

        let change: f64 = (next.clone() - inverse)
            .abs()
            .max()
            .into_scalar()
            .elem();
        inverse = next;

        if !change.is_finite() {
            return Err(RegistrationError::numeric(
                "field inversion produced non-finite values",
            ));
        }
        if change < tolerance {
            return Ok(DisplacementField::from_vectors(inverse, domain));
        }
    }

    Err(RegistrationError::numeric(format!(
        "field inversion did not reach tolerance {tolerance} within {max_iterations} iterations"
    )))
}

/// Largest residual `|D(x + D⁻¹(x)) + D⁻¹(x)|` over the grid.
///
/// Measures how far a forward/inverse field pair is from exact inverse
/// consistency, in physical units.
pub fn inverse_consistency_residual<B: Backend, const D: usize>(
    field: &DisplacementField<B, D>,
    inverse: &DisplacementField<B, D>,
) -> f64 {
    let domain = field.domain();
    let device = field.device();
    let interpolator = LinearInterpolator::new();

    let indices = generate_grid::<B, D>(domain.size(), &device);
    let points = domain.index_to_world_tensor(indices);

    let inverse_vectors = inverse.vectors();
    let probes = points + inverse_vectors.clone();
    let probe_indices = domain.world_to_index_tensor(probes);
    let sampled = field.sample(probe_indices, &interpolator);

    let residual = sampled + inverse_vectors;
    let n = domain.num_voxels();
    let mut squared = Tensor::<B, 1>::zeros([n], &device);
    for axis in 0..D {
        let column = residual.clone().narrow(1, axis, 1).squeeze::<1>(1);
        squared = squared + column.clone() * column;
    }
    let max: f64 = squared.max().into_scalar().elem();
    max.max(0.0).sqrt()
}
