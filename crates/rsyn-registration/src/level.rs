//! Between-level adaptation of displacement fields.

use burn::tensor::backend::Backend;

use rsyn_core::field::DisplacementField;
use rsyn_core::image::grid::generate_grid;
use rsyn_core::image::ImageDomain;
use rsyn_core::interpolation::LinearInterpolator;

use crate::error::Result;

/// Strategy carrying a displacement field from one pyramid level to the next.
///
/// Implementations must preserve the physical meaning of the field: vectors
/// are in physical units, only the sampling grid changes.
pub trait LevelAdapter<B: Backend, const D: usize> {
    /// Resample `field` onto `target`.
    fn adapt(
        &self,
        field: &DisplacementField<B, D>,
        target: &ImageDomain<D>,
    ) -> Result<DisplacementField<B, D>>;
}

/// Default adapter: sample the field's vectors at the target grid positions
/// with linear interpolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResampleLevelAdapter {
    interpolator: LinearInterpolator,
}

impl ResampleLevelAdapter {
    /// Create the default level adapter.
    pub fn new() -> Self {
        Self {
            interpolator: LinearInterpolator::new(),
        }
    }
}

impl<B: Backend, const D: usize> LevelAdapter<B, D> for ResampleLevelAdapter {
    fn adapt(
        &self,
        field: &DisplacementField<B, D>,
        target: &ImageDomain<D>,
    ) -> Result<DisplacementField<B, D>> {
        let device = field.device();
        let indices = generate_grid::<B, D>(target.size(), &device);
        let points = target.index_to_world_tensor(indices);
        let source_indices = field.domain().world_to_index_tensor(points);
        let vectors = field.sample(source_indices, &self.interpolator);
        Ok(DisplacementField::from_vectors(vectors, target.clone()))
    }
}
