//! Update-field construction strategies.

use burn::tensor::backend::Backend;

use rsyn_core::field::DisplacementField;
use rsyn_core::image::{Image, ImageDomain};

use crate::error::Result;
use crate::metric::SimilarityMetric;

/// Strategy mapping a metric gradient to a raw update field.
///
/// Called twice per iteration with the two source/transform pairs swapped,
/// once for each direction of the symmetric problem. The returned field is
/// unscaled; magnitude bounding and regularization happen in the driver.
pub trait UpdateRule<B: Backend, const D: usize> {
    /// Build the raw update field for `fixed` against `moving` on the
    /// virtual domain.
    fn update_field<M>(
        &self,
        metric: &mut M,
        virtual_domain: &ImageDomain<D>,
        fixed: &Image<B, D>,
        fixed_transform: &DisplacementField<B, D>,
        moving: &Image<B, D>,
        moving_transform: &DisplacementField<B, D>,
    ) -> Result<DisplacementField<B, D>>
    where
        M: SimilarityMetric<B, D> + ?Sized;
}

/// Default update rule: configure the metric and return its derivative as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricGradientUpdate;

impl MetricGradientUpdate {
    /// Create the default update rule.
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend, const D: usize> UpdateRule<B, D> for MetricGradientUpdate {
    fn update_field<M>(
        &self,
        metric: &mut M,
        virtual_domain: &ImageDomain<D>,
        fixed: &Image<B, D>,
        fixed_transform: &DisplacementField<B, D>,
        moving: &Image<B, D>,
        moving_transform: &DisplacementField<B, D>,
    ) -> Result<DisplacementField<B, D>>
    where
        M: SimilarityMetric<B, D> + ?Sized,
    {
        metric.configure(
            virtual_domain,
            fixed,
            moving,
            fixed_transform,
            moving_transform,
        )?;
        metric.derivative()
    }
}
