//! Similarity metric interface consumed by the registration driver.

use burn::tensor::backend::Backend;

use rsyn_core::field::DisplacementField;
use rsyn_core::image::{Image, ImageDomain};

use crate::error::Result;

/// Measures the dissimilarity of two warped sources on a virtual domain.
///
/// The driver configures the metric with the current virtual domain, the two
/// source images and the transforms mapping the virtual domain into each of
/// them, then queries value and derivative. A metric is borrowed mutably for
/// the duration of a run and must not be shared with other consumers.
///
/// # Derivative convention
/// [`derivative`](SimilarityMetric::derivative) returns a raw, unscaled
/// field on the virtual domain pointing in the direction that *improves* the
/// similarity with respect to the fixed-side transform. Magnitude bounding
/// and regularization are the caller's job.
pub trait SimilarityMetric<B: Backend, const D: usize> {
    /// Bind the metric to a virtual domain, two sources, and their transforms.
    fn configure(
        &mut self,
        virtual_domain: &ImageDomain<D>,
        fixed: &Image<B, D>,
        moving: &Image<B, D>,
        fixed_transform: &DisplacementField<B, D>,
        moving_transform: &DisplacementField<B, D>,
    ) -> Result<()>;

    /// Current dissimilarity value (lower is better).
    fn value(&self) -> Result<f64>;

    /// Raw gradient field on the virtual domain (see the trait docs for the
    /// sign convention).
    fn derivative(&self) -> Result<DisplacementField<B, D>>;

    /// Identifier for logs.
    fn name(&self) -> &'static str;
}
