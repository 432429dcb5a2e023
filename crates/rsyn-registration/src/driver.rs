//! Greedy symmetric (SyN) diffeomorphic registration driver.

use std::marker::PhantomData;

use burn::tensor::backend::Backend;

use rsyn_core::field::DisplacementField;
use rsyn_core::filter::ImagePyramid;
use rsyn_core::image::Image;

use crate::config::SynConfig;
use crate::convergence::ConvergenceMonitor;
use crate::error::{RegistrationError, Result};
use crate::inversion::invert_field;
use crate::level::{LevelAdapter, ResampleLevelAdapter};
use crate::metric::SimilarityMetric;
use crate::progress::{CancellationToken, ProgressTracker};
use crate::smoothing::FieldSmoother;
use crate::transform::DiffeomorphicTransform;
use crate::update::{MetricGradientUpdate, UpdateRule};

/// Magnitude below which an update field counts as numerically zero.
const ZERO_UPDATE: f64 = 1e-12;

/// Result of a symmetric registration run.
///
/// Both transforms map the shared middle frame outward, so the composite
/// fixed-to-moving deformation is `middle_to_moving ∘ middle_to_fixed⁻¹`.
pub struct SynOutput<B: Backend, const D: usize> {
    /// φ: middle frame → fixed image, with maintained inverse.
    pub middle_to_fixed: DiffeomorphicTransform<B, D>,
    /// ψ: middle frame → moving image, with maintained inverse.
    pub middle_to_moving: DiffeomorphicTransform<B, D>,
}

impl<B: Backend, const D: usize> SynOutput<B, D> {
    /// The primary result transform (middle frame → fixed image).
    pub fn transform(&self) -> &DiffeomorphicTransform<B, D> {
        &self.middle_to_fixed
    }
}

/// Multi-resolution greedy SyN registration.
///
/// Maintains two coupled displacement-field transforms, φ toward the fixed
/// image and ψ toward the moving image, and advances them symmetrically:
/// each inner iteration builds one update field per direction from the metric
/// gradient (same builder, roles swapped), smooths the updates, bounds the
/// step length, accumulates, smooths the total fields, and re-derives both
/// inverse fields by fixed-point iteration. A level finishes when its
/// iteration budget is spent, the windowed metric slope flattens out, or the
/// gradient vanishes; running out of budget is not an error.
///
/// The two strategy seams (how fields move between pyramid levels, and how
/// the metric gradient becomes an update field) are injected at
/// construction as [`LevelAdapter`] and [`UpdateRule`] implementations.
///
/// The driver runs on a single logical thread; per-voxel work is delegated
/// to tensor operations that complete before the next step observes their
/// output, so iteration n+1 always sees all of iteration n.
pub struct SynRegistration<B, U, L, const D: usize>
where
    B: Backend,
    U: UpdateRule<B, D>,
    L: LevelAdapter<B, D>,
{
    config: SynConfig,
    update_rule: U,
    level_adapter: L,
    progress: ProgressTracker,
    cancellation: Option<CancellationToken>,
    _backend: PhantomData<B>,
}

impl<B: Backend, const D: usize> SynRegistration<B, MetricGradientUpdate, ResampleLevelAdapter, D> {
    /// Create a driver with the default strategies.
    pub fn new(config: SynConfig) -> Self {
        Self::with_strategies(config, MetricGradientUpdate::new(), ResampleLevelAdapter::new())
    }
}

impl<B, U, L, const D: usize> SynRegistration<B, U, L, D>
where
    B: Backend,
    U: UpdateRule<B, D>,
    L: LevelAdapter<B, D>,
{
    /// Create a driver with explicit level-adaptation and update strategies.
    pub fn with_strategies(config: SynConfig, update_rule: U, level_adapter: L) -> Self {
        Self {
            config,
            update_rule,
            level_adapter,
            progress: ProgressTracker::new(),
            cancellation: None,
            _backend: PhantomData,
        }
    }

    /// Attach a progress tracker.
    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    /// Attach a cancellation token, checked between inner iterations.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The driver configuration.
    pub fn config(&self) -> &SynConfig {
        &self.config
    }

    /// Register `moving` to `fixed`, producing the symmetric transform pair.
    ///
    /// Configuration and geometry problems surface as `Configuration` and
    /// `Domain` errors before any iteration runs. `Numeric` and `Metric`
    /// errors abort the run; no partial result is returned in that case.
    pub fn execute<M>(
        &mut self,
        fixed: &Image<B, D>,
        moving: &Image<B, D>,
        metric: &mut M,
    ) -> Result<SynOutput<B, D>>
    where
        M: SimilarityMetric<B, D> + ?Sized,
    {
        self.config.validate()?;
        if !fixed.domain().overlaps(moving.domain()) {
            return Err(RegistrationError::domain(
                "fixed and moving images occupy disjoint physical regions",
            ));
        }

        let result = self.run_levels(fixed, moving, metric);
        match &result {
            Ok(_) => self.progress.complete(),
            Err(error) => self.progress.error(&error.to_string()),
        }
        result
    }

    fn run_levels<M>(
        &mut self,
        fixed: &Image<B, D>,
        moving: &Image<B, D>,
        metric: &mut M,
    ) -> Result<SynOutput<B, D>>
    where
        M: SimilarityMetric<B, D> + ?Sized,
    {
        let device = fixed.device();
        let levels = self.config.num_levels();

        let fixed_pyramid = ImagePyramid::new(
            fixed,
            &self.config.shrink_factors,
            &self.config.smoothing_sigmas,
        );
        let moving_pyramid = ImagePyramid::new(
            moving,
            &self.config.shrink_factors,
            &self.config.smoothing_sigmas,
        );

        let update_smoother = FieldSmoother::new(self.config.update_field_variance);
        let total_smoother = FieldSmoother::new(self.config.total_field_variance);
        let mut monitor = ConvergenceMonitor::new(
            self.config.convergence_window_size,
            self.config.convergence_threshold,
        );

        self.progress.start();

        // Both transforms start as the identity on the coarsest domain.
        let coarsest = fixed_pyramid.level(0).domain().clone();
        let mut middle_to_fixed = DisplacementField::<B, D>::zeros(coarsest.clone(), &device);
        let mut middle_to_fixed_inverse = DisplacementField::<B, D>::zeros(coarsest.clone(), &device);
        let mut middle_to_moving = DisplacementField::<B, D>::zeros(coarsest.clone(), &device);
        let mut middle_to_moving_inverse = DisplacementField::<B, D>::zeros(coarsest, &device);

        'levels: for level in 0..levels {
            let fixed_level = fixed_pyramid.level(level);
            let moving_level = moving_pyramid.level(level);
            let domain = fixed_level.domain().clone();
            let budget = self.config.iterations[level];

            tracing::info!(
                "level {}/{}: virtual domain {:?}, budget {} iterations",
                level + 1,
                levels,
                domain.size(),
                budget,
            );
            self.progress.level_start(level, levels);

            // Carry both transforms onto this level's virtual domain and
            // re-derive their inverses, budget or no budget.
            middle_to_fixed = self.level_adapter.adapt(&middle_to_fixed, &domain)?;
            middle_to_moving = self.level_adapter.adapt(&middle_to_moving, &domain)?;
            middle_to_fixed_inverse = self.invert(&middle_to_fixed)?;
            middle_to_moving_inverse = self.invert(&middle_to_moving)?;

            monitor.reset();
            let step = self.config.learning_rate * domain.spacing().min_spacing();

            for iteration in 1..=budget {
                if let Some(token) = &self.cancellation {
                    if token.is_cancelled() {
                        tracing::info!(
                            "cancellation requested, stopping at level {} iteration {}",
                            level + 1,
                            iteration,
                        );
                        break 'levels;
                    }
                }

                // One update per direction, same builder with roles swapped.
                let forward_update = self.update_rule.update_field(
                    metric,
                    &domain,
                    fixed_level,
                    &middle_to_fixed,
                    moving_level,
                    &middle_to_moving,
                )?;
                let metric_value = metric.value()?;
                let inverse_update = self.update_rule.update_field(
                    metric,
                    &domain,
                    moving_level,
                    &middle_to_moving,
                    fixed_level,
                    &middle_to_fixed,
                )?;

                let forward_update = update_smoother.apply(&forward_update)?;
                let inverse_update = update_smoother.apply(&inverse_update)?;

                // Bound each step to the learning-rate fraction of the voxel
                // size, measured after smoothing.
                let forward_step = scale_to_step(&forward_update, step);
                let inverse_step = scale_to_step(&inverse_update, step);

                if forward_step.is_none() && inverse_step.is_none() {
                    monitor.record(metric_value);
                    self.progress.iteration(level, iteration, budget, metric_value);
                    tracing::info!(
                        "vanishing update at level {} iteration {}, metric {:.6}",
                        level + 1,
                        iteration,
                        metric_value,
                    );
                    break;
                }

                if let Some(update) = forward_step {
                    middle_to_fixed = middle_to_fixed.add(&update);
                }
                if let Some(update) = inverse_step {
                    middle_to_moving = middle_to_moving.add(&update);
                }

                middle_to_fixed = total_smoother.apply(&middle_to_fixed)?;
                middle_to_moving = total_smoother.apply(&middle_to_moving)?;

                middle_to_fixed_inverse = self.invert(&middle_to_fixed)?;
                middle_to_moving_inverse = self.invert(&middle_to_moving)?;

                monitor.record(metric_value);
                self.progress.iteration(level, iteration, budget, metric_value);
                tracing::debug!(
                    "level {} iter {}/{}: metric {:.6}",
                    level + 1,
                    iteration,
                    budget,
                    metric_value,
                );

                if monitor.converged() {
                    tracing::info!(
                        "converged at level {} iteration {} (metric {:.6})",
                        level + 1,
                        iteration,
                        metric_value,
                    );
                    break;
                }
            }
        }

        Ok(SynOutput {
            middle_to_fixed: DiffeomorphicTransform::new(middle_to_fixed, middle_to_fixed_inverse),
            middle_to_moving: DiffeomorphicTransform::new(
                middle_to_moving,
                middle_to_moving_inverse,
            ),
        })
    }

    fn invert(&self, field: &DisplacementField<B, D>) -> Result<DisplacementField<B, D>> {
        invert_field(
            field,
            self.config.inverse_tolerance,
            self.config.inverse_iterations,
        )
    }
}

/// Rescale an update so its largest vector equals `step`, or `None` when the
/// update (or the step) is numerically zero.
fn scale_to_step<B: Backend, const D: usize>(
    update: &DisplacementField<B, D>,
    step: f64,
) -> Option<DisplacementField<B, D>> {
    let max = update.max_magnitude();
    if max <= ZERO_UPDATE || step <= 0.0 {
        return None;
    }
    Some(update.scaled(step / max))
}
