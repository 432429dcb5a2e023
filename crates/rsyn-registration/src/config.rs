//! Configuration for the SyN driver.

use crate::error::{RegistrationError, Result};

/// Configuration of a symmetric diffeomorphic registration run.
///
/// The three schedule vectors have one entry per pyramid level, coarsest
/// first, and must share their length. Variances are in voxel units;
/// pyramid smoothing sigmas are in physical units.
#[derive(Debug, Clone)]
pub struct SynConfig {
    /// Per-level integer shrink factors, coarsest first.
    pub shrink_factors: Vec<usize>,
    /// Per-level pyramid smoothing sigmas (physical units).
    pub smoothing_sigmas: Vec<f64>,
    /// Per-level iteration budgets. Zero is allowed; the level is then only
    /// used to adapt the fields to its resolution.
    pub iterations: Vec<usize>,
    /// Step length factor. Zero is allowed and yields identity transforms;
    /// negative values are rejected.
    pub learning_rate: f64,
    /// Gaussian variance applied to each update field (voxel units).
    pub update_field_variance: f64,
    /// Gaussian variance applied to each total field (voxel units).
    pub total_field_variance: f64,
    /// Convergence slope threshold.
    pub convergence_threshold: f64,
    /// Convergence window size (≥ 2).
    pub convergence_window_size: usize,
    /// Fixed-point inversion tolerance (physical units).
    pub inverse_tolerance: f64,
    /// Fixed-point inversion iteration cap.
    pub inverse_iterations: usize,
}

impl SynConfig {
    /// Single-level configuration with the given learning rate and defaults
    /// everywhere else.
    pub fn new(learning_rate: f64) -> Self {
        Self {
            shrink_factors: vec![1],
            smoothing_sigmas: vec![0.0],
            iterations: vec![100],
            learning_rate,
            update_field_variance: 1.75,
            total_field_variance: 0.5,
            convergence_threshold: 1e-6,
            convergence_window_size: 10,
            inverse_tolerance: 1e-3,
            inverse_iterations: 20,
        }
    }

    /// Replace the level schedule (equal-length vectors, coarsest first).
    pub fn with_levels(
        mut self,
        shrink_factors: Vec<usize>,
        smoothing_sigmas: Vec<f64>,
        iterations: Vec<usize>,
    ) -> Self {
        self.shrink_factors = shrink_factors;
        self.smoothing_sigmas = smoothing_sigmas;
        self.iterations = iterations;
        self
    }

    /// Set the update-field Gaussian variance (voxel units).
    pub fn with_update_field_variance(mut self, variance: f64) -> Self {
        self.update_field_variance = variance;
        self
    }

    /// Set the total-field Gaussian variance (voxel units).
    pub fn with_total_field_variance(mut self, variance: f64) -> Self {
        self.total_field_variance = variance;
        self
    }

    /// Set the convergence criterion.
    pub fn with_convergence(mut self, threshold: f64, window_size: usize) -> Self {
        self.convergence_threshold = threshold;
        self.convergence_window_size = window_size;
        self
    }

    /// Set the field-inversion parameters.
    pub fn with_inversion(mut self, tolerance: f64, iterations: usize) -> Self {
        self.inverse_tolerance = tolerance;
        self.inverse_iterations = iterations;
        self
    }

    /// Number of pyramid levels.
    pub fn num_levels(&self) -> usize {
        self.shrink_factors.len()
    }

    /// Check all constraints, returning `Configuration` on the first failure.
    pub fn validate(&self) -> Result<()> {
        let levels = self.shrink_factors.len();
        if levels == 0 {
            return Err(RegistrationError::configuration(
                "at least one pyramid level is required",
            ));
        }
        if self.smoothing_sigmas.len() != levels || self.iterations.len() != levels {
            return Err(RegistrationError::configuration(format!(
                "schedule lengths differ: {} shrink factors, {} sigmas, {} iteration budgets",
                levels,
                self.smoothing_sigmas.len(),
                self.iterations.len()
            )));
        }
        if self.shrink_factors.iter().any(|&f| f == 0) {
            return Err(RegistrationError::configuration(
                "shrink factors must be at least 1",
            ));
        }
        if self.smoothing_sigmas.iter().any(|&s| s < 0.0) {
            return Err(RegistrationError::configuration(
                "smoothing sigmas must be non-negative",
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return Err(RegistrationError::configuration(format!(
                "learning rate must be non-negative, got {}",
                self.learning_rate
            )));
        }
        if self.update_field_variance < 0.0 || self.total_field_variance < 0.0 {
            return Err(RegistrationError::configuration(
                "field variances must be non-negative",
            ));
        }
        if self.convergence_threshold <= 0.0 {
            return Err(RegistrationError::configuration(
                "convergence threshold must be positive",
            ));
        }
        if self.convergence_window_size < 2 {
            return Err(RegistrationError::configuration(format!(
                "convergence window must hold at least 2 values, got {}",
                self.convergence_window_size
            )));
        }
        if self.inverse_tolerance <= 0.0 || self.inverse_iterations == 0 {
            return Err(RegistrationError::configuration(
                "inversion needs a positive tolerance and at least one iteration",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SynConfig::new(0.25).validate().is_ok());
    }

    #[test]
    fn test_zero_learning_rate_is_valid() {
        assert!(SynConfig::new(0.0).validate().is_ok());
    }

    #[test]
    fn test_negative_learning_rate_rejected() {
        let result = SynConfig::new(-0.1).validate();
        assert!(matches!(result, Err(RegistrationError::Configuration(_))));
    }

    #[test]
    fn test_mismatched_schedule_rejected() {
        let config = SynConfig::new(0.25).with_levels(vec![4, 2, 1], vec![2.0, 1.0], vec![10; 3]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_variance_rejected() {
        let config = SynConfig::new(0.25).with_update_field_variance(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_small_window_rejected() {
        let config = SynConfig::new(0.25).with_convergence(1e-6, 1);
        assert!(config.validate().is_err());
    }
}
