use burn::tensor::{Tensor, TensorData};
use burn_ndarray::NdArray;
use rsyn_core::field::DisplacementField;
use rsyn_core::image::{Image, ImageDomain};
use rsyn_registration::metric::SimilarityMetric;
use rsyn_registration::{
    HistoryCallback, ProgressTracker, RegistrationError, Result, SynConfig, SynRegistration,
};
use std::sync::Arc;

type B = NdArray<f32>;
const D: usize = 2;

/// Metric whose value follows a fixed per-iteration schedule and whose
/// derivative is a small constant field, so the driver keeps stepping until
/// the convergence window triggers.
///
/// The driver configures the metric twice per iteration (once per
/// direction), so the iteration index is derived from the configure count.
struct ScheduledMetric {
    configure_calls: usize,
    iteration: usize,
    domain: Option<ImageDomain<D>>,
}

impl ScheduledMetric {
    fn new() -> Self {
        Self {
            configure_calls: 0,
            iteration: 0,
            domain: None,
        }
    }
}

impl SimilarityMetric<B, D> for ScheduledMetric {
    fn configure(
        &mut self,
        virtual_domain: &ImageDomain<D>,
        _fixed: &Image<B, D>,
        _moving: &Image<B, D>,
        _fixed_transform: &DisplacementField<B, D>,
        _moving_transform: &DisplacementField<B, D>,
    ) -> Result<()> {
        self.iteration = self.configure_calls / 2 + 1;
        self.configure_calls += 1;
        self.domain = Some(virtual_domain.clone());
        Ok(())
    }

    fn value(&self) -> Result<f64> {
        // Falls 8 -> 4 -> 2, then flatlines at 1 from iteration 4 on.
        let value = match self.iteration {
            0 => return Err(RegistrationError::metric("value queried before configure")),
            1 => 8.0,
            2 => 4.0,
            3 => 2.0,
            _ => 1.0,
        };
        Ok(value)
    }

    fn derivative(&self) -> Result<DisplacementField<B, D>> {
        let domain = self
            .domain
            .clone()
            .ok_or_else(|| RegistrationError::metric("derivative queried before configure"))?;
        let device = Default::default();
        let n = domain.num_voxels();
        let comp_x =
            Tensor::<B, 2>::from_data(TensorData::new(vec![0.1f32; n], domain.size()), &device);
        let comp_y = Tensor::<B, 2>::zeros(domain.size(), &device);
        Ok(DisplacementField::new(vec![comp_x, comp_y], domain))
    }

    fn name(&self) -> &'static str {
        "Scheduled"
    }
}

#[test]
fn test_window_slope_terminates_level() {
    let device = Default::default();
    let image = Image::new(
        Tensor::<B, 2>::zeros([16, 16], &device),
        ImageDomain::unit([16, 16]),
    );

    // The metric flatlines from iteration 3; with a window of 4 the first
    // all-flat window is [4, 5, 6, 7], so the driver must stop at 7.
    let config = SynConfig::new(0.05)
        .with_levels(vec![1], vec![0.0], vec![50])
        .with_update_field_variance(0.0)
        .with_total_field_variance(0.0)
        .with_convergence(1e-6, 4);

    let history = HistoryCallback::new();
    let mut tracker = ProgressTracker::new();
    tracker.add_callback(Arc::new(history.clone()));

    let mut metric = ScheduledMetric::new();
    let mut driver = SynRegistration::<B, _, _, D>::new(config).with_progress(tracker);
    driver.execute(&image, &image, &mut metric).unwrap();

    let recorded = history.history();
    assert_eq!(
        recorded.len(),
        7,
        "driver should stop exactly when the first flat window fills"
    );
    assert_eq!(recorded.last().unwrap().iteration, 7);
    assert_eq!(recorded.last().unwrap().metric_value, 1.0);
}

#[test]
fn test_steadily_improving_metric_runs_out_the_budget() {
    let device = Default::default();
    let image = Image::new(
        Tensor::<B, 2>::zeros([16, 16], &device),
        ImageDomain::unit([16, 16]),
    );

    // A strictly falling schedule past the window start never converges;
    // hitting the cap is legitimate termination, not an error.
    struct FallingMetric(ScheduledMetric);
    impl SimilarityMetric<B, D> for FallingMetric {
        fn configure(
            &mut self,
            virtual_domain: &ImageDomain<D>,
            fixed: &Image<B, D>,
            moving: &Image<B, D>,
            fixed_transform: &DisplacementField<B, D>,
            moving_transform: &DisplacementField<B, D>,
        ) -> Result<()> {
            self.0
                .configure(virtual_domain, fixed, moving, fixed_transform, moving_transform)
        }

        fn value(&self) -> Result<f64> {
            Ok(100.0 - self.0.iteration as f64)
        }

        fn derivative(&self) -> Result<DisplacementField<B, D>> {
            self.0.derivative()
        }

        fn name(&self) -> &'static str {
            "Falling"
        }
    }

    let config = SynConfig::new(0.05)
        .with_levels(vec![1], vec![0.0], vec![12])
        .with_update_field_variance(0.0)
        .with_total_field_variance(0.0)
        .with_convergence(1e-6, 4);

    let history = HistoryCallback::new();
    let mut tracker = ProgressTracker::new();
    tracker.add_callback(Arc::new(history.clone()));

    let mut metric = FallingMetric(ScheduledMetric::new());
    let mut driver = SynRegistration::<B, _, _, D>::new(config).with_progress(tracker);
    let output = driver.execute(&image, &image, &mut metric).unwrap();

    assert_eq!(history.history().len(), 12);
    // Twelve accumulated steps of 0.05 voxels along x.
    let max = output.middle_to_fixed.field().max_magnitude();
    assert!((max - 0.6).abs() < 1e-4, "expected 0.6, got {max}");
}
