//! Greedy symmetric (SyN) diffeomorphic image registration.
//!
//! The driver in [`driver`] advances a pair of coupled displacement-field
//! transforms through a coarse-to-fine pyramid, regularizing updates and
//! totals with Gaussian smoothing and keeping both transforms approximately
//! inverse-consistent throughout.

pub mod config;
pub mod convergence;
pub mod driver;
pub mod error;
pub mod inversion;
pub mod level;
pub mod metric;
pub mod progress;
pub mod smoothing;
pub mod transform;
pub mod update;

pub use config::SynConfig;
pub use convergence::ConvergenceMonitor;
pub use driver::{SynOutput, SynRegistration};
pub use error::{RegistrationError, Result};
pub use inversion::{inverse_consistency_residual, invert_field};
pub use level::{LevelAdapter, ResampleLevelAdapter};
pub use metric::{MeanSquaresMetric, SimilarityMetric};
pub use progress::{
    CancellationToken, ConsoleProgressCallback, HistoryCallback, IterationInfo, ProgressCallback,
    ProgressTracker,
};
pub use smoothing::FieldSmoother;
pub use transform::DiffeomorphicTransform;
pub use update::{MetricGradientUpdate, UpdateRule};
