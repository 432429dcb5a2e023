//! Progress observation and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Progress information for one inner iteration.
#[derive(Debug, Clone)]
pub struct IterationInfo {
    /// Pyramid level (0 = coarsest).
    pub level: usize,
    /// Iteration within the level (1-based).
    pub iteration: usize,
    /// Iteration budget of the level.
    pub level_iterations: usize,
    /// Metric value recorded this iteration.
    pub metric_value: f64,
    /// Time elapsed since the run started.
    pub elapsed: Duration,
}

/// Callback interface for observing a registration run.
pub trait ProgressCallback: Send + Sync {
    /// Called once per inner iteration.
    fn on_iteration(&self, info: &IterationInfo);

    /// Called when the run starts.
    fn on_start(&self) {}

    /// Called when a pyramid level starts.
    fn on_level_start(&self, _level: usize, _levels: usize) {}

    /// Called when the run completes successfully.
    fn on_complete(&self, _elapsed: Duration) {}

    /// Called when the run fails.
    fn on_error(&self, _error: &str) {}
}

/// Progress callback that logs through `tracing`.
#[derive(Debug, Clone)]
pub struct ConsoleProgressCallback {
    /// Log one line every N iterations.
    pub log_interval: usize,
}

impl Default for ConsoleProgressCallback {
    fn default() -> Self {
        Self { log_interval: 10 }
    }
}

impl ConsoleProgressCallback {
    /// Create a console callback with the given log interval.
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
        }
    }
}

impl ProgressCallback for ConsoleProgressCallback {
    fn on_iteration(&self, info: &IterationInfo) {
        if info.iteration % self.log_interval == 0 || info.iteration == info.level_iterations {
            tracing::info!(
                "level {} iter {}/{} | metric {:.6} | {:.2}s",
                info.level,
                info.iteration,
                info.level_iterations,
                info.metric_value,
                info.elapsed.as_secs_f64(),
            );
        }
    }

    fn on_start(&self) {
        tracing::info!("registration started");
    }

    fn on_level_start(&self, level: usize, levels: usize) {
        tracing::info!("starting level {}/{}", level + 1, levels);
    }

    fn on_complete(&self, elapsed: Duration) {
        tracing::info!("registration completed in {:.2}s", elapsed.as_secs_f64());
    }

    fn on_error(&self, error: &str) {
        tracing::error!("registration failed: {error}");
    }
}

/// Callback recording every iteration for later inspection.
#[derive(Debug, Clone, Default)]
pub struct HistoryCallback {
    history: Arc<Mutex<Vec<IterationInfo>>>,
}

impl HistoryCallback {
    /// Create an empty history callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded iterations.
    pub fn history(&self) -> Vec<IterationInfo> {
        self.history.lock().unwrap().clone()
    }

    /// Discard recorded iterations.
    pub fn clear(&self) {
        self.history.lock().unwrap().clear();
    }
}

impl ProgressCallback for HistoryCallback {
    fn on_iteration(&self, info: &IterationInfo) {
        self.history.lock().unwrap().push(info.clone());
    }
}

/// Cooperative cancellation flag checked between inner iterations.
///
/// A cancelled run finishes its current iteration, so the transforms stay
/// consistent, and returns the state accumulated so far.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Fans progress events out to registered callbacks.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    callbacks: Vec<Arc<dyn ProgressCallback>>,
    start_time: Arc<Mutex<Option<Instant>>>,
}

impl ProgressTracker {
    /// Create a tracker with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback.
    pub fn add_callback(&mut self, callback: Arc<dyn ProgressCallback>) {
        self.callbacks.push(callback);
    }

    /// Mark the run as started.
    pub fn start(&self) {
        *self.start_time.lock().unwrap() = Some(Instant::now());
        for callback in &self.callbacks {
            callback.on_start();
        }
    }

    /// Time elapsed since `start`.
    pub fn elapsed(&self) -> Duration {
        self.start_time
            .lock()
            .unwrap()
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Announce a new pyramid level.
    pub fn level_start(&self, level: usize, levels: usize) {
        for callback in &self.callbacks {
            callback.on_level_start(level, levels);
        }
    }

    /// Report one inner iteration.
    pub fn iteration(
        &self,
        level: usize,
        iteration: usize,
        level_iterations: usize,
        metric_value: f64,
    ) {
        let info = IterationInfo {
            level,
            iteration,
            level_iterations,
            metric_value,
            elapsed: self.elapsed(),
        };
        for callback in &self.callbacks {
            callback.on_iteration(&info);
        }
    }

    /// Report successful completion.
    pub fn complete(&self) {
        let elapsed = self.elapsed();
        for callback in &self.callbacks {
            callback.on_complete(elapsed);
        }
    }

    /// Report failure.
    pub fn error(&self, error: &str) {
        for callback in &self.callbacks {
            callback.on_error(error);
        }
    }
}
