//! Image filters: smoothing, shrinking, pyramids, and warping.

pub mod gaussian;
pub mod pyramid;
pub mod shrink;
pub mod warp;

pub use gaussian::{smooth_separable, GaussianSmoothing};
pub use pyramid::ImagePyramid;
pub use shrink::ShrinkImageFilter;
pub use warp::WarpImageFilter;
