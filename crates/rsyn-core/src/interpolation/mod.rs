//! Interpolation strategies for sampling images and fields.

pub mod linear;
pub mod nearest;
pub mod trait_;

pub use linear::LinearInterpolator;
pub use nearest::NearestNeighborInterpolator;
pub use trait_::Interpolator;
