//! Core data types for symmetric diffeomorphic image registration.
//!
//! Provides images with physical geometry, dense displacement fields,
//! interpolation, and the resampling primitives (smoothing, shrinking,
//! pyramids, warping) that registration drivers are built on.

pub mod field;
pub mod filter;
pub mod image;
pub mod interpolation;
pub mod spatial;

pub use field::DisplacementField;
pub use image::{Image, ImageDomain};
pub use spatial::{Direction, Point, Spacing, Vector};
