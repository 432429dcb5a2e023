//! Image type, sampling domains, and grid generation.

pub mod domain;
pub mod grid;
pub mod image;

pub use domain::ImageDomain;
pub use image::Image;
