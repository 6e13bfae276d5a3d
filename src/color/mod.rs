//! Color types and conversion utilities.
//!
//! This module provides type-safe color handling with compile-time
//! distinction between sRGB and linear RGB color spaces, plus the
//! perceptual Oklab space used for palette analysis and dithering.
//!
//! # Color spaces
//!
//! - **[`Srgb`]**: the standard color space for image storage. Use for I/O.
//! - **[`LinearRgb`]**: linear light intensity. Use for color arithmetic.
//! - **[`Oklab`]**: perceptually uniform space. Use for distance metrics.
//!
//! # Example
//!
//! ```
//! use palette8::color::{Srgb, LinearRgb};
//!
//! let srgb = Srgb::from_u8(128, 64, 32);
//! let linear = LinearRgb::from(srgb);
//! let back = Srgb::from(linear);
//! ```

mod linear_rgb;
mod lut;
pub mod metrics;
mod oklab;
mod srgb;

pub use linear_rgb::LinearRgb;
pub use metrics::{difference_analyzing, difference_hw, difference_match, forward_light, hue_sector, reverse_light};
pub use oklab::Oklab;
pub use srgb::{ParseColorError, Srgb};
