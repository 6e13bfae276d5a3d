//! Linear RGB color type.
//!
//! Linear RGB is the color space where light addition is physically
//! accurate. All color math (blending, distance, error diffusion) happens
//! here rather than in gamma-encoded sRGB.

use super::lut::srgb_to_linear;
use super::srgb::Srgb;

/// A color in linear RGB space. Values are typically `0.0..=1.0` but may
/// exceed that range for intermediate error-diffusion accumulators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRgb {
    /// Red channel (linear light intensity)
    pub r: f32,
    /// Green channel (linear light intensity)
    pub g: f32,
    /// Blue channel (linear light intensity)
    pub b: f32,
}

impl LinearRgb {
    /// Create a new linear RGB color.
    #[inline]
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Add a per-channel error term, as used by diffusion dithers.
    #[inline]
    pub fn add(self, error: [f32; 3]) -> Self {
        Self {
            r: self.r + error[0],
            g: self.g + error[1],
            b: self.b + error[2],
        }
    }

    /// Clamp all channels into `0.0..=1.0`.
    #[inline]
    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }
}

impl From<Srgb> for LinearRgb {
    /// Gamma-decode via the LUT. Required before any color arithmetic:
    /// sRGB's nonlinear curve makes direct math on it perceptually wrong.
    fn from(srgb: Srgb) -> Self {
        Self {
            r: srgb_to_linear(srgb.r),
            g: srgb_to_linear(srgb.g),
            b: srgb_to_linear(srgb.b),
        }
    }
}
