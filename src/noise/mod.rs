//! Deterministic noise sources for ordered and hybrid dithers.
//!
//! Every source here is a pure function of pixel coordinates (and, for
//! [`r2`], a sequence index): no RNG state, so dither output is always
//! reproducible for a given input and algorithm.

pub(crate) mod blue_noise_data;
pub mod r2;

pub use blue_noise_data::{
    sample_centered, sample_multiplier, BluePlane, PLANE_A, PLANE_B, PLANE_C, PLANE_D, PLANE_E, PLANE_SIZE,
};
