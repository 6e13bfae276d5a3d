//! sRGB gamma lookup table.
//!
//! The table is built once, lazily, from the IEC 61966-2-1 formulas rather
//! than generated at compile time: this keeps the crate buildable without a
//! codegen step, at the cost of a one-time fill on first use per process.

use std::sync::OnceLock;

const LUT_SIZE: usize = 4096;
const LUT_MAX_INDEX: f32 = (LUT_SIZE - 1) as f32;

fn srgb_to_linear_exact(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb_exact(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn srgb_to_linear_table() -> &'static [f32; LUT_SIZE] {
    static TABLE: OnceLock<[f32; LUT_SIZE]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0.0f32; LUT_SIZE];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = srgb_to_linear_exact(i as f32 / LUT_MAX_INDEX);
        }
        table
    })
}

fn linear_to_srgb_table() -> &'static [f32; LUT_SIZE] {
    static TABLE: OnceLock<[f32; LUT_SIZE]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0.0f32; LUT_SIZE];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = linear_to_srgb_exact(i as f32 / LUT_MAX_INDEX);
        }
        table
    })
}

/// Convert an sRGB value (`0.0..=1.0`) to linear RGB via LUT with linear
/// interpolation between adjacent entries.
#[inline]
pub fn srgb_to_linear(srgb: f32) -> f32 {
    let srgb = srgb.clamp(0.0, 1.0);
    let table = srgb_to_linear_table();
    let scaled = srgb * LUT_MAX_INDEX;
    let index = scaled as usize;
    if index >= LUT_SIZE - 1 {
        return table[LUT_SIZE - 1];
    }
    let frac = scaled - index as f32;
    table[index] + (table[index + 1] - table[index]) * frac
}

/// Convert a linear RGB value (`0.0..=1.0`) to sRGB via LUT with linear
/// interpolation between adjacent entries.
#[inline]
pub fn linear_to_srgb(linear: f32) -> f32 {
    let linear = linear.clamp(0.0, 1.0);
    let table = linear_to_srgb_table();
    let scaled = linear * LUT_MAX_INDEX;
    let index = scaled as usize;
    if index >= LUT_SIZE - 1 {
        return table[LUT_SIZE - 1];
    }
    let frac = scaled - index as f32;
    table[index] + (table[index + 1] - table[index]) * frac
}
