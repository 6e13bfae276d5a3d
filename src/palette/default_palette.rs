//! The built-in 255-color default palette, used whenever a caller asks to
//! encode without supplying or analyzing one.
//!
//! Built from a 6-level RGB cube (216 colors) plus 38 additional grayscale
//! steps, giving broad hue coverage and a smooth grayscale ramp in a
//! single fixed table — the same shape as the "web safe"-style palettes
//! this kind of encoder typically ships as a default, generalized to use
//! the full 255 non-transparent slots rather than stopping at 216.

use std::sync::OnceLock;

use super::error::PaletteError;
use super::palette::Palette;

const CUBE_LEVELS: [u8; 6] = [0, 51, 102, 153, 204, 255];

fn build_colors() -> Vec<[u8; 4]> {
    let mut colors = Vec::with_capacity(255);
    colors.push([0, 0, 0, 0]); // reserved transparent slot

    for &r in &CUBE_LEVELS {
        for &g in &CUBE_LEVELS {
            for &b in &CUBE_LEVELS {
                colors.push([r, g, b, 255]);
            }
        }
    }

    // 38 additional grayscale steps, skipping ones already in the cube
    // diagonal (multiples of 51).
    let mut added = 0;
    let mut v = 1u32;
    while added < 38 && v < 255 {
        if v % 51 != 0 {
            colors.push([v as u8, v as u8, v as u8, 255]);
            added += 1;
        }
        v += 7;
    }

    colors
}

/// The default palette: one transparent slot plus 254 opaque colors.
pub fn default_palette() -> Result<Palette, PaletteError> {
    static PALETTE: OnceLock<Palette> = OnceLock::new();
    if let Some(p) = PALETTE.get() {
        return Ok(p.clone());
    }
    let colors = build_colors();
    let palette = Palette::exact(&colors)?;
    Ok(PALETTE.get_or_init(|| palette).clone())
}
