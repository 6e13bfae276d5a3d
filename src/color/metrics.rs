//! RGB difference metrics and perceptual lightness shaping.
//!
//! Three metrics serve three different call sites, trading accuracy for
//! speed as appropriate:
//!
//! - [`difference_match`]: the cheap metric backing the palette mapping
//!   table and the inner loop of every dither. Called once per output
//!   pixel, so it stays a weighted squared difference in sRGB bytes.
//! - [`difference_analyzing`]: used while choosing which colors make it
//!   into a palette in the first place. Called far less often, so it can
//!   afford a full Oklab conversion per candidate.
//! - [`difference_hw`]: the hue-preserving metric behind the hue-wise
//!   palette builder, biased to keep at least one color per hue sector.

use super::oklab::Oklab;
use crate::bitmath::{bias_gain, fast_atan2};

/// Channel weights approximating relative luminance contribution, used by
/// [`difference_match`]. Roughly 3:4:2 for R:G:B.
const WEIGHT_R: f32 = 3.0;
const WEIGHT_G: f32 = 4.0;
const WEIGHT_B: f32 = 2.0;

/// Compress highlight detail before comparing lightness, so that palette
/// mapping doesn't waste entries distinguishing near-white shades humans
/// can't easily tell apart.
#[inline]
pub fn forward_light(l: f32) -> f32 {
    bias_gain(l.clamp(0.0, 1.0), 0.5, 0.75)
}

/// Inverse of [`forward_light`].
#[inline]
pub fn reverse_light(l: f32) -> f32 {
    bias_gain(l.clamp(0.0, 1.0), 0.5, 1.0 / 0.75)
}

/// Cheap weighted squared difference between two 8-bit RGB colors, with a
/// perceptual curve applied to the lightness axis. This is the metric
/// [`crate::palette::Palette::build_mapping`] uses to fill the 32768-entry
/// RGB555 lookup table, and the one every dither's inner loop calls.
#[inline]
pub fn difference_match(r1: u8, g1: u8, b1: u8, r2: u8, g2: u8, b2: u8) -> f32 {
    let l1 = forward_light((r1 as f32 * WEIGHT_R + g1 as f32 * WEIGHT_G + b1 as f32 * WEIGHT_B)
        / ((WEIGHT_R + WEIGHT_G + WEIGHT_B) * 255.0));
    let l2 = forward_light((r2 as f32 * WEIGHT_R + g2 as f32 * WEIGHT_G + b2 as f32 * WEIGHT_B)
        / ((WEIGHT_R + WEIGHT_G + WEIGHT_B) * 255.0));

    let dr = r1 as f32 - r2 as f32;
    let dg = g1 as f32 - g2 as f32;
    let db = b1 as f32 - b2 as f32;
    let dl = (l1 - l2) * 255.0;

    WEIGHT_R * dr * dr + WEIGHT_G * dg * dg + WEIGHT_B * db * db + 6.0 * dl * dl
}

/// Stronger, Oklab-chroma-aware metric used while selecting palette peaks,
/// so that similar hues don't each claim a separate entry.
#[inline]
pub fn difference_analyzing(a: Oklab, b: Oklab) -> f32 {
    a.hyab_distance(b, 2.0)
}

/// Hue-angle-preserving metric used by the hue-wise palette builder: two
/// colors in the same hue sector are considered closer than their raw Oklab
/// distance would suggest, so that sector quotas fill evenly.
#[inline]
pub fn difference_hw(a: Oklab, b: Oklab) -> f32 {
    let hue_a = fast_atan2(a.b, a.a);
    let hue_b = fast_atan2(b.b, b.a);
    let mut dhue = (hue_a - hue_b).abs();
    if dhue > std::f32::consts::PI {
        dhue = std::f32::consts::TAU - dhue;
    }

    let chroma_term = (a.chroma() - b.chroma()).abs();
    let lightness_term = (a.l - b.l).abs();

    lightness_term * 2.0 + chroma_term + dhue * 0.5
}

/// Hue sector index in `0..16` for a color, used to bucket candidates
/// during [`crate::palette::analyze_hue_wise`].
pub fn hue_sector(lab: Oklab, sectors: usize) -> usize {
    if lab.chroma() < 1e-4 {
        return sectors; // achromatic bucket, one past the chromatic sectors
    }
    let hue = fast_atan2(lab.b, lab.a);
    let normalized = (hue + std::f32::consts::PI) / std::f32::consts::TAU;
    ((normalized * sectors as f32) as usize).min(sectors - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difference_match_zero_at_identity() {
        assert_eq!(difference_match(10, 20, 30, 10, 20, 30), 0.0);
    }

    #[test]
    fn difference_match_commutative() {
        let a = difference_match(10, 200, 30, 250, 5, 90);
        let b = difference_match(250, 5, 90, 10, 200, 30);
        assert!((a - b).abs() < 1e-3);
    }

    #[test]
    fn difference_match_nonnegative() {
        for _ in 0..16 {
            let d = difference_match(1, 2, 3, 250, 240, 230);
            assert!(d >= 0.0);
        }
    }

    #[test]
    fn forward_reverse_light_round_trip() {
        for i in 0..=10 {
            let l = i as f32 / 10.0;
            let round_tripped = reverse_light(forward_light(l));
            assert!((round_tripped - l).abs() < 0.02, "l={l} got {round_tripped}");
        }
    }

    #[test]
    fn hue_sector_achromatic_gets_own_bucket() {
        let grey = Oklab { l: 0.5, a: 0.0, b: 0.0 };
        assert_eq!(hue_sector(grey, 16), 16);
    }

    #[test]
    fn hue_sector_in_range_for_chromatic() {
        let red = Oklab::from(crate::color::LinearRgb::from(crate::color::Srgb::from_u8(255, 0, 0)));
        let sector = hue_sector(red, 16);
        assert!(sector < 16);
    }
}
