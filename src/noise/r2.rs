//! R2 low-discrepancy sequence.
//!
//! The R2 sequence (Martin Roberts, "The Unreasonable Effectiveness of
//! Quasirandom Sequences") is the 2D generalization of the golden ratio
//! sequence, built from the plastic constant. It covers a plane more
//! evenly than a rotated-and-tiled Bayer matrix, which is why the
//! `ROBERTS`/`WOVEN`/`WREN`/`OVERBOARD` dithers use it as an ordered
//! threshold source keyed purely on pixel coordinates.

/// The plastic constant, the positive real root of `x^3 = x + 1`.
pub const PLASTIC: f64 = 1.324_717_957_244_746_f64;

const INV_PLASTIC: f64 = 1.0 / PLASTIC;
const INV_PLASTIC_SQ: f64 = 1.0 / (PLASTIC * PLASTIC);

/// The `i`-th point of the R2 sequence, both components in `[0, 1)`.
#[inline]
pub fn point(i: u64) -> (f32, f32) {
    let x = (0.5 + INV_PLASTIC * i as f64).fract();
    let y = (0.5 + INV_PLASTIC_SQ * i as f64).fract();
    (x as f32, y as f32)
}

/// Three independently-phased R2 samples for a pixel coordinate, used to
/// derive per-channel offsets without visible channel correlation.
///
/// Each channel uses a different linear index into the sequence so that,
/// e.g., the red and green offsets at the same pixel are decorrelated.
#[inline]
pub fn per_channel(x: usize, y: usize, width: usize) -> (f32, f32, f32) {
    let base = (y * width + x) as u64;
    let (r, _) = point(base);
    let (_, g) = point(base.wrapping_add(0x9E37_79B9));
    let (b, _) = point(base.wrapping_add(0x517C_C1B7));
    (r - 0.5, g - 0.5, b - 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_stays_in_unit_square() {
        for i in 0..10_000u64 {
            let (x, y) = point(i);
            assert!((0.0..1.0).contains(&x));
            assert!((0.0..1.0).contains(&y));
        }
    }

    #[test]
    fn sequence_is_aperiodic_over_short_runs() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..256u64 {
            let (x, y) = point(i);
            let key = ((x * 1000.0) as i32, (y * 1000.0) as i32);
            seen.insert(key);
        }
        assert!(seen.len() > 250, "expected near-unique samples, got {}", seen.len());
    }

    #[test]
    fn per_channel_centered_around_zero() {
        for (x, y) in [(0, 0), (5, 5), (100, 37)] {
            let (r, g, b) = per_channel(x, y, 64);
            assert!((-0.5..0.5).contains(&r));
            assert!((-0.5..0.5).contains(&g));
            assert!((-0.5..0.5).contains(&b));
        }
    }
}
