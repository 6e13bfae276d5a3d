//! Formula-driven ordered dithers: GRADIENT_NOISE, BLUE_NOISE, and
//! CHAOTIC_NOISE. Each adds a scalar perturbation (the same value to every
//! channel) before quantizing, rather than diffusing error or sampling
//! per-channel offsets.

use crate::color::{LinearRgb, Srgb};
use crate::image::{Frame, IndexedFrame};
use crate::noise::{sample_centered, PLANE_A};
use crate::palette::Palette;

use super::options::DitherOptions;

/// Jimenez's gradient interleaved noise: a cheap hash-based dither texture
/// that needs no lookup table, popular in real-time rendering.
#[inline]
fn gradient_interleaved_noise(x: usize, y: usize) -> f32 {
    let v = 52.982_918_9 * ((0.067_110_56 * x as f32 + 0.005_837_15 * y as f32).fract());
    v.fract() - 0.5
}

fn dither_with_scalar_noise(
    frame: &Frame,
    palette: &Palette,
    options: &DitherOptions,
    strength: f32,
    noise_fn: impl Fn(usize, usize) -> f32,
) -> IndexedFrame {
    let width = frame.width();
    let height = frame.height();
    let mut output = vec![0u8; width * height];

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let (r, g, b, _a) = frame.pixel_at(idx);

            if options.preserve_exact_matches {
                if let Some(p) = palette.exact_match(r, g, b) {
                    output[idx] = p;
                    continue;
                }
            }

            let color = LinearRgb::from(Srgb::from_u8(r, g, b));
            let noise = noise_fn(x, y) * strength * 0.25;
            let perturbed = color.add([noise, noise, noise]).clamped();
            let bytes = Srgb::from(perturbed).to_bytes();
            output[idx] = palette.nearest_exhaustive(bytes[0], bytes[1], bytes[2]).0;
        }
    }

    IndexedFrame::new(width, height, output)
}

/// GRADIENT_NOISE (Jimenez).
pub fn gradient_noise(frame: &Frame, palette: &Palette, options: &DitherOptions, strength: f32) -> IndexedFrame {
    dither_with_scalar_noise(frame, palette, options, strength, gradient_interleaved_noise)
}

/// BLUE_NOISE: a single blue-noise plane's threshold added identically to
/// every channel.
pub fn blue_noise(frame: &Frame, palette: &Palette, options: &DitherOptions, strength: f32) -> IndexedFrame {
    dither_with_scalar_noise(frame, palette, options, strength, |x, y| {
        sample_centered(&PLANE_A, x, y)
    })
}

/// CHAOTIC_NOISE: a xor-hash of `(x, y, frame_seq)`. Deliberately *not*
/// stable across frames of an animation, unlike every other algorithm
/// here — that instability is the point, trading temporal coherence for
/// breaking up any static-looking quantization bands.
pub fn chaotic_noise(
    frame: &Frame,
    palette: &Palette,
    options: &DitherOptions,
    strength: f32,
    frame_seq: u64,
) -> IndexedFrame {
    dither_with_scalar_noise(frame, palette, options, strength, move |x, y| {
        let mut h = (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        h ^= (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        h ^= frame_seq.wrapping_mul(0x1656_67B1_9E37_79F9);
        h ^= h >> 31;
        h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
        ((h & 0xFFFF) as f32 / 65535.0) - 0.5
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bw_palette() -> Palette {
        Palette::exact(&[[0, 0, 0, 255], [255, 255, 255, 255]]).unwrap()
    }

    fn mid_gray(side: usize) -> Frame {
        Frame::new(side, side, vec![0x808080FFu32; side * side])
    }

    #[test]
    fn gradient_noise_mixes_output() {
        let palette = bw_palette();
        let options = DitherOptions::default();
        let out = gradient_noise(&mid_gray(16), &palette, &options, 1.0);
        let ones = out.indices().iter().filter(|&&v| v == 1).count();
        assert!(ones > 0 && ones < 256);
    }

    #[test]
    fn blue_noise_mixes_output() {
        let palette = bw_palette();
        let options = DitherOptions::default();
        let out = blue_noise(&mid_gray(16), &palette, &options, 1.0);
        let ones = out.indices().iter().filter(|&&v| v == 1).count();
        assert!(ones > 0 && ones < 256);
    }

    #[test]
    fn chaotic_noise_changes_across_frame_seq() {
        let palette = bw_palette();
        let options = DitherOptions::default();
        let frame = mid_gray(16);
        let a = chaotic_noise(&frame, &palette, &options, 1.0, 0);
        let b = chaotic_noise(&frame, &palette, &options, 1.0, 1);
        assert_ne!(a.indices(), b.indices());
    }

    #[test]
    fn chaotic_noise_deterministic_for_same_seq() {
        let palette = bw_palette();
        let options = DitherOptions::default();
        let frame = mid_gray(16);
        let a = chaotic_noise(&frame, &palette, &options, 1.0, 7);
        let b = chaotic_noise(&frame, &palette, &options, 1.0, 7);
        assert_eq!(a.indices(), b.indices());
    }

    #[test]
    fn zero_strength_matches_none() {
        let palette = bw_palette();
        let options = DitherOptions::default();
        let frame = mid_gray(4);
        let out = gradient_noise(&frame, &palette, &options, 0.0);
        let expected = palette.nearest_for_rgb(0x80, 0x80, 0x80);
        for &idx in out.indices() {
            assert_eq!(idx, expected);
        }
    }
}
