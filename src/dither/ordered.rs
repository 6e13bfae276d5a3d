//! Stateless, per-pixel ordered dithers: PATTERN, ROBERTS, and LOAF.
//!
//! Unlike the diffusion family these never look at a neighbor's output,
//! so every pixel can be computed independently (and, if it mattered,
//! in parallel).

use crate::color::{LinearRgb, Srgb};
use crate::image::{Frame, IndexedFrame};
use crate::noise::r2;
use crate::palette::Palette;

use super::options::DitherOptions;

/// The classic 4x4 Bayer threshold matrix, values `0..16`.
const BAYER_4X4: [[u8; 4]; 4] = [
    [0, 8, 2, 10],
    [12, 4, 14, 6],
    [3, 11, 1, 9],
    [15, 7, 13, 5],
];

/// 2x2 ordered matrix for LOAF's deliberately coarse dithering.
const BAYER_2X2: [[u8; 2]; 2] = [[0, 2], [3, 1]];

fn quantize(color: LinearRgb, palette: &Palette) -> u8 {
    let bytes = Srgb::from(color.clamped()).to_bytes();
    palette.nearest_exhaustive(bytes[0], bytes[1], bytes[2]).0
}

/// Generate 16 candidate palette indices for a pixel by repeatedly
/// quantizing and feeding the quantization error back into the next
/// candidate's input color (Knoll's error-feedback pattern dithering).
fn pattern_candidates(color: LinearRgb, palette: &Palette) -> [u8; 16] {
    let mut candidates = [0u8; 16];
    let mut residual = color;

    for slot in candidates.iter_mut() {
        let idx = quantize(residual, palette);
        *slot = idx;

        let chosen = palette.color(idx as usize);
        let chosen_linear = LinearRgb::from(Srgb::from_u8(chosen[0], chosen[1], chosen[2]));
        let error = [
            residual.r - chosen_linear.r,
            residual.g - chosen_linear.g,
            residual.b - chosen_linear.b,
        ];
        residual = color.add(error).clamped();
    }

    candidates
}

/// PATTERN (Knoll): ordered dithering over 16 error-feedback candidates,
/// selected by position in a 4x4 Bayer matrix.
pub fn pattern(frame: &Frame, palette: &Palette, options: &DitherOptions, strength: f32) -> IndexedFrame {
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

            if strength <= 0.0 {
                output[idx] = palette.nearest_for_rgb(r, g, b);
                continue;
            }

            let color = LinearRgb::from(Srgb::from_u8(r, g, b));
            let candidates = pattern_candidates(color, palette);
            let rank = BAYER_4X4[y % 4][x % 4] as usize;
            output[idx] = candidates[rank];
        }
    }

    IndexedFrame::new(width, height, output)
}

/// ROBERTS: three independently-phased R2 sequence samples, one per
/// channel, added before quantization.
pub fn roberts(frame: &Frame, palette: &Palette, options: &DitherOptions, strength: f32) -> IndexedFrame {
    ordered_offset_dither(frame, palette, options, strength, |x, y, width| {
        let (r, g, b) = r2::per_channel(x, y, width);
        [r, g, b]
    })
}

/// LOAF: a deliberately lo-fi 2x2 ordered dither with only two threshold
/// levels per channel.
pub fn loaf(frame: &Frame, palette: &Palette, options: &DitherOptions, strength: f32) -> IndexedFrame {
    ordered_offset_dither(frame, palette, options, strength, |x, y, _width| {
        let v = BAYER_2X2[y % 2][x % 2] as f32 / 4.0 - 0.5;
        [v, v, v]
    })
}

fn ordered_offset_dither(
    frame: &Frame,
    palette: &Palette,
    options: &DitherOptions,
    strength: f32,
    offset_fn: impl Fn(usize, usize, usize) -> [f32; 3],
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
            let offset = offset_fn(x, y, width);
            let scale = strength * 0.2;
            let perturbed = color.add([offset[0] * scale, offset[1] * scale, offset[2] * scale]).clamped();
            output[idx] = quantize(perturbed, palette);
        }
    }

    IndexedFrame::new(width, height, output)
}
