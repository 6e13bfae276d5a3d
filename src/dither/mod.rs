//! The dithering engine: maps full-color frames to palette indices under
//! one of 15 named algorithms (SPEC_FULL §4.3).
//!
//! Dispatch happens once per frame in [`dither`], branching on
//! [`DitherAlgorithm`] to a monomorphic implementation — never inside the
//! per-pixel loop.

mod diffusion;
mod gradient_noise;
pub mod kernel;
mod options;
mod ordered;

pub use options::{DitherAlgorithm, DitherOptions};

use crate::image::{Frame, IndexedFrame};
use crate::palette::Palette;

/// The effective per-frame error scale: the options' strength multiplier,
/// the palette's own `dither_strength`, and a damping factor from
/// `population_bias` so large palettes (which already have tightly spaced
/// colors) don't get over-dithered.
fn effective_strength(palette: &Palette, options: &DitherOptions) -> f32 {
    let damping = (palette.population_bias() * 3.0).min(1.0);
    options.strength * palette.dither_strength() * damping
}

/// NONE: direct nearest-color mapping via the palette's mapping table.
fn none_dither(frame: &Frame, palette: &Palette) -> IndexedFrame {
    let width = frame.width();
    let height = frame.height();
    let mut output = vec![0u8; width * height];
    for (i, slot) in output.iter_mut().enumerate() {
        let (r, g, b, _a) = frame.pixel_at(i);
        *slot = palette.nearest_for_rgb(r, g, b);
    }
    IndexedFrame::new(width, height, output)
}

/// Run `algorithm` over `frame` against `palette`.
///
/// `frame_seq` is only consulted by [`DitherAlgorithm::ChaoticNoise`],
/// which is deliberately not stable across frames; every other algorithm
/// ignores it.
pub fn dither(
    frame: &Frame,
    palette: &Palette,
    algorithm: DitherAlgorithm,
    options: &DitherOptions,
    frame_seq: u64,
) -> IndexedFrame {
    let strength = effective_strength(palette, options);

    if strength <= 0.0 && algorithm != DitherAlgorithm::None {
        return none_dither(frame, palette);
    }

    match algorithm {
        DitherAlgorithm::None => none_dither(frame, palette),
        DitherAlgorithm::GradientNoise => gradient_noise::gradient_noise(frame, palette, options, strength),
        DitherAlgorithm::Pattern => ordered::pattern(frame, palette, options, strength),
        DitherAlgorithm::Diffusion => diffusion::diffusion(frame, palette, options, strength),
        DitherAlgorithm::Burkes => diffusion::burkes(frame, palette, options, strength),
        DitherAlgorithm::BlueNoise => gradient_noise::blue_noise(frame, palette, options, strength),
        DitherAlgorithm::ChaoticNoise => {
            gradient_noise::chaotic_noise(frame, palette, options, strength, frame_seq)
        }
        DitherAlgorithm::Scatter => diffusion::scatter(frame, palette, options, strength),
        DitherAlgorithm::Neue => diffusion::neue(frame, palette, options, strength),
        DitherAlgorithm::Roberts => ordered::roberts(frame, palette, options, strength),
        DitherAlgorithm::Woven => diffusion::woven(frame, palette, options, strength),
        DitherAlgorithm::Dodgy => diffusion::dodgy(frame, palette, options, strength),
        DitherAlgorithm::Loaf => ordered::loaf(frame, palette, options, strength),
        DitherAlgorithm::Wren => diffusion::wren(frame, palette, options, strength),
        DitherAlgorithm::Overboard => diffusion::overboard(frame, palette, options, strength),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bw_palette() -> Palette {
        Palette::exact(&[[0, 0, 0, 255], [255, 255, 255, 255]]).unwrap()
    }

    #[test]
    fn none_matches_mapping_table_directly() {
        let palette = bw_palette();
        let options = DitherOptions::default();
        let frame = Frame::new(2, 2, vec![0xFF0000FFu32, 0x00FF00FFu32, 0x0000FFFFu32, 0xFFFFFFFFu32]);
        let out = dither(&frame, &palette, DitherAlgorithm::None, &options, 0);
        for (i, &idx) in out.indices().iter().enumerate() {
            let (r, g, b, _a) = frame.pixel_at(i);
            assert_eq!(idx, palette.nearest_for_rgb(r, g, b));
        }
    }

    #[test]
    fn zero_strength_equals_none_for_every_algorithm() {
        let palette = bw_palette();
        let frame = Frame::new(8, 8, vec![0x808080FFu32; 64]);
        let zeroed = DitherOptions::default().strength(0.0);
        let none_out = dither(&frame, &palette, DitherAlgorithm::None, &DitherOptions::default(), 0);

        for algo in DitherAlgorithm::ALL {
            let out = dither(&frame, &palette, algo, &zeroed, 0);
            assert_eq!(out.indices(), none_out.indices(), "algorithm {algo:?} diverged at zero strength");
        }
    }

    #[test]
    fn output_dimensions_match_input() {
        let palette = bw_palette();
        let options = DitherOptions::default();
        let frame = Frame::new(5, 3, vec![0x808080FFu32; 15]);
        for algo in DitherAlgorithm::ALL {
            let out = dither(&frame, &palette, algo, &options, 0);
            assert_eq!(out.width(), 5);
            assert_eq!(out.height(), 3);
        }
    }

    #[test]
    fn indices_never_exceed_palette_len() {
        let palette = Palette::exact(&[
            [0, 0, 0, 255],
            [255, 0, 0, 255],
            [0, 255, 0, 255],
            [0, 0, 255, 255],
        ])
        .unwrap();
        let options = DitherOptions::default();
        let frame = Frame::new(16, 16, (0..256).map(|i| ((i * 7 % 256) as u32) << 16 | 0xFF).collect());
        for algo in DitherAlgorithm::ALL {
            let out = dither(&frame, &palette, algo, &options, 3);
            for &idx in out.indices() {
                assert!((idx as usize) < palette.len(), "algorithm {algo:?} produced out-of-range index {idx}");
            }
        }
    }
}
