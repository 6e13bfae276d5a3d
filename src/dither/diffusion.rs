//! Error-diffusion dithers: DIFFUSION, BURKES, SCATTER, NEUE, WOVEN, DODGY,
//! WREN, and OVERBOARD all share one core loop, differing only in which
//! kernel they diffuse with and what (if any) extra noise they mix in
//! before quantizing each pixel.

use crate::color::{LinearRgb, Srgb};
use crate::image::{Frame, IndexedFrame};
use crate::noise::{r2, sample_centered, sample_multiplier, PLANE_A, PLANE_B, PLANE_C, PLANE_D, PLANE_E};
use crate::palette::Palette;

use super::kernel::Kernel;
use super::options::DitherOptions;

/// Two-row (or more, for wider kernels) sliding error accumulator.
///
/// Rows are indexed relative to the current scanline (`0` = current row's
/// outgoing error, `1` = next row, ...). `advance_row` rotates the buffer
/// and clears what becomes the new farthest row.
struct ErrorBuffer {
    rows: Vec<Vec<[f32; 3]>>,
    pad: usize,
}

impl ErrorBuffer {
    fn new(width: usize, max_dy: usize, pad: usize) -> Self {
        Self {
            rows: vec![vec![[0.0f32; 3]; width + 2 * pad]; max_dy + 1],
            pad,
        }
    }

    #[inline]
    fn col(&self, x: usize, dx: i32) -> usize {
        (x as i32 + self.pad as i32 + dx) as usize
    }

    fn get(&self, x: usize, dy: usize) -> [f32; 3] {
        self.rows[dy][self.col(x, 0)]
    }

    fn add(&mut self, x: usize, dx: i32, dy: usize, error: [f32; 3], clamp: f32) {
        let col = self.col(x, dx);
        if col >= self.rows[dy].len() {
            return;
        }
        let slot = &mut self.rows[dy][col];
        for c in 0..3 {
            slot[c] = (slot[c] + error[c]).clamp(-clamp, clamp);
        }
    }

    fn advance_row(&mut self) {
        self.rows.rotate_left(1);
        let last = self.rows.len() - 1;
        for v in self.rows[last].iter_mut() {
            *v = [0.0; 3];
        }
    }
}

/// Per-pixel hooks an algorithm can plug into the shared diffusion loop.
#[derive(Default)]
pub struct DiffusionHooks<'a> {
    /// Offset added to the pixel (in centered `-0.5..=0.5` per-channel
    /// units, scaled by strength) before quantization, e.g. blue-noise or
    /// R2-sequence texture.
    pub pre_offset: Option<Box<dyn Fn(usize, usize) -> [f32; 3] + 'a>>,
    /// Multiplier applied to the diffused error term itself (SCATTER).
    pub error_scale: Option<Box<dyn Fn(usize, usize) -> f32 + 'a>>,
}

/// Core error-diffusion loop shared by every diffusive algorithm.
pub fn diffuse(
    frame: &Frame,
    palette: &Palette,
    kernel: Kernel,
    options: &DitherOptions,
    strength: f32,
    hooks: &DiffusionHooks,
) -> IndexedFrame {
    let width = frame.width();
    let height = frame.height();
    let mut output = vec![0u8; width * height];

    if width == 0 || height == 0 {
        return IndexedFrame::new(width, height, output);
    }

    let mut errors = ErrorBuffer::new(width, kernel.max_dy, 2);
    let channel_max = options.error_clamp;

    for y in 0..height {
        let right_to_left = options.serpentine && y % 2 == 1;
        let xs: Box<dyn Iterator<Item = usize>> = if right_to_left {
            Box::new((0..width).rev())
        } else {
            Box::new(0..width)
        };

        for x in xs {
            let idx = y * width + x;
            let (r, g, b, _a) = frame.pixel_at(idx);

            if options.preserve_exact_matches {
                if let Some(palette_idx) = palette.exact_match(r, g, b) {
                    output[idx] = palette_idx;
                    continue;
                }
            }

            let diffused = errors.get(x, 0);
            let mut linear = LinearRgb::from(Srgb::from_u8(r, g, b)).add(diffused);

            if let Some(offset_fn) = &hooks.pre_offset {
                let offset = offset_fn(x, y);
                let scale = strength * 0.12;
                linear = linear.add([offset[0] * scale, offset[1] * scale, offset[2] * scale]);
            }

            linear = linear.clamped();
            let quantized = Srgb::from(linear).to_bytes();
            let (palette_idx, _) = palette.nearest_exhaustive(quantized[0], quantized[1], quantized[2]);
            output[idx] = palette_idx;

            let chosen = palette.color(palette_idx as usize);
            let chosen_linear = LinearRgb::from(Srgb::from_u8(chosen[0], chosen[1], chosen[2]));
            let mut error = [
                linear.r - chosen_linear.r,
                linear.g - chosen_linear.g,
                linear.b - chosen_linear.b,
            ];

            if let Some(scale_fn) = &hooks.error_scale {
                let s = scale_fn(x, y);
                for e in error.iter_mut() {
                    *e *= s;
                }
            }

            let entries: Vec<(i32, i32, u8)> = if right_to_left {
                kernel.mirrored_entries()
            } else {
                kernel.entries.to_vec()
            };

            for &(dx, dy, weight) in &entries {
                if dy < 0 {
                    continue;
                }
                let fraction = weight as f32 / kernel.divisor as f32 * strength;
                let term = [error[0] * fraction, error[1] * fraction, error[2] * fraction];
                if x as i32 + dx < 0 {
                    continue;
                }
                errors.add(x, dx, dy as usize, term, channel_max);
            }
        }

        errors.advance_row();
    }

    IndexedFrame::new(width, height, output)
}

/// Blue-noise tile sample centered on `0`, one per plane.
fn blue_noise_offset(x: usize, y: usize) -> [f32; 3] {
    [
        sample_centered(&PLANE_A, x, y),
        sample_centered(&PLANE_B, x, y),
        sample_centered(&PLANE_C, x, y),
    ]
}

fn dodgy_offset(x: usize, y: usize) -> [f32; 3] {
    // Four independent planes drive R/G/B/bias; bias is folded evenly
    // into all three channels so it nudges lightness without a hue shift.
    let r = sample_centered(&PLANE_A, x, y);
    let g = sample_centered(&PLANE_B, x, y);
    let b = sample_centered(&PLANE_C, x, y);
    let bias = sample_centered(&PLANE_D, x, y) * 0.5;
    [r + bias, g + bias, b + bias]
}

fn r2_offset(x: usize, y: usize, width: usize) -> [f32; 3] {
    let (r, g, b) = r2::per_channel(x, y, width);
    [r, g, b]
}

/// DIFFUSION: plain Floyd-Steinberg.
pub fn diffusion(frame: &Frame, palette: &Palette, options: &DitherOptions, strength: f32) -> IndexedFrame {
    diffuse(frame, palette, super::kernel::FLOYD_STEINBERG, options, strength, &DiffusionHooks::default())
}

/// BURKES: plain Burkes diffusion. Unlike DIFFUSION, this scans strictly
/// left-to-right on every row (spec §4.3 calls DIFFUSION "serpentine" but
/// BURKES explicitly "not serpentine"), so the caller's `serpentine`
/// option is overridden here regardless of what was asked for.
pub fn burkes(frame: &Frame, palette: &Palette, options: &DitherOptions, strength: f32) -> IndexedFrame {
    let options = DitherOptions { serpentine: false, ..options.clone() };
    diffuse(frame, palette, super::kernel::BURKES, &options, strength, &DiffusionHooks::default())
}

/// SCATTER: Floyd-Steinberg with the diffused error scaled by the
/// multiplier plane, so flat regions diffuse less predictably.
pub fn scatter(frame: &Frame, palette: &Palette, options: &DitherOptions, strength: f32) -> IndexedFrame {
    let hooks = DiffusionHooks {
        pre_offset: None,
        error_scale: Some(Box::new(|x, y| sample_multiplier(&PLANE_E, x, y))),
    };
    diffuse(frame, palette, super::kernel::FLOYD_STEINBERG, options, strength, &hooks)
}

/// NEUE: Floyd-Steinberg plus additive blue-noise texture.
pub fn neue(frame: &Frame, palette: &Palette, options: &DitherOptions, strength: f32) -> IndexedFrame {
    let hooks = DiffusionHooks {
        pre_offset: Some(Box::new(blue_noise_offset)),
        error_scale: None,
    };
    diffuse(frame, palette, super::kernel::FLOYD_STEINBERG, options, strength, &hooks)
}

/// WOVEN: Floyd-Steinberg plus per-channel R2-sequence offsets.
pub fn woven(frame: &Frame, palette: &Palette, options: &DitherOptions, strength: f32) -> IndexedFrame {
    let width = frame.width();
    let hooks = DiffusionHooks {
        pre_offset: Some(Box::new(move |x, y| r2_offset(x, y, width))),
        error_scale: None,
    };
    diffuse(frame, palette, super::kernel::FLOYD_STEINBERG, options, strength, &hooks)
}

/// DODGY: Floyd-Steinberg plus four independent blue-noise planes.
pub fn dodgy(frame: &Frame, palette: &Palette, options: &DitherOptions, strength: f32) -> IndexedFrame {
    let hooks = DiffusionHooks {
        pre_offset: Some(Box::new(dodgy_offset)),
        error_scale: None,
    };
    diffuse(frame, palette, super::kernel::FLOYD_STEINBERG, options, strength, &hooks)
}

/// WREN: DODGY's per-channel blue noise combined with WOVEN's R2 offset.
pub fn wren(frame: &Frame, palette: &Palette, options: &DitherOptions, strength: f32) -> IndexedFrame {
    let width = frame.width();
    let hooks = DiffusionHooks {
        pre_offset: Some(Box::new(move |x, y| {
            let a = dodgy_offset(x, y);
            let b = r2_offset(x, y, width);
            [
                (a[0] + b[0]) * 0.5,
                (a[1] + b[1]) * 0.5,
                (a[2] + b[2]) * 0.5,
            ]
        })),
        error_scale: None,
    };
    diffuse(frame, palette, super::kernel::FLOYD_STEINBERG, options, strength, &hooks)
}

/// OVERBOARD: Burkes diffusion plus a per-pixel 4x4 ordered selector
/// choosing between R2 offset, blue-noise offset, or a compact XOR-mod
/// pattern.
pub fn overboard(frame: &Frame, palette: &Palette, options: &DitherOptions, strength: f32) -> IndexedFrame {
    let width = frame.width();
    let hooks = DiffusionHooks {
        pre_offset: Some(Box::new(move |x, y| match (x ^ y) & 0x3 {
            0 | 1 => r2_offset(x, y, width),
            2 => blue_noise_offset(x, y),
            _ => {
                let v = (((x ^ y) & 0xFF) as f32 / 255.0) - 0.5;
                [v, v, v]
            }
        })),
        error_scale: None,
    };
    diffuse(frame, palette, super::kernel::BURKES, options, strength, &hooks)
}
