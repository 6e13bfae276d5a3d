//! Per-sequence orchestration: the glue between palette analysis, the
//! dither engine, and the three container writers (SPEC_FULL §4.7).
//!
//! Each `encode_*` function is a thin, format-specific driver: resolve a
//! palette (explicit, shared-over-all-frames, or independently per
//! frame), dither every frame against it, and hand the result to the
//! matching writer. `flip_y` row reordering happens once, here, before
//! any palette analysis or dithering sees a frame, rather than being
//! duplicated inside each writer.

use std::borrow::Cow;
use std::io::Write;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::dither::{self, DitherAlgorithm, DitherOptions};
use crate::error::{ConfigurationError, EncodeError};
use crate::image::{Frame, IndexedFrame};
use crate::palette::{analyze, analyze_fast, analyze_many, Palette};
use crate::writer::{
    write_apng, write_gif, write_png8, ApngOptions, DisposalMethod, FrameControl, GifFrame, GifOptions, PaletteMode,
    Png8Options,
};

/// Configuration for an encode operation (SPEC_FULL §6), mirroring the
/// per-algorithm options builders already used in [`crate::dither`].
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub dither_algorithm: DitherAlgorithm,
    pub dither_options: DitherOptions,
    /// Scan frames bottom-to-top instead of top-to-bottom.
    pub flip_y: bool,
    /// PNG/APNG zlib compression level, `0..=9`. Ignored by GIF.
    pub compression: u32,
    /// GIF-only: use [`crate::palette::analyze_fast`] instead of
    /// [`crate::palette::analyze`] when a palette must be built.
    pub fast_analysis: bool,
    /// GIF-only: build an independent palette per frame (local color
    /// tables) instead of one shared palette (global color table).
    pub per_frame_palette: bool,
    pub fps: f32,
    /// Netscape loop extension count; `0` = infinite (GIF only).
    pub repeat: u16,
    pub disposal: DisposalMethod,
    /// Upper bound on colors when a palette must be analyzed.
    pub palette_color_count: usize,
    /// Minimum color-distance threshold for the same case.
    pub palette_threshold: f32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            dither_algorithm: DitherAlgorithm::default(),
            dither_options: DitherOptions::default(),
            flip_y: false,
            compression: 6,
            fast_analysis: false,
            per_frame_palette: false,
            fps: 10.0,
            repeat: 0,
            disposal: DisposalMethod::RestoreBackground,
            palette_color_count: 256,
            palette_threshold: 40.0,
        }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dither_algorithm(mut self, algorithm: DitherAlgorithm) -> Self {
        self.dither_algorithm = algorithm;
        self
    }

    pub fn dither_strength(mut self, strength: f32) -> Self {
        self.dither_options.strength = strength;
        self
    }

    pub fn flip_y(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }

    pub fn compression(mut self, level: u32) -> Self {
        self.compression = level;
        self
    }

    pub fn fast_analysis(mut self, enabled: bool) -> Self {
        self.fast_analysis = enabled;
        self
    }

    pub fn per_frame_palette(mut self, enabled: bool) -> Self {
        self.per_frame_palette = enabled;
        self
    }

    pub fn fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    pub fn repeat(mut self, repeat: u16) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn disposal(mut self, disposal: DisposalMethod) -> Self {
        self.disposal = disposal;
        self
    }

    pub fn palette_color_count(mut self, count: usize) -> Self {
        self.palette_color_count = count;
        self
    }

    pub fn palette_threshold(mut self, threshold: f32) -> Self {
        self.palette_threshold = threshold;
        self
    }

    /// Validate option values once, up front, rather than deep inside a
    /// per-pixel loop.
    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.compression > 9 {
            return Err(ConfigurationError::CompressionOutOfRange(self.compression));
        }
        if !(self.fps > 0.0) {
            return Err(ConfigurationError::InvalidFps(self.fps));
        }
        if self.dither_options.strength < 0.0 {
            return Err(ConfigurationError::InvalidStrength(self.dither_options.strength));
        }
        Ok(())
    }
}

fn check_frames(frames: &[Frame]) -> Result<(), EncodeError> {
    if frames.is_empty() {
        return Err(EncodeError::Sequence("no frames to encode".into()));
    }
    let (width, height) = (frames[0].width(), frames[0].height());
    if width == 0 || height == 0 {
        return Err(ConfigurationError::ZeroSizeFrame { width, height }.into());
    }
    for frame in frames {
        if frame.width() != width || frame.height() != height {
            return Err(EncodeError::Sequence(format!(
                "frame {}x{} does not match first frame {}x{}",
                frame.width(),
                frame.height(),
                width,
                height
            )));
        }
    }
    Ok(())
}

/// Reorder a frame's rows top-to-bottom or bottom-to-top, once, ahead of
/// any palette analysis or dithering. Borrows when no reordering is
/// needed so the common (`flip_y == false`) path never copies pixels.
fn oriented(frame: &Frame, flip_y: bool) -> Cow<'_, Frame> {
    if !flip_y {
        return Cow::Borrowed(frame);
    }
    let width = frame.width();
    let mut pixels = Vec::with_capacity(frame.pixels().len());
    for y in frame.row_indices(true) {
        pixels.extend_from_slice(&frame.pixels()[y * width..(y + 1) * width]);
    }
    Cow::Owned(Frame::new(width, frame.height(), pixels))
}

fn oriented_all(frames: &[Frame], flip_y: bool) -> Vec<Cow<'_, Frame>> {
    frames.iter().map(|f| oriented(f, flip_y)).collect()
}

fn analyze_one(frame: &Frame, options: &EncodeOptions) -> Result<Palette, EncodeError> {
    let palette = if options.fast_analysis {
        analyze_fast(&[frame], options.palette_threshold, options.palette_color_count)?
    } else {
        analyze(frame, options.palette_threshold, options.palette_color_count)?
    };
    Ok(palette)
}

/// Independent per-frame palette analysis, fanned out across a fork-join
/// pool (SPEC_FULL §5): each task only ever touches its own frame and
/// returns its own palette, so no shared mutable state crosses task
/// boundaries and the result vector stays in input order.
fn per_frame_palettes(frames: &[Cow<'_, Frame>], options: &EncodeOptions) -> Result<Vec<Palette>, EncodeError> {
    frames.par_iter().map(|f| analyze_one(f, options)).collect()
}

fn frame_control(options: &EncodeOptions, dispose_op: u8) -> FrameControl {
    let delay_den = (options.fps * 100.0).round().clamp(1.0, u16::MAX as f32) as u16;
    FrameControl {
        delay_num: 100,
        delay_den,
        dispose_op,
        blend_op: 0,
    }
}

/// Encode a sequence as animated (or still, for one frame) GIF89a.
///
/// If `palette` is `None`, a palette is built from the frames themselves:
/// one shared palette (global color table) by default, or an independent
/// palette per frame (local color tables) when
/// [`EncodeOptions::per_frame_palette`] is set.
pub fn encode_gif<W: Write>(w: &mut W, frames: &[Frame], palette: Option<&Palette>, options: &EncodeOptions) -> Result<(), EncodeError> {
    options.validate()?;
    check_frames(frames)?;

    let oriented_frames = oriented_all(frames, options.flip_y);

    let gif_options = GifOptions {
        fps: options.fps,
        repeat: options.repeat,
        fast_analysis: options.fast_analysis,
        disposal: options.disposal,
    };

    if let Some(shared) = palette {
        debug!(frames = oriented_frames.len(), colors = shared.len(), "gif: using explicit shared palette");
        let indexed: Vec<IndexedFrame> = oriented_frames
            .iter()
            .enumerate()
            .map(|(i, f)| dither::dither(f, shared, options.dither_algorithm, &options.dither_options, i as u64))
            .collect();
        let gif_frames: Vec<GifFrame> = indexed
            .iter()
            .map(|idx| GifFrame { indexed: idx, palette: shared })
            .collect();
        return write_gif(w, &gif_frames, PaletteMode::Global(shared), &gif_options);
    }

    if options.per_frame_palette {
        trace!(frames = oriented_frames.len(), "gif: analyzing one palette per frame");
        let palettes = per_frame_palettes(&oriented_frames, options)?;
        let indexed: Vec<IndexedFrame> = oriented_frames
            .iter()
            .zip(&palettes)
            .enumerate()
            .map(|(i, (f, p))| dither::dither(f, p, options.dither_algorithm, &options.dither_options, i as u64))
            .collect();
        let gif_frames: Vec<GifFrame> = indexed
            .iter()
            .zip(&palettes)
            .map(|(idx, palette)| GifFrame { indexed: idx, palette })
            .collect();
        return write_gif(w, &gif_frames, PaletteMode::PerFrame, &gif_options);
    }

    let refs: Vec<&Frame> = oriented_frames.iter().map(|f| f.as_ref()).collect();
    let shared = analyze_many(&refs, options.palette_threshold, options.palette_color_count)?;
    debug!(frames = refs.len(), colors = shared.len(), "gif: analyzed shared palette over all frames");
    let indexed: Vec<IndexedFrame> = oriented_frames
        .iter()
        .enumerate()
        .map(|(i, f)| dither::dither(f, &shared, options.dither_algorithm, &options.dither_options, i as u64))
        .collect();
    let gif_frames: Vec<GifFrame> = indexed
        .iter()
        .map(|idx| GifFrame { indexed: idx, palette: &shared })
        .collect();
    write_gif(w, &gif_frames, PaletteMode::Global(&shared), &gif_options)
}

/// Encode a sequence as palette-indexed PNG8, animated via `acTL`/`fcTL`/
/// `fdAT` when more than one frame is given.
///
/// A missing `palette` silently falls back to analyzing the frames
/// (SPEC_FULL §7's "recoverable conditions ... trigger an automatic
/// fall-back"), rather than erroring.
pub fn encode_png8<W: Write>(w: &mut W, frames: &[Frame], palette: Option<&Palette>, options: &EncodeOptions) -> Result<(), EncodeError> {
    options.validate()?;
    check_frames(frames)?;

    let oriented_frames = oriented_all(frames, options.flip_y);
    let refs: Vec<&Frame> = oriented_frames.iter().map(|f| f.as_ref()).collect();

    let owned_palette;
    let resolved: &Palette = match palette {
        Some(p) => p,
        None => {
            debug!(frames = refs.len(), "png8: no palette supplied, analyzing frames as a silent fallback");
            owned_palette = analyze_many(&refs, options.palette_threshold, options.palette_color_count)?;
            &owned_palette
        }
    };

    let indexed: Vec<IndexedFrame> = oriented_frames
        .iter()
        .enumerate()
        .map(|(i, f)| dither::dither(f, resolved, options.dither_algorithm, &options.dither_options, i as u64))
        .collect();

    let frame_controls = (0..indexed.len()).map(|_| frame_control(options, 0)).collect();
    let png_options = Png8Options {
        compression_level: options.compression,
        frame_controls,
    };
    write_png8(w, resolved, &indexed, &png_options)
}

/// Encode a sequence as truecolor APNG. Skips the palette and dither
/// engines entirely: every frame is written as full 8-bit RGBA.
pub fn encode_apng<W: Write>(w: &mut W, frames: &[Frame], options: &EncodeOptions) -> Result<(), EncodeError> {
    options.validate()?;
    check_frames(frames)?;

    let oriented_frames = oriented_all(frames, options.flip_y);
    let owned_frames: Vec<Frame> = oriented_frames.into_iter().map(|f| f.into_owned()).collect();

    let frame_controls = (0..owned_frames.len()).map(|_| frame_control(options, 0)).collect();
    let apng_options = ApngOptions {
        compression_level: options.compression,
        frame_controls,
    };
    debug!(frames = owned_frames.len(), "apng: writing truecolor frames");
    write_apng(w, &owned_frames, &apng_options)
}
