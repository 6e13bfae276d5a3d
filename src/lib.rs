//! palette8: palette construction, dithering, and GIF/PNG8/APNG encoding
//! for rasterized image sequences.
//!
//! This crate turns decoded RGBA8888 frames into animated GIF,
//! indexed-color PNG ("PNG8", optionally animated via `acTL`/`fcTL`/
//! `fdAT`), or full-color APNG. It does not decode image files itself —
//! callers hand it already-decoded pixel buffers ([`Frame`]) and get back
//! bytes written to any [`std::io::Write`] sink.
//!
//! # Quick start
//!
//! ```
//! use palette8::{EncodeOptions, Frame};
//!
//! let frame = Frame::new(2, 2, vec![0xFF0000FF, 0x00FF00FF, 0x0000FFFF, 0xFFFFFFFFu32]);
//! let mut out = Vec::new();
//! palette8::encode_png8(&mut out, &[frame], None, &EncodeOptions::default()).unwrap();
//! assert_eq!(&out[0..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
//! ```
//!
//! # Three engines
//!
//! - [`palette`]: builds a ≤256-entry [`Palette`] from source imagery (or
//!   an explicit color list), and a 32 KiB RGB555→index lookup table.
//! - [`dither`]: maps full-color pixels to palette indices under one of
//!   15 algorithms, from plain nearest-color to Floyd-Steinberg variants
//!   blended with blue-noise and R2 low-discrepancy offsets.
//! - [`writer`]: emits the GIF89a, PNG8, and APNG container formats.
//!
//! [`encode_gif`], [`encode_png8`], and [`encode_apng`] in [`pipeline`]
//! wire all three together: resolve a palette, dither every frame, write
//! the container. Reach for the writer functions directly only when you
//! already have palette-indexed (or, for APNG, truecolor) data in hand.
//!
//! # Color spaces
//!
//! [`color`] provides `Srgb`, `LinearRgb`, and `Oklab` newtypes so
//! palette analysis and dithering never do arithmetic on gamma-encoded
//! bytes by accident.

pub mod bitmath;
pub mod color;
pub mod dither;
pub mod error;
pub mod image;
pub mod noise;
pub mod palette;
pub mod pipeline;
pub mod writer;

pub use color::{LinearRgb, Oklab, Srgb};
pub use dither::{dither, DitherAlgorithm, DitherOptions};
pub use error::{ConfigurationError, EncodeError};
pub use image::{Frame, IndexedFrame};
pub use palette::{analyze, analyze_fast, analyze_hue_wise, analyze_many, analyze_reductive, default_palette, Palette};
pub use pipeline::{encode_apng, encode_gif, encode_png8, EncodeOptions};
pub use writer::{
    load_preload_file, write_apng, write_gif, write_png8, write_preload_file, ApngOptions, DisposalMethod, FrameControl,
    GifFrame, GifOptions, PaletteMode, Png8Options,
};
